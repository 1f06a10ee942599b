//! Print request wire types
//!
//! JSON shapes accepted by `POST /print`. The `type` tag selects the
//! variant; event variants carry a camelCase body whose `data` holds the
//! payload matching the tag. A payload that does not match its tag is a
//! validation error caught by the renderer, never a deserialization panic.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A print job request
///
/// ```json
/// {
///   "type": "order_paid",
///   "businessId": "b-1",
///   "orderId": "abc123456",
///   "data": { "orderDetails": { ... } }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrintRequest {
    /// Connectivity test; prints a fixed template through the same
    /// init/feed/cut bracketing as real receipts
    RawTest,
    OrderPaid(EventBody),
    ItemRedeemed(EventBody),
}

impl PrintRequest {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            PrintRequest::RawTest => "raw_test",
            PrintRequest::OrderPaid(_) => "order_paid",
            PrintRequest::ItemRedeemed(_) => "item_redeemed",
        }
    }
}

/// Common envelope of event-driven requests
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBody {
    #[serde(default)]
    pub business_id: String,
    pub order_id: String,
    #[serde(default)]
    pub data: EventData,
}

/// Event payload container; exactly one side should be present,
/// matching the request's `type` tag
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub order_details: Option<OrderDetails>,
    pub redemption_details: Option<RedemptionDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub customer_name: String,
    pub customer_email: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionDetails {
    pub product_name: String,
    pub quantity: u32,
}

/// A rendered print job: the ESC/POS byte stream plus metadata
///
/// Built once per request and owned by the dispatcher for the lifetime of
/// one delivery attempt; never mutated.
#[derive(Debug, Clone)]
pub struct RenderedJob {
    pub bytes: Vec<u8>,
    pub encoding: &'static str,
    pub approx_len: usize,
}

impl RenderedJob {
    pub fn new(bytes: Vec<u8>, encoding: &'static str) -> Self {
        let approx_len = bytes.len();
        Self {
            bytes,
            encoding,
            approx_len,
        }
    }
}

/// Successful dispatch outcome
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    /// Name of the printer the job was delivered to
    pub printer: String,
}
