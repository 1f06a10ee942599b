//! Receipt renderer
//!
//! Renders print requests into ESC/POS byte streams. Pure: no I/O, and
//! deterministic given a fixed timestamp, so the full output is testable
//! byte for byte. Validation happens here, before any transport is
//! touched.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use pos_printer::{EscPosBuilder, sanitize};
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::types::{EventBody, OrderDetails, PrintRequest, RedemptionDetails, RenderedJob};

/// Blank lines fed before the cut, so the printed tail clears the cutter.
/// Cutting into text jams some mechanisms.
const LINES_BEFORE_CUT: u8 = 5;

/// Code page the rendered bytes are encoded in
const RECEIPT_ENCODING: &str = "GB18030";

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("order_paid event is missing data.orderDetails")]
    MissingOrderDetails,

    #[error("item_redeemed event is missing data.redemptionDetails")]
    MissingRedemptionDetails,

    #[error("order has no items")]
    EmptyItems,

    #[error("item {name:?} has zero quantity")]
    ZeroQuantity { name: String },

    #[error("item {name:?} has a negative unit price")]
    NegativePrice { name: String },

    #[error("negative total amount")]
    NegativeTotal,

    #[error("redeemed quantity must be positive")]
    ZeroRedemptionQuantity,
}

/// Receipt renderer
///
/// Holds the paper width in characters and the timezone receipts are
/// stamped in.
pub struct ReceiptRenderer {
    width: usize,
    timezone: Tz,
}

impl ReceiptRenderer {
    /// Create a renderer with specified paper width and timezone
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize, timezone: Tz) -> Self {
        Self { width, timezone }
    }

    /// Render a print request to an ESC/POS job
    ///
    /// `now` is injected by the caller so rendering stays deterministic.
    pub fn render(
        &self,
        request: &PrintRequest,
        now: DateTime<Utc>,
    ) -> Result<RenderedJob, ValidationError> {
        let bytes = match request {
            PrintRequest::RawTest => self.render_test(now),
            PrintRequest::OrderPaid(body) => {
                let details = body
                    .data
                    .order_details
                    .as_ref()
                    .ok_or(ValidationError::MissingOrderDetails)?;
                validate_order(details)?;
                self.render_order(body, details, now)
            }
            PrintRequest::ItemRedeemed(body) => {
                let details = body
                    .data
                    .redemption_details
                    .as_ref()
                    .ok_or(ValidationError::MissingRedemptionDetails)?;
                if details.quantity == 0 {
                    return Err(ValidationError::ZeroRedemptionQuantity);
                }
                self.render_redemption(body, details, now)
            }
        };

        Ok(RenderedJob::new(bytes, RECEIPT_ENCODING))
    }

    /// Render an order receipt
    fn render_order(
        &self,
        body: &EventBody,
        details: &OrderDetails,
        now: DateTime<Utc>,
    ) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        // Header
        b.center();
        b.double_size();
        b.bold();
        b.line("ORDER RECEIPT");
        b.bold_off();
        b.reset_size();

        // Order reference and customer block
        b.left();
        b.line(&format!("#{}", short_order_ref(&body.order_id)));
        b.line(&sanitize(&details.customer_name));
        b.line(&sanitize(&details.customer_email));
        b.sep_double();

        // Items, in input order
        for item in &details.items {
            b.line(&format!("{}x {}", item.quantity, sanitize(&item.name)));
            b.line_lr(
                &format!("  @ {}", format_currency(item.unit_price)),
                &format_currency(line_total(item.quantity, item.unit_price)),
            );
        }
        b.sep_double();

        // The caller-supplied total is authoritative; never recompute it
        // from the items, even when they disagree.
        b.right();
        b.double_size();
        b.bold();
        b.line(&format!("TOTAL {}", format_currency(details.total_amount)));
        b.bold_off();
        b.reset_size();

        self.render_tail(&mut b, now);
        b.build()
    }

    /// Render an item redemption receipt
    fn render_redemption(
        &self,
        body: &EventBody,
        details: &RedemptionDetails,
        now: DateTime<Utc>,
    ) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        b.center();
        b.double_size();
        b.bold();
        b.line("ITEM REDEMPTION");
        b.bold_off();
        b.reset_size();

        b.left();
        b.line(&format!("#{}", short_order_ref(&body.order_id)));
        b.sep_double();

        b.line(&format!(
            "{}x {}",
            details.quantity,
            sanitize(&details.product_name)
        ));
        b.sep_double();

        self.render_tail(&mut b, now);
        b.build()
    }

    /// Render the fixed connectivity-test receipt
    fn render_test(&self, now: DateTime<Utc>) -> Vec<u8> {
        let mut b = EscPosBuilder::new(self.width);

        b.center();
        b.line("Hello World!");
        b.line("Test Print");
        b.line(&self.format_timestamp(now));

        b.left();
        b.feed(LINES_BEFORE_CUT);
        b.cut();
        b.build()
    }

    /// Timestamp, feed and cut - shared tail of every receipt
    fn render_tail(&self, b: &mut EscPosBuilder, now: DateTime<Utc>) {
        b.center();
        b.line(&self.format_timestamp(now));
        b.left();
        b.feed(LINES_BEFORE_CUT);
        b.cut();
    }

    fn format_timestamp(&self, now: DateTime<Utc>) -> String {
        now.with_timezone(&self.timezone)
            .format("%d/%m/%Y %H:%M:%S")
            .to_string()
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(48, chrono_tz::Europe::Madrid)
    }
}

fn validate_order(details: &OrderDetails) -> Result<(), ValidationError> {
    if details.items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }
    for item in &details.items {
        if item.quantity == 0 {
            return Err(ValidationError::ZeroQuantity {
                name: item.name.clone(),
            });
        }
        if item.unit_price.is_sign_negative() && !item.unit_price.is_zero() {
            return Err(ValidationError::NegativePrice {
                name: item.name.clone(),
            });
        }
    }
    if details.total_amount.is_sign_negative() && !details.total_amount.is_zero() {
        return Err(ValidationError::NegativeTotal);
    }
    Ok(())
}

/// Last 6 characters of the order id, upper-cased
fn short_order_ref(order_id: &str) -> String {
    let tail: Vec<char> = order_id.chars().rev().take(6).collect();
    tail.into_iter().rev().collect::<String>().to_uppercase()
}

/// Line total with half-up rounding at 2 decimals
fn line_total(quantity: u32, unit_price: Decimal) -> Decimal {
    (Decimal::from(quantity) * unit_price)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency with 2 decimals and euro suffix
fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2} €", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printing::types::{EventData, OrderItem};
    use chrono::TimeZone;
    use pos_printer::command;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 22, 14, 32, 15).unwrap()
    }

    fn order_request(items: Vec<OrderItem>, total: &str) -> PrintRequest {
        PrintRequest::OrderPaid(EventBody {
            business_id: "b-1".to_string(),
            order_id: "abc123456".to_string(),
            data: EventData {
                order_details: Some(OrderDetails {
                    customer_name: "Ana".to_string(),
                    customer_email: "a@x.com".to_string(),
                    items,
                    total_amount: total.parse().unwrap(),
                }),
                redemption_details: None,
            },
        })
    }

    fn beer_item() -> OrderItem {
        OrderItem {
            name: "Beer".to_string(),
            quantity: 2,
            unit_price: "5.00".parse().unwrap(),
        }
    }

    fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn count_subsequence(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    fn contains_text(bytes: &[u8], text: &str) -> bool {
        find_subsequence(bytes, text.as_bytes()).is_some()
    }

    #[test]
    fn test_order_receipt_content() {
        let renderer = ReceiptRenderer::default();
        let job = renderer
            .render(&order_request(vec![beer_item()], "10.00"), fixed_now())
            .unwrap();

        assert_eq!(job.encoding, "GB18030");
        assert_eq!(job.approx_len, job.bytes.len());
        assert!(contains_text(&job.bytes, "#123456"));
        assert!(contains_text(&job.bytes, "Ana"));
        assert!(contains_text(&job.bytes, "a@x.com"));
        assert!(contains_text(&job.bytes, "2x Beer"));
        assert!(contains_text(&job.bytes, "10.00"));
        assert!(contains_text(&job.bytes, "22/01/2024"));
    }

    #[test]
    fn test_single_cut_after_all_text_behind_feed() {
        let renderer = ReceiptRenderer::default();
        let job = renderer
            .render(&order_request(vec![beer_item()], "10.00"), fixed_now())
            .unwrap();

        assert_eq!(count_subsequence(&job.bytes, &command::CUT_FULL), 1);

        let cut_pos = find_subsequence(&job.bytes, &command::CUT_FULL).unwrap();
        let feed_pos = find_subsequence(
            &job.bytes,
            &[command::FEED_LINES[0], command::FEED_LINES[1], LINES_BEFORE_CUT],
        )
        .unwrap();
        // The feed command sits directly before the cut
        assert_eq!(feed_pos + 3, cut_pos);

        // Everything textual precedes the cut
        let total_pos = find_subsequence(&job.bytes, b"TOTAL").unwrap();
        let stamp_pos = find_subsequence(&job.bytes, b"22/01/2024").unwrap();
        assert!(total_pos < cut_pos);
        assert!(stamp_pos < cut_pos);
    }

    #[test]
    fn test_total_is_caller_supplied_verbatim() {
        // 2 x 5.00 sums to 10.00, but the caller says 99.99; the receipt
        // must trust the caller.
        let renderer = ReceiptRenderer::default();
        let job = renderer
            .render(&order_request(vec![beer_item()], "99.99"), fixed_now())
            .unwrap();

        assert!(contains_text(&job.bytes, "TOTAL 99.99"));
        assert!(!contains_text(&job.bytes, "TOTAL 10.00"));
    }

    #[test]
    fn test_line_total_rounds_half_up() {
        let item = OrderItem {
            name: "Split".to_string(),
            quantity: 3,
            unit_price: "1.115".parse().unwrap(),
        };
        // 3 * 1.115 = 3.345 -> 3.35 half-up
        let renderer = ReceiptRenderer::default();
        let job = renderer
            .render(&order_request(vec![item], "3.35"), fixed_now())
            .unwrap();
        assert!(contains_text(&job.bytes, "3.35"));
    }

    #[test]
    fn test_items_render_in_input_order() {
        let first = OrderItem {
            name: "Zebra".to_string(),
            quantity: 1,
            unit_price: "1.00".parse().unwrap(),
        };
        let second = OrderItem {
            name: "Apple".to_string(),
            quantity: 1,
            unit_price: "2.00".parse().unwrap(),
        };
        let renderer = ReceiptRenderer::default();
        let job = renderer
            .render(&order_request(vec![first, second], "3.00"), fixed_now())
            .unwrap();

        let zebra = find_subsequence(&job.bytes, b"1x Zebra").unwrap();
        let apple = find_subsequence(&job.bytes, b"1x Apple").unwrap();
        assert!(zebra < apple);
    }

    #[test]
    fn test_render_is_deterministic_for_fixed_timestamp() {
        let renderer = ReceiptRenderer::default();
        let request = order_request(vec![beer_item()], "10.00");
        let first = renderer.render(&request, fixed_now()).unwrap();
        let second = renderer.render(&request, fixed_now()).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_missing_order_details_is_validation_error() {
        let request = PrintRequest::OrderPaid(EventBody {
            business_id: String::new(),
            order_id: "abc123456".to_string(),
            data: EventData::default(),
        });
        let renderer = ReceiptRenderer::default();
        let err = renderer.render(&request, fixed_now()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingOrderDetails));
    }

    #[test]
    fn test_empty_items_is_validation_error() {
        let renderer = ReceiptRenderer::default();
        let err = renderer
            .render(&order_request(vec![], "10.00"), fixed_now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyItems));
    }

    #[test]
    fn test_zero_quantity_is_validation_error() {
        let item = OrderItem {
            name: "Beer".to_string(),
            quantity: 0,
            unit_price: "5.00".parse().unwrap(),
        };
        let renderer = ReceiptRenderer::default();
        let err = renderer
            .render(&order_request(vec![item], "0.00"), fixed_now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::ZeroQuantity { .. }));
    }

    #[test]
    fn test_negative_price_is_validation_error() {
        let item = OrderItem {
            name: "Refund".to_string(),
            quantity: 1,
            unit_price: "-5.00".parse().unwrap(),
        };
        let renderer = ReceiptRenderer::default();
        let err = renderer
            .render(&order_request(vec![item], "0.00"), fixed_now())
            .unwrap_err();
        assert!(matches!(err, ValidationError::NegativePrice { .. }));
    }

    #[test]
    fn test_control_bytes_are_stripped_from_untrusted_text() {
        let request = PrintRequest::OrderPaid(EventBody {
            business_id: String::new(),
            order_id: "abc123456".to_string(),
            data: EventData {
                order_details: Some(OrderDetails {
                    // Embedded ESC @ must not survive into the stream
                    customer_name: "An\u{1B}\u{40}a".to_string(),
                    customer_email: "a@x.com".to_string(),
                    items: vec![beer_item()],
                    total_amount: "10.00".parse().unwrap(),
                }),
                redemption_details: None,
            },
        });
        let renderer = ReceiptRenderer::default();
        let job = renderer.render(&request, fixed_now()).unwrap();

        assert!(contains_text(&job.bytes, "Ana"));
        // Exactly one INIT: the builder's own, at the start
        assert_eq!(count_subsequence(&job.bytes, &command::INIT), 1);
    }

    #[test]
    fn test_redemption_receipt() {
        let request = PrintRequest::ItemRedeemed(EventBody {
            business_id: "b-1".to_string(),
            order_id: "xyz998877".to_string(),
            data: EventData {
                order_details: None,
                redemption_details: Some(RedemptionDetails {
                    product_name: "Festival Token".to_string(),
                    quantity: 3,
                }),
            },
        });
        let renderer = ReceiptRenderer::default();
        let job = renderer.render(&request, fixed_now()).unwrap();

        assert!(contains_text(&job.bytes, "ITEM REDEMPTION"));
        assert!(contains_text(&job.bytes, "#998877"));
        assert!(contains_text(&job.bytes, "3x Festival Token"));
        // No pricing section on redemptions
        assert!(!contains_text(&job.bytes, "TOTAL"));
        assert_eq!(count_subsequence(&job.bytes, &command::CUT_FULL), 1);
    }

    #[test]
    fn test_missing_redemption_details_is_validation_error() {
        let request = PrintRequest::ItemRedeemed(EventBody {
            business_id: String::new(),
            order_id: "xyz998877".to_string(),
            data: EventData::default(),
        });
        let renderer = ReceiptRenderer::default();
        let err = renderer.render(&request, fixed_now()).unwrap_err();
        assert!(matches!(err, ValidationError::MissingRedemptionDetails));
    }

    #[test]
    fn test_raw_test_uses_same_bracketing() {
        let renderer = ReceiptRenderer::default();
        let job = renderer.render(&PrintRequest::RawTest, fixed_now()).unwrap();

        assert!(contains_text(&job.bytes, "Hello World!"));
        assert!(contains_text(&job.bytes, "Test Print"));
        assert_eq!(count_subsequence(&job.bytes, &command::CUT_FULL), 1);

        let cut_pos = find_subsequence(&job.bytes, &command::CUT_FULL).unwrap();
        let feed_pos = find_subsequence(
            &job.bytes,
            &[command::FEED_LINES[0], command::FEED_LINES[1], LINES_BEFORE_CUT],
        )
        .unwrap();
        assert_eq!(feed_pos + 3, cut_pos);
    }
}
