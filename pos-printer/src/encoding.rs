//! GB18030 encoding utilities for thermal printers
//!
//! The target devices default to GB18030 for text. This module provides:
//! - Encoded width calculation for column layout
//! - Truncating/padding strings to encoded widths
//! - Converting UTF-8 to GB18030 while preserving ESC/POS commands
//! - Sanitizing untrusted text before it reaches the wire

use crate::command;

/// Get the GB18030 byte width of a string
///
/// CJK characters are 2 bytes, ASCII is 1 byte.
pub fn encoded_width(s: &str) -> usize {
    let (cow, _, _) = encoding_rs::GB18030.encode(s);
    cow.len()
}

/// Truncate a string to fit within an encoded byte width
pub fn truncate_width(s: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut result = String::new();
    for c in s.chars() {
        let s_char = c.to_string();
        let (cow, _, _) = encoding_rs::GB18030.encode(&s_char);
        let char_len = cow.len();

        if width + char_len > max_width {
            break;
        }
        result.push(c);
        width += char_len;
    }
    result
}

/// Pad a string to a specific encoded byte width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_width(s: &str, width: usize, align_right: bool) -> String {
    let current_width = encoded_width(s);
    if current_width >= width {
        return truncate_width(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Strip control characters (0x00-0x1F, 0x7F) from untrusted text
///
/// Caller-supplied strings (customer names, product names) must never be
/// able to inject ESC/POS control sequences into the output stream.
pub fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'))
        .collect()
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to GB18030
///
/// ASCII bytes (0x00-0x7F) pass through exactly as is, which protects
/// ESC/POS commands from being corrupted. Only bytes >= 0x80 are treated
/// as UTF-8 sequences and converted.
///
/// Also handles:
/// - Re-enabling kanji mode after an INIT command (ESC @)
/// - Euro symbol (€) via a PC858 code-page excursion
pub fn convert_to_gb18030(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() * 2);

    // Arm the multi-byte code system up front
    result.extend_from_slice(&command::KANJI_ON);
    result.extend_from_slice(&command::CODE_SYSTEM_GB);

    let mut buffer = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // INIT (ESC @) resets the code system; re-arm kanji mode after it
        if b == command::INIT[0] && i + 1 < bytes.len() && bytes[i + 1] == command::INIT[1] {
            flush_buffer(&mut buffer, &mut result);

            result.extend_from_slice(&command::INIT);
            result.extend_from_slice(&command::KANJI_ON);

            i += 2;
            continue;
        }

        if b < 128 {
            // ASCII byte (command or ASCII text)
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Non-ASCII byte (part of a UTF-8 sequence)
            buffer.push(b);
        }
        i += 1;
    }

    flush_buffer(&mut buffer, &mut result);

    // Exit kanji mode at the end
    result.extend_from_slice(&command::KANJI_OFF);

    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to GB18030
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    let parts: Vec<&str> = s.split('€').collect();

    for (idx, part) in parts.iter().enumerate() {
        if !part.is_empty() {
            let (encoded, _, _) = encoding_rs::GB18030.encode(part);
            result.extend_from_slice(&encoded);
        }
        if idx < parts.len() - 1 {
            // Euro excursion: exit kanji -> PC858 -> euro byte -> re-enter kanji
            result.extend_from_slice(&command::KANJI_OFF);
            result.extend_from_slice(&command::SELECT_CODEPAGE);
            result.push(command::CODEPAGE_PC858);
            result.push(command::EURO_PC858);
            result.extend_from_slice(&command::KANJI_ON);
        }
    }
    buffer.clear();
}
