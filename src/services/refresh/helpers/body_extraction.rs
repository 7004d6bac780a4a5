//! Header lookup and body text extraction.
//!
//! Picks the first usable text part of a message: `text/plain` wins, then
//! `text/html` run through tag stripping. Part payloads arrive base64url
//! encoded from the provider; some senders pad, some don't.

use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;

use crate::types::{MessageHeader, MessagePart};

/// Case-insensitive header lookup, defaulting to empty text.
pub fn header_value<'a>(headers: &'a [MessageHeader], name: &str) -> &'a str {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
        .unwrap_or("")
}

/// Extract the first usable text body, or empty text when the message
/// has none.
pub fn extract_text(parts: &[MessagePart]) -> String {
    if let Some(plain) = first_decoded(parts, "text/plain") {
        return plain;
    }

    if let Some(html) = first_decoded(parts, "text/html") {
        return html_to_text(&html);
    }

    String::new()
}

fn first_decoded(parts: &[MessagePart], mime_type: &str) -> Option<String> {
    parts
        .iter()
        .filter(|p| p.mime_type.eq_ignore_ascii_case(mime_type))
        .find_map(|p| p.data.as_deref().and_then(decode_body))
}

/// Decode a base64url payload, tolerating padded input.
fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(data)
        .or_else(|_| URL_SAFE.decode(data))
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Convert an HTML body to readable plain text.
fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 80)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text.as_bytes())
    }

    fn part(mime_type: &str, data: Option<String>) -> MessagePart {
        MessagePart {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let headers = vec![MessageHeader {
            name: "subject".to_string(),
            value: "Hi".to_string(),
        }];
        assert_eq!(header_value(&headers, "Subject"), "Hi");
        assert_eq!(header_value(&headers, "From"), "");
    }

    #[test]
    fn test_prefers_plain_text_over_html() {
        let parts = vec![
            part("text/html", Some(encode("<p>html wins?</p>"))),
            part("text/plain", Some(encode("plain wins"))),
        ];
        assert_eq!(extract_text(&parts), "plain wins");
    }

    #[test]
    fn test_html_fallback_strips_tags() {
        let parts = vec![part(
            "text/html",
            Some(encode("<html><body><p>Unfortunately, we moved on.</p></body></html>")),
        )];
        let text = extract_text(&parts);
        assert!(text.contains("Unfortunately, we moved on."));
        assert!(!text.contains('<'));
    }

    #[test]
    fn test_padded_base64_is_accepted() {
        let padded = URL_SAFE.encode("padded body".as_bytes());
        let parts = vec![part("text/plain", Some(padded))];
        assert_eq!(extract_text(&parts), "padded body");
    }

    #[test]
    fn test_skips_parts_without_data() {
        let parts = vec![
            part("text/plain", None),
            part("text/plain", Some(encode("second part"))),
        ];
        assert_eq!(extract_text(&parts), "second part");
    }

    #[test]
    fn test_no_usable_part_yields_empty_body() {
        let parts = vec![part("application/pdf", Some(encode("%PDF")))];
        assert_eq!(extract_text(&parts), "");
        assert_eq!(extract_text(&[]), "");
    }
}
