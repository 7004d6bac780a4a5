//! Text normalization for rule matching.
//!
//! Matching is substring based over a single lowercased string, so no
//! punctuation trimming or tokenization happens here. Two shapes exist
//! because some rule groups match the sender text inline while others
//! keep the sender aside for a separate domain check.

/// Lowercased "subject body sender" in that fixed order.
pub fn normalize_all(subject: &str, body: &str, from: &str) -> String {
    format!("{} {} {}", subject, body, from).to_lowercase()
}

/// Lowercased "subject body", sender excluded.
pub fn normalize_subject_body(subject: &str, body: &str) -> String {
    format!("{} {}", subject, body).to_lowercase()
}
