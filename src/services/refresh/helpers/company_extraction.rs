//! Company identifier extraction.
//!
//! Best-effort: the first label of the sender's domain is a stable enough
//! key for per-company tallies. Multi-label ESP domains (for example
//! `notifications.greenhouse.io`) deliberately come out as the first
//! label; this is a heuristic, not a directory lookup.

use mailparse::MailAddr;

/// Sentinel for senders no pattern applies to. Capitalized so it can
/// never collide with an extracted label, which is always lowercased.
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Derive a company identifier from a From header, which may be a
/// `"Display Name" <user@domain.tld>` form or a bare address.
pub fn extract_company(from: &str) -> String {
    if let Ok(addrs) = mailparse::addrparse(from) {
        for addr in addrs.iter() {
            match addr {
                MailAddr::Single(info) => {
                    if let Some(label) = domain_label(&info.addr) {
                        return label;
                    }
                }
                MailAddr::Group(group) => {
                    for member in &group.addrs {
                        if let Some(label) = domain_label(&member.addr) {
                            return label;
                        }
                    }
                }
            }
        }
    }

    // Raw-field fallback for values addrparse rejects.
    domain_label(from).unwrap_or_else(|| UNKNOWN_COMPANY.to_string())
}

/// First label after the `@`: alphanumerics, `-` and `_` up to the next
/// dot or delimiter, lowercased.
fn domain_label(field: &str) -> Option<String> {
    let (_, rest) = field.split_once('@')?;
    let label: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if label.is_empty() {
        None
    } else {
        Some(label.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_form() {
        assert_eq!(
            extract_company("\"Acme Recruiting\" <jobs@acme.com>"),
            "acme"
        );
    }

    #[test]
    fn test_bare_address() {
        assert_eq!(extract_company("jobs@acme.com"), "acme");
    }

    #[test]
    fn test_multi_label_domain_takes_first_label() {
        assert_eq!(
            extract_company("no-reply@notifications.greenhouse.io"),
            "notifications"
        );
    }

    #[test]
    fn test_uppercase_is_normalized() {
        assert_eq!(extract_company("HR <Talent@BigCo.COM>"), "bigco");
    }

    #[test]
    fn test_unknown_domain_label() {
        assert_eq!(extract_company("noreply@unknown.xyz"), "unknown");
    }

    #[test]
    fn test_no_address_yields_sentinel() {
        assert_eq!(extract_company("Mailer Daemon"), UNKNOWN_COMPANY);
        assert_eq!(extract_company(""), UNKNOWN_COMPANY);
    }

    #[test]
    fn test_hyphenated_company() {
        assert_eq!(extract_company("careers@big-corp.io"), "big-corp");
    }
}
