//! Lifecycle stage classification.
//!
//! An ordered cascade of rule groups, first match wins. The order is a
//! behavioral contract because the categories overlap: a LinkedIn-branded
//! rejection must come out as LinkedIn, and a rejection that mentions an
//! interview must come out as Rejection. The fixed priority is
//! LinkedIn, Rejection, Interview, Applied, then Uncategorized as the
//! fallthrough.

use crate::types::Category;

use super::text_normalize::{normalize_all, normalize_subject_body};

/// Which normalized text a rule group matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchScope {
    /// Subject + body + sender, concatenated
    All,
    /// Subject + body only; the sender is reserved for domain checks
    SubjectBody,
}

/// One category's predicate: keywords OR-combined, optionally a sender
/// domain fragment, optionally veto phrases that suppress the group and
/// let the cascade continue.
struct RuleGroup {
    category: Category,
    scope: MatchScope,
    keywords: Vec<String>,
    sender_domains: Vec<String>,
    vetoes: Vec<String>,
}

impl RuleGroup {
    fn matches(&self, text: &str, sender: &str) -> bool {
        let keyword_hit = self.keywords.iter().any(|kw| text.contains(kw.as_str()));
        let domain_hit = self
            .sender_domains
            .iter()
            .any(|fragment| sender_domain(sender).contains(fragment.as_str()));

        if !keyword_hit && !domain_hit {
            return false;
        }

        !self.vetoes.iter().any(|veto| text.contains(veto.as_str()))
    }
}

/// Everything after the last `@` of the sender field, lowercased.
fn sender_domain(sender: &str) -> String {
    sender
        .rsplit_once('@')
        .map(|(_, domain)| domain.to_lowercase())
        .unwrap_or_default()
}

/// Rule-cascade classifier. Pure: category depends only on the three
/// text inputs, so repeated calls always agree.
pub struct StageClassifier {
    rules: Vec<RuleGroup>,
}

impl StageClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Self::build_linkedin_rules(),
                Self::build_rejection_rules(),
                Self::build_interview_rules(),
                Self::build_applied_rules(),
            ],
        }
    }

    /// Assign exactly one category to a message. Never fails; unmatched
    /// input is Uncategorized.
    pub fn classify(&self, subject: &str, body: &str, from: &str) -> Category {
        let all = normalize_all(subject, body, from);
        let subject_body = normalize_subject_body(subject, body);

        for rule in &self.rules {
            let text = match rule.scope {
                MatchScope::All => all.as_str(),
                MatchScope::SubjectBody => subject_body.as_str(),
            };
            if rule.matches(text, from) {
                return rule.category;
            }
        }

        Category::Uncategorized
    }

    // -- Rule tables ---------------------------------------------------------

    fn build_linkedin_rules() -> RuleGroup {
        RuleGroup {
            category: Category::LinkedIn,
            scope: MatchScope::All,
            keywords: [
                "linkedin",
                "applied via linkedin",
                "job alert",
                "job recommendation",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
            sender_domains: vec!["linkedin".to_string()],
            vetoes: Vec::new(),
        }
    }

    fn build_rejection_rules() -> RuleGroup {
        RuleGroup {
            category: Category::Rejection,
            scope: MatchScope::SubjectBody,
            keywords: [
                "we regret",
                "not selected",
                "no longer being considered",
                "after careful consideration",
                "unfortunately",
                "declined",
                "not moving forward",
                "didn't work out",
                "rejected",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
            sender_domains: Vec::new(),
            vetoes: Vec::new(),
        }
    }

    fn build_interview_rules() -> RuleGroup {
        RuleGroup {
            category: Category::Interview,
            scope: MatchScope::SubjectBody,
            keywords: [
                "interview",
                "schedule",
                "assessment",
                "invite",
                "technical screen",
                "calendar link",
                "zoom call",
                "phone screen",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
            sender_domains: Vec::new(),
            // Passive mentions of a possible future interview over-trigger
            // plain substring matching; these suppress the group so the
            // message falls through to Applied or Uncategorized.
            vetoes: [
                "we will contact you to schedule",
                "will reach out to schedule",
                "if you are selected for an interview",
                "should you be selected",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }

    fn build_applied_rules() -> RuleGroup {
        RuleGroup {
            category: Category::Applied,
            scope: MatchScope::SubjectBody,
            keywords: [
                "thank you for applying",
                "application received",
                "application submitted",
                "your application is under review",
                "we have received your application",
            ]
            .into_iter()
            .map(|s| s.to_string())
            .collect(),
            sender_domains: Vec::new(),
            vetoes: Vec::new(),
        }
    }
}

impl Default for StageClassifier {
    fn default() -> Self {
        Self::new()
    }
}
