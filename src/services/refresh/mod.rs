//! Refresh orchestration.
//!
//! One pass: list recent message ids, fetch each message in list order,
//! run it through the classification pipeline, aggregate once over the
//! whole sequence, and publish. Any provider failure aborts the pass
//! before publish, so the previously published snapshot stays visible.

pub mod helpers;

use std::time::Instant;
use tracing::{debug, info};

use crate::adapters::gmail::GmailMailbox;
use crate::adapters::MailProvider;
use crate::config::{self, GoogleConfig, RefreshConfig};
use crate::error::{JobtrailError, Result};
use crate::oauth;
use crate::services::aggregation;
use crate::state::{AppState, SnapshotStore};
use crate::types::{ClassifiedMessage, RawMessage, Snapshot};

use helpers::body_extraction;
use helpers::company_extraction;
use helpers::stage_classification::StageClassifier;

/// What a successful refresh published.
#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    pub version: u64,
    pub message_count: usize,
}

/// Run a full refresh against the configured Gmail account and publish
/// the result. This is the `GET /refresh` entry point.
pub async fn refresh_and_publish(state: &AppState) -> Result<RefreshOutcome> {
    let cfg = config::get()?;
    let access_token = ensure_access_token(state, &cfg.google).await?;
    let mailbox = GmailMailbox::new(state.gmail.clone(), access_token);

    run_and_publish(&mailbox, &cfg.refresh, &state.snapshots).await
}

/// Run one pass against any provider and publish on success. Split from
/// [`refresh_and_publish`] so the no-partial-publish contract is testable
/// without a live mailbox.
pub async fn run_and_publish<P: MailProvider>(
    provider: &P,
    options: &RefreshConfig,
    store: &SnapshotStore,
) -> Result<RefreshOutcome> {
    let snapshot = run_refresh(provider, options).await?;
    let message_count = snapshot.message_count;
    let version = store.publish(snapshot);

    info!(version, messages = message_count, "Published refreshed snapshot");

    Ok(RefreshOutcome {
        version,
        message_count,
    })
}

/// Fetch and classify every recent message. Fails wholesale on the first
/// provider error; a partial batch is never aggregated.
async fn run_refresh<P: MailProvider>(provider: &P, options: &RefreshConfig) -> Result<Snapshot> {
    let started = Instant::now();

    let ids = provider
        .list_recent_ids(options.max_results, options.newer_than_days)
        .await?;
    debug!(candidates = ids.len(), "Listed recent messages");

    let classifier = StageClassifier::new();
    let mut classified = Vec::with_capacity(ids.len());

    for id in &ids {
        let raw = provider.fetch_message(id).await?;
        classified.push(classify_message(&classifier, &raw));
    }

    let snapshot = aggregation::build_snapshot(classified);

    debug!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Refresh pass complete"
    );

    Ok(snapshot)
}

/// Pipeline for one message: header defaults, body selection, category,
/// company. Pure given the raw message.
fn classify_message(classifier: &StageClassifier, raw: &RawMessage) -> ClassifiedMessage {
    let subject = body_extraction::header_value(&raw.headers, "Subject");
    let from = body_extraction::header_value(&raw.headers, "From");
    let date = body_extraction::header_value(&raw.headers, "Date");
    let body = body_extraction::extract_text(&raw.parts);

    let classification = classifier.classify(subject, &body, from);
    let company = company_extraction::extract_company(from);

    ClassifiedMessage {
        subject: subject.to_string(),
        from: from.to_string(),
        date: date.to_string(),
        classification,
        company,
    }
}

/// Resolve a usable access token, refreshing through OAuth when the
/// current one is expired or close to it.
async fn ensure_access_token(state: &AppState, google: &GoogleConfig) -> Result<String> {
    let tokens = state.tokens.get().ok_or(JobtrailError::NotAuthenticated)?;

    if !oauth::should_refresh(&tokens) {
        return Ok(tokens.access_token);
    }

    let refresh_token = tokens.refresh_token.ok_or_else(|| {
        JobtrailError::Auth("access token expired and no refresh token was granted".to_string())
    })?;

    let renewed = state.oauth.refresh_tokens(google, &refresh_token).await?;
    let access_token = renewed.access_token.clone();
    state.tokens.set(renewed);

    Ok(access_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, MessageHeader, MessagePart};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    struct MockProvider {
        messages: Vec<RawMessage>,
        fail_on_fetch: Option<usize>,
    }

    impl MailProvider for MockProvider {
        async fn list_recent_ids(
            &self,
            max_results: u32,
            _newer_than_days: u32,
        ) -> Result<Vec<String>> {
            Ok(self
                .messages
                .iter()
                .take(max_results as usize)
                .map(|m| m.id.clone())
                .collect())
        }

        async fn fetch_message(&self, id: &str) -> Result<RawMessage> {
            let index = self
                .messages
                .iter()
                .position(|m| m.id == id)
                .expect("unknown id");
            if self.fail_on_fetch == Some(index) {
                return Err(JobtrailError::Provider("quota exceeded".to_string()));
            }
            Ok(self.messages[index].clone())
        }
    }

    fn raw(id: &str, subject: &str, from: &str, date: &str, body: &str) -> RawMessage {
        let headers = vec![
            MessageHeader {
                name: "Subject".to_string(),
                value: subject.to_string(),
            },
            MessageHeader {
                name: "From".to_string(),
                value: from.to_string(),
            },
            MessageHeader {
                name: "Date".to_string(),
                value: date.to_string(),
            },
        ];
        let parts = if body.is_empty() {
            Vec::new()
        } else {
            vec![MessagePart {
                mime_type: "text/plain".to_string(),
                data: Some(URL_SAFE_NO_PAD.encode(body.as_bytes())),
            }]
        };
        RawMessage {
            id: id.to_string(),
            headers,
            parts,
        }
    }

    fn sample_messages() -> Vec<RawMessage> {
        vec![
            raw(
                "1",
                "Thank you for applying to Acme",
                "jobs@acme.com",
                "Tue, 5 Aug 2025 08:00:00 +0000",
                "",
            ),
            raw(
                "2",
                "Your interview is scheduled",
                "hr@techco.io",
                "Tue, 5 Aug 2025 09:00:00 +0000",
                "Please select a time slot",
            ),
            raw(
                "3",
                "Update on your application",
                "talent@bigco.com",
                "Wed, 6 Aug 2025 10:00:00 +0000",
                "Unfortunately, we have decided not to move forward.",
            ),
        ]
    }

    fn options() -> RefreshConfig {
        RefreshConfig {
            max_results: 100,
            newer_than_days: 5,
        }
    }

    #[tokio::test]
    async fn test_full_pass_classifies_and_aggregates() {
        let provider = MockProvider {
            messages: sample_messages(),
            fail_on_fetch: None,
        };

        let snapshot = run_refresh(&provider, &options()).await.unwrap();
        assert_eq!(snapshot.message_count, 3);

        let tuesday = &snapshot.emails_by_day["Tuesday, Aug 5, 2025"];
        assert_eq!(tuesday.len(), 2);
        assert_eq!(tuesday[0].classification, Category::Applied);
        assert_eq!(tuesday[0].company, "acme");
        assert_eq!(tuesday[1].classification, Category::Interview);

        let wednesday = &snapshot.emails_by_day["Wednesday, Aug 6, 2025"];
        assert_eq!(wednesday[0].classification, Category::Rejection);

        assert_eq!(snapshot.company_stats["acme"].applied, 1);
        assert_eq!(snapshot.company_stats["techco"].interviews, 1);
        assert!(!snapshot.company_stats.contains_key("bigco"));
    }

    #[tokio::test]
    async fn test_list_bound_is_respected() {
        let provider = MockProvider {
            messages: sample_messages(),
            fail_on_fetch: None,
        };
        let options = RefreshConfig {
            max_results: 1,
            newer_than_days: 5,
        };

        let snapshot = run_refresh(&provider, &options).await.unwrap();
        assert_eq!(snapshot.message_count, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_aborts_pass() {
        let provider = MockProvider {
            messages: sample_messages(),
            fail_on_fetch: Some(1),
        };

        let result = run_refresh(&provider, &options()).await;
        assert!(matches!(result, Err(JobtrailError::Provider(_))));
    }

    #[tokio::test]
    async fn test_failed_pass_keeps_prior_snapshot() {
        let store = SnapshotStore::new();

        let good = MockProvider {
            messages: sample_messages(),
            fail_on_fetch: None,
        };
        run_and_publish(&good, &options(), &store).await.unwrap();
        let before = store.load();
        assert_eq!(before.version, 1);
        assert_eq!(before.message_count, 3);

        // Second pass dies after one successful fetch; nothing publishes.
        let failing = MockProvider {
            messages: sample_messages(),
            fail_on_fetch: Some(2),
        };
        let result = run_and_publish(&failing, &options(), &store).await;
        assert!(result.is_err());

        let after = store.load();
        assert_eq!(after.version, 1);
        assert_eq!(after.message_count, 3);
        assert_eq!(after.refreshed_at, before.refreshed_at);
    }

    #[tokio::test]
    async fn test_missing_headers_default_to_empty() {
        let provider = MockProvider {
            messages: vec![RawMessage {
                id: "bare".to_string(),
                headers: Vec::new(),
                parts: Vec::new(),
            }],
            fail_on_fetch: None,
        };

        let snapshot = run_refresh(&provider, &options()).await.unwrap();
        let bucket = &snapshot.emails_by_day[aggregation::INVALID_DAY_KEY];
        assert_eq!(bucket[0].classification, Category::Uncategorized);
        assert_eq!(bucket[0].company, "Unknown");
        assert_eq!(bucket[0].subject, "");
    }
}
