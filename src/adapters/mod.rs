//! Clients for external collaborators.

pub mod gmail;

use crate::error::Result;
use crate::types::RawMessage;

/// Narrow contract the refresh pipeline consumes from a mailbox.
///
/// The production implementation is [`gmail::GmailMailbox`]; tests use an
/// in-memory mock.
#[allow(async_fn_in_trait)]
pub trait MailProvider {
    /// List ids of messages newer than `newer_than_days`, most recent
    /// first, bounded by `max_results`.
    async fn list_recent_ids(&self, max_results: u32, newer_than_days: u32)
        -> Result<Vec<String>>;

    /// Fetch one full message by id.
    async fn fetch_message(&self, id: &str) -> Result<RawMessage>;
}
