//! Data structures shared across the pipeline and the HTTP surface.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Job-search lifecycle stage assigned to a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// LinkedIn-originated mail (job alerts, recommendations, notices)
    LinkedIn,
    /// Application acknowledgement
    Applied,
    /// Scheduled or requested interview
    Interview,
    /// Rejection notice
    Rejection,
    /// No rule matched
    Uncategorized,
}

/// A single header as returned by the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

/// One body part of a message. `data` is the provider's base64url payload
/// and is absent for multipart containers without inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    pub mime_type: String,
    pub data: Option<String>,
}

/// A message as fetched from the mail provider, before classification.
/// Owned by one refresh pass and discarded after classification.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: String,
    pub headers: Vec<MessageHeader>,
    pub parts: Vec<MessagePart>,
}

/// The pipeline's output for one message. Immutable once produced; lives
/// only inside the snapshot that was built from its refresh pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedMessage {
    pub subject: String,
    pub from: String,
    /// Original Date header text, kept verbatim.
    pub date: String,
    pub classification: Category,
    pub company: String,
}

/// Applied/Interview tallies for one company. Created lazily on the first
/// qualifying message, so a company never appears with both counts at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub applied: u64,
    pub interviews: u64,
}

/// Calendar-day key -> messages in arrival order.
pub type DayBuckets = IndexMap<String, Vec<ClassifiedMessage>>;

/// Company identifier -> Applied/Interview tallies.
pub type CompanyStats = IndexMap<String, CompanyRecord>;

/// Published result of one successful refresh pass. Replaced wholesale;
/// `version` and `refreshed_at` are stamped by the snapshot store at
/// publish time, so the default value is the "never refreshed" state.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub emails_by_day: DayBuckets,
    pub company_stats: CompanyStats,
    pub message_count: usize,
    pub version: u64,
    pub refreshed_at: Option<DateTime<Utc>>,
}
