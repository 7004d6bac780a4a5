//! Application state management
//!
//! Thread-safe containers for everything the HTTP handlers share: the
//! published snapshot, the in-memory OAuth tokens, and the collaborator
//! clients. Cloning `AppState` is cheap; all fields are behind `Arc`.

mod snapshot_store;
mod token_store;

pub use snapshot_store::SnapshotStore;
pub use token_store::TokenStore;

use std::sync::Arc;

use crate::adapters::gmail::GmailClient;
use crate::error::Result;
use crate::oauth::OAuthManager;

#[derive(Clone)]
pub struct AppState {
    pub snapshots: Arc<SnapshotStore>,
    pub tokens: Arc<TokenStore>,
    pub oauth: Arc<OAuthManager>,
    pub gmail: Arc<GmailClient>,
}

impl AppState {
    pub fn new() -> Result<Self> {
        Ok(Self {
            snapshots: Arc::new(SnapshotStore::new()),
            tokens: Arc::new(TokenStore::new()),
            oauth: Arc::new(OAuthManager::new()),
            gmail: Arc::new(GmailClient::new()?),
        })
    }
}
