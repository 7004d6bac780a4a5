//! In-memory OAuth token storage.
//!
//! Tokens are process state only; they are gone on restart and the user
//! re-authenticates. Durable token storage is a collaborator concern the
//! core deliberately does not take on.

use std::sync::RwLock;

use crate::oauth::OAuthTokens;

pub struct TokenStore {
    tokens: RwLock<Option<OAuthTokens>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(None),
        }
    }

    pub fn get(&self) -> Option<OAuthTokens> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, tokens: OAuthTokens) {
        let mut guard = self
            .tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(tokens);
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
