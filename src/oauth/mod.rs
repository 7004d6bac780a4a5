//! Google OAuth2 flow with PKCE.
//!
//! Builds the authorization URL, exchanges the callback code for tokens,
//! and refreshes expired access tokens. Tokens live in process memory
//! only; persisting them is out of scope for this service.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use oauth2::{
    basic::BasicClient, AuthUrl, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenUrl,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::GoogleConfig;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested from Google: read-only mailbox access plus basic identity.
const GOOGLE_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/gmail.readonly",
    "profile",
    "email",
];

/// Errors that can occur during OAuth operations
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("OAuth configuration error: {0}")]
    Configuration(String),

    #[error("OAuth request failed: {0}")]
    Request(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Invalid state parameter")]
    InvalidState,

    #[error("No pending OAuth flow found")]
    NoPendingFlow,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
}

/// OAuth2 tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    /// Access token for API requests
    pub access_token: String,
    /// Refresh token for obtaining new access tokens
    pub refresh_token: Option<String>,
    /// Token expiration time (Unix timestamp)
    pub expires_at: Option<i64>,
}

/// Pending OAuth flow state
#[derive(Debug)]
struct PendingOAuthFlow {
    pkce_verifier: PkceCodeVerifier,
    csrf_token: String,
}

/// OAuth2 manager for handling authentication flows
pub struct OAuthManager {
    /// Pending OAuth flows keyed by state parameter
    pending_flows: RwLock<HashMap<String, PendingOAuthFlow>>,
}

impl OAuthManager {
    pub fn new() -> Self {
        Self {
            pending_flows: RwLock::new(HashMap::new()),
        }
    }

    /// Start an OAuth2 authorization flow.
    ///
    /// Returns the authorization URL to redirect the user to.
    pub fn start_auth_flow(&self, config: &GoogleConfig) -> Result<String, OAuthError> {
        if config.client_id.is_empty() {
            return Err(OAuthError::Configuration(
                "Google client id is not configured".to_string(),
            ));
        }

        // Generate PKCE challenge
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        // Generate CSRF state token
        let csrf_token = generate_state_token();

        // Build the OAuth2 client
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_auth_uri(
                AuthUrl::new(GOOGLE_AUTH_URL.to_string())
                    .map_err(|e| OAuthError::Configuration(e.to_string()))?,
            )
            .set_token_uri(
                TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
                    .map_err(|e| OAuthError::Configuration(e.to_string()))?,
            )
            .set_redirect_uri(
                RedirectUrl::new(config.redirect_uri.clone())
                    .map_err(|e| OAuthError::Configuration(e.to_string()))?,
            );

        let client = if let Some(secret) = &config.client_secret {
            client.set_client_secret(ClientSecret::new(secret.clone()))
        } else {
            client
        };

        let mut auth_request = client
            .authorize_url(|| CsrfToken::new(csrf_token.clone()))
            .set_pkce_challenge(pkce_challenge);

        for scope in GOOGLE_SCOPES {
            auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
        }

        // Google needs access_type=offline and prompt=consent to issue a
        // refresh token on every grant.
        let auth_url = auth_request
            .add_extra_param("access_type", "offline")
            .add_extra_param("prompt", "consent")
            .url()
            .0
            .to_string();

        self.pending_flows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(
                csrf_token.clone(),
                PendingOAuthFlow {
                    pkce_verifier,
                    csrf_token: csrf_token.clone(),
                },
            );

        info!("Started OAuth flow with state {}", csrf_token);

        Ok(auth_url)
    }

    /// Complete an OAuth2 authorization flow with the authorization code
    pub async fn complete_auth_flow(
        &self,
        config: &GoogleConfig,
        code: &str,
        state: &str,
    ) -> Result<OAuthTokens, OAuthError> {
        // Get and remove pending flow
        let pending = self
            .pending_flows
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(state)
            .ok_or(OAuthError::NoPendingFlow)?;

        // Verify state matches
        if pending.csrf_token != state {
            return Err(OAuthError::InvalidState);
        }

        info!("Completing OAuth flow with state {}", state);

        exchange_code_for_tokens(config, code, &pending.pkce_verifier).await
    }

    /// Refresh an access token using a refresh token
    pub async fn refresh_tokens(
        &self,
        config: &GoogleConfig,
        refresh_token: &str,
    ) -> Result<OAuthTokens, OAuthError> {
        info!("Refreshing OAuth access token");

        refresh_access_token(config, refresh_token).await
    }
}

impl Default for OAuthManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check if tokens need refresh (within 5 minutes of expiry)
pub fn should_refresh(tokens: &OAuthTokens) -> bool {
    if let Some(expires_at) = tokens.expires_at {
        let now = chrono::Utc::now().timestamp();
        // Refresh if less than 5 minutes remaining
        expires_at - now < 300
    } else {
        // No expiry info, assume we should refresh
        true
    }
}

// ============================================================================
// Token exchange
// ============================================================================

/// Exchange authorization code for tokens
async fn exchange_code_for_tokens(
    config: &GoogleConfig,
    code: &str,
    pkce_verifier: &PkceCodeVerifier,
) -> Result<OAuthTokens, OAuthError> {
    let client = reqwest::Client::new();

    let mut params = vec![
        ("grant_type", "authorization_code"),
        ("code", code),
        ("redirect_uri", &config.redirect_uri),
        ("client_id", &config.client_id),
        ("code_verifier", pkce_verifier.secret()),
    ];

    // Add client secret if available (confidential clients)
    let secret_str;
    if let Some(secret) = &config.client_secret {
        secret_str = secret.clone();
        params.push(("client_secret", &secret_str));
    }

    debug!("Exchanging authorization code for tokens");

    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| OAuthError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!("Token exchange failed: {}", error_text);
        return Err(OAuthError::TokenExchange(error_text));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

    let expires_at = token_response
        .expires_in
        .map(|secs| chrono::Utc::now().timestamp() + secs as i64);

    Ok(OAuthTokens {
        access_token: token_response.access_token,
        refresh_token: token_response.refresh_token,
        expires_at,
    })
}

/// Refresh an access token
async fn refresh_access_token(
    config: &GoogleConfig,
    refresh_token: &str,
) -> Result<OAuthTokens, OAuthError> {
    let client = reqwest::Client::new();

    let mut params = vec![
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", &config.client_id),
    ];

    let secret_str;
    if let Some(secret) = &config.client_secret {
        secret_str = secret.clone();
        params.push(("client_secret", &secret_str));
    }

    debug!("Refreshing access token");

    let response = client
        .post(GOOGLE_TOKEN_URL)
        .form(&params)
        .send()
        .await
        .map_err(|e| OAuthError::Request(e.to_string()))?;

    if !response.status().is_success() {
        let error_text = response.text().await.unwrap_or_default();
        warn!("Token refresh failed: {}", error_text);
        return Err(OAuthError::RefreshFailed(error_text));
    }

    let token_response: TokenResponse = response
        .json()
        .await
        .map_err(|e| OAuthError::RefreshFailed(e.to_string()))?;

    let expires_at = token_response
        .expires_in
        .map(|secs| chrono::Utc::now().timestamp() + secs as i64);

    // Google does not return a new refresh token on refresh
    let new_refresh_token = token_response
        .refresh_token
        .unwrap_or_else(|| refresh_token.to_string());

    Ok(OAuthTokens {
        access_token: token_response.access_token,
        refresh_token: Some(new_refresh_token),
        expires_at,
    })
}

// ============================================================================
// Token response parsing
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
}

// ============================================================================
// Helper functions
// ============================================================================

/// Generate a cryptographically secure state token
fn generate_state_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    URL_SAFE_NO_PAD.encode(bytes)
}
