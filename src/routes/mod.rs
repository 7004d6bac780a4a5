//! HTTP handlers: thin wrappers over the services and state.
//!
//! Response shapes follow the frontend's existing contract: `/emails`
//! returns the day-bucketed map directly, `/refresh` answers with a
//! `message` or a 500 `error`, and the OAuth callback redirects back to
//! the frontend origin.

use axum::extract::Query;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::{self, AppConfig};
use crate::error::{JobtrailError, Result};
use crate::services::refresh;
use crate::state::AppState;

pub fn router(state: AppState, cfg: &AppConfig) -> Result<Router> {
    let origin = cfg
        .frontend_origin
        .parse::<HeaderValue>()
        .map_err(|e| JobtrailError::Config(format!("invalid frontend origin: {}", e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET])
        .allow_credentials(true);

    Ok(Router::new()
        .route("/health", get(health))
        .route("/auth/google", get(auth_google))
        .route("/auth/google/callback", get(auth_google_callback))
        .route("/emails", get(emails))
        .route("/companies", get(companies))
        .route("/snapshot", get(snapshot))
        .route("/refresh", get(trigger_refresh))
        .layer(Extension(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OAuth routes
// ---------------------------------------------------------------------------

async fn auth_google(Extension(state): Extension<AppState>) -> Response {
    let result = config::get().and_then(|cfg| {
        state
            .oauth
            .start_auth_flow(&cfg.google)
            .map_err(JobtrailError::from)
    });

    match result {
        Ok(url) => Redirect::temporary(&url).into_response(),
        Err(e) => {
            error!("Could not start OAuth flow: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: String,
    state: String,
}

async fn auth_google_callback(
    Extension(state): Extension<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let cfg = match config::get() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Callback error: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
        }
    };

    match state
        .oauth
        .complete_auth_flow(&cfg.google, &params.code, &params.state)
        .await
    {
        Ok(tokens) => {
            state.tokens.set(tokens);

            // Warm the cache right away; a failure here is not an auth
            // failure, the user can hit /refresh again.
            if let Err(e) = refresh::refresh_and_publish(&state).await {
                warn!("Initial refresh after auth failed: {}", e);
            }

            Redirect::temporary(&cfg.frontend_origin).into_response()
        }
        Err(e) => {
            error!("Callback error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Query surface
// ---------------------------------------------------------------------------

async fn emails(Extension(state): Extension<AppState>) -> Response {
    let snapshot = state.snapshots.load();
    Json(snapshot.emails_by_day.clone()).into_response()
}

async fn companies(Extension(state): Extension<AppState>) -> Response {
    let snapshot = state.snapshots.load();
    Json(snapshot.company_stats.clone()).into_response()
}

async fn snapshot(Extension(state): Extension<AppState>) -> Response {
    let snapshot = state.snapshots.load();
    Json((*snapshot).clone()).into_response()
}

async fn trigger_refresh(Extension(state): Extension<AppState>) -> Response {
    match refresh::refresh_and_publish(&state).await {
        Ok(outcome) => Json(json!({
            "message": "Emails refreshed successfully",
            "messages": outcome.message_count,
            "version": outcome.version,
        }))
        .into_response(),
        Err(e) => {
            error!("Refresh failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("Failed to refresh emails: {}", e) })),
            )
                .into_response()
        }
    }
}
