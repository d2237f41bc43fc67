//! Session endpoints and authentication middleware

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    http::StatusCode,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use serde_json::json;

use crate::error::{ApiError, Result};
use crate::models::{
    CallbackRequest, OAuthPlatform, OAuthProvider, StartLoginRequest, StartLoginResponse,
};
use crate::AppState;

/// Authenticated session info stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedSession {
    pub token: String,
    pub provider: String,
}

/// Auth middleware - validates the bearer token against the sessions table
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization format".to_string()))?
        .to_string();

    let session = state
        .db
        .get_session(&token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid session token".to_string()))?;

    request.extensions_mut().insert(AuthenticatedSession {
        token: session.token,
        provider: session.provider,
    });

    Ok(next.run(request).await)
}

/// POST /api/v1/auth/login/start
pub async fn start_login(
    Json(payload): Json<StartLoginRequest>,
) -> Result<Json<StartLoginResponse>> {
    let auth_url = build_authorize_url(payload.provider, payload.platform);
    Ok(Json(StartLoginResponse { auth_url }))
}

/// POST /api/v1/auth/callback
pub async fn callback(
    State(state): State<AppState>,
    Json(payload): Json<CallbackRequest>,
) -> Result<Json<serde_json::Value>> {
    if payload.code.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Authorization code must not be empty".to_string(),
        ));
    }

    let session = state.db.create_session(payload.provider).await?;

    tracing::info!(provider = %session.provider, "Minted session token");

    Ok(Json(json!({
        "token": session.token,
        "provider": session.provider,
    })))
}

/// DELETE /api/v1/auth/session
pub async fn revoke(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedSession>,
) -> Result<StatusCode> {
    state.db.delete_session(&auth.token).await?;
    tracing::info!(provider = %auth.provider, "Revoked session token");
    Ok(StatusCode::NO_CONTENT)
}

/// Provider authorize URL for the given platform. Mobile platforms
/// redirect back into the app scheme; web gets a same-origin redirect.
fn build_authorize_url(provider: OAuthProvider, platform: OAuthPlatform) -> String {
    let base = match provider {
        OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
        OAuthProvider::Apple => "https://appleid.apple.com/auth/authorize",
    };

    let redirect_uri = match platform {
        OAuthPlatform::Android | OAuthPlatform::Ios => "studycards://callback",
        OAuthPlatform::Web => "/api/v1/auth/callback",
    };

    format!(
        "{}?response_type=code&redirect_uri={}&state={}",
        base,
        redirect_uri,
        uuid::Uuid::new_v4()
    )
}
