//! Token endpoints: generate, validate, refresh, revoke and login.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use aloha_core::Email;
use aloha_platform::{
    require_email, IssuedTokens, LoginSession, RefreshedSession, ValidatedTokens,
};
use aloha_store::Store;

use super::{DataResponse, MessageResponse};
use crate::auth::CallerEmail;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::GatewayState;

/// Body of `POST /api/auth/tokens/generate`.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateBody {
    /// Identity to issue for.
    pub email: Option<String>,
}

/// `?email=` query.
#[derive(Debug, Default, Deserialize)]
pub struct EmailQuery {
    /// Identity.
    pub email: Option<String>,
}

/// Body of `PUT /api/auth/tokens/refresh`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshBody {
    /// Identity.
    pub email: Option<String>,
    /// Refresh token issued with the bundle.
    pub refresh_token: Option<String>,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginBody {
    /// Identity.
    pub email: Option<String>,
    /// Password.
    pub password: Option<String>,
}

/// Issue a fresh credential bundle.
///
/// # Errors
///
/// Returns 400 `Email is required` without an email.
pub async fn generate<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<GenerateBody>,
) -> Result<Json<DataResponse<IssuedTokens>>, ApiError> {
    let email = require_email(body.email.as_deref())?;
    let tokens = state.tokens.generate(&email)?;
    Ok(Json(DataResponse::ok(tokens)))
}

/// Validate (and possibly refresh) the cached bundle.
///
/// # Errors
///
/// Returns 400 without an email, 401 in strict mode when the cached session
/// token fails verification.
pub async fn validate<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<DataResponse<ValidatedTokens>>, ApiError> {
    let email = require_email(query.email.as_deref())?;
    let validated = state.tokens.validate(&email)?;
    Ok(Json(DataResponse::ok(validated)))
}

/// Exchange a refresh token for a new session token.
///
/// # Errors
///
/// Returns 400 when either field is missing, 401 for a rejected token.
pub async fn refresh<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<RefreshBody>,
) -> Result<Json<DataResponse<RefreshedSession>>, ApiError> {
    let session = state
        .tokens
        .refresh(body.email.as_deref(), body.refresh_token.as_deref())?;
    Ok(Json(DataResponse::ok(session)))
}

/// Drop the cached bundle for the `email` query or the caller header.
///
/// # Errors
///
/// Returns 500 only if the store fails.
pub async fn revoke<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    CallerEmail(caller): CallerEmail,
    Query(query): Query<EmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = query
        .email
        .and_then(|e| Email::parse(e.trim()).ok())
        .or(caller);

    state.tokens.revoke(email.as_ref())?;
    Ok(Json(MessageResponse::ok("Tokens revoked successfully")))
}

/// Check a password and issue a bundle.
///
/// # Errors
///
/// Returns 400 when a field is missing, 401 for bad credentials.
pub async fn login<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<Json<DataResponse<LoginSession>>, ApiError> {
    let email = require_email(body.email.as_deref())?;
    let Some(password) = body.password.filter(|p| !p.is_empty()) else {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    };

    let session = state.tokens.login(&email, &password).await?;
    tracing::info!(email = %email, role = session.role, "Login succeeded");
    Ok(Json(DataResponse::ok(session)))
}
