//! Admin-only endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use aloha_platform::{Analytics, UserList};
use aloha_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::GatewayState;

/// List users.
///
/// # Errors
///
/// Returns 403 for non-admin callers.
pub async fn users<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    AdminUser(admin): AdminUser,
) -> Result<Json<UserList>, ApiError> {
    tracing::debug!(admin = %admin, "Listing users");
    Ok(Json(state.admin.users()?))
}

/// Platform figures.
///
/// # Errors
///
/// Returns 403 for non-admin callers.
pub async fn analytics<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    AdminUser(_): AdminUser,
) -> Result<Json<Analytics>, ApiError> {
    Ok(Json(state.admin.analytics(state.llm.request_count())?))
}
