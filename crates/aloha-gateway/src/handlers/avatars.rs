//! Avatar endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use aloha_store::{Avatar, AvatarCustomization, Store};

use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::GatewayState;

/// Body of `POST /api/avatars/create`.
#[derive(Debug, Default, Deserialize)]
pub struct CreateAvatarBody {
    /// Display name.
    pub name: Option<String>,
    /// Avatar type.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Appearance; omitted fields take defaults.
    pub customization: Option<AvatarCustomization>,
}

/// Response for a created avatar.
#[derive(Debug, Serialize)]
pub struct CreatedAvatar {
    /// Always `true`.
    pub success: bool,
    /// The new avatar.
    pub avatar: Avatar,
}

/// Response for the avatar list.
#[derive(Debug, Serialize)]
pub struct AvatarList {
    /// All avatars.
    pub avatars: Vec<Avatar>,
    /// Number of avatars.
    pub count: usize,
}

/// Create an avatar.
///
/// # Errors
///
/// Returns 400 when the name or type is missing.
pub async fn create_avatar<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    JsonBody(body): JsonBody<CreateAvatarBody>,
) -> Result<impl IntoResponse, ApiError> {
    let avatar = state.avatars.create(
        body.name.as_deref(),
        body.kind.as_deref(),
        body.customization,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedAvatar {
            success: true,
            avatar,
        }),
    ))
}

/// List all avatars.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn list_avatars<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
) -> Result<Json<AvatarList>, ApiError> {
    let avatars = state.avatars.list()?;
    Ok(Json(AvatarList {
        count: avatars.len(),
        avatars,
    }))
}

/// Get one avatar.
///
/// # Errors
///
/// Returns 404 `Avatar not found`.
pub async fn get_avatar<S: Store + 'static>(
    State(state): State<Arc<GatewayState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Avatar>, ApiError> {
    Ok(Json(state.avatars.get(&id)?))
}
