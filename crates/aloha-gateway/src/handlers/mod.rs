//! HTTP request handlers.
//!
//! This module contains all the endpoint handlers for the gateway API.

use serde::Serialize;

pub mod admin;
pub mod avatars;
pub mod billing;
pub mod health;
pub mod llm;
pub mod settings;
pub mod tokens;

/// `{success: true, data}` envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    /// Always `true`.
    pub success: bool,
    /// Payload.
    pub data: T,
}

impl<T> DataResponse<T> {
    /// Wrap `data` in a success envelope.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `{success: true, message}` envelope.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Always `true`.
    pub success: bool,
    /// Human readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// A success message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
