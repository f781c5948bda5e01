//! HTTP gateway for the Aloha Nova platform.
//!
//! This crate provides the public JSON API. It handles:
//!
//! - Token issuance, validation, refresh and revocation
//! - Password login for configured accounts
//! - LLM chat relay with per-user provider keys
//! - Avatars, billing, provider-key settings and admin views
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Clients (HTTP)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       aloha-gateway                          │
//! │  ┌─────────────┐ ┌─────────────┐ ┌─────────────────────┐   │
//! │  │ x-user-email│ │   Router    │ │  ApiError → {error} │   │
//! │  │  Extractors │ │  + Handlers │ │                     │   │
//! │  └─────────────┘ └─────────────┘ └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┼──────────────┐
//!               ▼              ▼              ▼
//!        ┌──────────┐   ┌──────────┐   ┌──────────┐
//!        │ Platform │   │   LLM    │   │  Store   │
//!        │ services │   │  relay   │   │          │
//!        └──────────┘   └──────────┘   └──────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aloha_auth::{AccessPolicy, IssuerConfig, TokenIssuer};
//! use aloha_gateway::{create_router, GatewayConfig, GatewayState};
//! use aloha_llm::{LlmConfig, LlmRouter};
//! use aloha_store::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let policy = Arc::new(AccessPolicy::from_csv("admin@example.com", ""));
//! let issuer = Arc::new(TokenIssuer::new(IssuerConfig::default(), policy)?);
//! let llm = LlmRouter::from_config(&LlmConfig::default())?;
//!
//! let state = GatewayState::new(store, issuer, llm, GatewayConfig::default());
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{AdminUser, CallerEmail, USER_EMAIL_HEADER};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::GatewayState;
