//! # roadlaw-server
//!
//! HTTP front end for the traffic-law assistant.
//!
//! - `POST /api/v0/agent/chat` streams the run as NDJSON
//!   (`{"type": ..., "content": ...}` per line)
//! - `GET /api/health` reports liveness
//!
//! The `roadlaw` binary reads [`ServerConfig`] from the environment, wires the
//! components with [`build_components`] and serves [`app_router`].

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

pub use bootstrap::build_components;
pub use config::{LogFormat, LogSettings, ServerConfig};
pub use error::{ApiError, ConfigError};
pub use server::{AppState, CHAT_PATH, ChatRequest, HEALTH_PATH, app_router, run_server};
pub use telemetry::init_tracing;
