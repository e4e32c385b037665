//! `folio-server` exposes the Folio chat pipeline over HTTP.
//! Answers stream back as plain text; the session id travels in a header.

pub mod config;
pub mod server;

pub use config::ServerConfig;
pub use server::{ApiError, AppState, SESSION_HEADER, app_router, run_server};
