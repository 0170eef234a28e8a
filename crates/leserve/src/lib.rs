//! leserve - HTTP Server
//!
//! *Le Serve* (The Server) - Axum-based REST API and command line for the
//! LeConseil course recommendation backend

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Command-line interface
pub mod cli;

/// API error types
pub mod error;

/// Request extractors with JSON rejections
pub mod extract;

/// HTTP handlers for REST endpoints
pub mod handlers;

/// Server configuration from TOML and environment
pub mod config;

/// API response bodies
pub mod responses;

/// Server instance management
pub mod server;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use handlers::{create_router, AppState};
pub use server::{build_app, ConseilServer};
