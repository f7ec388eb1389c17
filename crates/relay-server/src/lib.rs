//! # relay-server
//!
//! Handler-process bootstrap for the relay routing layer.
//!
//! Owns the pieces a handler instance needs to go from zero to serving:
//! configuration with environment overrides, structured-logging
//! initialization, the inbound RPC surface ([`HandlerService`]), per-role
//! gateway clients fed by membership watchers, and the
//! publish-before-serve / withdraw-on-shutdown registration lifecycle.

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod server;
pub mod service;

pub use config::HandlerConfig;
pub use errors::ServerError;
pub use server::HandlerServer;
pub use service::{HandleRequest, HandleResponse, HandlerService};

use tracing_subscriber::EnvFilter;

/// Initialize structured logging.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Safe to call
/// more than once — later calls are no-ops.
pub fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
