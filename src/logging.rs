//! Structured logging (C11, ambient): `tracing` wiring driven by `APP_ENV`.
//!
//! Grounded in `server/internal/logger/logger.go`'s env-switched level
//! (debug for local/dev, info for prod), expressed with
//! `tracing-subscriber`'s `EnvFilter` instead of hand-rolling a level
//! switch over a custom logger interface.

use crate::config::Env;
use tracing_subscriber::EnvFilter;

pub fn init(env: Env) {
    let default_level = match env {
        Env::Local | Env::Dev => "debug",
        Env::Prod => "info",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ephemeral_chat={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
