//! # hotswap-reload
//!
//! Keep a configuration blob fresh by polling a remote endpoint or a local
//! file, and decode it into a typed value only when it actually changes.
//!
//! ## Overview
//!
//! `hotswap-reload` has two layers:
//! - [`Reloader`](core::Reloader) owns the raw bytes. It loads them once at
//!   construction, refreshes them on a fixed interval (remote first, local
//!   cache file as fallback), detects changes by SHA-256 fingerprint and
//!   notifies listeners in registration order before publishing new content.
//! - [`TypedReloader`](core::TypedReloader) decodes those bytes into `T`
//!   (JSON, YAML, or auto-detected), caches the result, and drops the cache
//!   exactly when the raw data changes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hotswap_reload::prelude::*;
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Debug, Deserialize)]
//! struct AppConfig {
//!     server: ServerConfig,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct ServerConfig {
//!     port: u16,
//! }
//!
//! # async fn example() -> hotswap_reload::error::Result<()> {
//! let reloader = Reloader::builder()
//!     .with_local_file("config/app.yaml")
//!     .with_interval(Duration::from_secs(30))
//!     .build()
//!     .await?;
//!
//! let config = TypedReloader::<AppConfig>::new(reloader);
//! let cfg = config.load_config()?;
//! println!("Server port: {}", cfg.server.port);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Lock-free reads**: `load()` never waits for an in-flight refresh
//! - **Remote with fallback**: fetch over HTTP, persist to a local cache file,
//!   fall back to that file when the remote is unavailable
//! - **Change detection**: listeners only run when the content changed
//! - **Commit after acceptance**: a listener error keeps the previous data
//! - **Typed decoding**: JSON/YAML auto-detection and strict field checking
//!
//! ## Feature Flags
//!
//! - `remote` (default): `reqwest`-backed [`HttpFetcher`](sources::HttpFetcher)
//! - `metrics`: OpenTelemetry refresh metrics

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigFormat, Reloader, ReloaderBuilder, TypedReloader};
    pub use crate::error::{BoxError, ReloadError, Result};
    pub use crate::notify::ListenerId;
}
