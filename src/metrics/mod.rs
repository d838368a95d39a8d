//! Built-in metrics for refresh operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Refresh attempts/success/failures
//! - Refreshes that changed the content
//! - Refresh duration
//! - Listener failures and registered listeners
//!
//! # Examples
//!
//! ```rust,no_run
//! use hotswap_reload::prelude::*;
//! use hotswap_reload::metrics::ReloadMetrics;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let metrics = ReloadMetrics::new(global::meter("my-app"));
//!
//! let reloader = Reloader::builder()
//!     .with_local_file("config.yaml")
//!     .with_metrics(metrics)
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod reload_metrics;

pub use reload_metrics::ReloadMetrics;
