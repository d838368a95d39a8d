//! Builder for constructing Reloader instances.

use crate::core::reloader::ReloaderParts;
use crate::core::{ReloadSource, Reloader, ReloadingOptions};
use crate::error::{ReloadError, Result};
use crate::sources::RemoteFetcher;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Dispatch;

#[cfg(feature = "metrics")]
use crate::metrics::ReloadMetrics;

/// Builder for constructing a [`Reloader`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reload::prelude::*;
/// use hotswap_reload::sources::HttpFetcher;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let reloader = Reloader::builder()
///     .with_remote_url("https://config.example.com/app.yaml")
///     .with_local_file("/var/cache/app.yaml")
///     .with_interval(Duration::from_secs(60))
///     .with_fetcher(HttpFetcher::builder().build()?)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ReloaderBuilder {
    static_data: Option<Bytes>,
    remote_url: Option<String>,
    local_file: Option<PathBuf>,
    interval: Duration,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    dispatch: Option<Dispatch>,
    #[cfg(feature = "metrics")]
    metrics: Option<ReloadMetrics>,
}

impl ReloaderBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            static_data: None,
            remote_url: None,
            local_file: None,
            interval: Duration::ZERO,
            fetcher: None,
            dispatch: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Start from host configuration options.
    ///
    /// Fetcher, logger and metrics still have to be supplied through the
    /// builder, since they are live objects rather than configuration.
    pub fn from_options(options: ReloadingOptions) -> Self {
        Self {
            static_data: options.static_data.map(Bytes::from),
            remote_url: options.remote_url,
            local_file: options.local_file,
            interval: options.reloading_duration,
            ..Self::new()
        }
    }

    /// Use fixed content. Bypasses all reloading.
    pub fn with_static_data(mut self, data: impl Into<Bytes>) -> Self {
        self.static_data = Some(data.into());
        self
    }

    /// Set the remote URL to fetch from.
    ///
    /// Only used when a fetcher is also configured.
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }

    /// Set the local cache file.
    pub fn with_local_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    /// Set the polling interval. Zero (the default) disables polling.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the fetcher used for the remote URL.
    pub fn with_fetcher<F: RemoteFetcher + 'static>(self, fetcher: F) -> Self {
        self.with_shared_fetcher(Arc::new(fetcher))
    }

    /// Set a fetcher shared with other components.
    pub fn with_shared_fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Route this reloader's diagnostics to `dispatch`.
    ///
    /// Without it, diagnostics are discarded.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use hotswap_reload::prelude::*;
    ///
    /// # async fn example() -> Result<()> {
    /// let dispatch = tracing::dispatcher::get_default(|d| d.clone());
    /// let reloader = Reloader::builder()
    ///     .with_local_file("config.json")
    ///     .with_dispatch(dispatch)
    ///     .build()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_dispatch(mut self, dispatch: impl Into<Dispatch>) -> Self {
        self.dispatch = Some(dispatch.into());
        self
    }

    /// Record refresh metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ReloadMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    fn source(&self) -> Result<ReloadSource> {
        if let Some(data) = self.static_data.as_ref().filter(|d| !d.is_empty()) {
            return Ok(ReloadSource::Static(data.clone()));
        }

        ReloadingOptions {
            static_data: None,
            remote_url: self.remote_url.clone(),
            local_file: self.local_file.clone(),
            reloading_duration: self.interval,
            resty: None,
        }
        .into_source()
    }

    /// Build the reloader, performing the first load.
    ///
    /// Must be called within a Tokio runtime when polling is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither static data nor a local file is configured
    /// - The first load fails ([`ReloadError::Construction`])
    pub async fn build(self) -> Result<Reloader> {
        let source = self.source()?;
        let dispatch = self.dispatch.unwrap_or_else(Dispatch::none);

        if let ReloadSource::Remote { url, .. } = &source {
            if self.fetcher.is_none() {
                tracing::dispatcher::with_default(&dispatch, || {
                    tracing::warn!(remote_url = %url, "no fetcher configured, using local file only");
                });
            }
        }

        Reloader::start(ReloaderParts {
            source,
            fetcher: self.fetcher,
            dispatch,
            #[cfg(feature = "metrics")]
            metrics: self.metrics,
        })
        .await
    }
}

impl Default for ReloaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert options straight into a builder, for hosts that decode them.
impl From<ReloadingOptions> for ReloaderBuilder {
    fn from(options: ReloadingOptions) -> Self {
        Self::from_options(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_local_source() {
        let source = ReloaderBuilder::new()
            .with_local_file("config.json")
            .with_interval(Duration::from_secs(5))
            .source()
            .unwrap();

        assert_eq!(
            source,
            ReloadSource::Local {
                local_file: PathBuf::from("config.json"),
                interval: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_builder_static_keeps_raw_bytes() {
        let data: &'static [u8] = &[0xff, 0xfe, 0x00];
        let source = ReloaderBuilder::new()
            .with_static_data(data)
            .source()
            .unwrap();
        assert_eq!(source, ReloadSource::Static(Bytes::from_static(data)));
    }

    #[test]
    fn test_builder_requires_local_file() {
        let result = ReloaderBuilder::new()
            .with_remote_url("http://config/app")
            .source();
        assert!(matches!(result, Err(ReloadError::InvalidOptions(_))));
    }

    #[test]
    fn test_from_options() {
        let options: ReloadingOptions = serde_json::from_str(
            r#"{"remote_url": "http://config/app", "local_file": "app.json", "reloading_duration": 2}"#,
        )
        .unwrap();

        let builder = ReloaderBuilder::from(options);
        assert_eq!(builder.interval, Duration::from_secs(2));
        assert_eq!(builder.remote_url.as_deref(), Some("http://config/app"));
    }

    #[tokio::test]
    async fn test_build_fails_without_file() {
        let err = ReloaderBuilder::new()
            .with_local_file("/nonexistent/config.json")
            .build()
            .await
            .unwrap_err();
        assert!(matches!(err, ReloadError::Construction(_)));
    }
}
