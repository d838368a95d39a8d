//! Reload source description and host-facing options.

use crate::error::{ReloadError, Result};
use bytes::Bytes;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a reloader gets its data from. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ReloadSource {
    /// Fixed content. Never reloaded, listeners never fire.
    Static(Bytes),

    /// Fetch from `url` and persist to `local_file`, falling back to the
    /// local file when the fetch fails.
    Remote {
        /// Remote endpoint
        url: String,
        /// Local cache file, also the fallback source
        local_file: PathBuf,
        /// Polling interval; zero disables polling
        interval: Duration,
    },

    /// Re-read `local_file` only.
    Local {
        /// File to read
        local_file: PathBuf,
        /// Polling interval; zero disables polling
        interval: Duration,
    },
}

impl ReloadSource {
    /// Polling interval. Static sources never poll.
    pub fn interval(&self) -> Duration {
        match self {
            Self::Static(_) => Duration::ZERO,
            Self::Remote { interval, .. } | Self::Local { interval, .. } => *interval,
        }
    }

    /// The local cache file, if any.
    pub fn local_file(&self) -> Option<&Path> {
        match self {
            Self::Static(_) => None,
            Self::Remote { local_file, .. } | Self::Local { local_file, .. } => Some(local_file),
        }
    }

    /// The remote URL, if any.
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            Self::Remote { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Returns true for [`ReloadSource::Static`].
    pub fn is_static(&self) -> bool {
        matches!(self, Self::Static(_))
    }
}

/// Reloader options as they appear in a host configuration document.
///
/// # Examples
///
/// ```rust
/// use hotswap_reload::core::{ReloadSource, ReloadingOptions};
/// use std::time::Duration;
///
/// let options: ReloadingOptions = serde_json::from_str(
///     r#"{"local_file": "cfg.json", "reloading_duration": 30}"#,
/// ).unwrap();
///
/// let source = options.into_source().unwrap();
/// assert_eq!(source.interval(), Duration::from_secs(30));
/// assert!(matches!(source, ReloadSource::Local { .. }));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReloadingOptions {
    /// Fixed content; bypasses all reloading when non-empty.
    #[serde(default)]
    pub static_data: Option<String>,

    /// Optional remote source.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Local cache file. Required unless `static_data` is set.
    #[serde(default)]
    pub local_file: Option<PathBuf>,

    /// Polling interval, as seconds (`30`, `1.5`) or a humantime string
    /// (`"30s"`, `"1m 30s"`); `0` or absent disables polling.
    #[serde(default, deserialize_with = "duration_secs::deserialize")]
    pub reloading_duration: Duration,

    /// Name of the host's HTTP client component.
    ///
    /// Recorded for hosts that resolve components by name. The live fetcher
    /// is still passed to [`ReloaderBuilder::with_shared_fetcher`](crate::core::ReloaderBuilder::with_shared_fetcher).
    #[serde(default)]
    pub resty: Option<String>,
}

impl ReloadingOptions {
    /// Resolve the options into a [`ReloadSource`].
    ///
    /// Non-empty `static_data` wins over everything else. Otherwise
    /// `local_file` is required, and a non-empty `remote_url` selects
    /// [`ReloadSource::Remote`].
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::InvalidOptions`] if neither `static_data` nor
    /// `local_file` is set.
    pub fn into_source(self) -> Result<ReloadSource> {
        if let Some(data) = self.static_data.filter(|d| !d.is_empty()) {
            return Ok(ReloadSource::Static(Bytes::from(data)));
        }

        let local_file = self
            .local_file
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                ReloadError::InvalidOptions(
                    "local_file is required unless static_data is set".to_string(),
                )
            })?;
        let interval = self.reloading_duration;

        match self.remote_url.filter(|u| !u.is_empty()) {
            Some(url) => Ok(ReloadSource::Remote {
                url,
                local_file,
                interval,
            }),
            None => Ok(ReloadSource::Local {
                local_file,
                interval,
            }),
        }
    }
}

mod duration_secs {
    use serde::de::{self, Deserializer, IntoDeserializer, Visitor, value::StrDeserializer};
    use std::fmt;
    use std::time::Duration;

    struct DurationVisitor;

    impl<'de> Visitor<'de> for DurationVisitor {
        type Value = Duration;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("seconds as a number or a duration string such as \"30s\"")
        }

        fn visit_u64<E: de::Error>(self, secs: u64) -> Result<Duration, E> {
            Ok(Duration::from_secs(secs))
        }

        fn visit_i64<E: de::Error>(self, secs: i64) -> Result<Duration, E> {
            u64::try_from(secs)
                .map(Duration::from_secs)
                .map_err(|_| E::custom(format!("invalid reloading_duration {}: negative", secs)))
        }

        fn visit_f64<E: de::Error>(self, secs: f64) -> Result<Duration, E> {
            Duration::try_from_secs_f64(secs)
                .map_err(|e| E::custom(format!("invalid reloading_duration {}: {}", secs, e)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Duration, E> {
            let de: StrDeserializer<'_, E> = value.into_deserializer();
            humantime_serde::deserialize(de)
        }
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DurationVisitor)
    }
}
