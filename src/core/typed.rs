//! Typed configuration on top of a [`Reloader`].

use crate::core::fingerprint::Fingerprint;
use crate::core::{ConfigFormat, Reloader, decode};
use crate::error::{BoxError, ReloadError, Result};
use crate::notify::ListenerId;
use arc_swap::ArcSwapOption;
use bytes::Bytes;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A decoded value and the fingerprint of the data it came from.
struct Cached<T> {
    fingerprint: Option<Fingerprint>,
    value: Arc<T>,
}

/// Removes the cache invalidation listener when the last wrapper clone drops.
struct Invalidation {
    reloader: Reloader,
    id: ListenerId,
}

impl Drop for Invalidation {
    fn drop(&mut self) {
        self.reloader.remove_listener(self.id);
    }
}

/// Typed wrapper options as they appear in a host configuration document.
///
/// The reloader itself is supplied separately to
/// [`TypedReloader::from_options`].
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct TypedReloadingOptions<T> {
    /// Fixed value returned instead of the reloader's data.
    #[serde(default)]
    pub static_config: Option<T>,

    /// Reject fields unknown to `T`.
    #[serde(default)]
    pub struct_mode: bool,

    /// Format used to decode the reloader's data.
    #[serde(default)]
    pub config_type: ConfigFormat,
}

impl<T> Default for TypedReloadingOptions<T> {
    fn default() -> Self {
        Self {
            static_config: None,
            struct_mode: false,
            config_type: ConfigFormat::Auto,
        }
    }
}

/// Lazily decodes a reloader's data into `T` and caches the result.
///
/// The cached value is dropped whenever the reloader reports a change and is
/// also tied to the fingerprint it was decoded from, so `load_config` never
/// returns a value older than the reloader's current data. A static value,
/// when set, always wins.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reload::prelude::*;
/// use serde::Deserialize;
/// use std::time::Duration;
///
/// #[derive(Debug, Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// # async fn example() -> Result<()> {
/// let reloader = Reloader::builder()
///     .with_local_file("config.yaml")
///     .with_interval(Duration::from_secs(10))
///     .build()
///     .await?;
///
/// let config = TypedReloader::<AppConfig>::new(reloader).with_strict(true);
/// println!("port: {}", config.load_config()?.port);
///
/// config.add_listener(|cfg: std::sync::Arc<AppConfig>| {
///     println!("port is now {}", cfg.port);
///     Ok(())
/// });
/// # Ok(())
/// # }
/// ```
pub struct TypedReloader<T> {
    inner: Option<Reloader>,
    static_config: Option<Arc<T>>,
    format: ConfigFormat,
    strict: bool,
    cache: Arc<ArcSwapOption<Cached<T>>>,
    _invalidation: Option<Arc<Invalidation>>,
}

impl<T> TypedReloader<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Wrap `reloader`, decoding with [`ConfigFormat::Auto`] in lenient mode.
    pub fn new(reloader: Reloader) -> Self {
        Self::with_parts(Some(reloader), None)
    }

    /// A wrapper that always returns `value`, with no reloader behind it.
    pub fn from_static(value: T) -> Self {
        Self::with_parts(None, Some(Arc::new(value)))
    }

    /// Build from host options and an optional reloader.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::InvalidOptions`] if there is neither a static
    /// value nor a reloader.
    pub fn from_options(options: TypedReloadingOptions<T>, reloader: Option<Reloader>) -> Result<Self> {
        if options.static_config.is_none() && reloader.is_none() {
            return Err(ReloadError::InvalidOptions(
                "either static_config or a reloader is required".to_string(),
            ));
        }

        Ok(Self::with_parts(reloader, options.static_config.map(Arc::new))
            .with_format(options.config_type)
            .with_strict(options.struct_mode))
    }

    fn with_parts(inner: Option<Reloader>, static_config: Option<Arc<T>>) -> Self {
        let cache: Arc<ArcSwapOption<Cached<T>>> = Arc::new(ArcSwapOption::empty());

        let invalidation = inner.as_ref().map(|reloader| {
            let cache = Arc::clone(&cache);
            let id = reloader.add_listener(move |_: &Bytes| {
                cache.store(None);
                Ok(())
            });
            Arc::new(Invalidation {
                reloader: reloader.clone(),
                id,
            })
        });

        Self {
            inner,
            static_config,
            format: ConfigFormat::Auto,
            strict: false,
            cache,
            _invalidation: invalidation,
        }
    }

    /// Set the decoding format.
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = format;
        self.cache.store(None);
        self
    }

    /// Reject fields unknown to `T` when set.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self.cache.store(None);
        self
    }

    /// Always return `value` instead of decoding the reloader's data.
    pub fn with_static_config(mut self, value: T) -> Self {
        self.static_config = Some(Arc::new(value));
        self
    }

    /// The current configuration.
    ///
    /// Returns the static value if set, otherwise the cached value if it was
    /// decoded from the reloader's current data, otherwise decodes and caches.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Decode`] if the current data cannot be decoded,
    /// or [`ReloadError::InvalidOptions`] if there is nothing to load from.
    pub fn load_config(&self) -> Result<Arc<T>> {
        if let Some(value) = &self.static_config {
            return Ok(Arc::clone(value));
        }

        let reloader = self.inner.as_ref().ok_or_else(|| {
            ReloadError::InvalidOptions("no static config and no reloader".to_string())
        })?;
        let snapshot = reloader.snapshot();

        let cached = self.cache.load();
        if let Some(cached) = &*cached {
            if cached.fingerprint == snapshot.fingerprint {
                return Ok(Arc::clone(&cached.value));
            }
        }

        let value = Arc::new(decode::<T>(&snapshot.data, self.format, self.strict)?);
        self.cache.store(Some(Arc::new(Cached {
            fingerprint: snapshot.fingerprint,
            value: Arc::clone(&value),
        })));
        Ok(value)
    }

    /// Register a typed change listener.
    ///
    /// On every change the new data is decoded and passed to `callback`. A
    /// decode failure aborts the fan-out like any listener error, so the
    /// undecodable data is not committed. Returns `None` when there is no
    /// reloader to listen to.
    pub fn add_listener<F>(&self, callback: F) -> Option<ListenerId>
    where
        F: Fn(Arc<T>) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        let reloader = self.inner.as_ref()?;
        let cache = Arc::clone(&self.cache);
        let format = self.format;
        let strict = self.strict;

        Some(reloader.add_listener(move |data: &Bytes| {
            cache.store(None);
            let value = Arc::new(decode::<T>(data, format, strict)?);
            cache.store(Some(Arc::new(Cached {
                fingerprint: Some(Fingerprint::of(data)),
                value: Arc::clone(&value),
            })));
            callback(value)
        }))
    }

    /// Remove a listener. Unknown handles are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        if let Some(reloader) = &self.inner {
            reloader.remove_listener(id);
        }
    }

    /// The underlying reloader, if any.
    pub fn reloader(&self) -> Option<&Reloader> {
        self.inner.as_ref()
    }

    /// Close the underlying reloader.
    pub fn close(&self) -> Result<()> {
        match &self.inner {
            Some(reloader) => reloader.close(),
            None => Ok(()),
        }
    }
}

impl<T> Clone for TypedReloader<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            static_config: self.static_config.clone(),
            format: self.format,
            strict: self.strict,
            cache: Arc::clone(&self.cache),
            _invalidation: self._invalidation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TestConfig {
        value: i32,
    }

    #[test]
    fn test_static_only() {
        let config = TypedReloader::from_static(TestConfig { value: 7 });
        assert_eq!(config.load_config().unwrap().value, 7);
        assert!(config.add_listener(|_| Ok(())).is_none());
        config.close().unwrap();
    }

    #[test]
    fn test_options_require_a_source() {
        let result = TypedReloader::<TestConfig>::from_options(TypedReloadingOptions::default(), None);
        assert!(matches!(result, Err(ReloadError::InvalidOptions(_))));
    }

    #[test]
    fn test_options_from_yaml() {
        let options: TypedReloadingOptions<TestConfig> =
            serde_yaml::from_str("static_config:\n  value: 3\nstruct_mode: true\nconfig_type: json\n")
                .unwrap();
        assert_eq!(options.config_type, ConfigFormat::Json);
        assert!(options.struct_mode);

        let config = TypedReloader::from_options(options, None).unwrap();
        assert_eq!(config.load_config().unwrap().value, 3);
    }

    #[tokio::test]
    async fn test_cache_hit_returns_same_value() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.json");
        fs::write(&path, r#"{"value": 1}"#).unwrap();

        let reloader = Reloader::builder().with_local_file(&path).build().await.unwrap();
        let config = TypedReloader::<TestConfig>::new(reloader);

        let first = config.load_config().unwrap();
        let second = config.load_config().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_change_invalidates_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.json");
        fs::write(&path, r#"{"value": 1}"#).unwrap();

        let reloader = Reloader::builder().with_local_file(&path).build().await.unwrap();
        let config = TypedReloader::<TestConfig>::new(reloader.clone());
        assert_eq!(config.load_config().unwrap().value, 1);

        fs::write(&path, r#"{"value": 2}"#).unwrap();
        assert!(reloader.reload().await.unwrap());
        assert_eq!(config.load_config().unwrap().value, 2);
    }

    #[tokio::test]
    async fn test_static_config_overrides_reloader() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cfg.json");
        fs::write(&path, r#"{"value": 1}"#).unwrap();

        let reloader = Reloader::builder().with_local_file(&path).build().await.unwrap();
        let config = TypedReloader::new(reloader.clone()).with_static_config(TestConfig { value: 99 });

        fs::write(&path, r#"{"value": 2}"#).unwrap();
        reloader.reload().await.unwrap();
        assert_eq!(config.load_config().unwrap().value, 99);
    }
}
