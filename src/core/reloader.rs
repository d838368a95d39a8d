//! The raw-byte reloader.

use crate::core::{ReloadSource, ReloaderBuilder};
use crate::core::fingerprint::{Fingerprint, has_changed};
use crate::error::{BoxError, ReloadError, Result};
use crate::notify::{ListenerId, ListenerRegistry, ReloadListener};
use crate::sources::{RemoteFetcher, local};
use arc_swap::ArcSwap;
use bytes::Bytes;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;
use tracing::instrument::WithSubscriber;

#[cfg(feature = "metrics")]
use crate::metrics::ReloadMetrics;

/// The published content and the fingerprint it was recorded with.
///
/// Stored as a single unit so readers never pair a blob with another
/// blob's fingerprint.
#[derive(Debug)]
pub(crate) struct Snapshot {
    pub(crate) data: Bytes,
    pub(crate) fingerprint: Option<Fingerprint>,
}

pub(crate) struct Shared {
    source: ReloadSource,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    current: ArcSwap<Snapshot>,
    /// Held for a whole refresh attempt, fan-out included.
    refresh_lock: tokio::sync::Mutex<()>,
    listeners: ListenerRegistry,
    cancel: CancellationToken,
    polling: AtomicBool,
    closed: AtomicBool,
    dispatch: Dispatch,
    #[cfg(feature = "metrics")]
    metrics: Option<ReloadMetrics>,
}

/// Keeps a byte blob fresh from a remote endpoint or a local file.
///
/// Construction performs a mandatory first load. When a positive interval is
/// configured a background task refreshes the data on every tick. Each
/// refresh that yields different content runs the registered listeners in
/// registration order and, only if all of them succeed, publishes the new
/// content.
///
/// Cloning a `Reloader` yields another handle to the same instance. The
/// background task stops on [`close`](Reloader::close) or when the last
/// handle is dropped.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_reload::prelude::*;
/// use std::time::Duration;
///
/// # async fn example() -> Result<()> {
/// let reloader = Reloader::builder()
///     .with_local_file("config.json")
///     .with_interval(Duration::from_secs(30))
///     .build()
///     .await?;
///
/// reloader.add_listener(|data: &bytes::Bytes| {
///     println!("config changed: {} bytes", data.len());
///     Ok(())
/// });
///
/// let current = reloader.load();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Reloader {
    shared: Arc<Shared>,
}

/// Everything a reloader needs at construction, assembled by the builder.
pub(crate) struct ReloaderParts {
    pub(crate) source: ReloadSource,
    pub(crate) fetcher: Option<Arc<dyn RemoteFetcher>>,
    pub(crate) dispatch: Dispatch,
    #[cfg(feature = "metrics")]
    pub(crate) metrics: Option<ReloadMetrics>,
}

impl Reloader {
    /// Create a new builder for constructing a reloader.
    pub fn builder() -> ReloaderBuilder {
        ReloaderBuilder::new()
    }

    pub(crate) async fn start(parts: ReloaderParts) -> Result<Self> {
        let ReloaderParts {
            source,
            fetcher,
            dispatch,
            #[cfg(feature = "metrics")]
            metrics,
        } = parts;

        let initial = match &source {
            ReloadSource::Static(data) => Snapshot {
                data: data.clone(),
                fingerprint: Some(Fingerprint::of(data)),
            },
            _ => Snapshot {
                data: Bytes::new(),
                fingerprint: None,
            },
        };

        let shared = Arc::new(Shared {
            source,
            fetcher,
            current: ArcSwap::from_pointee(initial),
            refresh_lock: tokio::sync::Mutex::new(()),
            listeners: ListenerRegistry::new(),
            cancel: CancellationToken::new(),
            polling: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            dispatch,
            #[cfg(feature = "metrics")]
            metrics,
        });

        if shared.source.is_static() {
            return Ok(Self { shared });
        }

        let dispatch = shared.dispatch.clone();
        async {
            tracing::debug!(
                local_file = ?shared.source.local_file(),
                remote_url = ?shared.source.remote_url(),
                "first reload"
            );
            shared.refresh().await.map_err(|e| {
                tracing::error!(error = %e, "first reload failed");
                ReloadError::Construction(Box::new(e))
            })
        }
        .with_subscriber(dispatch)
        .await?;

        let interval = shared.source.interval();
        if !interval.is_zero() {
            spawn_poller(&shared, interval);
        }

        Ok(Self { shared })
    }

    /// The current content. Never blocks on an in-flight refresh.
    ///
    /// For static sources this is always the fixed content.
    pub fn load(&self) -> Bytes {
        self.shared.current.load().data.clone()
    }

    /// Fingerprint of the current content.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.shared.current.load().fingerprint
    }

    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.current.load_full()
    }

    /// The source this reloader was built from.
    pub fn source(&self) -> &ReloadSource {
        &self.shared.source
    }

    /// Register a change listener and return its handle.
    ///
    /// The listener is invoked with the new content on every confirmed
    /// change, in registration order. Registering against a static source
    /// is allowed, but the listener never fires.
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Bytes) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
    {
        self.add_reload_listener(Arc::new(callback))
    }

    /// Register a listener object and return its handle.
    pub fn add_reload_listener(&self, listener: Arc<dyn ReloadListener>) -> ListenerId {
        let id = self.shared.listeners.add_listener(listener);
        self.shared.record_listener_count();
        id
    }

    /// Remove a listener. Unknown handles are ignored.
    pub fn remove_listener(&self, id: ListenerId) {
        self.shared.listeners.remove(id);
        self.shared.record_listener_count();
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Refresh now, through the same path the background task uses.
    ///
    /// Returns `true` if new content was committed. Static sources and
    /// closed reloaders return `Ok(false)` without doing anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the local file cannot be read after the remote
    /// attempt was skipped or failed, or if a listener rejected the change.
    /// In both cases the previous content stays in effect.
    pub async fn reload(&self) -> Result<bool> {
        if self.shared.source.is_static() || self.is_closed() {
            return Ok(false);
        }
        let dispatch = self.shared.dispatch.clone();
        self.shared.refresh().with_subscriber(dispatch).await
    }

    /// Returns true while the background refresh task is running.
    pub fn is_polling(&self) -> bool {
        self.shared.polling.load(Ordering::SeqCst)
    }

    /// Returns true once [`close`](Reloader::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stop background refreshes and drop every listener.
    ///
    /// The background task stops scheduling refreshes; a refresh already in
    /// progress runs to completion and may finish after this returns.
    /// Calling `close` again is a no-op.
    pub fn close(&self) -> Result<()> {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.cancel.cancel();
        self.shared.listeners.clear();
        self.shared.record_listener_count();
        tracing::dispatcher::with_default(&self.shared.dispatch, || {
            tracing::debug!(local_file = ?self.shared.source.local_file(), "reloader closed");
        });
        Ok(())
    }
}

impl std::fmt::Debug for Reloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reloader")
            .field("source", &self.shared.source)
            .field("fingerprint", &self.fingerprint())
            .field("listeners", &self.listener_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Shared {
    /// One refresh attempt: remote first when possible, then the local file.
    async fn refresh(&self) -> Result<bool> {
        let _guard = self.refresh_lock.lock().await;

        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_refresh());

        let result = self.refresh_locked().await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(changed) => metrics.record_refresh_success(timer, *changed),
                Err(e) => {
                    if e.is_listener_error() {
                        metrics.record_listener_failure();
                    }
                    metrics.record_refresh_failure(timer);
                }
            }
            metrics.update_data_age();
        }

        result
    }

    async fn refresh_locked(&self) -> Result<bool> {
        let Some(local_file) = self.source.local_file() else {
            return Ok(false);
        };
        let recorded = self.current.load().fingerprint;

        if let (Some(url), Some(fetcher)) = (self.source.remote_url(), &self.fetcher) {
            match self
                .refresh_remote(url, fetcher.as_ref(), local_file, recorded)
                .await
            {
                Ok(changed) => return Ok(changed),
                Err(e @ ReloadError::Listener { .. }) => {
                    tracing::warn!(remote_url = url, error = %e, "listener rejected remote data");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        remote_url = url,
                        local_file = %local_file.display(),
                        error = %e,
                        "remote reload failed, falling back to local file"
                    );
                }
            }
        }

        self.refresh_local(local_file, recorded).await
    }

    async fn refresh_remote(
        &self,
        url: &str,
        fetcher: &dyn RemoteFetcher,
        local_file: &Path,
        recorded: Option<Fingerprint>,
    ) -> Result<bool> {
        let data = fetcher.fetch(url).await?;
        let fingerprint = Fingerprint::of(&data);
        if !has_changed(recorded.as_ref(), &fingerprint) {
            tracing::trace!(remote_url = url, "remote data unchanged");
            return Ok(false);
        }

        let staged = local::write_temp(local_file, &fingerprint, &data).await?;

        tracing::info!(
            remote_url = url,
            local_file = %local_file.display(),
            old_fingerprint = ?recorded,
            new_fingerprint = ?fingerprint,
            "remote data changed"
        );

        if let Err(e) = self.listeners.notify(&data) {
            local::discard(&staged).await;
            return Err(e);
        }

        if let Err(e) = local::commit(&staged, local_file).await {
            local::discard(&staged).await;
            return Err(e);
        }

        self.publish(data, fingerprint);
        Ok(true)
    }

    async fn refresh_local(&self, local_file: &Path, recorded: Option<Fingerprint>) -> Result<bool> {
        let data = local::read(local_file).await.inspect_err(|e| {
            tracing::warn!(local_file = %local_file.display(), error = %e, "local reload failed");
        })?;

        let fingerprint = Fingerprint::of(&data);
        if !has_changed(recorded.as_ref(), &fingerprint) {
            tracing::trace!(local_file = %local_file.display(), "local file unchanged");
            return Ok(false);
        }

        tracing::info!(
            local_file = %local_file.display(),
            old_fingerprint = ?recorded,
            new_fingerprint = ?fingerprint,
            "local file changed"
        );

        self.listeners.notify(&data).inspect_err(|e| {
            tracing::warn!(local_file = %local_file.display(), error = %e, "listener rejected local data");
        })?;

        self.publish(data, fingerprint);
        Ok(true)
    }

    fn publish(&self, data: Bytes, fingerprint: Fingerprint) {
        self.current.store(Arc::new(Snapshot {
            data,
            fingerprint: Some(fingerprint),
        }));
    }

    fn record_listener_count(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.update_listener_count(self.listeners.len() as i64);
        }
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn the periodic refresh task.
///
/// The task holds only a weak reference, so dropping the last `Reloader`
/// handle ends it.
fn spawn_poller(shared: &Arc<Shared>, period: Duration) {
    let Some(start) = Instant::now().checked_add(period) else {
        tracing::dispatcher::with_default(&shared.dispatch, || {
            tracing::warn!(
                interval = ?period,
                local_file = ?shared.source.local_file(),
                "reloading interval out of range, polling disabled"
            );
        });
        return;
    };

    let weak: Weak<Shared> = Arc::downgrade(shared);
    let cancel = shared.cancel.clone();
    let dispatch = shared.dispatch.clone();
    shared.polling.store(true, Ordering::SeqCst);

    tokio::spawn(
        async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(shared) = weak.upgrade() else { break };
                        if let Err(e) = shared.refresh().await {
                            tracing::error!(
                                local_file = ?shared.source.local_file(),
                                error = %e,
                                "reload failed, keeping previous data"
                            );
                        }
                    }
                }
            }

            if let Some(shared) = weak.upgrade() {
                shared.polling.store(false, Ordering::SeqCst);
            }
            tracing::info!("reloading closed");
        }
        .with_subscriber(dispatch),
    );
}
