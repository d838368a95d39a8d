//! Data sources for the reloader.
//!
//! A reloader reads its local cache file and, when configured, fetches from a
//! remote endpoint first.

pub(crate) mod local;
mod remote;

pub use remote::{RemoteFetcher, UnavailableFetcher};

#[cfg(feature = "remote")]
pub use remote::{HttpAuth, HttpFetcher, HttpFetcherBuilder};
