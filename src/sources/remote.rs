//! Remote HTTP/HTTPS fetch capability.

use crate::error::{ReloadError, Result};
use async_trait::async_trait;
use bytes::Bytes;

/// Capability for fetching raw bytes from a remote URL.
///
/// The reloader only needs "GET url -> bytes". Timeouts, authentication and
/// proxies are the fetcher's business. Implement this trait to plug in a
/// custom transport, or use [`HttpFetcher`] (feature `remote`).
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    /// Fetch the body at `url`.
    ///
    /// # Errors
    ///
    /// Should return [`ReloadError::Fetch`] if the request fails or the
    /// response is not successful.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

#[cfg(feature = "remote")]
pub use http::{HttpAuth, HttpFetcher, HttpFetcherBuilder};

#[cfg(feature = "remote")]
mod http {
    use super::RemoteFetcher;
    use crate::error::{ReloadError, Result};
    use async_trait::async_trait;
    use bytes::Bytes;
    use reqwest::{Client, header::HeaderValue};
    use std::time::Duration;

    #[async_trait]
    impl RemoteFetcher for Client {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            let response = self
                .get(url)
                .send()
                .await
                .map_err(|e| ReloadError::Fetch(format!("HTTP request failed: {}", e)))?;
            read_body(response).await
        }
    }

    async fn read_body(response: reqwest::Response) -> Result<Bytes> {
        let status = response.status();
        if !status.is_success() {
            return Err(ReloadError::Fetch(format!(
                "HTTP request failed with status {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| ReloadError::Fetch(format!("Failed to read response body: {}", e)))
    }

    /// Authentication method for HTTP requests.
    #[derive(Clone)]
    pub enum HttpAuth {
        /// No authentication
        None,
        /// Bearer token authentication
        Bearer(String),
        /// Basic authentication (username, password)
        Basic(String, String),
    }

    /// `reqwest`-backed fetcher with authentication and a request timeout.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use hotswap_reload::sources::HttpFetcher;
    /// use std::time::Duration;
    ///
    /// # fn example() -> hotswap_reload::error::Result<()> {
    /// let fetcher = HttpFetcher::builder()
    ///     .with_auth_token("secret-token")
    ///     .with_timeout(Duration::from_secs(5))
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub struct HttpFetcher {
        client: Client,
        auth: HttpAuth,
    }

    impl HttpFetcher {
        /// Create a new builder for constructing an HTTP fetcher.
        pub fn builder() -> HttpFetcherBuilder {
            HttpFetcherBuilder::new()
        }
    }

    #[async_trait]
    impl RemoteFetcher for HttpFetcher {
        async fn fetch(&self, url: &str) -> Result<Bytes> {
            let mut request = self.client.get(url);

            request = match &self.auth {
                HttpAuth::None => request,
                HttpAuth::Bearer(token) => {
                    let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                        .map_err(|e| ReloadError::Fetch(format!("Invalid bearer token: {}", e)))?;
                    request.header("Authorization", header_value)
                }
                HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
            };

            let response = request
                .send()
                .await
                .map_err(|e| ReloadError::Fetch(format!("HTTP request failed: {}", e)))?;
            read_body(response).await
        }
    }

    /// Builder for constructing an [`HttpFetcher`].
    pub struct HttpFetcherBuilder {
        auth: HttpAuth,
        timeout: Duration,
    }

    impl HttpFetcherBuilder {
        /// Create a new builder with default settings.
        pub fn new() -> Self {
            Self {
                auth: HttpAuth::None,
                timeout: Duration::from_secs(10),
            }
        }

        /// Set Bearer token authentication.
        pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
            self.auth = HttpAuth::Bearer(token.into());
            self
        }

        /// Set Basic authentication.
        pub fn with_basic_auth(
            mut self,
            username: impl Into<String>,
            password: impl Into<String>,
        ) -> Self {
            self.auth = HttpAuth::Basic(username.into(), password.into());
            self
        }

        /// Set the request timeout.
        ///
        /// Default is 10 seconds.
        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        /// Build the HTTP fetcher.
        ///
        /// # Errors
        ///
        /// Returns an error if the HTTP client cannot be constructed.
        pub fn build(self) -> Result<HttpFetcher> {
            let client = Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| ReloadError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

            Ok(HttpFetcher {
                client,
                auth: self.auth,
            })
        }
    }

    impl Default for HttpFetcherBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_builder() {
            let fetcher = HttpFetcher::builder()
                .with_auth_token("token123")
                .with_timeout(Duration::from_secs(5))
                .build();
            assert!(fetcher.is_ok());
        }

        #[test]
        fn test_builder_with_basic_auth() {
            let fetcher = HttpFetcher::builder()
                .with_basic_auth("user", "pass")
                .build()
                .unwrap();
            assert!(matches!(fetcher.auth, HttpAuth::Basic(ref u, _) if u == "user"));
        }

        #[tokio::test]
        async fn test_unreachable_host_is_fetch_error() {
            let fetcher = HttpFetcher::builder()
                .with_timeout(Duration::from_millis(200))
                .build()
                .unwrap();
            let err = fetcher.fetch("http://127.0.0.1:1/config").await.unwrap_err();
            assert!(matches!(err, ReloadError::Fetch(_)));
        }
    }
}

/// A fetcher that always fails. Useful to exercise local fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableFetcher;

#[async_trait]
impl RemoteFetcher for UnavailableFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        Err(ReloadError::Fetch(format!("{} is unavailable", url)))
    }
}
