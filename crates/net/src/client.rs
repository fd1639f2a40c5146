//! HTTP client with connection pooling and retry logic

use cmirror_config::NetworkConfig;
use cmirror_errors::{Error, NetworkError};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tokio::time::error::Elapsed;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    /// Longest wait for the response headers of one attempt
    ///
    /// The body has no overall deadline; a transfer only fails when a
    /// single chunk takes longer than `chunk_timeout`.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest accepted pause between two body chunks
    pub chunk_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self::from(&NetworkConfig::default())
    }
}

impl From<&NetworkConfig> for NetConfig {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout),
            connect_timeout: Duration::from_secs(config.connect_timeout),
            chunk_timeout: Duration::from_secs(config.chunk_timeout),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            retry_count: config.retries,
            retry_delay: Duration::from_secs(config.retry_delay),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct NetClient {
    client: Client,
    config: NetConfig,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| NetworkError::ConnectionRefused(e.to_string()))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Execute a GET request, retrying transport failures
    ///
    /// Any HTTP status is returned as a response; callers decide what a
    /// non-success status means.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails after all retry attempts, or
    /// the server asks the client to back off.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        self.retry_request(url, || {
            tokio::time::timeout(self.config.timeout, self.client.get(url).send())
        })
        .await
    }

    /// Execute a request with retries
    async fn retry_request<F, Fut>(&self, url: &str, mut f: F) -> Result<Response, Error>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Result<Response, reqwest::Error>, Elapsed>>,
    {
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay * attempt).await;
            }

            match f().await {
                Err(_) => {
                    if attempt >= self.config.retry_count {
                        return Err(NetworkError::Timeout {
                            url: url.to_string(),
                        }
                        .into());
                    }
                }
                Ok(Ok(response)) => {
                    if response.status() == StatusCode::TOO_MANY_REQUESTS {
                        if let Some(retry_after) = response
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|s| s.parse::<u64>().ok())
                        {
                            return Err(NetworkError::RateLimited {
                                seconds: retry_after,
                            }
                            .into());
                        }
                    }

                    return Ok(response);
                }
                Ok(Err(e)) => {
                    if attempt >= self.config.retry_count || !Self::should_retry(&e) {
                        return Err(Self::classify(url, &e).into());
                    }
                }
            }

            attempt += 1;
        }
    }

    /// Map a transport error onto the network error taxonomy
    pub(crate) fn classify(url: &str, error: &reqwest::Error) -> NetworkError {
        if error.is_timeout() {
            NetworkError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            NetworkError::ConnectionRefused(error.to_string())
        } else {
            NetworkError::DownloadFailed(error.to_string())
        }
    }

    /// Determine if an error should be retried
    fn should_retry(error: &reqwest::Error) -> bool {
        error.is_timeout()
            || error.is_connect()
            || error.status().is_none_or(|s| s.is_server_error())
    }
}
