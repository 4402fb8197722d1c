// src/edgar/client.rs
use crate::utils::error::EdgarError;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

// SEC requires a descriptive User-Agent with contact details; override with EDGAR_USER_AGENT.
pub const DEFAULT_USER_AGENT: &str = "sec_statements research-tool admin@example.com";
// SEC asks for 10 requests/second max.
const DEFAULT_REQUESTS_PER_SECOND: u32 = 10;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Anything that can serve archive documents by URL.
/// The live implementation is [`EdgarClient`]; tests plug in an in-memory archive.
#[async_trait]
pub trait Archive: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, EdgarError>;
}

/// Transport settings for [`EdgarClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub requests_per_second: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
        }
    }
}

/// Rate-limited EDGAR HTTP client. Cheap to clone; clones share the limiter.
#[derive(Clone)]
pub struct EdgarClient {
    http: reqwest::Client,
    limiter: SharedRateLimiter,
    config: ClientConfig,
}

impl EdgarClient {
    pub fn new(config: ClientConfig) -> Result<Self, EdgarError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str()) // Set the required User-Agent
            .timeout(config.timeout)
            .build()?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self { http, limiter, config })
    }

    /// Single GET attempt. Maps the status codes EDGAR actually uses onto [`EdgarError`].
    async fn get_once(&self, url: &str) -> Result<String, EdgarError> {
        self.limiter.until_ready().await;

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/xml,text/html,text/plain,*/*")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} for URL: {}", status, url);
            if status == reqwest::StatusCode::FORBIDDEN {
                tracing::warn!("Received 403 Forbidden - check User-Agent and rate limits.");
                return Err(EdgarError::RateLimited);
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(EdgarError::DocumentNotFound(url.to_string()));
            }
            return Err(EdgarError::Http(status));
        }

        let body = response.text().await?;
        tracing::debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[async_trait]
impl Archive for EdgarClient {
    async fn fetch_text(&self, url: &str) -> Result<String, EdgarError> {
        retry_with_backoff(url, self.config.max_retries, RETRY_BASE_DELAY, || self.get_once(url)).await
    }
}

/// Runs `attempt` until it succeeds, fails with a non-transient error, or `max_retries`
/// retries are used up. Waits `base_delay * 2^n` before retry `n`.
pub async fn retry_with_backoff<T, F, Fut>(
    url: &str,
    max_retries: u32,
    base_delay: Duration,
    mut attempt: F,
) -> Result<T, EdgarError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, EdgarError>>,
{
    let mut retries = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && retries < max_retries => {
                let delay = retry_delay(base_delay, retries);
                tracing::warn!(
                    "Transient failure fetching {} (attempt {}/{}): {}; retrying in {:?}",
                    url,
                    retries + 1,
                    max_retries + 1,
                    e,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                retries += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn retry_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(1u32 << retry.min(6))
}


#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::cell::Cell;

    #[test]
    fn test_retry_delay_grows_and_saturates() {
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 0), Duration::from_millis(500));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 1), Duration::from_millis(1000));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 2), Duration::from_millis(2000));
        assert_eq!(retry_delay(RETRY_BASE_DELAY, 40), retry_delay(RETRY_BASE_DELAY, 6));
    }

    // Replays scripted outcomes in order; the last one repeats.
    fn replay(outcomes: &[Result<&'static str, StatusCode>], call: usize) -> Result<String, EdgarError> {
        match outcomes[call.min(outcomes.len() - 1)] {
            Ok(body) => Ok(body.to_string()),
            Err(StatusCode::FORBIDDEN) => Err(EdgarError::RateLimited),
            Err(StatusCode::NOT_FOUND) => Err(EdgarError::DocumentNotFound("R9.htm".into())),
            Err(status) => Err(EdgarError::Http(status)),
        }
    }

    fn run_scripted(
        max_retries: u32,
        outcomes: &[Result<&'static str, StatusCode>],
    ) -> (Result<String, EdgarError>, usize) {
        let calls = Cell::new(0);
        let result = tokio_test::block_on(retry_with_backoff(
            "https://x.test/R2.htm",
            max_retries,
            Duration::ZERO,
            || {
                let call = calls.get();
                calls.set(call + 1);
                let outcome = replay(outcomes, call);
                async move { outcome }
            },
        ));
        (result, calls.get())
    }

    #[test]
    fn test_transient_failure_then_success_returns_body() {
        let (result, calls) = run_scripted(
            3,
            &[
                Err(StatusCode::SERVICE_UNAVAILABLE),
                Err(StatusCode::TOO_MANY_REQUESTS),
                Ok("<html>R2</html>"),
            ],
        );
        assert_eq!(result.unwrap(), "<html>R2</html>");
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retries_stop_after_max_retries() {
        let (result, calls) = run_scripted(2, &[Err(StatusCode::BAD_GATEWAY)]);
        assert!(matches!(result, Err(EdgarError::Http(StatusCode::BAD_GATEWAY))));
        assert_eq!(calls, 3);

        let (result, calls) = run_scripted(0, &[Err(StatusCode::BAD_GATEWAY)]);
        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_non_transient_errors_are_not_retried() {
        let (result, calls) = run_scripted(3, &[Err(StatusCode::FORBIDDEN)]);
        assert!(matches!(result, Err(EdgarError::RateLimited)));
        assert_eq!(calls, 1);

        let (result, calls) = run_scripted(3, &[Err(StatusCode::NOT_FOUND)]);
        assert!(matches!(result, Err(EdgarError::DocumentNotFound(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_client_builds_with_zero_rate() {
        let config = ClientConfig { requests_per_second: 0, ..ClientConfig::default() };
        assert!(EdgarClient::new(config).is_ok());
    }
}
