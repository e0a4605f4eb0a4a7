//! External Call Policy
//!
//! Every request to the text-generation capability goes through one
//! policy: wait for the rate limiter, bound each attempt with a timeout,
//! retry a fixed number of times, then report `PipelineError::Service`.
//! Call sites decide what to fall back to.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use tracing::{debug, warn};

use super::LLMProvider;
use crate::config::CallConfig;
use crate::error::{PipelineError, PipelineResult};

#[derive(Clone)]
pub struct CallPolicy {
    provider: Arc<dyn LLMProvider>,
    timeout: Duration,
    max_retries: usize,
    backoff: Duration,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl CallPolicy {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &CallConfig) -> Self {
        let limiter = NonZeroU32::new(config.requests_per_minute)
            .map(|rpm| Arc::new(RateLimiter::direct(Quota::per_minute(rpm))));

        Self {
            provider,
            timeout: config.timeout,
            max_retries: config.max_retries,
            backoff: Duration::from_millis(500),
            limiter,
        }
    }

    /// Policy without rate limiting or backoff, for tests and local runs.
    pub fn unthrottled(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(120),
            max_retries: 0,
            backoff: Duration::ZERO,
            limiter: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: usize, backoff: Duration) -> Self {
        self.max_retries = retries;
        self.backoff = backoff;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One logical call; `label` names the call site in logs.
    pub async fn generate(
        &self,
        label: &str,
        system: &str,
        input: &str,
        temperature: f32,
    ) -> PipelineResult<String> {
        let attempts = self.max_retries + 1;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            if let Some(limiter) = &self.limiter {
                limiter.until_ready().await;
            }

            let call = self.provider.generate(system, input, temperature);
            match tokio::time::timeout(self.timeout, call).await {
                Ok(Ok(output)) => {
                    debug!("{}: {} answered on attempt {}", label, self.provider.name(), attempt);
                    return Ok(output);
                }
                Ok(Err(e)) => last_error = e.to_string(),
                Err(_) => last_error = format!("timed out after {:?}", self.timeout),
            }

            warn!("{}: attempt {}/{} failed: {}", label, attempt, attempts, last_error);
            if attempt < attempts && !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff * attempt as u32).await;
            }
        }

        Err(PipelineError::Service(format!("{}: {}", label, last_error)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::test_support::{EchoProvider, FailingProvider, FlakyProvider};

    #[tokio::test]
    async fn test_success_passes_output_through() {
        let policy = CallPolicy::unthrottled(Arc::new(EchoProvider));
        let out = policy.generate("test", "sys", "hello", 0.0).await.unwrap();
        assert_eq!(out, "hello");
    }

    #[tokio::test]
    async fn test_exhausted_retries_become_service_error() {
        let policy = CallPolicy::unthrottled(Arc::new(FailingProvider))
            .with_retries(2, Duration::ZERO);
        let err = policy.generate("tone", "sys", "hello", 0.0).await.unwrap_err();
        assert!(matches!(err, PipelineError::Service(ref m) if m.starts_with("tone")));
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let flaky = Arc::new(FlakyProvider::new(1));
        let policy = CallPolicy::unthrottled(flaky.clone()).with_retries(1, Duration::ZERO);
        let out = policy.generate("merge", "sys", "text", 0.0).await.unwrap();
        assert_eq!(out, "text");
        assert_eq!(flaky.calls(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_a_service_error() {
        struct Slow;
        #[async_trait::async_trait]
        impl LLMProvider for Slow {
            async fn generate(&self, _s: &str, input: &str, _t: f32) -> anyhow::Result<String> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(input.to_string())
            }
        }

        let policy = CallPolicy::unthrottled(Arc::new(Slow)).with_timeout(Duration::from_millis(20));
        let err = policy.generate("audit", "sys", "x", 0.0).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
