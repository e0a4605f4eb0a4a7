//! Agent Module
//!
//! The external text-generation capability and the policy every call
//! site uses to reach it.

mod policy;
mod provider;

pub use policy::CallPolicy;
pub use provider::{provider_from_config, LLMProvider, OllamaProvider, OpenAICompatibleProvider};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use super::LLMProvider;

    /// Returns its input unchanged.
    pub struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn generate(&self, _system: &str, input: &str, _temperature: f32) -> Result<String> {
            Ok(input.to_string())
        }
    }

    /// Always unreachable.
    pub struct FailingProvider;

    #[async_trait]
    impl LLMProvider for FailingProvider {
        async fn generate(&self, _system: &str, _input: &str, _temperature: f32) -> Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    /// Fails the first `failures` calls, then echoes.
    pub struct FlakyProvider {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyProvider {
        pub fn new(failures: usize) -> Self {
            Self { failures, calls: AtomicUsize::new(0) }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LLMProvider for FlakyProvider {
        async fn generate(&self, _system: &str, input: &str, _temperature: f32) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(anyhow!("503 service unavailable"))
            } else {
                Ok(input.to_string())
            }
        }
    }

    /// Answers every call with the same canned text.
    pub struct FixedProvider(pub String);

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn generate(&self, _system: &str, _input: &str, _temperature: f32) -> Result<String> {
            Ok(self.0.clone())
        }
    }
}
