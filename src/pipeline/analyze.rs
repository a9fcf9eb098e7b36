//! Language-model interaction: send the prompt, get raw text back.
//!
//! This stage does not look at what the model said. Interpreting the text is
//! [`super::parse`]'s job; all prompt wording lives in [`crate::prompts`].
//!
//! ## Retry Strategy
//!
//! Up to `max_attempts` sequential calls (default 3), retried immediately.
//! Each call runs under its own `api_timeout_secs` deadline and a timeout
//! counts as one failed attempt, so the worst-case latency of a request is
//! bounded by `max_attempts × api_timeout_secs`.

use crate::config::AnalyzerConfig;
use crate::error::{BackendError, ConfigError, IngestError};
use crate::pipeline::retry::retry_bounded;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

/// Model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Something that can turn a prompt into a chat completion.
///
/// Implemented by [`LlmBackend`] for real providers; tests supply stubs.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Send `prompt` as a single user message and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String, BackendError>;
}

/// [`AnalysisBackend`] over an `edgequake-llm` provider.
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnalyzerConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

#[async_trait]
impl AnalysisBackend for LlmBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| BackendError::Provider(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 2. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    both non-empty.
/// 3. **OpenAI** whenever `OPENAI_API_KEY` is set.
/// 4. **Full auto-detection** via `ProviderFactory::from_env`.
///
/// Called once at startup; a failure here stops the service.
pub fn resolve_provider(config: &AnalyzerConfig) -> Result<Arc<dyn LLMProvider>, ConfigError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ConfigError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, ConfigError> {
    info!("Using LLM provider '{}' with model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ConfigError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Build `CompletionOptions` from the analyzer config.
fn build_options(config: &AnalyzerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Raw model output plus how many attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub content: String,
    pub attempts: u32,
}

/// Calls the backend with a bounded retry and a per-call deadline.
#[derive(Clone)]
pub struct AnalysisClient {
    backend: Arc<dyn AnalysisBackend>,
    max_attempts: u32,
    call_timeout: Duration,
}

impl AnalysisClient {
    pub fn new(backend: Arc<dyn AnalysisBackend>, config: &AnalyzerConfig) -> Self {
        Self {
            backend,
            max_attempts: config.max_attempts,
            call_timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Send `prompt` and return the model's raw reply.
    ///
    /// Fails with [`IngestError::AnalysisUnavailable`] once every attempt has
    /// failed.
    pub async fn analyze(&self, prompt: &str) -> Result<Analysis, IngestError> {
        let start = Instant::now();
        let secs = self.call_timeout.as_secs();

        let outcome = retry_bounded(
            self.max_attempts,
            |_attempt| async move {
                match timeout(self.call_timeout, self.backend.complete(prompt)).await {
                    Ok(result) => result,
                    Err(_) => Err(BackendError::Timeout { secs }),
                }
            },
            |attempt, e| {
                warn!(
                    "Model call failed (attempt {}/{}): {}",
                    attempt, self.max_attempts, e
                );
            },
        )
        .await;

        match outcome {
            Ok((content, attempts)) => {
                debug!(
                    "Model replied with {} chars after {} attempt(s) in {:?}",
                    content.len(),
                    attempts,
                    start.elapsed()
                );
                Ok(Analysis { content, attempts })
            }
            Err(exhausted) => {
                error!(
                    "Model unavailable after {} attempts: {}",
                    exhausted.attempts, exhausted.last_error
                );
                Err(IngestError::AnalysisUnavailable {
                    attempts: exhausted.attempts,
                    last_error: exhausted.last_error.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then answers `reply`.
    struct FlakyBackend {
        failures: u32,
        calls: AtomicU32,
        reply: String,
    }

    impl FlakyBackend {
        fn new(failures: u32, reply: &str) -> Arc<Self> {
            Arc::new(Self {
                failures,
                calls: AtomicU32::new(0),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl AnalysisBackend for FlakyBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                Err(BackendError::Provider(format!("HTTP 503 on call {n}")))
            } else {
                Ok(self.reply.clone())
            }
        }
    }

    /// Never answers within any reasonable deadline.
    struct HangingBackend {
        calls: AtomicU32,
    }

    #[async_trait]
    impl AnalysisBackend for HangingBackend {
        async fn complete(&self, _prompt: &str) -> Result<String, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn client(backend: Arc<dyn AnalysisBackend>) -> AnalysisClient {
        AnalysisClient::new(backend, &AnalyzerConfig::default())
    }

    #[tokio::test]
    async fn fewer_failures_than_bound_still_succeed() {
        for failures in 0..3 {
            let backend = FlakyBackend::new(failures, "{}");
            let analysis = client(backend.clone()).analyze("prompt").await.unwrap();
            assert_eq!(analysis.content, "{}");
            assert_eq!(analysis.attempts, failures + 1);
            assert_eq!(backend.calls.load(Ordering::SeqCst), failures + 1);
        }
    }

    #[tokio::test]
    async fn persistent_failure_exhausts_after_three_attempts() {
        let backend = FlakyBackend::new(u32::MAX, "");
        let err = client(backend.clone()).analyze("prompt").await.unwrap_err();
        match err {
            IngestError::AnalysisUnavailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("call 3"), "got: {last_error}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_count_toward_the_bound() {
        let backend = Arc::new(HangingBackend {
            calls: AtomicU32::new(0),
        });
        let err = client(backend.clone()).analyze("prompt").await.unwrap_err();
        match err {
            IngestError::AnalysisUnavailable {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn build_options_defaults() {
        let opts = build_options(&AnalyzerConfig::default());
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
