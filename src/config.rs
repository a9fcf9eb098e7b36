//! Configuration types for contract analysis.
//!
//! Two structs cover the two outbound seams:
//!
//! * [`AnalyzerConfig`]: prompt budget, model choice, retry bound. Built via
//!   [`AnalyzerConfigBuilder`] so callers set only what they care about.
//! * [`StoreConfig`]: record-store endpoint and key. Constructed once at
//!   startup, usually from the environment, and handed to
//!   [`crate::pipeline::store::SupabaseStore::new`].
//!
//! Nothing in the request path reads the environment; every value arrives
//! through one of these structs.

use crate::error::{ConfigError, IngestError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroUsize;

/// Environment variable holding the record-store base URL.
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";

/// Environment variable holding the record-store service key.
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_KEY";

/// Default table that receives contract records.
pub const DEFAULT_TABLE: &str = "contracts";

/// Configuration for a contract analysis.
///
/// # Example
/// ```rust
/// use contract_risk::AnalyzerConfig;
///
/// let config = AnalyzerConfig::builder()
///     .model("gpt-4.1-mini")
///     .prompt_budget(4000)
///     .build()
///     .unwrap();
/// assert_eq!(config.prompt_budget.get(), 4000);
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// LLM model identifier, e.g. "gpt-4". If None, the provider default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the provider is auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Sampling temperature. Default: 0.0.
    ///
    /// The model is asked for a fixed JSON shape; any creativity only raises
    /// the chance of a response that degrades to raw text.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// Five short findings rarely exceed 400 tokens.
    pub max_tokens: usize,

    /// Total attempts against the model, first call included. Default: 3.
    pub max_attempts: u32,

    /// Characters of contract text embedded in the prompt. Default: 3500.
    pub prompt_budget: NonZeroUsize,

    /// Characters of contract text kept in the stored record. Default: 5000.
    pub raw_text_limit: usize,

    /// Per-call deadline in seconds. A timed-out call counts as one failed
    /// attempt. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            temperature: 0.0,
            max_tokens: 1024,
            max_attempts: 3,
            prompt_budget: NonZeroUsize::new(3500).expect("non-zero literal"),
            raw_text_limit: 5000,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for AnalyzerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzerConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_attempts", &self.max_attempts)
            .field("prompt_budget", &self.prompt_budget)
            .field("raw_text_limit", &self.raw_text_limit)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl AnalyzerConfig {
    /// Create a new builder for `AnalyzerConfig`.
    pub fn builder() -> AnalyzerConfigBuilder {
        let config = Self::default();
        AnalyzerConfigBuilder {
            prompt_budget: config.prompt_budget.get(),
            config,
        }
    }
}

/// Builder for [`AnalyzerConfig`].
#[derive(Debug)]
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
    prompt_budget: usize,
}

impl AnalyzerConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn prompt_budget(mut self, chars: usize) -> Self {
        self.prompt_budget = chars;
        self
    }

    pub fn raw_text_limit(mut self, chars: usize) -> Self {
        self.config.raw_text_limit = chars;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<AnalyzerConfig, ConfigError> {
        self.config.prompt_budget = NonZeroUsize::new(self.prompt_budget).ok_or_else(|| {
            ConfigError::InvalidConfig("Prompt budget must be ≥ 1 character".into())
        })?;
        if self.config.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "Max attempts must be ≥ 1".into(),
            ));
        }
        if self.config.api_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Connection settings for the record store.
#[derive(Clone)]
pub struct StoreConfig {
    /// Base URL of the Supabase project, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service or anon key sent as `apikey` and bearer token.
    pub key: String,
    /// Target table. Default: `contracts`.
    pub table: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("url", &self.url)
            .field("key", &"<redacted>")
            .field("table", &self.table)
            .finish()
    }
}

impl StoreConfig {
    /// Build from optional values, treating empty strings as absent.
    ///
    /// Fails with [`IngestError::ConfigurationMissing`] naming every absent
    /// setting.
    pub fn new(url: Option<String>, key: Option<String>) -> Result<Self, IngestError> {
        let url = url.filter(|s| !s.trim().is_empty());
        let key = key.filter(|s| !s.trim().is_empty());

        match (url, key) {
            (Some(url), Some(key)) => Ok(Self {
                url: url.trim_end_matches('/').to_string(),
                key,
                table: DEFAULT_TABLE.to_string(),
            }),
            (url, key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SUPABASE_URL_VAR);
                }
                if key.is_none() {
                    missing.push(SUPABASE_KEY_VAR);
                }
                Err(IngestError::ConfigurationMissing { missing })
            }
        }
    }

    /// Read `SUPABASE_URL` and `SUPABASE_KEY` from the environment.
    pub fn from_env() -> Result<Self, IngestError> {
        Self::new(
            std::env::var(SUPABASE_URL_VAR).ok(),
            std::env::var(SUPABASE_KEY_VAR).ok(),
        )
    }

    /// Override the target table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }
}
