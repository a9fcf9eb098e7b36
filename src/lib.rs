//! # contract-risk
//!
//! Flag risky clauses in vendor contracts with a language model.
//!
//! A client uploads a contract PDF; the service extracts its text, asks the
//! model for red flags in five fixed categories, records the result in
//! Supabase, and returns the flags.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF upload
//!  │
//!  ├─ 0. Validate  .pdf filename, record store configured
//!  ├─ 1. Extract   page text via lopdf (CPU-bound, spawn_blocking)
//!  ├─ 2. Prompt    fixed analysis template, text truncated to the budget
//!  ├─ 3. Analyze   chat completion, up to 3 attempts
//!  ├─ 4. Parse     JSON object → structured flags, else raw-text fallback
//!  ├─ 5. Persist   insert {filename, created_at, raw_text, flags}
//!  └─ 6. Respond   {"flags": ...}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use contract_risk::{AnalyzerConfig, IngestionPipeline, LlmBackend, SupabaseStore};
//! use edgequake_llm::ProviderFactory;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalyzerConfig::builder().model("gpt-4").build()?;
//!     let provider = ProviderFactory::create_llm_provider("openai", "gpt-4")
//!         .map_err(|e| e.to_string())?;
//!     let backend = Arc::new(LlmBackend::new(provider, &config));
//!     let store = Arc::new(SupabaseStore::from_env()?);
//!
//!     let pipeline = IngestionPipeline::new(config, backend, store);
//!     let bytes = std::fs::read("msa.pdf")?;
//!     let submission = pipeline.ingest("msa.pdf", bytes).await?;
//!     println!("{}", serde_json::to_string_pretty(&submission.flags)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `contract-risk` server binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, StoreConfig};
pub use error::{BackendError, ConfigError, IngestError, StoreError};
pub use ingest::{IngestionPipeline, Stage};
pub use output::{AnalysisResponse, ContractRecord, Flags, Submission};
pub use pipeline::analyze::{Analysis, AnalysisBackend, AnalysisClient, LlmBackend};
pub use pipeline::store::{RecordStore, SupabaseStore};
pub use server::{router, serve};
