//! Ingestion pipeline: one uploaded contract in, one [`Submission`] out.
//!
//! ## State machine
//!
//! ```text
//! Received ─▶ Extracted ─▶ Prompted ─▶ Analyzed ─▶ Parsed ─▶ Persisted ─▶ Completed
//!     │           │            │           │                     │
//!     └───────────┴────────────┴───────────┴─────────────────────┴──▶ Err(IngestError)
//! ```
//!
//! [`Stage`] models the forward path only. A failure is not a stage: it
//! ends the request with the [`IngestError`] variant for its kind, logged
//! together with the last stage reached.
//!
//! Stages run strictly in sequence. Any failure aborts the whole request;
//! nothing is retried at this level (the model stage retries internally) and
//! no partial result is returned or stored. Parsing cannot fail: a reply that
//! is not a JSON object becomes [`Flags::Raw`](crate::output::Flags::Raw).
//!
//! A failed insert fails the request even though the analysis succeeded.
//! Callers never receive an analysis that was not recorded.

use crate::config::AnalyzerConfig;
use crate::error::IngestError;
use crate::output::Submission;
use crate::pipeline::analyze::{AnalysisBackend, AnalysisClient};
use crate::pipeline::store::RecordStore;
use crate::pipeline::{extract, parse};
use crate::prompts::{build_prompt, truncate_chars};
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Accepted upload extension (compared case-sensitively).
pub const PDF_EXTENSION: &str = ".pdf";

/// Progress of one request through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracted,
    Prompted,
    Analyzed,
    Parsed,
    Persisted,
    Completed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Extracted => "extracted",
            Stage::Prompted => "prompted",
            Stage::Analyzed => "analyzed",
            Stage::Parsed => "parsed",
            Stage::Persisted => "persisted",
            Stage::Completed => "completed",
        };
        f.write_str(name)
    }
}

enum StoreSlot {
    Ready(Arc<dyn RecordStore>),
    /// Settings were absent at startup; every request fails fast.
    Missing(Vec<&'static str>),
}

/// Orchestrates extraction, analysis, parsing and persistence.
///
/// Immutable once built and shared across requests behind an `Arc`.
pub struct IngestionPipeline {
    config: AnalyzerConfig,
    analysis: AnalysisClient,
    store: StoreSlot,
}

impl IngestionPipeline {
    /// Build a pipeline with a configured record store.
    pub fn new(
        config: AnalyzerConfig,
        backend: Arc<dyn AnalysisBackend>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            analysis: AnalysisClient::new(backend, &config),
            config,
            store: StoreSlot::Ready(store),
        }
    }

    /// Build a pipeline whose record store could not be configured.
    ///
    /// The service still starts, but every upload is rejected with
    /// [`IngestError::ConfigurationMissing`] naming `missing`.
    pub fn with_missing_store(
        config: AnalyzerConfig,
        backend: Arc<dyn AnalysisBackend>,
        missing: Vec<&'static str>,
    ) -> Self {
        Self {
            analysis: AnalysisClient::new(backend, &config),
            config,
            store: StoreSlot::Missing(missing),
        }
    }

    /// Run one upload through every stage.
    pub async fn ingest(
        &self,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<Submission, IngestError> {
        let start = Instant::now();
        let received_at = Utc::now();
        info!("Received '{}' ({} bytes)", filename, bytes.len());

        // ── Entry validation ─────────────────────────────────────────────
        if !is_pdf_filename(filename) {
            warn!("Rejected '{}': not a {} file", filename, PDF_EXTENSION);
            return Err(IngestError::UnsupportedMediaType {
                filename: filename.to_string(),
            });
        }

        let store = match &self.store {
            StoreSlot::Ready(store) => store,
            StoreSlot::Missing(missing) => {
                let e = IngestError::ConfigurationMissing {
                    missing: missing.clone(),
                };
                return Err(fail(filename, Stage::Received, e));
            }
        };

        // ── Step 1: Extract text ─────────────────────────────────────────
        let text = extract::extract_text(bytes)
            .await
            .map_err(|e| fail(filename, Stage::Received, e))?;
        advance(filename, Stage::Extracted);
        debug!("'{}': {} chars extracted", filename, text.chars().count());

        // ── Step 2: Build prompt ─────────────────────────────────────────
        let prompt = build_prompt(&text, self.config.prompt_budget);
        advance(filename, Stage::Prompted);

        // ── Step 3: Call the model ───────────────────────────────────────
        let analysis = self
            .analysis
            .analyze(&prompt)
            .await
            .map_err(|e| fail(filename, Stage::Prompted, e))?;
        advance(filename, Stage::Analyzed);

        // ── Step 4: Parse the reply ──────────────────────────────────────
        let flags = parse::parse_flags(&analysis.content);
        if flags.is_degraded() {
            warn!("'{}': returning degraded (raw text) flags", filename);
        }
        advance(filename, Stage::Parsed);

        let submission = Submission {
            filename: filename.to_string(),
            received_at,
            raw_text: truncate_chars(&text, self.config.raw_text_limit).to_string(),
            flags,
        };

        // ── Step 5: Persist ──────────────────────────────────────────────
        store
            .insert(&submission.to_record())
            .await
            .map_err(|source| {
                fail(
                    filename,
                    Stage::Parsed,
                    IngestError::PersistenceFailed { source },
                )
            })?;
        advance(filename, Stage::Persisted);

        info!(
            "'{}' {} in {}ms ({} model attempt(s))",
            filename,
            Stage::Completed,
            start.elapsed().as_millis(),
            analysis.attempts
        );
        Ok(submission)
    }
}

/// `true` when `filename` carries the `.pdf` extension.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.ends_with(PDF_EXTENSION)
}

fn advance(filename: &str, to: Stage) {
    debug!("'{}' → {}", filename, to);
}

fn fail(filename: &str, last: Stage, e: IngestError) -> IngestError {
    error!("'{}' failed after stage '{}': {}", filename, last, e);
    e
}
