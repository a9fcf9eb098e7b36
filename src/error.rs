//! Error types for the contract-risk library.
//!
//! Two distinct error types reflect two distinct failure moments:
//!
//! * [`ConfigError`] (startup): the service cannot be assembled at all
//!   (zero prompt budget, no model provider). Returned from the config
//!   builders and surfaced by the binary before it binds a socket.
//!
//! * [`IngestError`] (per request): one upload could not be analysed.
//!   This is the closed taxonomy every pipeline stage reports through. The
//!   HTTP layer matches on the variant to pick a status code and a detail
//!   message; it never inspects the `Display` text.
//!
//! A model response that does not parse as JSON is *not* an error. It
//! degrades to [`crate::output::Flags::Raw`] and the request still succeeds.
//!
//! [`StoreError`] and [`BackendError`] carry the underlying cause from the
//! two outbound seams (record store, language model) before the pipeline
//! classifies them.

use thiserror::Error;

/// Detail returned to clients for a non-PDF upload.
pub const UNSUPPORTED_MEDIA_DETAIL: &str = "Only PDF files are supported.";

/// Detail returned when the record store is not configured.
pub const CONFIG_MISSING_DETAIL: &str = "Missing SUPABASE_URL or SUPABASE_KEY env vars";

/// Detail returned when the PDF could not be parsed.
pub const EXTRACTION_DETAIL: &str = "Failed to read PDF";

/// Detail returned when the record store rejected the insert.
pub const PERSISTENCE_DETAIL: &str = "Database insert failed";

/// Every way a single ingestion request can fail.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload is not a PDF (decided from the filename alone).
    #[error("Unsupported upload '{filename}': only .pdf files are accepted")]
    UnsupportedMediaType { filename: String },

    /// Record-store settings were absent when the service started.
    #[error("Record store is not configured; missing: {}", missing.join(", "))]
    ConfigurationMissing { missing: Vec<&'static str> },

    /// PDF bytes could not be parsed or their text could not be read.
    #[error("PDF text extraction failed: {detail}")]
    ExtractionFailed { detail: String },

    /// Every attempt against the language model failed.
    #[error("Language model unavailable after {attempts} attempts: {last_error}")]
    AnalysisUnavailable { attempts: u32, last_error: String },

    /// The record store rejected or could not receive the insert.
    #[error("Record store insert failed: {source}")]
    PersistenceFailed {
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// HTTP status code for this failure kind.
    ///
    /// Only the input-defect kind is a 4xx; everything else is a deployment
    /// or upstream problem the client cannot fix by resubmitting.
    pub fn status_code(&self) -> u16 {
        match self {
            IngestError::UnsupportedMediaType { .. } => 400,
            IngestError::ConfigurationMissing { .. }
            | IngestError::ExtractionFailed { .. }
            | IngestError::AnalysisUnavailable { .. }
            | IngestError::PersistenceFailed { .. } => 500,
        }
    }

    /// Human-readable message placed in the response `detail` field.
    pub fn detail(&self) -> String {
        match self {
            IngestError::UnsupportedMediaType { .. } => UNSUPPORTED_MEDIA_DETAIL.to_string(),
            IngestError::ConfigurationMissing { .. } => CONFIG_MISSING_DETAIL.to_string(),
            IngestError::ExtractionFailed { .. } => EXTRACTION_DETAIL.to_string(),
            IngestError::AnalysisUnavailable { attempts, .. } => {
                format!("OpenAI API failed after {attempts} attempts")
            }
            IngestError::PersistenceFailed { .. } => PERSISTENCE_DETAIL.to_string(),
        }
    }
}

/// Startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No language-model provider could be constructed (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },
}

/// Failure reported by a [`crate::pipeline::store::RecordStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the request could not be sent.
    #[error("store request failed: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("store rejected insert with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The record could not be serialised.
    #[error("record serialisation failed: {0}")]
    Serialise(#[from] serde_json::Error),
}

/// Failure reported by a [`crate::pipeline::analyze::AnalysisBackend`].
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Provider call returned an error (transport, auth, 5xx, …).
    #[error("{0}")]
    Provider(String),

    /// The call did not finish within the per-call deadline.
    #[error("call timed out after {secs}s")]
    Timeout { secs: u64 },
}
