//! Result types: what one analysed upload produces.
//!
//! [`Flags`] is the only value the HTTP caller sees. [`Submission`] wraps it
//! with the provenance the record store needs; [`ContractRecord`] is the flat
//! row shape written to the store.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Risk flags returned by the model.
///
/// Serialised untagged: `Structured` becomes the object itself, `Raw`
/// becomes `{"raw": "..."}`. Callers that need to know which one they got
/// match on the variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Flags {
    /// The model answered with a JSON object. Keys and values are carried
    /// through verbatim; expected categories may be missing and extra keys
    /// may be present.
    Structured(Map<String, Value>),
    /// The model's answer was not a JSON object. Holds the original text.
    Raw { raw: String },
}

impl Flags {
    /// `true` when the model output could not be interpreted as an object.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Flags::Raw { .. })
    }

    /// Finding for a category, when the output was structured and the value
    /// is a string.
    pub fn finding(&self, category: &str) -> Option<&str> {
        match self {
            Flags::Structured(map) => map.get(category).and_then(Value::as_str),
            Flags::Raw { .. } => None,
        }
    }
}

/// One analysed upload. Built once by the pipeline and never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub filename: String,
    pub received_at: DateTime<Utc>,
    /// Leading slice of the extracted text kept for the record.
    pub raw_text: String,
    pub flags: Flags,
}

impl Submission {
    /// Flat record written to the store.
    pub fn to_record(&self) -> ContractRecord {
        ContractRecord {
            filename: self.filename.clone(),
            created_at: self.received_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            raw_text: self.raw_text.clone(),
            flags: self.flags.clone(),
        }
    }
}

/// Row inserted into the `contracts` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractRecord {
    pub filename: String,
    /// ISO-8601 UTC timestamp.
    pub created_at: String,
    pub raw_text: String,
    pub flags: Flags,
}

/// HTTP success body: `{"flags": ...}`.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub flags: Flags,
}
