//! Shared fixtures: in-memory PDFs and recording stubs for the model and
//! the record store.

#![allow(dead_code)]

use async_trait::async_trait;
use contract_risk::{AnalysisBackend, BackendError, ContractRecord, RecordStore, StoreError};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Ordered log of outbound calls, shared by the stubs of one test.
pub type CallLog = Arc<Mutex<Vec<&'static str>>>;

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Build a PDF with one Courier text line per page.
pub fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Model stub: fails the first `failures` calls, then answers `reply`.
pub struct StubModel {
    pub failures: u32,
    pub reply: String,
    pub calls: AtomicU32,
    pub prompts: Mutex<Vec<String>>,
    log: CallLog,
}

impl StubModel {
    pub fn replying(reply: &str, log: &CallLog) -> Arc<Self> {
        Self::flaky(0, reply, log)
    }

    pub fn flaky(failures: u32, reply: &str, log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            failures,
            reply: reply.to_string(),
            calls: AtomicU32::new(0),
            prompts: Mutex::new(Vec::new()),
            log: Arc::clone(log),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisBackend for StubModel {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        self.log.lock().unwrap().push("model");
        self.prompts.lock().unwrap().push(prompt.to_string());
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(BackendError::Provider(format!("upstream 503 (call {n})")))
        } else {
            Ok(self.reply.clone())
        }
    }
}

/// Store stub: records inserts, or rejects every one when `failing`.
pub struct StubStore {
    pub failing: bool,
    pub records: Mutex<Vec<ContractRecord>>,
    log: CallLog,
}

impl StubStore {
    pub fn accepting(log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            failing: false,
            records: Mutex::new(Vec::new()),
            log: Arc::clone(log),
        })
    }

    pub fn failing(log: &CallLog) -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            records: Mutex::new(Vec::new()),
            log: Arc::clone(log),
        })
    }

    pub fn records(&self) -> Vec<ContractRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for StubStore {
    async fn insert(&self, record: &ContractRecord) -> Result<(), StoreError> {
        self.log.lock().unwrap().push("store");
        if self.failing {
            return Err(StoreError::Rejected {
                status: 503,
                body: "database is read-only".into(),
            });
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Model reply covering all five categories.
pub const FIVE_KEY_REPLY: &str = r#"{
  "auto_renewal": "Renews automatically for 12-month terms unless cancelled 90 days prior.",
  "termination_fees": "Early termination fee of 50% of remaining contract value.",
  "payment_terms": "Net 60.",
  "compliance_gaps": "",
  "exclusivity_clauses": "Customer may not engage competing vendors."
}"#;
