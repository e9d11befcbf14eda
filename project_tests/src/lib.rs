//! # Project Test Support
//!
//! Scripted collaborators for exercising `lib_common::core` end to end
//! without a resolver service or a broker:
//!
//! - **`MockResolver`** answers from a table keyed by reference and records
//!   every call; its `ResolverProbe` stays with the test after the resolver
//!   has been moved into the pipeline.
//! - **`MockSink`** records published messages and close calls through a
//!   `SinkProbe`, and can be told to fail or to publish slowly.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use lib_common::core::{BrokerSink, Lookup, Resolver, ResolverConfig, ResolverError, SinkError};
use tempfile::TempDir;

/// A resolver document for entity `entity_id` whose first record is
/// `data_source`/`record_id`.
pub fn entity_document(entity_id: i64, data_source: &str, record_id: &str) -> String {
    serde_json::json!({
        "RESOLVED_ENTITY": {
            "ENTITY_ID": entity_id,
            "LENS_CODE": "DEFAULT",
            "RECORDS": [
                { "DATA_SOURCE": data_source, "RECORD_ID": record_id },
                { "DATA_SOURCE": "OTHER", "RECORD_ID": "ignored" }
            ]
        }
    })
    .to_string()
}

/// The notification expected for `entity_document(entity_id, data_source, record_id)`.
pub fn expected_message(entity_id: i64, data_source: &str, record_id: &str) -> String {
    format!(
        r#"{{"DATA_SOURCE":"{}","RECORD_ID":"{}","AFFECTED_ENTITIES":[{{"ENTITY_ID":{},"LENS_CODE":"DEFAULT"}}]}}"#,
        data_source, record_id, entity_id
    )
}

/// Writes `lines` (joined with `\n`) to `refs.csv` in a fresh temp dir.
/// Keep the `TempDir` alive for as long as the file is needed.
pub fn write_input(lines: &[&str]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("refs.csv");
    let mut file = std::fs::File::create(&path).expect("create input");
    file.write_all(lines.join("\n").as_bytes()).expect("write input");
    (dir, path)
}

/// What a `MockResolver` saw, shared with the test.
#[derive(Clone, Default)]
pub struct ResolverProbe {
    calls: Arc<Mutex<Vec<String>>>,
    inits: Arc<AtomicUsize>,
    cleanups: Arc<AtomicUsize>,
}

impl ResolverProbe {
    /// Lookup keys in call order: `record:DS/ID` or `entity:ID`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("probe lock").clone()
    }

    /// Number of `init` calls.
    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    /// Number of `cleanup` calls.
    pub fn cleanups(&self) -> usize {
        self.cleanups.load(Ordering::SeqCst)
    }
}

/// # Mock Resolver
///
/// Unscripted keys answer `NotFound`.
#[derive(Default)]
pub struct MockResolver {
    answers: HashMap<String, Result<Lookup, ResolverError>>,
    probe: ResolverProbe,
    fail_init: bool,
    initialized: bool,
}

impl MockResolver {
    /// A resolver and the probe observing it.
    pub fn new() -> (Self, ResolverProbe) {
        let resolver = Self::default();
        let probe = resolver.probe.clone();
        (resolver, probe)
    }

    /// Scripts the answer for a record reference.
    pub fn with_record(mut self, data_source: &str, record_id: &str, answer: Result<Lookup, ResolverError>) -> Self {
        self.answers.insert(format!("record:{}/{}", data_source, record_id), answer);
        self
    }

    /// Scripts the answer for an entity reference.
    pub fn with_entity(mut self, entity_id: i64, answer: Result<Lookup, ResolverError>) -> Self {
        self.answers.insert(format!("entity:{}", entity_id), answer);
        self
    }

    /// Makes `init` fail.
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    fn answer(&mut self, key: String) -> Result<Lookup, ResolverError> {
        if !self.initialized {
            return Err(ResolverError::NotInitialized);
        }
        let answer = self
            .answers
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Ok(Lookup::NotFound(format!("{} is unknown", key))));
        self.probe.calls.lock().expect("probe lock").push(key);
        answer
    }
}

#[async_trait]
impl Resolver for MockResolver {
    async fn init(&mut self, _config: &ResolverConfig) -> Result<(), ResolverError> {
        self.probe.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init {
            return Err(ResolverError::Init("engine refused the configuration".into()));
        }
        self.initialized = true;
        Ok(())
    }

    async fn resolve_by_record(&mut self, data_source_code: &str, record_id: &str) -> Result<Lookup, ResolverError> {
        self.answer(format!("record:{}/{}", data_source_code, record_id))
    }

    async fn resolve_by_entity_id(&mut self, entity_id: i64) -> Result<Lookup, ResolverError> {
        self.answer(format!("entity:{}", entity_id))
    }

    async fn cleanup(&mut self) {
        self.initialized = false;
        self.probe.cleanups.fetch_add(1, Ordering::SeqCst);
    }
}

/// What a `MockSink` saw, shared with the test.
#[derive(Clone, Default)]
pub struct SinkProbe {
    published: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl SinkProbe {
    /// Messages accepted so far, in order.
    pub fn published(&self) -> Vec<String> {
        self.published.lock().expect("probe lock").clone()
    }

    /// Number of messages accepted so far.
    pub fn published_count(&self) -> usize {
        self.published.lock().expect("probe lock").len()
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

/// # Mock Sink
#[derive(Default)]
pub struct MockSink {
    probe: SinkProbe,
    fail_on: Option<usize>,
    publish_delay: Option<Duration>,
    destination: Option<String>,
}

impl MockSink {
    /// A sink with its destination already declared, and its probe.
    pub fn new() -> (Self, SinkProbe) {
        let sink = Self { destination: Some("test-queue".into()), ..Self::default() };
        let probe = sink.probe.clone();
        (sink, probe)
    }

    /// Rejects the publish of the message at zero-based position `index`.
    pub fn failing_on(mut self, index: usize) -> Self {
        self.fail_on = Some(index);
        self
    }

    /// Sleeps before accepting each message.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = Some(delay);
        self
    }
}

#[async_trait]
impl BrokerSink for MockSink {
    async fn ensure_destination(&mut self, name: &str) -> Result<(), SinkError> {
        self.destination = Some(name.to_string());
        Ok(())
    }

    async fn publish(&mut self, message: &str) -> Result<(), SinkError> {
        if self.destination.is_none() {
            return Err(SinkError::NoDestination);
        }
        if let Some(delay) = self.publish_delay {
            tokio::time::sleep(delay).await;
        }
        let mut published = self.probe.published.lock().expect("probe lock");
        if self.fail_on == Some(published.len()) {
            return Err(SinkError::Publish("connection reset by broker".into()));
        }
        published.push(message.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        self.destination = None;
        self.probe.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
