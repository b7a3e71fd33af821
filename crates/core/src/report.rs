//! Structured output emitted by operations.
//!
//! Operations never log their observational output through a global logger.
//! They receive a [`Reporter`] in their [`ExecContext`](crate::ExecContext)
//! and push [`Record`]s into it, which keeps emitted output capturable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordLevel {
    Info,
    Warn,
}

/// One structured output record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: RecordLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(RecordLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(RecordLevel::Warn, message)
    }

    fn new(level: RecordLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }
}

/// Sink for operation output records.
pub trait Reporter: Send + Sync {
    fn report(&self, record: Record);
}

/// Forwards records to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, record: Record) {
        let fields = serde_json::Value::Object(record.fields.into_iter().collect());
        match record.level {
            RecordLevel::Info => info!(fields = %fields, "{}", record.message),
            RecordLevel::Warn => warn!(fields = %fields, "{}", record.message),
        }
    }
}

/// Keeps every record in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    records: Mutex<Vec<Record>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}
