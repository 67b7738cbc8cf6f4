//! Structured observability for job execution.
//!
//! Business logic reports what it is doing through a [`JobObserver`]
//! handed in with the job context, never through a logging backend
//! directly. Each report carries the pipeline [`Stage`], a message and a
//! list of key/value pairs.
//!
//! - [`TracingObserver`] forwards reports to `tracing` (the default)
//! - [`RecordingObserver`] keeps them in memory for assertions

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Pipeline stage a report belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preprocess,
    Resolve,
    Compile,
    Select,
    Abi,
    Transaction,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Preprocess => "preprocess",
            Stage::Resolve => "resolve",
            Stage::Compile => "compile",
            Stage::Select => "select",
            Stage::Abi => "abi",
            Stage::Transaction => "transaction",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObsLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Receives stage reports from the job engine.
pub trait JobObserver: Send + Sync {
    fn observe(&self, level: ObsLevel, stage: Stage, message: &str, fields: &[(&str, String)]);

    fn debug(&self, stage: Stage, message: &str, fields: &[(&str, String)]) {
        self.observe(ObsLevel::Debug, stage, message, fields);
    }

    fn info(&self, stage: Stage, message: &str, fields: &[(&str, String)]) {
        self.observe(ObsLevel::Info, stage, message, fields);
    }

    fn warn(&self, stage: Stage, message: &str, fields: &[(&str, String)]) {
        self.observe(ObsLevel::Warn, stage, message, fields);
    }

    fn error(&self, stage: Stage, message: &str, fields: &[(&str, String)]) {
        self.observe(ObsLevel::Error, stage, message, fields);
    }
}

/// Observer that emits every report as a `tracing` event.
///
/// Key/value pairs are rendered into a single `context` field since
/// `tracing` field names must be known at compile time.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl JobObserver for TracingObserver {
    fn observe(&self, level: ObsLevel, stage: Stage, message: &str, fields: &[(&str, String)]) {
        let context = render_fields(fields);
        let stage = stage.as_str();
        match level {
            ObsLevel::Debug => debug!(stage, context = %context, "{}", message),
            ObsLevel::Info => info!(stage, context = %context, "{}", message),
            ObsLevel::Warn => warn!(stage, context = %context, "{}", message),
            ObsLevel::Error => error!(stage, context = %context, "{}", message),
        }
    }
}

fn render_fields(fields: &[(&str, String)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One captured report.
#[derive(Debug, Clone, Serialize)]
pub struct ObsRecord {
    pub level: ObsLevel,
    pub stage: Stage,
    pub message: String,
    pub fields: Vec<(String, String)>,
    pub at: DateTime<Utc>,
}

impl ObsRecord {
    /// Value of a field, if present.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory observer for tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    records: Mutex<Vec<ObsRecord>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All reports so far, in emission order.
    pub fn records(&self) -> Vec<ObsRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Reports for one stage.
    pub fn for_stage(&self, stage: Stage) -> Vec<ObsRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.stage == stage)
            .collect()
    }

    /// Order in which stages first reported.
    pub fn stage_order(&self) -> Vec<Stage> {
        let mut order = Vec::new();
        for record in self.records() {
            if !order.contains(&record.stage) {
                order.push(record.stage);
            }
        }
        order
    }
}

impl JobObserver for RecordingObserver {
    fn observe(&self, level: ObsLevel, stage: Stage, message: &str, fields: &[(&str, String)]) {
        self.records.lock().unwrap().push(ObsRecord {
            level,
            stage,
            message: message.to_string(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            at: Utc::now(),
        });
    }
}

/// Span covering one job execution, tagged with its kind and a fresh id.
pub fn job_span(kind: &'static str, job_id: &Uuid) -> tracing::Span {
    tracing::info_span!("contract_jobs.job", kind = kind, job_id = %job_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order_and_fields() {
        let obs = RecordingObserver::new();
        obs.info(Stage::Preprocess, "resolved", &[("field", "source".to_string())]);
        obs.warn(Stage::Compile, "warning", &[]);
        obs.debug(Stage::Preprocess, "again", &[]);

        let records = obs.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].field("field"), Some("source"));
        assert_eq!(records[1].level, ObsLevel::Warn);
        assert_eq!(obs.stage_order(), vec![Stage::Preprocess, Stage::Compile]);
        assert_eq!(obs.for_stage(Stage::Preprocess).len(), 2);
    }

    #[test]
    fn test_render_fields() {
        let rendered = render_fields(&[("a", "1".to_string()), ("b", "x y".to_string())]);
        assert_eq!(rendered, "a=1 b=x y");
    }

    #[test]
    fn test_job_span_create() {
        let _span = job_span("deploy", &Uuid::new_v4());
    }
}
