//! Audit trail
//!
//! Append-only CSV record of every answered question: when it was asked, the
//! question, the answer text, and the SQL that produced it (empty when the
//! pipeline answered without SQL). The header row is written once when the
//! file is first created; appends are serialized through a lock so concurrent
//! pipelines never interleave partial rows.

use crate::error::{AskError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_REPORT_PATH: &str = "report/qa_report.csv";

const HEADER: [&str; 4] = ["timestamp", "question", "answer", "sql"];

/// One audited question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaRecord {
    pub timestamp: DateTime<Utc>,
    pub question: String,
    pub answer: String,
    pub sql: Option<String>,
}

impl QaRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, sql: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            question: question.into(),
            answer: answer.into(),
            sql,
        }
    }
}

/// Append-only CSV sink.
pub struct QaReporter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl QaReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file (and its parent directory) with a
    /// header row on first use.
    pub fn append(&self, record: &QaRecord) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AskError::Audit("report lock poisoned".to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| AskError::Audit(e.to_string()))?;
            }
        }

        let is_new = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AskError::Audit(e.to_string()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer
                .write_record(HEADER)
                .map_err(|e| AskError::Audit(e.to_string()))?;
        }
        writer
            .write_record([
                record
                    .timestamp
                    .format("%Y-%m-%dT%H:%M:%S%.6f")
                    .to_string()
                    .as_str(),
                record.question.as_str(),
                record.answer.as_str(),
                record.sql.as_deref().unwrap_or(""),
            ])
            .map_err(|e| AskError::Audit(e.to_string()))?;
        writer
            .flush()
            .map_err(|e| AskError::Audit(e.to_string()))?;
        Ok(())
    }

    /// Read every recorded exchange back. A missing file is an empty history.
    pub fn read_all(&self) -> Result<Vec<QaRecord>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| AskError::Audit("report lock poisoned".to_string()))?;

        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader =
            csv::Reader::from_path(&self.path).map_err(|e| AskError::Audit(e.to_string()))?;
        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| AskError::Audit(e.to_string()))?;
            let timestamp = NaiveDateTime::parse_from_str(&row[0], "%Y-%m-%dT%H:%M:%S%.f")
                .map_err(|e| AskError::Audit(format!("bad timestamp {:?}: {}", &row[0], e)))?
                .and_utc();
            let sql = match &row[3] {
                "" => None,
                text => Some(text.to_string()),
            };
            records.push(QaRecord {
                timestamp,
                question: row[1].to_string(),
                answer: row[2].to_string(),
                sql,
            });
        }
        Ok(records)
    }
}
