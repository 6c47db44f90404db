//! Question bank sinks.
//!
//! The JSONL bank appends one entry per line and is never rewritten, so it
//! can be inspected with ordinary text tools.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::QuestionRecord;

/// Accepts converted questions
pub trait QuestionBank {
    /// Store one question imported from package `package_id`
    fn add(&mut self, package_id: &str, source: &str, record: &QuestionRecord) -> Result<()>;
}

/// One stored question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankEntry {
    pub id: Uuid,
    pub ts: DateTime<Utc>,
    pub package_id: String,
    /// Package file the question came from
    pub source: String,
    pub question: QuestionRecord,
}

impl BankEntry {
    pub fn new(package_id: &str, source: &str, question: QuestionRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            ts: Utc::now(),
            package_id: package_id.to_string(),
            source: source.to_string(),
            question,
        }
    }
}

/// In-memory bank
#[derive(Debug, Default)]
pub struct MemoryQuestionBank {
    pub entries: Vec<BankEntry>,
}

impl MemoryQuestionBank {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QuestionBank for MemoryQuestionBank {
    fn add(&mut self, package_id: &str, source: &str, record: &QuestionRecord) -> Result<()> {
        self.entries
            .push(BankEntry::new(package_id, source, record.clone()));
        Ok(())
    }
}

/// Append-only JSONL bank file
#[derive(Debug, Clone)]
pub struct JsonlQuestionBank {
    path: PathBuf,
}

impl JsonlQuestionBank {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the bank file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay all entries in order
    pub fn entries(&self) -> Result<Vec<BankEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open bank file: {}", self.path.display()))?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let entry: BankEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse bank entry: {}", line))?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

impl QuestionBank for JsonlQuestionBank {
    fn add(&mut self, package_id: &str, source: &str, record: &QuestionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open bank file: {}", self.path.display()))?;

        // Concurrent imports may append to the same bank
        file.lock_exclusive()
            .context("Failed to acquire file lock on bank file")?;

        let entry = BankEntry::new(package_id, source, record.clone());
        let json = serde_json::to_string(&entry).context("Failed to serialize bank entry")?;
        writeln!(file, "{}", json).context("Failed to write bank entry")?;
        file.flush().context("Failed to flush bank entry")?;

        // Lock is released when file is dropped
        Ok(())
    }
}
