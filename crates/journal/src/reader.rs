//! JSONL journal reader

use crate::error::JournalError;
use crate::record::JournalRecord;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Reads every journal file in date order
pub struct JournalReader {
    files: Vec<PathBuf>,
}

impl JournalReader {
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref();
        let mut files = Vec::new();

        if path.exists() {
            for entry in std::fs::read_dir(path)? {
                let file_path = entry?.path();
                if file_path.extension().is_some_and(|ext| ext == "jsonl") {
                    files.push(file_path);
                }
            }
        }

        files.sort();
        Ok(Self { files })
    }

    pub fn read_all(&self) -> Result<Vec<JournalRecord>, JournalError> {
        let mut records = Vec::new();

        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                records.push(serde_json::from_str(&line)?);
            }
        }

        Ok(records)
    }

    /// Most recent `limit` records, oldest first
    pub fn tail(&self, limit: usize) -> Result<Vec<JournalRecord>, JournalError> {
        let mut records = self.read_all()?;
        let skip = records.len().saturating_sub(limit);
        Ok(records.split_off(skip))
    }

    pub fn for_request(&self, request_id: &str) -> Result<Option<JournalRecord>, JournalError> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|record| record.request_id == request_id))
    }

    pub fn count(&self) -> Result<usize, JournalError> {
        let mut count = 0;
        for file_path in &self.files {
            let reader = BufReader::new(File::open(file_path)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    count += 1;
                }
            }
        }
        Ok(count)
    }
}
