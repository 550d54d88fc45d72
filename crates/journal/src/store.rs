//! Decision journal writer
//!
//! Records are appended to `<dir>/<YYYY-MM-DD>.jsonl`, keyed by the date the
//! request was decided. Every append is flushed before it returns.

use crate::error::JournalError;
use crate::record::JournalRecord;
use chrono::NaiveDate;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// The file currently open for one decision date
struct DayFile {
    date: NaiveDate,
    writer: BufWriter<File>,
}

pub struct JournalStore {
    dir: PathBuf,
    day: Option<DayFile>,
}

impl JournalStore {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, JournalError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, day: None })
    }

    pub fn append(&mut self, record: &JournalRecord) -> Result<(), JournalError> {
        let line = serde_json::to_string(record)?;
        self.open_day(record.timestamp.date_naive())?;

        if let Some(day) = self.day.as_mut() {
            writeln!(day.writer, "{}", line)?;
            day.writer.flush()?;
        }
        Ok(())
    }

    fn open_day(&mut self, date: NaiveDate) -> Result<(), JournalError> {
        if self.day.as_ref().is_some_and(|day| day.date == date) {
            return Ok(());
        }

        self.close()?;
        let path = self.dir.join(format!("{}.jsonl", date.format("%Y-%m-%d")));
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.day = Some(DayFile {
            date,
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), JournalError> {
        if let Some(mut day) = self.day.take() {
            day.writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for JournalStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
