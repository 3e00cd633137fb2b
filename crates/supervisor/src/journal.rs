//! Per-source append-only journal.
//!
//! One file per supervision unit, never truncated: every encoder lifetime
//! appends a start marker and an end marker with the last diagnostic
//! lines. A journal write failure is logged and swallowed; bookkeeping
//! must not take the broadcast down.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use wallcast_common::clock::Timestamps;
use wallcast_common::error::WallcastResult;

pub struct Journal {
    path: PathBuf,
    writer: BufWriter<File>,
    stamps: Box<dyn Timestamps>,
}

impl Journal {
    /// Open (or create) the journal in append mode.
    pub fn open(path: impl Into<PathBuf>, stamps: Box<dyn Timestamps>) -> WallcastResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
            stamps,
        })
    }

    /// Append one timestamped line and flush it to disk.
    pub fn record(&mut self, message: &str) {
        let stamp = self.stamps.now();
        let result = writeln!(self.writer, "{stamp}: {message}").and_then(|_| self.writer.flush());
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "journal write failed");
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
