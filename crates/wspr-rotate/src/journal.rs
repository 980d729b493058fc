//! Append-only decision journal
//!
//! One JSON line per rotation cycle. Records are only ever appended, never
//! rewritten, so concurrent readers (log tailers, alerting) are always safe.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::controller::RotationDecision;

/// Append-only sink for rotation decisions
#[derive(Debug, Clone)]
pub struct DecisionJournal {
    path: PathBuf,
}

impl DecisionJournal {
    /// Create a journal writing to `path`; the file and its parent
    /// directory are created on first append
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Journal file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision record
    pub fn append(&self, decision: &RotationDecision) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let line = serde_json::to_string(decision)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        debug!("Journaled decision to {}", self.path.display());
        Ok(())
    }

    /// Read every record currently in the journal
    ///
    /// Lines that fail to parse (e.g. from an older record layout) are
    /// skipped rather than failing the whole read.
    pub fn read_all(&self) -> io::Result<Vec<RotationDecision>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        Ok(contents
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str(l).ok())
            .collect())
    }
}
