use crate::error::{BinSplitError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub input: PathBuf,
    pub input_size: u64,
    pub output_directory: PathBuf,
    pub fragments: Vec<ExtractedFragment>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    pub dry_run: bool,
}

impl ExtractionReport {
    pub fn total_bytes(&self) -> u64 {
        self.fragments.iter().map(|f| f.bytes).sum()
    }

    pub fn truncated_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.truncated).count()
    }
}

/// One produced (or, for a dry run, planned) fragment file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFragment {
    pub name: String,
    pub path: PathBuf,
    pub offset: u64,
    pub length: u64,
    /// Bytes written, or that would be written on a dry run.
    pub bytes: u64,
    pub truncated: bool,
}

/// Resolves where fragment files go.
///
/// An existing regular file as the output means "next to this file"; any
/// other path is the target directory itself.
#[derive(Debug, Clone)]
pub struct OutputManager {
    output_directory: PathBuf,
}

impl OutputManager {
    pub fn new<P: AsRef<Path>>(output: P) -> Self {
        let output = output.as_ref();
        let output_directory = if output.is_file() {
            output
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        } else {
            output.to_path_buf()
        };

        Self { output_directory }
    }

    pub fn get_output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn fragment_path(&self, name: &str) -> PathBuf {
        self.output_directory.join(name)
    }

    /// Create the output directory and its parents; a no-op when present.
    pub fn ensure_directory(&self) -> Result<()> {
        fs::create_dir_all(&self.output_directory).map_err(|source| BinSplitError::OutputWrite {
            path: self.output_directory.display().to_string(),
            source,
        })
    }

    /// Remove a previous fragment so the new one replaces it.
    pub fn remove_existing(&self, path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(source) => Err(BinSplitError::OutputWrite {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn write_fragment(&self, path: &Path, data: &[u8]) -> Result<()> {
        fs::write(path, data).map_err(|source| BinSplitError::OutputWrite {
            path: path.display().to_string(),
            source,
        })
    }
}
