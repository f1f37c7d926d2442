use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::errors::RunAfterError;
use crate::models::Job;
use crate::storage::JobSource;

/// A `jobs.json` snapshot: either a bare array of jobs or `{"jobs": [...]}`.
pub struct JsonJobSnapshot {
    file_path: PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotFile {
    Bare(Vec<Job>),
    Wrapped { jobs: Vec<Job> },
}

impl JsonJobSnapshot {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Parse snapshot JSON that is already in memory.
    pub fn parse(content: &str) -> Result<Vec<Job>, RunAfterError> {
        let jobs = match serde_json::from_str::<SnapshotFile>(content)? {
            SnapshotFile::Bare(jobs) => jobs,
            SnapshotFile::Wrapped { jobs } => jobs,
        };
        Ok(jobs)
    }
}

impl JobSource for JsonJobSnapshot {
    fn list_jobs(&self) -> Result<Vec<Job>, RunAfterError> {
        if !self.file_path.exists() {
            return Err(RunAfterError::NotFound(format!(
                "Job snapshot {}",
                self.file_path.display()
            )));
        }

        let content = std::fs::read_to_string(&self.file_path)?;
        match Self::parse(&content) {
            Ok(jobs) => {
                tracing::info!(
                    "Loaded {} jobs from {}",
                    jobs.len(),
                    self.file_path.display()
                );
                Ok(jobs)
            }
            Err(e) => {
                tracing::warn!("{} is not a valid job snapshot: {}", self.file_path.display(), e);
                Err(e)
            }
        }
    }
}
