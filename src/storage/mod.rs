pub mod jobs;

pub use jobs::JsonJobSnapshot;

use crate::errors::RunAfterError;
use crate::models::Job;

/// Read-only source of a job snapshot.
pub trait JobSource: Send + Sync {
    fn list_jobs(&self) -> Result<Vec<Job>, RunAfterError>;
}
