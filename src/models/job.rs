use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::RunAfterError;

/// Opaque job identifier. Snapshots may carry ids as JSON strings or numbers;
/// both are normalized to their string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(u64),
}

impl From<RawId> for JobId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => JobId(s),
            RawId::Number(n) => JobId::from(n),
        }
    }
}

impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RawId::deserialize(deserializer).map(JobId::from)
    }
}

/// `null`, missing, and blank ids all mean "no id".
fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<JobId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawId>::deserialize(deserializer)?;
    Ok(raw
        .map(JobId::from)
        .filter(|id| !id.as_str().trim().is_empty()))
}

fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    #[default]
    Query,
    Script,
}

/// A scheduled job as supplied by the job form.
///
/// Only `id`, `parent_id` and `cron_string` take part in dependency and
/// schedule resolution; everything else is carried through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<JobId>,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        alias = "parent",
        deserialize_with = "deserialize_optional_id"
    )]
    pub parent_id: Option<JobId>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub cron_string: Option<String>,
    #[serde(default, rename = "type")]
    pub job_type: JobType,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub should_rerun: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub driver: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub result_query: String,
    #[serde(default)]
    pub result_email: String,
    #[serde(default)]
    pub status_email: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Job {
    /// A fresh, unsaved job (no id) with the form's initial values.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            parent_id: None,
            cron_string: None,
            job_type: JobType::Query,
            enabled: true,
            should_rerun: true,
            description: None,
            driver: None,
            user: None,
            code: String::new(),
            result_query: String::new(),
            result_email: String::new(),
            status_email: String::new(),
            last_modified: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<JobId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<JobId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    pub fn with_cron(mut self, expr: impl Into<String>) -> Self {
        self.cron_string = Some(expr.into());
        self
    }

    pub fn has_parent(&self) -> bool {
        self.parent_id.is_some()
    }

    /// The job's own schedule expression, trimmed; `None` when blank.
    pub fn cron_expression(&self) -> Option<&str> {
        self.cron_string
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Label used in logs and CLI output.
    pub fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("'{}' ({})", self.name, id),
            None => format!("'{}' (unsaved)", self.name),
        }
    }
}

/// Check a job the way the job form does before saving it.
pub fn validate_job(job: &Job) -> Result<(), RunAfterError> {
    if job.name.trim().is_empty() {
        return Err(RunAfterError::Validation("Job name cannot be empty".to_string()));
    }

    if job.job_type == JobType::Query && job.driver.is_none() {
        return Err(RunAfterError::Validation(
            "Query jobs require a data source driver".to_string(),
        ));
    }

    if !job.result_query.trim().is_empty() && job.result_email.trim().is_empty() {
        return Err(RunAfterError::Validation(
            "A result email is required when a result query is set".to_string(),
        ));
    }

    match (job.cron_expression(), &job.parent_id) {
        (None, None) => Err(RunAfterError::Validation(
            "Either cron string or parent job is required".to_string(),
        )),
        // The cron string is ignored while a parent is selected.
        (_, Some(_)) => Ok(()),
        (Some(expr), None) => crate::schedule::validate_cron(expr),
    }
}
