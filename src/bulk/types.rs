//! Bulk job payload types.

use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Server-assigned bulk job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        JobId(id)
    }
}

/// One input row: an email plus any extra columns to carry through to results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub email: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl JobRecord {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Input for a bulk job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// Records uploaded with the request.
    Records(Vec<JobRecord>),
    /// A CSV the API downloads itself.
    RemoteUrl(String),
}

impl JobInput {
    pub fn records<I, R>(records: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<JobRecord>,
    {
        JobInput::Records(records.into_iter().map(Into::into).collect())
    }

    pub fn remote_url(url: impl Into<String>) -> Self {
        JobInput::RemoteUrl(url.into())
    }

    pub(crate) fn input_location(&self) -> &'static str {
        match self {
            JobInput::Records(_) => "supplied",
            JobInput::RemoteUrl(_) => "remote_url",
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let ctx = || ErrorContext::new().with_source("job_runner");
        match self {
            JobInput::Records(records) => {
                if records.is_empty() {
                    return Err(Error::validation_with_context(
                        "bulk job input must contain at least one record",
                        ctx().with_field_path("input"),
                    ));
                }
                for (i, record) in records.iter().enumerate() {
                    if record.email.trim().is_empty() {
                        return Err(Error::validation_with_context(
                            "email must not be blank",
                            ctx().with_field_path(format!("input[{}].email", i)),
                        ));
                    }
                    if record.fields.contains_key("email") {
                        return Err(Error::validation_with_context(
                            "extra field collides with the email column",
                            ctx().with_field_path(format!("input[{}].fields.email", i)),
                        ));
                    }
                }
                Ok(())
            }
            JobInput::RemoteUrl(raw) => {
                let parsed = url::Url::parse(raw).map_err(|e| {
                    Error::validation_with_context(
                        "remote input is not a valid URL",
                        ctx().with_field_path("input").with_details(e.to_string()),
                    )
                })?;
                match parsed.scheme() {
                    "http" | "https" => Ok(()),
                    other => Err(Error::validation_with_context(
                        "remote input must be an http(s) URL",
                        ctx()
                            .with_field_path("input")
                            .with_details(format!("scheme: {}", other)),
                    )),
                }
            }
        }
    }

    pub(crate) fn to_value(&self) -> Result<Value> {
        match self {
            JobInput::Records(records) => Ok(serde_json::to_value(records)?),
            JobInput::RemoteUrl(url) => Ok(Value::String(url.clone())),
        }
    }

    pub(crate) fn input_ref(&self) -> InputRef {
        match self {
            JobInput::Records(records) => InputRef::Supplied {
                records: records.len(),
            },
            JobInput::RemoteUrl(url) => InputRef::RemoteUrl(url.clone()),
        }
    }
}

impl From<&str> for JobRecord {
    fn from(email: &str) -> Self {
        JobRecord::new(email)
    }
}

impl From<String> for JobRecord {
    fn from(email: String) -> Self {
        JobRecord::new(email)
    }
}

/// Where a tracked job's input came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRef {
    Supplied { records: usize },
    RemoteUrl(String),
    /// Job created outside this runner and adopted on first poll.
    External,
}

/// Pointer to the results of a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRef {
    pub job_id: JobId,
    pub records: Option<u64>,
}

/// Options for `jobs/create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOptions {
    pub filename: Option<String>,
    pub auto_parse: bool,
    pub auto_start: bool,
    pub run_sample: bool,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            filename: None,
            auto_parse: true,
            auto_start: true,
            run_sample: false,
        }
    }
}

/// Per-category record counts of a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobTotals {
    pub records: Option<u64>,
    pub billable: Option<u64>,
    pub processed: Option<u64>,
    pub valid: Option<u64>,
    pub invalid: Option<u64>,
    pub catchall: Option<u64>,
    pub disposable: Option<u64>,
    pub unknown: Option<u64>,
    pub duplicates: Option<u64>,
    pub bad_syntax: Option<u64>,
}

/// Parsed `jobs/status` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    #[serde(default)]
    pub id: Option<JobId>,
    pub job_status: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub total: Option<JobTotals>,
    #[serde(default)]
    pub bounce_estimate: Option<f64>,
    #[serde(default)]
    pub percent_complete: Option<f64>,
    #[serde(default)]
    pub execution_time: Option<u64>,
}

/// Verification outcome of a single record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationOutcome {
    /// `valid`, `invalid`, `disposable`, `catchall` or `unknown`
    pub result: String,
    pub flags: Vec<String>,
    pub suggested_correction: Option<String>,
    pub address_info: Option<Value>,
}

/// One row of `jobs/results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobResultItem {
    /// The input columns as echoed back by the API
    pub data: Map<String, Value>,
    pub verification: VerificationOutcome,
}

/// A page of `jobs/results`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsPage {
    pub total_results: u64,
    pub total_pages: u64,
    pub results: Vec<JobResultItem>,
}

/// Filters for `jobs/search`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub job_id: Option<JobId>,
    pub filename: Option<String>,
    pub job_status: Option<String>,
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
}

/// A page of `jobs/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchPage {
    pub total_results: u64,
    pub total_pages: u64,
    pub results: Vec<JobStatusReport>,
}
