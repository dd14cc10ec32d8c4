//! Bulk job lifecycle.
//!
//! ```text
//! Created ──► Submitted ──► Running ──► Complete
//!    │            │            ├──────► Failed
//!    └────────────┴────────────┴──────► Cancelled
//! ```
//!
//! `Submitted` may also jump straight to `Complete` or `Failed` when the
//! server finishes before the first poll. Terminal states are sticky.

use super::types::{InputRef, JobId, JobStatusReport, ResultRef};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Created,
    Submitted,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed | Self::Cancelled)
    }

    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Created, Submitted | Cancelled) => true,
            (Submitted, Running | Complete | Failed | Cancelled) => true,
            (Running, Complete | Failed | Cancelled) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Submitted => "submitted",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of the server's `job_status` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    InProgress,
    Complete,
    Failed,
    Cancelled,
}

impl RemoteStatus {
    /// Returns `None` for statuses this client does not know about.
    pub fn from_job_status(job_status: &str) -> Option<Self> {
        let status = match job_status {
            "under_review" | "queued" | "running" | "parsing" | "waiting"
            | "waiting_analyzed" | "uploading" | "analyzing" => Self::InProgress,
            "complete" => Self::Complete,
            "failed" => Self::Failed,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => return None,
        };
        Some(status)
    }

    fn target(&self) -> JobState {
        match self {
            Self::InProgress => JobState::Running,
            Self::Complete => JobState::Complete,
            Self::Failed => JobState::Failed,
            Self::Cancelled => JobState::Cancelled,
        }
    }
}

/// Local view of a server-side bulk job.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkJob {
    pub id: JobId,
    state: JobState,
    pub input: InputRef,
    pub results: Option<ResultRef>,
    pub last_report: Option<JobStatusReport>,
    server_removed: bool,
}

impl BulkJob {
    pub fn new(id: JobId, input: InputRef) -> Self {
        Self {
            id,
            state: JobState::Created,
            input,
            results: None,
            last_report: None,
            server_removed: false,
        }
    }

    /// A job created elsewhere, first seen by this client after submission.
    pub(crate) fn adopted(id: JobId) -> Self {
        Self {
            state: JobState::Submitted,
            ..Self::new(id, InputRef::External)
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Whether the server copy was already deleted by a cancellation.
    pub fn server_removed(&self) -> bool {
        self.server_removed
    }

    pub(crate) fn mark_submitted(&mut self) -> Result<()> {
        self.transition(JobState::Submitted, "submit")
    }

    /// Applies a status observed on the server and returns the resulting state.
    ///
    /// Once terminal, observations are ignored and the terminal state is
    /// reported again.
    pub(crate) fn observe(&mut self, remote: RemoteStatus) -> Result<JobState> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }
        if self.state == JobState::Created {
            self.mark_submitted()?;
        }
        let target = remote.target();
        if target != self.state {
            self.transition(target, "poll")?;
        }
        if self.state == JobState::Complete {
            let records = self
                .last_report
                .as_ref()
                .and_then(|r| r.total.as_ref())
                .and_then(|t| t.records);
            self.results = Some(ResultRef {
                job_id: self.id,
                records,
            });
        }
        Ok(self.state)
    }

    /// Records a cancellation the server confirmed by deleting the job.
    pub(crate) fn mark_cancelled(&mut self) -> Result<()> {
        self.transition(JobState::Cancelled, "cancel")?;
        self.server_removed = true;
        Ok(())
    }

    /// Fails with `InvalidJobState` unless the job is in `expected`.
    pub(crate) fn require(&self, expected: JobState, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(self.invalid(operation))
        }
    }

    pub(crate) fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidJobState {
            job_id: self.id,
            state: Some(self.state),
            operation,
        }
    }

    fn transition(&mut self, next: JobState, operation: &'static str) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(self.invalid(operation));
        }
        info!(job_id = %self.id, from = %self.state, to = %next, "bulk job state changed");
        self.state = next;
        Ok(())
    }
}
