//! 批量验证任务模块：提交、轮询、获取结果与清理。
//!
//! # Bulk Jobs
//!
//! Bulk verification runs asynchronously on the server. A job is submitted,
//! polled until it reaches a terminal state and, once complete, its results
//! are fetched page by page. Finished jobs can then be deleted.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`JobRunner`] | Tracks jobs and issues the lifecycle requests |
//! | [`BulkJob`] | Local view of one job: state, input and result references |
//! | [`JobState`] | `Created → Submitted → Running → Complete / Failed / Cancelled` |
//! | [`JobInput`] | Supplied records or a remote CSV URL |
//!
//! Only `Complete` jobs hand out results; asking earlier is an
//! [`Error::InvalidJobState`](crate::Error::InvalidJobState).

mod runner;
mod state;
mod types;

pub use runner::{JobRunner, MAX_RESULTS_PER_PAGE};
pub use state::{BulkJob, JobState, RemoteStatus};
pub use types::{
    InputRef, JobId, JobInput, JobRecord, JobResultItem, JobStatusReport, JobTotals, ResultRef,
    ResultsPage, SearchPage, SearchQuery, SubmitOptions, VerificationOutcome,
};
