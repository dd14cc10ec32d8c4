//! Bulk job runner: drives jobs through their lifecycle over an [`ApiCore`].

use super::state::{BulkJob, JobState, RemoteStatus};
use super::types::{
    JobId, JobInput, JobResultItem, JobStatusReport, ResultsPage, SearchPage, SearchQuery,
    SubmitOptions,
};
use crate::client::core::{ApiCore, RequestParams};
use crate::{BoxStream, Error, Result};
use bytes::Bytes;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Method;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// The API caps `items_per_page` at 1000.
pub const MAX_RESULTS_PER_PAGE: u32 = 1000;

/// Tracks the bulk jobs of one client and applies the lifecycle rules.
///
/// Polling is caller-driven; nothing here schedules requests on its own.
#[derive(Debug)]
pub struct JobRunner {
    jobs: HashMap<JobId, BulkJob>,
    results_per_page: u32,
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            jobs: HashMap::new(),
            results_per_page: MAX_RESULTS_PER_PAGE,
        }
    }

    pub fn with_results_per_page(mut self, n: u32) -> Self {
        self.results_per_page = n.clamp(1, MAX_RESULTS_PER_PAGE);
        self
    }

    pub fn job(&self, job_id: JobId) -> Option<&BulkJob> {
        self.jobs.get(&job_id)
    }

    pub fn jobs(&self) -> impl Iterator<Item = &BulkJob> {
        self.jobs.values()
    }

    /// Uploads the input as a new job and tracks it as `Submitted`.
    pub async fn submit(
        &mut self,
        core: &ApiCore,
        input: JobInput,
        options: &SubmitOptions,
    ) -> Result<JobId> {
        input.validate()?;
        let params = RequestParams::new()
            .with("input_location", input.input_location())
            .with("input", input.to_value()?)
            .with_opt("filename", options.filename.clone())
            .flag("auto_parse", options.auto_parse)
            .flag("auto_start", options.auto_start)
            .flag("run_sample", options.run_sample);

        let response = core.call(Method::POST, &["jobs", "create"], params).await?;
        let job_id = response
            .payload
            .get("job_id")
            .and_then(Value::as_u64)
            .map(JobId)
            .ok_or_else(|| Error::UnexpectedResponse {
                payload: response.payload.clone(),
            })?;

        let mut job = BulkJob::new(job_id, input.input_ref());
        job.mark_submitted()?;
        self.jobs.insert(job_id, job);
        info!(job_id = %job_id, "bulk job submitted");
        Ok(job_id)
    }

    /// Reads the job status from the server and advances the local state.
    ///
    /// Terminal jobs are answered locally. Unknown jobs are adopted.
    pub async fn poll(&mut self, core: &ApiCore, job_id: JobId) -> Result<JobState> {
        if let Some(job) = self.jobs.get(&job_id) {
            if job.state().is_terminal() {
                debug!(job_id = %job_id, state = %job.state(), "job already terminal");
                return Ok(job.state());
            }
        }

        let report = self.fetch_status(core, job_id).await?;
        let remote = RemoteStatus::from_job_status(&report.job_status).unwrap_or_else(|| {
            warn!(job_id = %job_id, job_status = %report.job_status, "unrecognised job status, treating as in progress");
            RemoteStatus::InProgress
        });

        let job = self.tracked_or_adopt(job_id);
        job.last_report = Some(report);
        job.observe(remote)
    }

    /// Raw `jobs/status` read. Does not touch local state.
    pub async fn fetch_status(&self, core: &ApiCore, job_id: JobId) -> Result<JobStatusReport> {
        let params = RequestParams::new().with("job_id", job_id.0);
        let response = core.call(Method::GET, &["jobs", "status"], params).await?;
        Ok(serde_json::from_value(response.into_payload())?)
    }

    /// Parses an uploaded job that was submitted with `auto_parse` off.
    pub async fn parse(&mut self, core: &ApiCore, job_id: JobId, auto_start: bool) -> Result<()> {
        self.require_active(job_id, "parse")?;
        let params = RequestParams::new()
            .with("job_id", job_id.0)
            .flag("auto_start", auto_start);
        core.call(Method::POST, &["jobs", "parse"], params).await?;
        self.tracked_or_adopt(job_id);
        Ok(())
    }

    /// Starts a parsed job that was submitted with `auto_start` off.
    pub async fn start(&mut self, core: &ApiCore, job_id: JobId, run_sample: bool) -> Result<()> {
        self.require_active(job_id, "start")?;
        let params = RequestParams::new()
            .with("job_id", job_id.0)
            .flag("run_sample", run_sample);
        core.call(Method::POST, &["jobs", "start"], params).await?;
        self.tracked_or_adopt(job_id);
        Ok(())
    }

    /// Cancels a job that has not reached a terminal state.
    ///
    /// The job becomes `Cancelled` only once the server confirms the deletion.
    pub async fn cancel(&mut self, core: &ApiCore, job_id: JobId) -> Result<JobState> {
        self.require_active(job_id, "cancel")?;
        let params = RequestParams::new().with("job_id", job_id.0);
        core.call(Method::POST, &["jobs", "delete"], params).await?;

        let job = self.tracked_or_adopt(job_id);
        job.mark_cancelled()?;
        Ok(job.state())
    }

    /// Deletes a finished job on the server and stops tracking it.
    ///
    /// A job cancelled through [`JobRunner::cancel`] is already gone on the
    /// server and is only forgotten locally.
    pub async fn delete(&mut self, core: &ApiCore, job_id: JobId) -> Result<()> {
        match self.jobs.get(&job_id) {
            Some(job) if job.server_removed() => {
                self.jobs.remove(&job_id);
                debug!(job_id = %job_id, "cancelled job forgotten");
                return Ok(());
            }
            Some(job) if job.state().is_terminal() => {}
            Some(job) => return Err(job.invalid("delete")),
            None => return Err(untracked(job_id, "delete")),
        }
        let params = RequestParams::new().with("job_id", job_id.0);
        core.call(Method::POST, &["jobs", "delete"], params).await?;
        self.jobs.remove(&job_id);
        info!(job_id = %job_id, "bulk job deleted");
        Ok(())
    }

    /// One page of results, 1-based.
    pub async fn results_page(
        &self,
        core: &ApiCore,
        job_id: JobId,
        page: u64,
    ) -> Result<ResultsPage> {
        self.require_complete(job_id, "fetch results for")?;
        fetch_page(core, job_id, page, self.results_per_page).await
    }

    /// Lazily pages through the results of a completed job.
    pub fn stream_results<'a>(
        &self,
        core: &'a ApiCore,
        job_id: JobId,
    ) -> Result<BoxStream<'a, JobResultItem>> {
        self.require_complete(job_id, "fetch results for")?;
        let per_page = self.results_per_page;

        let pages = stream::try_unfold(Some(1u64), move |next| async move {
            let Some(page) = next else {
                return Ok(None);
            };
            let data = fetch_page(core, job_id, page, per_page).await?;
            let next = (page < data.total_pages).then_some(page + 1);
            let items = stream::iter(data.results.into_iter().map(Ok::<_, Error>));
            Ok::<_, Error>(Some((items, next)))
        });
        Ok(Box::pin(pages.try_flatten()))
    }

    /// All results of a completed job.
    pub async fn fetch_results(&self, core: &ApiCore, job_id: JobId) -> Result<Vec<JobResultItem>> {
        let capacity = self
            .job(job_id)
            .and_then(|j| j.results.as_ref())
            .and_then(|r| r.records)
            .unwrap_or(0);
        let mut items = Vec::with_capacity(capacity.min(MAX_RESULTS_PER_PAGE as u64 * 10) as usize);
        let mut results = self.stream_results(core, job_id)?;
        while let Some(item) = results.next().await {
            items.push(item?);
        }
        debug!(job_id = %job_id, count = items.len(), "fetched bulk results");
        Ok(items)
    }

    /// Results of a completed job as the CSV file the API produces.
    pub async fn download(&self, core: &ApiCore, job_id: JobId) -> Result<Bytes> {
        self.require_complete(job_id, "download")?;
        let params = RequestParams::new().with("job_id", job_id.0);
        core.call_bytes(Method::GET, &["jobs", "download"], params).await
    }

    /// Searches jobs on the server. Does not touch local state.
    pub async fn search(&self, core: &ApiCore, query: &SearchQuery) -> Result<SearchPage> {
        let params = RequestParams::new()
            .with_opt("job_id", query.job_id.map(|id| id.0))
            .with_opt("filename", query.filename.clone())
            .with_opt("job_status", query.job_status.clone())
            .with_opt("page", query.page)
            .with_opt("items_per_page", query.items_per_page);
        let response = core.call(Method::GET, &["jobs", "search"], params).await?;
        Ok(serde_json::from_value(response.into_payload())?)
    }

    fn tracked_or_adopt(&mut self, job_id: JobId) -> &mut BulkJob {
        self.jobs.entry(job_id).or_insert_with(|| {
            info!(job_id = %job_id, "adopting job created elsewhere");
            BulkJob::adopted(job_id)
        })
    }

    fn require_active(&self, job_id: JobId, operation: &'static str) -> Result<()> {
        match self.jobs.get(&job_id) {
            Some(job) if job.state().is_terminal() => Err(job.invalid(operation)),
            _ => Ok(()),
        }
    }

    fn require_complete(&self, job_id: JobId, operation: &'static str) -> Result<()> {
        match self.jobs.get(&job_id) {
            Some(job) => job.require(JobState::Complete, operation),
            None => Err(untracked(job_id, operation)),
        }
    }
}

fn untracked(job_id: JobId, operation: &'static str) -> Error {
    Error::InvalidJobState {
        job_id,
        state: None,
        operation,
    }
}

async fn fetch_page(core: &ApiCore, job_id: JobId, page: u64, per_page: u32) -> Result<ResultsPage> {
    let params = RequestParams::new()
        .with("job_id", job_id.0)
        .with("page", page)
        .with("items_per_page", per_page);
    let response = core.call(Method::GET, &["jobs", "results"], params).await?;
    Ok(serde_json::from_value(response.into_payload())?)
}
