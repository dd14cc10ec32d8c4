use crate::auth::{Auth, IntoAuth};
use crate::bulk::{
    BulkJob, JobId, JobInput, JobResultItem, JobRunner, JobState, JobStatusReport, ResultsPage,
    SearchPage, SearchQuery, SubmitOptions,
};
use crate::client::builder::ClientBuilder;
use crate::client::core::{ApiCore, RequestParams};
use crate::client::session::SessionScope;
use crate::transport::Session;
use crate::{BoxStream, Result};
use bytes::Bytes;
use reqwest::Method;
use serde_json::Value;

/// Options for a single-address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Include address breakdown in the response
    pub address_info: bool,
    /// Include remaining credits in the response
    pub credits_info: bool,
    /// Seconds the server may spend before answering `unknown`
    pub max_execution_time: u32,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            address_info: false,
            credits_info: false,
            max_execution_time: 30,
        }
    }
}

impl VerifyOptions {
    pub fn address_info(mut self, enable: bool) -> Self {
        self.address_info = enable;
        self
    }

    pub fn credits_info(mut self, enable: bool) -> Self {
        self.credits_info = enable;
        self
    }

    pub fn max_execution_time(mut self, secs: u32) -> Self {
        self.max_execution_time = secs;
        self
    }
}

/// NeverBounce API client.
///
/// Holds the request plumbing ([`ApiCore`]) and the bulk [`JobRunner`] side by
/// side; bulk operations are delegated to the runner over the same core.
#[derive(Debug)]
pub struct NeverBounceClient {
    core: ApiCore,
    jobs: JobRunner,
}

impl NeverBounceClient {
    /// Client for the public API with the given key.
    pub fn new(api_key: impl IntoAuth) -> Result<Self> {
        ClientBuilder::new().auth(api_key).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(core: ApiCore, jobs: JobRunner) -> Self {
        Self { core, jobs }
    }

    pub fn core(&self) -> &ApiCore {
        &self.core
    }

    pub(crate) fn core_mut(&mut self) -> &mut ApiCore {
        &mut self.core
    }

    /// Sets the client's credential. Strings are wrapped in a static-key
    /// strategy; `None` or an empty key clears it.
    pub fn set_auth(&mut self, auth: impl IntoAuth) {
        self.core.set_auth(auth);
    }

    pub fn clear_auth(&mut self) {
        self.core.clear_auth();
    }

    /// The credential requests will use: the client's own, else the session's.
    pub fn auth(&self) -> Option<Auth> {
        self.core.resolve_auth(None)
    }

    pub fn set_session(&mut self, session: Session) {
        self.core.set_session(session);
    }

    pub fn has_session(&self) -> bool {
        self.core.has_session()
    }

    /// Opens a persistent session for the lifetime of the returned scope.
    ///
    /// ```rust,no_run
    /// # async fn run() -> neverbounce_rust::Result<()> {
    /// let mut client = neverbounce_rust::NeverBounceClient::new("secret_key")?;
    /// {
    ///     let scope = client.session()?;
    ///     scope.account_info().await?;
    ///     scope.verify("a@example.com", &Default::default()).await?;
    /// } // connections closed here
    /// # Ok(())
    /// # }
    /// ```
    pub fn session(&mut self) -> Result<SessionScope<'_>> {
        SessionScope::enter(self)
    }

    pub async fn account_info(&self) -> Result<Value> {
        let response = self
            .core
            .call(Method::GET, &["account", "info"], RequestParams::new())
            .await?;
        Ok(response.into_payload())
    }

    /// Verifies a single address and returns the API payload as-is.
    pub async fn verify(&self, email: &str, options: &VerifyOptions) -> Result<Value> {
        let params = RequestParams::new()
            .with("email", email)
            .flag("address_info", options.address_info)
            .flag("credits_info", options.credits_info)
            .with("max_execution_time", options.max_execution_time);
        let response = self
            .core
            .call(Method::GET, &["single", "check"], params)
            .await?;
        Ok(response.into_payload())
    }

    pub fn jobs(&self) -> &JobRunner {
        &self.jobs
    }

    pub fn job(&self, job_id: JobId) -> Option<&BulkJob> {
        self.jobs.job(job_id)
    }

    pub async fn submit(&mut self, input: JobInput, options: &SubmitOptions) -> Result<JobId> {
        self.jobs.submit(&self.core, input, options).await
    }

    pub async fn poll(&mut self, job_id: JobId) -> Result<JobState> {
        self.jobs.poll(&self.core, job_id).await
    }

    pub async fn job_status(&self, job_id: JobId) -> Result<JobStatusReport> {
        self.jobs.fetch_status(&self.core, job_id).await
    }

    pub async fn parse(&mut self, job_id: JobId, auto_start: bool) -> Result<()> {
        self.jobs.parse(&self.core, job_id, auto_start).await
    }

    pub async fn start(&mut self, job_id: JobId, run_sample: bool) -> Result<()> {
        self.jobs.start(&self.core, job_id, run_sample).await
    }

    pub async fn fetch_results(&self, job_id: JobId) -> Result<Vec<JobResultItem>> {
        self.jobs.fetch_results(&self.core, job_id).await
    }

    pub fn stream_results(&self, job_id: JobId) -> Result<BoxStream<'_, JobResultItem>> {
        self.jobs.stream_results(&self.core, job_id)
    }

    pub async fn results_page(&self, job_id: JobId, page: u64) -> Result<ResultsPage> {
        self.jobs.results_page(&self.core, job_id, page).await
    }

    pub async fn download(&self, job_id: JobId) -> Result<Bytes> {
        self.jobs.download(&self.core, job_id).await
    }

    pub async fn cancel(&mut self, job_id: JobId) -> Result<JobState> {
        self.jobs.cancel(&self.core, job_id).await
    }

    pub async fn delete(&mut self, job_id: JobId) -> Result<()> {
        self.jobs.delete(&self.core, job_id).await
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchPage> {
        self.jobs.search(&self.core, query).await
    }
}
