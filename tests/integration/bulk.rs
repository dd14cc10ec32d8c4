//! Integration tests for the bulk job lifecycle

use crate::integration::mock_server::{MockServerFixture, API_KEY};
use futures::TryStreamExt;
use neverbounce_rust::bulk::SearchQuery;
use neverbounce_rust::{Error, JobId, JobInput, JobRecord, JobState, SubmitOptions};
use serde_json::{json, Value};

const JOB_ID: u64 = 150_970;

fn status_body(job_status: &str) -> Value {
    json!({
        "status": "success",
        "id": JOB_ID,
        "job_status": job_status,
        "filename": "contacts.csv",
        "total": {
            "records": 3,
            "billable": 3,
            "processed": 3,
            "valid": 2,
            "invalid": 1,
            "catchall": 0,
            "disposable": 0,
            "unknown": 0,
            "duplicates": 0,
            "bad_syntax": 0
        },
        "percent_complete": 100,
        "execution_time": 21
    })
}

fn result_row(email: &str, result: &str) -> Value {
    json!({
        "data": { "email": email, "name": "row" },
        "verification": { "result": result, "flags": ["has_dns"], "suggested_correction": "" }
    })
}

fn input() -> JobInput {
    JobInput::Records(vec![
        JobRecord::new("a@example.com").with_field("name", "A"),
        JobRecord::new("b@example.com"),
        JobRecord::new("c@example.com"),
    ])
}

async fn submitted(fixture: &MockServerFixture) -> neverbounce_rust::NeverBounceClient {
    let _create = fixture
        .mock_post(
            "/jobs/create",
            json!({
                "input_location": "supplied",
                "auto_parse": 1,
                "auto_start": 1,
                "run_sample": 0,
                "input": [
                    { "email": "a@example.com", "name": "A" },
                    { "email": "b@example.com" },
                    { "email": "c@example.com" }
                ]
            }),
            json!({ "status": "success", "job_id": JOB_ID, "execution_time": 388 }),
        )
        .await;

    let mut client = fixture.builder().auth(API_KEY).results_per_page(2).build().unwrap();
    let job_id = client.submit(input(), &SubmitOptions::default()).await.unwrap();
    assert_eq!(job_id, JobId(JOB_ID));
    assert_eq!(client.job(job_id).unwrap().state(), JobState::Submitted);
    client
}

fn job_id_query() -> (&'static str, &'static str) {
    ("job_id", "150970")
}

#[tokio::test]
async fn test_submit_poll_fetch_results() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let running = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("running"))
        .await;
    assert_eq!(client.poll(job_id).await.unwrap(), JobState::Running);
    running.assert_async().await;
    running.remove_async().await;

    // Results are refused until the job completes.
    let err = client.fetch_results(job_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidJobState {
            state: Some(JobState::Running),
            ..
        }
    ));

    let complete = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("complete"))
        .await;
    assert_eq!(client.poll(job_id).await.unwrap(), JobState::Complete);
    complete.assert_async().await;

    let page_one = fixture
        .mock_json(
            "GET",
            "/jobs/results",
            vec![job_id_query(), ("page", "1"), ("items_per_page", "2")],
            json!({
                "status": "success",
                "total_results": 3,
                "total_pages": 2,
                "results": [result_row("a@example.com", "valid"), result_row("b@example.com", "valid")]
            }),
        )
        .await;
    let page_two = fixture
        .mock_json(
            "GET",
            "/jobs/results",
            vec![job_id_query(), ("page", "2"), ("items_per_page", "2")],
            json!({
                "status": "success",
                "total_results": 3,
                "total_pages": 2,
                "results": [result_row("c@example.com", "invalid")]
            }),
        )
        .await;

    let results = client.fetch_results(job_id).await.unwrap();

    let outcomes: Vec<_> = results
        .iter()
        .map(|r| (r.data["email"].as_str().unwrap(), r.verification.result.as_str()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("a@example.com", "valid"),
            ("b@example.com", "valid"),
            ("c@example.com", "invalid")
        ]
    );
    page_one.assert_async().await;
    page_two.assert_async().await;

    let job = client.job(job_id).unwrap();
    assert_eq!(job.results.as_ref().and_then(|r| r.records), Some(3));
}

#[tokio::test]
async fn test_poll_after_terminal_is_answered_locally() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let failed = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("failed"))
        .await;

    for _ in 0..3 {
        assert_eq!(client.poll(job_id).await.unwrap(), JobState::Failed);
    }
    // Only the first poll reached the server.
    failed.assert_async().await;

    let err = client.fetch_results(job_id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidJobState { .. }));
}

#[tokio::test]
async fn test_stream_results_pages_lazily() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let _complete = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("complete"))
        .await;
    client.poll(job_id).await.unwrap();

    let _page = fixture
        .mock_json(
            "GET",
            "/jobs/results",
            vec![("page", "1")],
            json!({
                "status": "success",
                "total_results": 1,
                "total_pages": 1,
                "results": [result_row("a@example.com", "disposable")]
            }),
        )
        .await;

    let items: Vec<_> = client
        .stream_results(job_id)
        .unwrap()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].verification.result, "disposable");
}

#[tokio::test]
async fn test_cancel_running_job() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let delete = fixture
        .mock_post(
            "/jobs/delete",
            json!({ "job_id": JOB_ID }),
            json!({ "status": "success", "execution_time": 11 }),
        )
        .await;

    assert_eq!(client.cancel(job_id).await.unwrap(), JobState::Cancelled);
    delete.assert_async().await;

    // Terminal: no second request, and polling re-reports the state.
    let err = client.cancel(job_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidJobState {
            state: Some(JobState::Cancelled),
            operation: "cancel",
            ..
        }
    ));
    assert_eq!(client.poll(job_id).await.unwrap(), JobState::Cancelled);
}

#[tokio::test]
async fn test_delete_requires_terminal_state() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let err = client.delete(job_id).await.unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidJobState {
            state: Some(JobState::Submitted),
            ..
        }
    ));

    let _complete = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("complete"))
        .await;
    client.poll(job_id).await.unwrap();

    let delete = fixture
        .mock_post(
            "/jobs/delete",
            json!({ "job_id": JOB_ID }),
            json!({ "status": "success" }),
        )
        .await;
    client.delete(job_id).await.unwrap();

    delete.assert_async().await;
    assert!(client.job(job_id).is_none());
}

#[tokio::test]
async fn test_delete_after_cancel_is_local() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let cancel = fixture
        .mock_post(
            "/jobs/delete",
            json!({ "job_id": JOB_ID }),
            json!({ "status": "success" }),
        )
        .await;
    client.cancel(job_id).await.unwrap();
    cancel.assert_async().await;
    cancel.remove_async().await;

    // The server no longer knows the job; a second delete must not reach it.
    let gone = fixture
        .mock_json_times(
            "POST",
            "/jobs/delete",
            vec![],
            json!({ "status": "general_failure", "message": "Job not found" }),
            0,
        )
        .await;

    client.delete(job_id).await.unwrap();

    assert!(client.job(job_id).is_none());
    gone.assert_async().await;
}

#[tokio::test]
async fn test_empty_input_is_rejected_before_any_request() {
    let fixture = MockServerFixture::new().await;
    let create = fixture
        .mock_json_times("POST", "/jobs/create", vec![], json!({ "status": "success" }), 0)
        .await;

    let mut client = fixture.client();
    let err = client
        .submit(JobInput::Records(vec![]), &SubmitOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Validation { .. }));
    assert_eq!(client.jobs().jobs().count(), 0);
    create.assert_async().await;
}

#[tokio::test]
async fn test_failed_submit_tracks_nothing() {
    let fixture = MockServerFixture::new().await;
    let _create = fixture
        .mock_json(
            "POST",
            "/jobs/create",
            vec![],
            json!({ "status": "general_failure", "message": "Missing required parameter 'input'" }),
        )
        .await;

    let mut client = fixture.client();
    let err = client
        .submit(JobInput::remote_url("https://example.com/list.csv"), &SubmitOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Api(_)));
    assert_eq!(client.jobs().jobs().count(), 0);
}

#[tokio::test]
async fn test_poll_adopts_external_job() {
    let fixture = MockServerFixture::new().await;
    let _status = fixture
        .mock_json("GET", "/jobs/status", vec![("job_id", "42")], status_body("queued"))
        .await;

    let mut client = fixture.client();
    assert_eq!(client.poll(JobId(42)).await.unwrap(), JobState::Running);

    let job = client.job(JobId(42)).unwrap();
    assert_eq!(job.input, neverbounce_rust::bulk::InputRef::External);
    assert_eq!(
        job.last_report.as_ref().map(|r| r.job_status.as_str()),
        Some("queued")
    );
}

#[tokio::test]
async fn test_download_returns_csv() {
    let fixture = MockServerFixture::new().await;
    let mut client = submitted(&fixture).await;
    let job_id = JobId(JOB_ID);

    let _complete = fixture
        .mock_json("GET", "/jobs/status", vec![job_id_query()], status_body("complete"))
        .await;
    client.poll(job_id).await.unwrap();

    let csv = "email,result\na@example.com,valid\n";
    let _download = fixture
        .mock_raw("GET", "/jobs/download", 200, "application/octet-stream", csv)
        .await;

    let bytes = client.download(job_id).await.unwrap();
    assert_eq!(&bytes[..], csv.as_bytes());
}

#[tokio::test]
async fn test_search_is_typed() {
    let fixture = MockServerFixture::new().await;
    let _search = fixture
        .mock_json(
            "GET",
            "/jobs/search",
            vec![("job_status", "complete")],
            json!({
                "status": "success",
                "total_results": 1,
                "total_pages": 1,
                "results": [status_body("complete")]
            }),
        )
        .await;

    let query = SearchQuery {
        job_status: Some("complete".into()),
        ..Default::default()
    };
    let page = fixture.client().search(&query).await.unwrap();

    assert_eq!(page.total_results, 1);
    assert_eq!(page.results[0].id, Some(JobId(JOB_ID)));
}
