//! Bulk verification: submit, poll until done, print results, clean up.
//!
//! Usage:
//!   NEVERBOUNCE_API_KEY=secret_xxx cargo run --example bulk_job

use neverbounce_rust::{ClientBuilder, JobInput, JobRecord, JobState, SubmitOptions};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut client = ClientBuilder::from_env().build()?;

    let input = JobInput::Records(vec![
        JobRecord::new("support@neverbounce.com").with_field("name", "Support"),
        JobRecord::new("invalid@example.com").with_field("name", "Nobody"),
    ]);
    let options = SubmitOptions {
        filename: Some("demo.csv".into()),
        ..Default::default()
    };
    let job_id = client.submit(input, &options).await?;
    println!("Submitted job {}", job_id);

    // Backoff is the caller's business; the client never sleeps or retries.
    let state = loop {
        let state = client.poll(job_id).await?;
        if state.is_terminal() {
            break state;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    };

    if state != JobState::Complete {
        anyhow::bail!("job {} ended as {}", job_id, state);
    }

    for item in client.fetch_results(job_id).await? {
        println!("{} -> {}", item.data["email"], item.verification.result);
    }

    client.delete(job_id).await?;
    Ok(())
}
