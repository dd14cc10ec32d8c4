//! Single address verification.
//!
//! API keys are configured via environment variables:
//! - NEVERBOUNCE_API_KEY
//!
//! Usage:
//!   NEVERBOUNCE_API_KEY=secret_xxx cargo run --example verify_single -- someone@example.com

use neverbounce_rust::{ApiErrorKind, ClientBuilder, Error, VerifyOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let email = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "support@neverbounce.com".to_string());

    if std::env::var("NEVERBOUNCE_API_KEY").is_err() {
        eprintln!("Warning: NEVERBOUNCE_API_KEY not set. Requests will fail with auth_failure.");
    }

    let mut client = ClientBuilder::from_env().build()?;
    let scope = client.session()?;

    let account = scope.account_info().await?;
    println!("Credits: {}", account["credits_info"]);

    let options = VerifyOptions::default().address_info(true);
    match scope.verify(&email, &options).await {
        Ok(result) => println!("{} -> {}", email, result["result"]),
        Err(Error::Api(err)) if err.kind == ApiErrorKind::ThrottleTriggered => {
            eprintln!("Throttled, try again later: {}", err);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
