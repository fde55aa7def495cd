//! Example: Logging in with a phone number and listing parcels
//!
//! Drives the onboarding flow from the terminal: phone number, SMS code,
//! optional email confirmation, then fetches a parcel summary with the
//! issued tokens.
//!
//! Run with: ```bash RUST_LOG=paczkomat_infra=debug cargo run --example
//! interactive_login ```
//!
//! Configuration is read the usual way (`paczkomat.toml`, `PACZKOMAT_*`
//! environment variables).

use std::sync::Arc;
use std::time::Duration;

use paczkomat_common::{AuthStep, OnboardingStep, TokenSet};
use paczkomat_infra::{config, init_tracing, ApiClientConfig, InPostApiClient, InpostAuthFlow, LogFormat};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

async fn prompt(lines: &mut Input, question: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;
    Ok(lines.next_line().await?.unwrap_or_default().trim().to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let format = std::env::var("LOG_FORMAT").unwrap_or_default().parse().unwrap_or(LogFormat::Plain);
    init_tracing(format);

    let settings = config::load()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("InPost login");
    println!("============\n");

    let flow = InpostAuthFlow::from_config(&settings);
    flow.initialize_session().await?;
    let mut step: AuthStep = flow.fetch_xsrf_token().await?;

    while !step.is_onboarded() {
        step = match &step.step {
            OnboardingStep::ProvidePhoneNumber => {
                let phone = prompt(&mut lines, "Phone number (+48...): ").await?;
                flow.submit_phone_number(&phone).await?
            }
            OnboardingStep::ProvidePhoneCode => {
                let code = prompt(&mut lines, "SMS code: ").await?;
                match flow.submit_otp_code(&code).await {
                    Ok(next) => next,
                    Err(err) => {
                        println!("✗ {err}");
                        continue;
                    }
                }
            }
            OnboardingStep::ProvideExistingEmail => {
                let (_, masked) = step.requires_email();
                println!("Confirm the login from the email sent to {}", masked.unwrap_or_default());
                flow.request_email_confirmation().await?;

                let poll = Duration::from_secs_f64(settings.auth.email_poll_interval_seconds);
                let timeout = Duration::from_secs_f64(settings.auth.email_confirmation_timeout_seconds);
                if !flow.wait_for_email_confirmation(poll, timeout).await? {
                    println!("✗ Email was not confirmed in time");
                    flow.close();
                    return Ok(());
                }
                flow.get_current_step().await?
            }
            OnboardingStep::Onboarded => break,
            OnboardingStep::Other(name) => {
                println!("✗ Unsupported onboarding step: {name}");
                flow.close();
                return Ok(());
            }
        };
    }

    let code = flow.fetch_authorization_code().await?;
    let tokens = flow.exchange_code_for_tokens(&code).await?;
    flow.close();
    println!("✓ Logged in\n");

    let client = InPostApiClient::builder()
        .config(ApiClientConfig::from(&settings))
        .credentials(tokens)
        .on_token_refresh(Arc::new(|_: &TokenSet| println!("ℹ️  Tokens refreshed")))
        .build()?;

    let summary = client.get_parcels().await?;
    println!("Parcels:        {}", summary.all_count);
    println!("Ready to pick:  {}", summary.ready_for_pickup_count);
    println!("On the way:     {}", summary.en_route_count);
    for item in &summary.ready_for_pickup_list {
        println!("  • {} at {}", item.shipment_number, item.pickup_point_name.as_deref().unwrap_or("-"));
    }

    client.close();
    Ok(())
}
