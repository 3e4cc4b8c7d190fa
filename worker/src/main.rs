mod citations;
mod config;
mod error;
mod worker;

use error::Error;
use researcher::GPTResearcher;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub type Result<T> = std::result::Result<T, Error>;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = worker::execute(
        |key| std::env::var(key).ok(),
        std::env::args_os(),
        |config, run| GPTResearcher::new(config, &run.query, &run.report_type),
    )
    .await;

    match outcome {
        Ok(_) => ExitCode::SUCCESS,
        Err(Error::MissingCredentials) => {
            eprintln!("❌ Critical Error: {}", Error::MissingCredentials);
            ExitCode::FAILURE
        }
        Err(Error::Usage(err)) => {
            let _ = err.print();
            ExitCode::from(err.exit_code() as u8)
        }
        Err(err) => {
            eprintln!("❌ ERROR: {}", err);
            ExitCode::FAILURE
        }
    }
}
