mod analysis;
mod app;
mod batch;
mod cli;
mod config;
mod openai;
mod search;

pub const USER_AGENT: &str = concat!("mrscout/", env!("CARGO_PKG_VERSION"));

use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::{info, warn};

use app::{MrScout, operator_message};
use cli::{Cli, Command};
use config::Config;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mrscout=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(ExitCode::from(2));
        }
    };

    let scout = match MrScout::new(&config) {
        Ok(scout) => scout,
        Err(e) => {
            eprintln!("error: {}", operator_message(&e));
            return Ok(ExitCode::from(e.exit_code()));
        }
    };

    let options = cli.session.options();

    let result = match &cli.command {
        Command::Lookup(params) => scout.lookup(params, &options).await.map(|output| {
            println!("{output}");
        }),
        Command::Batch(params) => {
            let abort = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&abort);
            tokio::spawn(async move {
                if watch_interrupts(tokio::signal::ctrl_c, &flag).await {
                    std::process::exit(130);
                }
            });

            scout.batch(params, &options, &abort).await.map(|report| {
                println!(
                    "{} rows processed ({} failed), results written to {}",
                    report.outcomes.len(),
                    report.failed(),
                    params.output.display()
                );
                if report.not_started > 0 {
                    println!("aborted: {} rows not started", report.not_started);
                }
            })
        }
    };

    match result {
        Ok(()) => {
            info!("done");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {}", operator_message(&e));
            Ok(ExitCode::from(e.exit_code()))
        }
    }
}

/// First interrupt sets `abort` so rows in flight can finish; returns `true`
/// on a second interrupt, when the process should exit at once.
async fn watch_interrupts<F>(mut next: impl FnMut() -> F, abort: &AtomicBool) -> bool
where
    F: Future<Output = std::io::Result<()>>,
{
    if next().await.is_err() {
        return false;
    }
    warn!("interrupt received, finishing rows in progress (press Ctrl-C again to quit)");
    abort.store(true, Ordering::SeqCst);

    if next().await.is_err() {
        return false;
    }
    warn!("second interrupt, exiting before results are written");
    true
}
