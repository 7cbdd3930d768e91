// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use balance_poller::app::config::WorkerSettings;
use balance_poller::app::logging::setup_logging;
use balance_poller::domain::error::AppError;
use balance_poller::domain::time::current_unix;
use balance_poller::network::http::HttpClients;
use balance_poller::services::driver::{IterationOutcome, PollingDriver};
use balance_poller::services::fetcher::data_path::DataPathFetcher;
use balance_poller::services::fetcher::portfolio::PortfolioFetcher;
use balance_poller::services::fetcher::{BalanceFetcher, Profile};
use balance_poller::services::housekeeping::run_housekeeping;
use balance_poller::store::grist::GristBackend;
use balance_poller::store::{RecordFilter, RecordStore, TableBackend};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "wallet balance poller")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,json} if present)
    #[arg(long)]
    config: Option<String>,

    /// Log updates instead of writing them to the datastore
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Run a single poll iteration and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Poll wallets forever (default)
    Run,
    /// Normalize State/Version/Retries columns once and exit
    Housekeeping {
        /// Only this row id (overrides --state/--name)
        #[arg(long)]
        row: Option<i64>,
        /// Only rows in this State
        #[arg(long)]
        state: Option<String>,
        /// Only rows with this Name
        #[arg(long)]
        name: Option<String>,
    },
}

async fn drive<B: TableBackend, F: BalanceFetcher>(
    store: RecordStore<B>,
    fetcher: F,
    settings: &WorkerSettings,
    once: bool,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let http = HttpClients::new(settings.http_timeout())?;
    let driver = PollingDriver::new(store, fetcher, http, settings.driver_options()?, shutdown);
    if once {
        let outcome = driver.run_iteration(&mut rand::thread_rng()).await?;
        if let IterationOutcome::Completed(report) = outcome {
            tracing::info!(
                updated = report.updated,
                failed = report.failed,
                skipped = report.skipped,
                "Single iteration finished"
            );
        }
        return Ok(());
    }
    driver.run().await
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = WorkerSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(&settings.log_level, settings.log_json);

    let backend = GristBackend::new(
        &settings.grist_server,
        &settings.grist_doc_id,
        &settings.grist_api_key,
        settings.http_timeout(),
    )?;
    let store = RecordStore::new(backend, settings.table_names())
        .with_dry_run(cli.dry_run || settings.dry_run);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received; shutting down");
            signal_token.cancel();
        }
    });

    match cli.command.unwrap_or(Command::Run) {
        Command::Housekeeping { row, state, name } => {
            let filter = RecordFilter {
                id: row,
                state,
                name,
            };
            let scoped = filter.id.is_some() || filter.state.is_some() || filter.name.is_some();
            let report = run_housekeeping(&store, current_unix(), scoped.then_some(&filter)).await?;
            tracing::info!(scanned = report.scanned, updated = report.updated, "Housekeeping done");
            Ok(())
        }
        Command::Run => match settings.profile()? {
            Profile::DataPath => {
                drive(store, DataPathFetcher::new(), &settings, cli.once, shutdown).await
            }
            Profile::Portfolio => {
                let fetcher = PortfolioFetcher::new(settings.portfolio_endpoints());
                drive(store, fetcher, &settings, cli.once, shutdown).await
            }
        },
    }
}
