// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::constants::{COL_COMMENT, ERROR_BACKOFF, IDLE_SLEEP, NO_PROXY_COMMENT};
use crate::domain::error::AppError;
use crate::domain::record::{RowUpdate, WalletRow};
use crate::infrastructure::network::http::HttpClients;
use crate::infrastructure::network::proxy::{ProxyChoice, ProxyMode, ProxyTemplate, choose_proxy, redact};
use crate::infrastructure::store::{RecordStore, TableBackend};
use crate::services::fetcher::BalanceFetcher;
use crate::services::selector::SelectionPolicy;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    Writing,
    Sleeping,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IterationReport {
    pub selected: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    /// No candidate rows; nothing was fetched.
    Idle,
    Completed(IterationReport),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepPolicy {
    pub idle: Duration,
    pub error_backoff: Duration,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl SleepPolicy {
    pub fn with_jitter(min: Duration, max: Duration) -> Self {
        Self {
            idle: IDLE_SLEEP,
            error_backoff: ERROR_BACKOFF,
            jitter_min: min,
            jitter_max: max.max(min),
        }
    }

    pub fn delay_after<R: Rng + ?Sized>(
        &self,
        result: &Result<IterationOutcome, AppError>,
        rng: &mut R,
    ) -> Duration {
        match result {
            Err(_) => self.error_backoff,
            Ok(IterationOutcome::Idle) => self.idle,
            Ok(IterationOutcome::Completed(_)) => {
                if self.jitter_max <= self.jitter_min {
                    return self.jitter_min;
                }
                let secs = rng.gen_range(self.jitter_min.as_secs_f64()..=self.jitter_max.as_secs_f64());
                Duration::from_secs_f64(secs)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub selection: SelectionPolicy,
    pub proxy_mode: ProxyMode,
    pub proxy_template: Option<ProxyTemplate>,
    pub sleep: SleepPolicy,
}

enum RowResult {
    Updated,
    Failed,
    Skipped,
}

/// Select → fetch → write → sleep, forever. One iteration is a unit of work that
/// returns a result; `run` owns the sleep and backoff policy around it.
pub struct PollingDriver<B, F> {
    store: RecordStore<B>,
    fetcher: F,
    http: HttpClients,
    options: DriverOptions,
    shutdown: CancellationToken,
}

impl<B: TableBackend, F: BalanceFetcher> PollingDriver<B, F> {
    pub fn new(
        store: RecordStore<B>,
        fetcher: F,
        http: HttpClients,
        options: DriverOptions,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store,
            fetcher,
            http,
            options,
            shutdown,
        }
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    fn enter(&self, state: PollState) {
        tracing::debug!(target: "driver", ?state, "State transition");
    }

    /// One full poll. Errors returned here are iteration-level (configuration,
    /// datastore unreachable); per-row fetch failures are written to the row.
    pub async fn run_iteration<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<IterationOutcome, AppError> {
        let rows = self.store.fetch_wallets(None).await?;
        let candidates = self.options.selection.select(rows, rng);
        if candidates.is_empty() {
            self.enter(PollState::Idle);
            tracing::info!(target: "driver", "No wallets to check");
            return Ok(IterationOutcome::Idle);
        }

        self.enter(PollState::Fetching);
        let plan = self.fetcher.plan(&self.store).await?;
        tracing::debug!(target: "driver", ?plan, "Fetch plan ready");
        let iteration_proxy = match (&self.options.proxy_mode, &self.options.proxy_template) {
            (ProxyMode::Template, Some(template)) => Some(template.generate(rng)),
            _ => None,
        };

        let mut report = IterationReport {
            selected: candidates.len(),
            ..Default::default()
        };
        for row in &candidates {
            if self.shutdown.is_cancelled() {
                break;
            }
            match self.process_row(&plan, row, iteration_proxy.as_deref()).await? {
                RowResult::Updated => report.updated += 1,
                RowResult::Failed => report.failed += 1,
                RowResult::Skipped => report.skipped += 1,
            }
        }
        Ok(IterationOutcome::Completed(report))
    }

    async fn process_row(
        &self,
        plan: &F::Plan,
        row: &WalletRow,
        iteration_proxy: Option<&str>,
    ) -> Result<RowResult, AppError> {
        // Candidates always carry an address.
        let Some(address) = row.address.as_deref() else {
            return Ok(RowResult::Skipped);
        };

        let proxy = choose_proxy(self.options.proxy_mode, row, iteration_proxy);
        if proxy == ProxyChoice::Missing {
            if row.comment.as_deref() != Some(NO_PROXY_COMMENT) {
                self.store
                    .update(row.id, RowUpdate::new().set(COL_COMMENT, NO_PROXY_COMMENT), None)
                    .await?;
            }
            tracing::warn!(target: "driver", row_id = row.id, address, "Row has no proxy; skipping");
            return Ok(RowResult::Skipped);
        }
        tracing::info!(
            target: "driver",
            row_id = row.id,
            address,
            proxy = %proxy.as_url().map(redact).unwrap_or_else(|| "direct".into()),
            "Checking wallet"
        );

        let attempt = async {
            let client = self.http.client_for(proxy.as_url())?;
            let update = self.fetcher.fetch(plan, address, &client).await?;
            self.enter(PollState::Writing);
            self.store.update(row.id, update, None).await
        };

        match attempt.await {
            Ok(()) => Ok(RowResult::Updated),
            Err(e) => {
                tracing::error!(target: "driver", row_id = row.id, address, error = %e, "Wallet check failed");
                self.enter(PollState::Writing);
                self.store.update(row.id, RowUpdate::error_marker(&e), None).await?;
                Ok(RowResult::Failed)
            }
        }
    }

    /// Loop until shutdown. Never returns on iteration failures.
    pub async fn run(&self) -> Result<(), AppError> {
        tracing::info!(
            target: "driver",
            table = %self.store.tables().wallets,
            proxy_mode = ?self.options.proxy_mode,
            "Polling driver started"
        );
        let mut iteration: u64 = 0;
        loop {
            if self.shutdown.is_cancelled() {
                tracing::info!(target: "driver", "Shutdown requested; stopping driver");
                return Ok(());
            }
            iteration += 1;
            let span = tracing::info_span!("poll", iteration);
            let result = self
                .run_iteration(&mut rand::thread_rng())
                .instrument(span)
                .await;
            let delay = self.options.sleep.delay_after(&result, &mut rand::thread_rng());
            match &result {
                Ok(IterationOutcome::Completed(report)) => tracing::info!(
                    target: "driver",
                    iteration,
                    selected = report.selected,
                    updated = report.updated,
                    failed = report.failed,
                    skipped = report.skipped,
                    "Iteration complete"
                ),
                Ok(IterationOutcome::Idle) => {}
                Err(e) => tracing::error!(
                    target: "driver",
                    iteration,
                    error = ?e,
                    "Iteration failed, sleeping {}s",
                    delay.as_secs()
                ),
            }

            self.enter(PollState::Sleeping);
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!(target: "driver", "Shutdown requested during sleep");
                    return Ok(());
                }
                _ = sleep(delay) => {}
            }
        }
    }
}
