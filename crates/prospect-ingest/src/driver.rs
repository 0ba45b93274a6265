//! Pagination driver
//!
//! Walks the search results one page at a time: fetch, persist the page into
//! the checkpoint, pause, repeat. Every page that reaches the checkpoint
//! stays there, so a run that stops for any reason can be started again and
//! continues at `latest_page + 1`.
//!
//! ```text
//! Idle -> Fetching -> Persisting -> Pausing -> Fetching ...
//!            |             |           |
//!            v             v           v
//!         Aborted        Done        Done
//! ```

use crate::checkpoint::CheckpointStore;
use crate::error::{IngestError, IngestResult};
use crate::fetcher::{SearchClient, SearchFilters};
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Driver lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Fetching,
    Persisting,
    Pausing,
    Done,
    Aborted,
}

impl fmt::Display for DriverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverState::Idle => "idle",
            DriverState::Fetching => "fetching",
            DriverState::Persisting => "persisting",
            DriverState::Pausing => "pausing",
            DriverState::Done => "done",
            DriverState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Why a run reached `Done`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The last fetched page was shorter than the page size
    LastPage,
    /// The configured page ceiling was reached
    PageLimit,
    /// The run was cancelled between pages
    Cancelled,
}

/// Terminal outcome of a run
#[derive(Debug)]
pub enum RunOutcome {
    Done(StopReason),
    /// A page request failed; pages before `page` are still checkpointed
    Aborted { page: u32, error: IngestError },
}

/// Summary of a single pagination run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// First page this run tried to fetch
    pub start_page: u32,
    /// Pages fetched and persisted by this run
    pub pages_fetched: u32,
    /// Records persisted by this run
    pub records_fetched: usize,
}

impl RunReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, RunOutcome::Aborted { .. })
    }
}

/// Knobs for a pagination run
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub filters: SearchFilters,
    pub page_size: u32,
    /// Highest page number to fetch
    pub max_page: u32,
    /// Pause between two requests
    pub request_interval: Duration,
}

/// Drives a [`SearchClient`] page by page into a [`CheckpointStore`]
pub struct PaginationDriver<C, S> {
    client: C,
    store: S,
    config: DriverConfig,
    state: DriverState,
}

impl<C, S> PaginationDriver<C, S>
where
    C: SearchClient,
    S: CheckpointStore,
{
    pub fn new(client: C, store: S, config: DriverConfig) -> Self {
        Self {
            client,
            store,
            config,
            state: DriverState::Idle,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn transition(&mut self, next: DriverState, page: u32) {
        debug!(from = %self.state, to = %next, page, "Driver state transition");
        self.state = next;
    }

    /// Run until the data ends, the page ceiling is hit, a page fails, or
    /// `cancel` fires.
    ///
    /// A failed page ends the run as [`RunOutcome::Aborted`]. Checkpoint load
    /// and save failures are returned as errors: nothing after the last
    /// successful save is trusted in that case.
    pub async fn run(&mut self, cancel: &CancellationToken) -> IngestResult<RunReport> {
        self.state = DriverState::Idle;

        let mut checkpoint = self.store.load().await?;
        let start_page = checkpoint.next_page();
        let mut page = start_page;
        let mut pages_fetched = 0u32;
        let mut records_fetched = 0usize;

        info!(
            start_page,
            max_page = self.config.max_page,
            checkpoint = %self.store.describe(),
            "Starting pagination run"
        );

        let outcome = loop {
            if page > self.config.max_page {
                self.transition(DriverState::Done, page);
                break RunOutcome::Done(StopReason::PageLimit);
            }
            if cancel.is_cancelled() {
                self.transition(DriverState::Done, page);
                break RunOutcome::Done(StopReason::Cancelled);
            }

            self.transition(DriverState::Fetching, page);
            let fetched = match self
                .client
                .fetch_page(&self.config.filters, page, self.config.page_size)
                .await
            {
                Ok(fetched) => fetched,
                Err(e) if e.is_page_failure() => {
                    error!(page, error = %e, "Page fetch failed, aborting run");
                    self.transition(DriverState::Aborted, page);
                    break RunOutcome::Aborted { page, error: e };
                },
                Err(e) => {
                    self.transition(DriverState::Aborted, page);
                    return Err(e);
                },
            };

            self.transition(DriverState::Persisting, page);
            let count = fetched.records.len();
            checkpoint.record_page(page, fetched.records);
            if let Err(e) = self.store.save(&checkpoint).await {
                error!(page, error = %e, "Checkpoint save failed");
                self.transition(DriverState::Aborted, page);
                return Err(e);
            }
            pages_fetched += 1;
            records_fetched += count;
            info!(
                page,
                records = count,
                total = %fetched.total_display_count,
                "Page persisted"
            );

            if fetched.is_last_page {
                self.transition(DriverState::Done, page);
                break RunOutcome::Done(StopReason::LastPage);
            }
            if page >= self.config.max_page {
                self.transition(DriverState::Done, page);
                break RunOutcome::Done(StopReason::PageLimit);
            }

            self.transition(DriverState::Pausing, page);
            tokio::select! {
                _ = cancel.cancelled() => {
                    self.transition(DriverState::Done, page);
                    break RunOutcome::Done(StopReason::Cancelled);
                }
                _ = tokio::time::sleep(self.config.request_interval) => {}
            }

            page += 1;
        };

        match &outcome {
            RunOutcome::Done(reason) => info!(
                ?reason,
                pages = pages_fetched,
                records = records_fetched,
                "Pagination run finished"
            ),
            RunOutcome::Aborted { page, .. } => error!(
                failed_page = page,
                pages = pages_fetched,
                records = records_fetched,
                "Pagination run aborted"
            ),
        }

        Ok(RunReport {
            outcome,
            start_page,
            pages_fetched,
            records_fetched,
        })
    }
}
