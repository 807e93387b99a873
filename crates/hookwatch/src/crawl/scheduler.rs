//! Timer loop driving the crawler.
//!
//! The scheduler owns the crawler for its whole lifetime, so ticks never
//! overlap and the cursor needs no locking. Ticks run on a fixed period
//! starting one period after [`Scheduler::start`]; a tick that overruns the
//! period delays the next one instead of triggering a burst.

use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

use super::CrawlError;
use super::crawler::{Crawler, TickOutcome};

/// Default time between ticks.
pub const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(600);

/// How the loop ended.
pub struct SchedulerExit {
    pub crawler: Crawler,
    /// Set when a fatal tick error ended the loop.
    pub error: Option<CrawlError>,
    pub ticks: u64,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler task panicked: {0}")]
    Panicked(String),

    #[error("scheduler task was cancelled")]
    Cancelled,
}

pub struct Scheduler;

impl Scheduler {
    /// Spawn the timer loop on the current runtime.
    ///
    /// A zero `period` is replaced by [`DEFAULT_POLL_INTERVAL`].
    pub fn start(crawler: Crawler, period: StdDuration) -> SchedulerHandle {
        let period = if period.is_zero() {
            warn!(
                default_secs = DEFAULT_POLL_INTERVAL.as_secs(),
                "zero poll interval, using default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };
        let (stop_tx, stop_rx) = watch::channel(false);
        let (done_tx, done_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let exit = run(crawler, period, stop_rx).await;
            let _ = done_tx.send(true);
            exit
        });

        SchedulerHandle {
            stop: stop_tx,
            done: done_rx,
            task,
        }
    }
}

async fn run(
    mut crawler: Crawler,
    period: StdDuration,
    mut stop: watch::Receiver<bool>,
) -> SchedulerExit {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0u64;

    info!(period_secs = period.as_secs(), "scheduler started");

    loop {
        tokio::select! {
            biased;

            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    debug!(ticks, "stop requested");
                    break;
                }
            }

            _ = interval.tick() => {
                ticks += 1;
                match crawler.tick().await {
                    Ok(outcome) => log_outcome(ticks, &outcome),
                    Err(e) => {
                        error!(ticks, error = %e, "fatal crawl error, stopping scheduler");
                        return SchedulerExit {
                            crawler,
                            error: Some(e),
                            ticks,
                        };
                    }
                }
            }
        }
    }

    SchedulerExit {
        crawler,
        error: None,
        ticks,
    }
}

fn log_outcome(tick: u64, outcome: &TickOutcome) {
    match outcome {
        TickOutcome::Processed(report) => debug!(
            tick,
            repository = %report.repository,
            fetched = report.fetched,
            skipped = report.skipped,
            indexed = report.indexed,
            already_present = report.already_present,
            failed = report.failed,
            webhook = ?report.webhook,
            "tick complete"
        ),
        other => debug!(tick, outcome = ?other, "tick complete"),
    }
}

/// Control handle for a running scheduler.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    done: watch::Receiver<bool>,
    task: JoinHandle<SchedulerExit>,
}

impl SchedulerHandle {
    /// Resolve once the loop has ended on its own, after a fatal error.
    ///
    /// Cancel-safe; call [`SchedulerHandle::stop`] afterwards to collect the
    /// exit.
    pub async fn finished(&mut self) {
        let _ = self.done.wait_for(|done| *done).await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for it.
    ///
    /// A tick in progress is completed first.
    pub async fn stop(self) -> Result<SchedulerExit, SchedulerError> {
        let _ = self.stop.send(true);
        self.task.await.map_err(|e| {
            if e.is_panic() {
                let payload = e.into_panic();
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                SchedulerError::Panicked(message)
            } else {
                SchedulerError::Cancelled
            }
        })
    }
}
