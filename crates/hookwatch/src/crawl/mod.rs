//! The polling state machine.
//!
//! Each tick either refreshes the repository list, pauses on low quota, or
//! processes exactly one repository: its pull requests become events and
//! its webhook is reconciled.

mod crawler;
mod cursor;
mod retention;
mod scheduler;

use thiserror::Error;

use crate::github::GitHubError;

pub use crawler::{Crawler, RepositoryReport, TickOutcome};
pub use cursor::CrawlCursor;
pub use retention::{CLOSED_RETENTION_HOURS, is_recent, should_emit};
pub use scheduler::{
    DEFAULT_POLL_INTERVAL, Scheduler, SchedulerError, SchedulerExit, SchedulerHandle,
};

/// Errors that stop the crawler.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The credential was rejected while listing repositories.
    #[error("GitHub credential rejected: {0}")]
    Unauthorized(#[source] GitHubError),
}
