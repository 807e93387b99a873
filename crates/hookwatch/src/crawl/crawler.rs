//! One repository per tick.

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::CrawlError;
use super::cursor::CrawlCursor;
use super::retention::{is_recent, should_emit};
use crate::event::PullRequestEvent;
use crate::github::{GitHubClient, Repository};
use crate::rate_limit::{LOW_QUOTA_THRESHOLD, RateLimitTracker};
use crate::search::{IndexOutcome, SearchClient, SearchError};
use crate::webhook::{WebhookOutcome, WebhookReconciler};

/// What happened to one repository during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryReport {
    pub repository: String,
    /// Listing its pull requests failed; nothing else was attempted.
    pub listing_failed: bool,
    pub fetched: usize,
    /// Closed outside the retention window.
    pub skipped: usize,
    pub indexed: usize,
    pub already_present: usize,
    pub failed: usize,
    pub webhook: WebhookOutcome,
}

impl RepositoryReport {
    fn new(repository: &str) -> Self {
        Self {
            repository: repository.to_string(),
            listing_failed: false,
            fetched: 0,
            skipped: 0,
            indexed: 0,
            already_present: 0,
            failed: 0,
            webhook: WebhookOutcome::Skipped,
        }
    }
}

/// Result of a non-fatal tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Listing repositories failed; retried next tick.
    ListFailed,
    /// The credential sees no repositories.
    ListEmpty,
    QuotaLow { remaining: i64 },
    Processed(RepositoryReport),
}

pub struct Crawler {
    github: GitHubClient,
    search: SearchClient,
    webhooks: WebhookReconciler,
    cursor: CrawlCursor,
}

impl Crawler {
    /// `webhook_target` of `None` disables webhook reconciliation.
    pub fn new(github: GitHubClient, search: SearchClient, webhook_target: Option<String>) -> Self {
        let webhooks = WebhookReconciler::new(github.clone(), webhook_target);
        Self {
            github,
            search,
            webhooks,
            cursor: CrawlCursor::new(),
        }
    }

    pub fn cursor(&self) -> &CrawlCursor {
        &self.cursor
    }

    pub fn rate_limit(&self) -> &RateLimitTracker {
        self.github.rate_limit()
    }

    pub async fn tick(&mut self) -> Result<TickOutcome, CrawlError> {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as of `now`.
    ///
    /// Only a rejected credential while listing is an error; every other
    /// failure is logged and reflected in the outcome.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> Result<TickOutcome, CrawlError> {
        if self.cursor.needs_listing() {
            match self.github.list_repositories().await {
                Ok(repositories) => {
                    log_listing(&repositories, now);
                    if repositories.is_empty() {
                        return Ok(TickOutcome::ListEmpty);
                    }
                    self.cursor.reset(repositories);
                }
                Err(e) if e.is_unauthorized() => {
                    error!(error = %e, "listing repositories was not authorized");
                    return Err(CrawlError::Unauthorized(e));
                }
                Err(e) => {
                    error!(error = %e, "listing repositories failed");
                    return Ok(TickOutcome::ListFailed);
                }
            }
        }

        if let Some(remaining) = self.rate_limit().remaining_at(now)
            && remaining < LOW_QUOTA_THRESHOLD
        {
            if self.cursor.enter_low_quota() {
                info!(remaining, threshold = LOW_QUOTA_THRESHOLD, "low quota, pausing");
            }
            return Ok(TickOutcome::QuotaLow { remaining });
        }
        self.cursor.leave_low_quota();

        let Some(repository) = self.cursor.current().cloned() else {
            return Ok(TickOutcome::ListEmpty);
        };

        let report = self.process(&repository, now).await;
        self.cursor.advance();
        Ok(TickOutcome::Processed(report))
    }

    async fn process(&self, repository: &Repository, now: DateTime<Utc>) -> RepositoryReport {
        let full_name = repository.full_name.as_str();
        let mut report = RepositoryReport::new(full_name);

        debug!(
            repository = full_name,
            position = self.cursor.position(),
            of = self.cursor.len(),
            "processing repository"
        );

        let pull_requests = match self.github.list_pull_requests(full_name).await {
            Ok(pull_requests) => pull_requests,
            Err(e) => {
                error!(
                    repository = full_name,
                    url = %self.github.pull_requests_url(full_name),
                    error = %e,
                    "listing pull requests failed"
                );
                report.listing_failed = true;
                return report;
            }
        };

        for pull_request in pull_requests {
            report.fetched += 1;
            let number = pull_request.number;

            if !should_emit(&pull_request, now) {
                debug!(
                    repository = full_name,
                    number,
                    title = %pull_request.title,
                    closed_at = ?pull_request.closed_at,
                    "skipping old closed pull request"
                );
                report.skipped += 1;
                continue;
            }

            let title = pull_request.title.clone();
            let state = pull_request.state.clone();
            let mut event = PullRequestEvent::from_pull_request(pull_request, repository);
            let id = event.id();

            let document = match event.to_document(Utc::now()) {
                Ok(document) => document,
                Err(e) => {
                    error!(repository = full_name, number, %title, error = %e, "encoding event failed");
                    report.failed += 1;
                    continue;
                }
            };

            match self.search.create(id, document).await {
                Ok(IndexOutcome::Created) => {
                    info!(repository = full_name, number, %title, %state, uuid = %id, "indexed pull request");
                    report.indexed += 1;
                }
                Ok(IndexOutcome::AlreadyExists) => {
                    debug!(repository = full_name, number, uuid = %id, "pull request already indexed");
                    report.already_present += 1;
                }
                Err(SearchError::Rejected {
                    status,
                    error_type,
                    reason,
                }) => {
                    error!(
                        repository = full_name,
                        number,
                        %title,
                        uuid = %id,
                        status,
                        error_type = error_type.as_deref().unwrap_or_default(),
                        reason = reason.as_deref().unwrap_or_default(),
                        "search engine refused event"
                    );
                    report.failed += 1;
                }
                Err(e) => {
                    error!(repository = full_name, number, %title, uuid = %id, error = %e, "indexing event failed");
                    report.failed += 1;
                }
            }
        }

        report.webhook = self.webhooks.reconcile(full_name).await;
        report
    }
}

fn log_listing(repositories: &[Repository], now: DateTime<Utc>) {
    let mut new_repositories = 0;
    for (index, repository) in repositories.iter().enumerate() {
        if is_recent(repository.created_at, now) {
            new_repositories += 1;
        }
        debug!(
            index,
            repository = %repository.full_name,
            created_at = ?repository.created_at,
            age_hours = repository.created_at.map(|t| (now - t).num_hours()),
            "listed repository"
        );
    }
    info!(size = repositories.len(), new = new_repositories, "listed repositories");
}
