//! hookwatch - polls GitHub pull requests into an Elasticsearch index.
//!
//! Every tick of the [`crawl::Scheduler`] handles one repository visible to
//! the configured token: its pull requests are normalized into
//! [`event::PullRequestEvent`] documents and written with create-only
//! semantics under a deterministic ID, and a `pull_request` webhook pointing
//! at the service is registered if missing.
//!
//! # Example
//!
//! ```ignore
//! use hookwatch::{
//!     Crawler, DEFAULT_API_URL, GitHubClient, RateLimitTracker, Scheduler, SearchClient,
//! };
//!
//! let rate_limit = RateLimitTracker::new();
//! let github = GitHubClient::new(DEFAULT_API_URL, &token, rate_limit.clone(), timeout)?;
//! let search = SearchClient::connect(&settings).await?;
//! let handle = Scheduler::start(Crawler::new(github, search, target), interval);
//! ```

pub mod crawl;
pub mod event;
pub mod github;
pub mod http;
pub mod rate_limit;
pub mod search;
pub mod webhook;

pub use crawl::{
    CrawlError, Crawler, RepositoryReport, Scheduler, SchedulerExit, SchedulerHandle, TickOutcome,
};
pub use event::{PERIODIC_PULL_ACTION, PullRequestEvent, event_id};
pub use github::{DEFAULT_API_URL, GitHubClient, GitHubError};
pub use http::{
    HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
    header_get,
};
pub use rate_limit::{LOW_QUOTA_THRESHOLD, RateLimitSnapshot, RateLimitTracker};
pub use search::{IndexOutcome, SearchClient, SearchError, SearchSettings};
pub use webhook::{WebhookOutcome, WebhookReconciler, webhook_url};
