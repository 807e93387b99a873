//! GitHub REST API access.
//!
//! # Module Structure
//!
//! - [`error`] - Error type for GitHub API operations
//! - [`types`] - Repository, pull request and webhook payloads
//! - [`client`] - Authenticated client with `Link` pagination
//! - [`pagination`] - `Link` header parsing

mod client;
mod error;
mod pagination;
pub(crate) mod types;

pub use client::{API_VERSION, DEFAULT_API_URL, DEFAULT_PR_PAGE_SIZE, GitHubClient, Page};
pub use error::GitHubError;
pub use pagination::{LinkRelations, next_page_url, parse_link_header};
pub use types::{
    CreateWebhook, Label, PullRequest, Reference, Repository, Team, User, WebhookConfig,
    WebhookDescriptor, WebhookLastResponse,
};
