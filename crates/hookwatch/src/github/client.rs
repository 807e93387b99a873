//! Authenticated GitHub REST client.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::GitHubError;
use super::pagination::next_page_url;
use super::types::{CreateWebhook, PullRequest, Repository, WebhookDescriptor};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::rate_limit::RateLimitTracker;

/// Public GitHub API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Value of the `X-GitHub-Api-Version` header sent with every request.
pub const API_VERSION: &str = "2022-11-28";

const USER_AGENT: &str = "hookwatch";

/// Default `per_page` for pull-request listings.
pub const DEFAULT_PR_PAGE_SIZE: u32 = 50;

/// One decoded page plus the URL of the page after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Empty when this is the last page.
    pub next: String,
}

/// GitHub REST client.
///
/// Every response, successful or not, feeds the shared [`RateLimitTracker`].
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_url: String,
    token: String,
    rate_limit: RateLimitTracker,
    pr_page_size: u32,
    webhook_page_size: u32,
}

impl GitHubClient {
    /// Create a client backed by reqwest with the given request timeout.
    pub fn new(
        api_url: &str,
        token: &str,
        rate_limit: RateLimitTracker,
        timeout: StdDuration,
    ) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Ok(Self::new_with_transport(
            api_url,
            token,
            rate_limit,
            Arc::new(transport),
        ))
    }

    pub fn new_with_transport(
        api_url: &str,
        token: &str,
        rate_limit: RateLimitTracker,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            rate_limit,
            pr_page_size: DEFAULT_PR_PAGE_SIZE,
            webhook_page_size: 0,
        }
    }

    /// Page size for pull-request listings; `0` omits `per_page`.
    #[must_use]
    pub fn with_pr_page_size(mut self, size: u32) -> Self {
        self.pr_page_size = size;
        self
    }

    /// Page size for webhook listings; `0` omits `per_page`.
    #[must_use]
    pub fn with_webhook_page_size(mut self, size: u32) -> Self {
        self.webhook_page_size = size;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn rate_limit(&self) -> &RateLimitTracker {
        &self.rate_limit
    }

    pub fn repositories_url(&self) -> String {
        format!("{}/user/repos", self.api_url)
    }

    pub fn pull_requests_url(&self, full_name: &str) -> String {
        let mut url = format!("{}/repos/{}/pulls?state=all", self.api_url, full_name);
        if self.pr_page_size > 0 {
            url.push_str(&format!("&per_page={}", self.pr_page_size));
        }
        url
    }

    /// Webhook listing URL. Creation posts to the same path without query.
    pub fn webhooks_url(&self, full_name: &str, with_page_size: bool) -> String {
        let url = format!("{}/repos/{}/hooks", self.api_url, full_name);
        if with_page_size && self.webhook_page_size > 0 {
            format!("{url}?per_page={}", self.webhook_page_size)
        } else {
            url
        }
    }

    fn request(&self, method: HttpMethod, url: &str) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", USER_AGENT)
            .header("Authorization", format!("Bearer {}", self.token))
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GitHubError> {
        let response = self.transport.send(request).await?;
        self.rate_limit.observe(&response.headers);
        Ok(response)
    }

    /// Fetch one page and decode it as a JSON array.
    ///
    /// Returns [`GitHubError::Unauthorized`] on 401 and
    /// [`GitHubError::StatusNotAccepted`] on any other non-200 status.
    pub async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>, GitHubError> {
        debug!(url, "fetching page");
        let response = self.send(self.request(HttpMethod::Get, url)).await?;

        match response.status {
            200 => {}
            401 => return Err(GitHubError::Unauthorized),
            status => return Err(GitHubError::status(status, url)),
        }

        let items: Vec<T> =
            serde_json::from_slice(&response.body).map_err(|e| GitHubError::decode(url, e))?;
        let next = next_page_url(response.header("link"));

        Ok(Page { items, next })
    }

    /// Follow `next` links from `first_url` until the last page, concatenating
    /// items in page order.
    pub async fn get_all_pages<T: DeserializeOwned>(
        &self,
        first_url: &str,
    ) -> Result<Vec<T>, GitHubError> {
        let mut items = Vec::new();
        let mut url = first_url.to_string();

        loop {
            let page: Page<T> = self.get_page(&url).await?;
            items.extend(page.items);
            if page.next.is_empty() {
                break;
            }
            url = page.next;
        }

        Ok(items)
    }

    /// Every repository the credential can access.
    pub async fn list_repositories(&self) -> Result<Vec<Repository>, GitHubError> {
        self.get_all_pages(&self.repositories_url()).await
    }

    /// Every pull request of `full_name`, open and closed.
    pub async fn list_pull_requests(
        &self,
        full_name: &str,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        self.get_all_pages(&self.pull_requests_url(full_name)).await
    }

    /// The first page of webhooks on `full_name`.
    ///
    /// Further pages are not followed.
    pub async fn list_webhooks(
        &self,
        full_name: &str,
    ) -> Result<Vec<WebhookDescriptor>, GitHubError> {
        let page = self.get_page(&self.webhooks_url(full_name, true)).await?;
        if !page.next.is_empty() {
            debug!(
                repository = full_name,
                next = %page.next,
                "webhook list has more pages; only the first is checked"
            );
        }
        Ok(page.items)
    }

    /// Register a webhook on `full_name`.
    pub async fn create_webhook(
        &self,
        full_name: &str,
        hook: &CreateWebhook,
    ) -> Result<WebhookDescriptor, GitHubError> {
        let url = self.webhooks_url(full_name, false);
        let body = serde_json::to_vec(hook)?;
        let response = self
            .send(self.request(HttpMethod::Post, &url).json_body(body))
            .await?;

        match response.status {
            200 | 201 => {}
            401 => return Err(GitHubError::Unauthorized),
            status => return Err(GitHubError::status(status, url)),
        }

        serde_json::from_slice(&response.body).map_err(|e| GitHubError::decode(url, e))
    }
}
