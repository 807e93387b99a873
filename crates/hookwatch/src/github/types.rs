//! GitHub REST payload types.
//!
//! Only the fields the crawler and the indexed documents care about are
//! modelled. Fields GitHub documents as nullable are `Option`s; collections
//! default to empty when the key is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account (user, organization or bot).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: i64,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub site_admin: bool,
}

/// A repository as returned by `/user/repos` and embedded in pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: i64,
    #[serde(default)]
    pub node_id: String,
    pub name: String,
    pub full_name: String,
    pub owner: User,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub fork: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub topics: Vec<String>,
    pub visibility: Option<String>,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub open_issues_count: i64,
}

/// A branch reference on either side of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub label: Option<String>,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    pub user: Option<User>,
    /// Null when the head fork has been deleted.
    pub repo: Option<Repository>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: i64,
    #[serde(default)]
    pub node_id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    #[serde(default)]
    pub node_id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub privacy: Option<String>,
    pub permission: Option<String>,
}

/// A pull request snapshot from `/repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    #[serde(default)]
    pub url: String,
    pub id: i64,
    #[serde(default)]
    pub node_id: String,
    pub number: i64,
    pub state: String,
    #[serde(default)]
    pub locked: bool,
    pub title: String,
    pub user: Option<User>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    pub merge_commit_sha: Option<String>,
    pub assignee: Option<User>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub requested_reviewers: Vec<User>,
    #[serde(default)]
    pub requested_teams: Vec<Team>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub draft: bool,
    pub head: Reference,
    pub base: Reference,
    #[serde(default)]
    pub author_association: String,
    /// Only present on the single-PR endpoint, absent from list responses.
    pub merged: Option<bool>,
    pub mergeable: Option<bool>,
    pub merged_by: Option<User>,
}

impl PullRequest {
    /// Whether GitHub reports this pull request as closed (merged or not).
    pub fn is_closed(&self) -> bool {
        self.state.eq_ignore_ascii_case("closed")
    }
}

/// Delivery configuration of a repository webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure_ssl: Option<String>,
}

/// Outcome of the most recent delivery attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookLastResponse {
    pub code: Option<i64>,
    pub status: Option<String>,
    pub message: Option<String>,
}

/// A webhook registered on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookDescriptor {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub config: WebhookConfig,
    #[serde(default)]
    pub last_response: WebhookLastResponse,
}

impl WebhookDescriptor {
    /// Whether this webhook delivers to `target`.
    ///
    /// Only the URL is compared; event subscriptions and content type are
    /// not inspected.
    pub fn targets(&self, target: &str) -> bool {
        self.config.url.as_deref() == Some(target)
    }
}

/// Request body for `POST /repos/{owner}/{repo}/hooks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateWebhook {
    pub name: String,
    pub active: bool,
    pub events: Vec<String>,
    pub config: WebhookConfig,
}

impl CreateWebhook {
    /// A JSON `pull_request` subscription delivering to `url`.
    pub fn pull_requests(url: impl Into<String>) -> Self {
        Self {
            name: "web".to_string(),
            active: true,
            events: vec!["pull_request".to_string()],
            config: WebhookConfig {
                url: Some(url.into()),
                content_type: Some("json".to_string()),
                insecure_ssl: None,
            },
        }
    }
}
