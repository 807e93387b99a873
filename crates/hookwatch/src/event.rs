//! Pull requests as indexable events.
//!
//! A polled pull request is wrapped in a [`PullRequestEvent`] shaped like the
//! `pull_request` webhook payload, so documents from polling and from pushed
//! webhooks can share one index. Polled events carry the
//! [`PERIODIC_PULL_ACTION`] action.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::github::{PullRequest, Repository, User};

/// Action label of events produced by polling.
pub const PERIODIC_PULL_ACTION: &str = "periodic_pull";

const FIELD_SEPARATOR: u8 = 0x1f;

/// Deterministic document ID of a pull request in a given state.
///
/// The ID is the first 16 bytes of SHA-256 over the four fields separated by
/// the ASCII unit separator. A state change yields a new ID, so each state a
/// pull request passes through is stored as its own document.
pub fn event_id(full_name: &str, id: i64, number: i64, state: &str) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(full_name.as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(id.to_string().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(number.to_string().as_bytes());
    hasher.update([FIELD_SEPARATOR]);
    hasher.update(state.as_bytes());
    let digest = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes)
}

/// The canonical event document for one pull request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PullRequestEvent {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub number: i64,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: Option<User>,
    pub assignee: Option<User>,
}

impl PullRequestEvent {
    /// Normalize a polled pull request.
    ///
    /// The event's repository is the pull request's base repository, or
    /// `crawled` when GitHub omitted it.
    pub fn from_pull_request(pull_request: PullRequest, crawled: &Repository) -> Self {
        let repository = pull_request
            .base
            .repo
            .clone()
            .unwrap_or_else(|| crawled.clone());
        let sender = pull_request
            .head
            .user
            .clone()
            .or_else(|| pull_request.user.clone());

        Self {
            timestamp: pull_request.created_at,
            action: PERIODIC_PULL_ACTION.to_string(),
            number: pull_request.number,
            assignee: pull_request.assignee.clone(),
            sender,
            repository,
            pull_request,
        }
    }

    pub fn id(&self) -> Uuid {
        event_id(
            &self.repository.full_name,
            self.pull_request.id,
            self.pull_request.number,
            &self.pull_request.state,
        )
    }

    /// Serialize for indexing, stamping `indexed_at` as the event timestamp.
    pub fn to_document(&mut self, indexed_at: DateTime<Utc>) -> Result<Vec<u8>, serde_json::Error> {
        self.timestamp = indexed_at;
        serde_json::to_vec(self)
    }
}
