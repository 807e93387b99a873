//! Keeps a `pull_request` webhook registered on every crawled repository.

use tracing::{debug, error, info};

use crate::github::{CreateWebhook, GitHubClient, GitHubError};

/// Join the public base address and the webhook path with exactly one `/`.
///
/// Returns `None` when either part is empty.
pub fn webhook_url(public_address: &str, endpoint: &str) -> Option<String> {
    let base = public_address.trim().trim_end_matches('/');
    let path = endpoint.trim().trim_start_matches('/');
    if base.is_empty() || path.is_empty() {
        return None;
    }
    Some(format!("{base}/{path}"))
}

/// What reconciliation did for one repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// No target URL configured.
    Skipped,
    /// A webhook with the target URL already exists.
    Present,
    Created,
    Failed,
}

/// Register a webhook delivering to `target` on `full_name` unless one with
/// that URL is already there.
///
/// Returns `Ok(false)` when it was already present.
pub async fn ensure_webhook(
    client: &GitHubClient,
    full_name: &str,
    target: &str,
) -> Result<bool, GitHubError> {
    let hooks = client.list_webhooks(full_name).await?;
    if hooks.iter().any(|hook| hook.targets(target)) {
        return Ok(false);
    }

    let created = client
        .create_webhook(full_name, &CreateWebhook::pull_requests(target))
        .await?;
    debug!(
        repository = full_name,
        id = created.id,
        url = created.config.url.as_deref().unwrap_or_default(),
        last_response = ?created.last_response.code,
        "webhook created"
    );
    Ok(true)
}

#[derive(Clone)]
pub struct WebhookReconciler {
    client: GitHubClient,
    target: Option<String>,
}

impl WebhookReconciler {
    pub fn new(client: GitHubClient, target: Option<String>) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Reconcile one repository. Failures are logged, never returned.
    pub async fn reconcile(&self, full_name: &str) -> WebhookOutcome {
        let Some(target) = self.target.as_deref() else {
            return WebhookOutcome::Skipped;
        };

        match ensure_webhook(&self.client, full_name, target).await {
            Ok(true) => {
                info!(repository = full_name, url = target, "registered webhook");
                WebhookOutcome::Created
            }
            Ok(false) => {
                debug!(repository = full_name, url = target, "webhook already registered");
                WebhookOutcome::Present
            }
            Err(e) => {
                error!(repository = full_name, url = target, error = %e, "webhook reconciliation failed");
                WebhookOutcome::Failed
            }
        }
    }
}
