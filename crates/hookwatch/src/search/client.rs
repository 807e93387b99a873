//! Create-only document writes against an Elasticsearch index.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::error::SearchError;
use crate::http::{
    HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
};

/// Connection settings for the search engine.
#[derive(Debug, Clone, Default)]
pub struct SearchSettings {
    /// Node URLs; the first one is used.
    pub addresses: Vec<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Base64-encoded PEM certificate to trust as an extra root.
    pub ca_cert: Option<String>,
    pub index: String,
    pub timeout: StdDuration,
}

/// Result of a create-only write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    Created,
    /// A document with this ID is already stored.
    AlreadyExists,
}

/// The `error` object of an engine error response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EngineErrorDetail {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EngineErrorBody {
    error: Option<EngineErrorDetail>,
}

/// Decode `{"error":{"type":..,"reason":..}}`, tolerating any other shape.
pub fn parse_engine_error(body: &[u8]) -> EngineErrorDetail {
    serde_json::from_slice::<EngineErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_default()
}

#[derive(Clone)]
pub struct SearchClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    index: String,
    authorization: Option<String>,
}

impl SearchClient {
    /// Build a client from `settings` and verify the index exists.
    pub async fn connect(settings: &SearchSettings) -> Result<Self, SearchError> {
        let base_url = settings
            .addresses
            .first()
            .filter(|a| !a.trim().is_empty())
            .ok_or(SearchError::NoAddress)?;

        let mut builder = reqwest::Client::builder().timeout(settings.timeout);
        if let Some(encoded) = settings.ca_cert.as_deref().filter(|c| !c.is_empty()) {
            let pem = BASE64
                .decode(encoded.trim())
                .map_err(|e| SearchError::InvalidCaCert(e.to_string()))?;
            let cert = reqwest::Certificate::from_pem(&pem)
                .map_err(|e| SearchError::InvalidCaCert(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let authorization = settings
            .username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|user| basic_auth(user, settings.password.as_deref().unwrap_or_default()));

        let client = Self::new_with_transport(
            base_url,
            &settings.index,
            authorization,
            Arc::new(ReqwestTransport::new(http)),
        );
        client.ensure_index().await?;
        info!(address = %client.base_url, index = %client.index, "connected to search engine");
        Ok(client)
    }

    pub fn new_with_transport(
        base_url: &str,
        index: &str,
        authorization: Option<String>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            authorization,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn request(&self, method: HttpMethod, url: String) -> HttpRequest {
        let request = HttpRequest::new(method, url);
        match &self.authorization {
            Some(value) => request.header("Authorization", value.clone()),
            None => request,
        }
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, SearchError> {
        Ok(self.transport.send(request).await?)
    }

    /// Check that the configured index exists.
    pub async fn ensure_index(&self) -> Result<(), SearchError> {
        let url = format!("{}/{}", self.base_url, self.index);
        let response = self.send(self.request(HttpMethod::Head, url.clone())).await?;

        match response.status {
            200 => Ok(()),
            404 => Err(SearchError::IndexMissing {
                index: self.index.clone(),
            }),
            401 => Err(SearchError::Unauthorized),
            status => Err(SearchError::UnexpectedStatus { status, url }),
        }
    }

    /// Store `document` under `id` unless a document with that ID exists.
    pub async fn create(&self, id: Uuid, document: Vec<u8>) -> Result<IndexOutcome, SearchError> {
        let url = format!("{}/{}/_create/{}", self.base_url, self.index, id);
        let response = self
            .send(self.request(HttpMethod::Put, url).json_body(document))
            .await?;

        match response.status {
            200 | 201 => Ok(IndexOutcome::Created),
            409 => {
                debug!(%id, "document already indexed");
                Ok(IndexOutcome::AlreadyExists)
            }
            401 => Err(SearchError::Unauthorized),
            status => {
                let detail = parse_engine_error(&response.body);
                Err(SearchError::Rejected {
                    status,
                    error_type: detail.error_type,
                    reason: detail.reason,
                })
            }
        }
    }
}

fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}
