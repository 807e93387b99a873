//! Full crawl cycles against scripted GitHub and search-engine responses.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use hookwatch::{
    Crawler, GitHubClient, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpTransport,
    RateLimitTracker, SearchClient, TickOutcome, WebhookOutcome, event_id,
};

const API: &str = "https://api.github.test";
const ES: &str = "http://search.test:9200";
const INDEX: &str = "application-github-webhook-test";
const TARGET: &str = "https://hooks.example.test/webhook";

/// Replays canned responses keyed by method and URL, recording every request.
#[derive(Clone, Default)]
struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

#[derive(Default)]
struct Script {
    responses: HashMap<(HttpMethod, String), VecDeque<HttpResponse>>,
    log: Vec<HttpRequest>,
}

impl ScriptedTransport {
    fn respond(
        &self,
        method: HttpMethod,
        url: impl Into<String>,
        status: u16,
        headers: &[(&str, &str)],
        body: Value,
    ) {
        let response = HttpResponse {
            status,
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: serde_json::to_vec(&body).unwrap(),
        };
        self.inner
            .lock()
            .unwrap()
            .responses
            .entry((method, url.into()))
            .or_default()
            .push_back(response);
    }

    fn log(&self) -> Vec<HttpRequest> {
        self.inner.lock().unwrap().log.clone()
    }

    fn urls(&self) -> Vec<String> {
        self.log().into_iter().map(|r| r.url).collect()
    }

    fn clear_log(&self) {
        self.inner.lock().unwrap().log.clear();
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let mut script = self.inner.lock().unwrap();
        let key = (request.method, request.url.clone());
        script.log.push(request);
        script
            .responses
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| HttpError::Unscripted {
                method: key.0.as_str().to_string(),
                url: key.1,
            })
    }
}

/// In-memory index honouring create-only semantics.
#[derive(Clone, Default)]
struct MemoryIndex {
    documents: Arc<Mutex<HashMap<String, Value>>>,
}

#[async_trait]
impl HttpTransport for MemoryIndex {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let prefix = format!("{ES}/{INDEX}/_create/");
        let id = request
            .url
            .strip_prefix(&prefix)
            .ok_or_else(|| HttpError::Transport(format!("unexpected url {}", request.url)))?
            .to_string();

        let mut documents = self.documents.lock().unwrap();
        let status = if documents.contains_key(&id) {
            409
        } else {
            let body: Value = serde_json::from_slice(&request.body)
                .map_err(|e| HttpError::Transport(e.to_string()))?;
            documents.insert(id, body);
            201
        };

        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        })
    }
}

impl MemoryIndex {
    fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    fn get(&self, id: &str) -> Option<Value> {
        self.documents.lock().unwrap().get(id).cloned()
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
}

fn user(login: &str) -> Value {
    json!({ "login": login, "id": 7, "type": "User" })
}

fn repository(full_name: &str) -> Value {
    let (owner, name) = full_name.split_once('/').unwrap();
    json!({
        "id": 100,
        "name": name,
        "full_name": full_name,
        "owner": user(owner),
        "private": true,
        "description": null,
        "created_at": "2024-06-09T20:00:00Z",
        "updated_at": null,
        "pushed_at": null,
        "homepage": null,
        "language": "Rust",
        "visibility": "private",
        "default_branch": "main"
    })
}

fn pull_request(
    full_name: &str,
    number: i64,
    state: &str,
    closed_at: Option<DateTime<Utc>>,
) -> Value {
    json!({
        "id": 5000 + number,
        "number": number,
        "state": state,
        "title": format!("PR {number}"),
        "user": user("dev"),
        "body": "details",
        "created_at": "2024-01-02T03:04:05Z",
        "updated_at": "2024-01-02T03:04:05Z",
        "closed_at": closed_at.map(|t| t.to_rfc3339()),
        "merged_at": null,
        "merge_commit_sha": null,
        "assignee": user("reviewer"),
        "head": { "label": "dev:topic", "ref": "topic", "sha": "1", "user": user("dev"), "repo": null },
        "base": { "label": "o:main", "ref": "main", "sha": "2", "user": user("o"), "repo": repository(full_name) }
    })
}

struct Service {
    github: ScriptedTransport,
    index: MemoryIndex,
    crawler: Crawler,
}

fn service() -> Service {
    let github = ScriptedTransport::default();
    let index = MemoryIndex::default();
    let client = GitHubClient::new_with_transport(
        API,
        "token",
        RateLimitTracker::new(),
        Arc::new(github.clone()),
    );
    let search = SearchClient::new_with_transport(ES, INDEX, None, Arc::new(index.clone()));
    let crawler = Crawler::new(client, search, Some(TARGET.to_string()));
    Service {
        github,
        index,
        crawler,
    }
}

fn script_listing(github: &ScriptedTransport, names: &[&str], remaining: &str) {
    github.respond(
        HttpMethod::Get,
        format!("{API}/user/repos"),
        200,
        &[("X-RateLimit-Remaining", remaining), ("X-RateLimit-Limit", "5000")],
        Value::Array(names.iter().map(|n| repository(n)).collect()),
    );
}

fn script_repository(github: &ScriptedTransport, full_name: &str, pulls: Value) {
    github.respond(
        HttpMethod::Get,
        format!("{API}/repos/{full_name}/pulls?state=all&per_page=50"),
        200,
        &[("X-RateLimit-Remaining", "4500")],
        pulls,
    );
    github.respond(
        HttpMethod::Get,
        format!("{API}/repos/{full_name}/hooks"),
        200,
        &[],
        json!([{ "id": 1, "config": { "url": TARGET } }]),
    );
}

fn processed(outcome: TickOutcome) -> hookwatch::RepositoryReport {
    match outcome {
        TickOutcome::Processed(report) => report,
        other => panic!("expected a processed repository, got {other:?}"),
    }
}

#[tokio::test]
async fn two_repositories_take_two_ticks_then_relist() {
    let mut svc = service();
    script_listing(&svc.github, &["o/a", "o/b"], "4900");
    script_repository(&svc.github, "o/a", json!([pull_request("o/a", 1, "open", None)]));
    script_repository(&svc.github, "o/b", json!([pull_request("o/b", 1, "open", None)]));

    let first = processed(svc.crawler.tick_at(now()).await.unwrap());
    assert_eq!(first.repository, "o/a");
    assert_eq!(svc.crawler.cursor().position(), 1);

    let second = processed(svc.crawler.tick_at(now()).await.unwrap());
    assert_eq!(second.repository, "o/b");
    assert!(svc.crawler.cursor().needs_listing());

    svc.github.clear_log();
    script_listing(&svc.github, &["o/a", "o/b"], "4800");
    script_repository(&svc.github, "o/a", json!([pull_request("o/a", 1, "open", None)]));

    let third = processed(svc.crawler.tick_at(now()).await.unwrap());
    assert_eq!(third.repository, "o/a");
    assert_eq!(
        svc.github.urls().first().map(String::as_str),
        Some(format!("{API}/user/repos").as_str())
    );
    assert_eq!(third.indexed, 0);
    assert_eq!(third.already_present, 1);
    assert_eq!(svc.index.len(), 2);
}

#[tokio::test]
async fn quota_gate_blocks_at_1999_and_opens_at_2001() {
    let mut svc = service();
    script_listing(&svc.github, &["o/a"], "1999");

    let outcome = svc.crawler.tick_at(now()).await.unwrap();
    assert_eq!(outcome, TickOutcome::QuotaLow { remaining: 1999 });
    assert_eq!(svc.github.urls(), [format!("{API}/user/repos")]);
    assert_eq!(svc.index.len(), 0);

    let mut svc = service();
    script_listing(&svc.github, &["o/a"], "2001");
    script_repository(&svc.github, "o/a", json!([pull_request("o/a", 1, "open", None)]));

    let report = processed(svc.crawler.tick_at(now()).await.unwrap());
    assert_eq!(report.repository, "o/a");
    assert_eq!(report.webhook, WebhookOutcome::Present);
    assert_eq!(svc.index.len(), 1);
}

#[tokio::test]
async fn pull_request_pages_are_followed_to_the_end() {
    let mut svc = service();
    script_listing(&svc.github, &["o/a"], "4000");

    let first = format!("{API}/repos/o/a/pulls?state=all&per_page=50");
    let second = format!("{API}/repositories/100/pulls?state=all&per_page=50&page=2");
    let next = format!(r#"<{second}>; rel="next", <{second}>; rel="last""#);
    svc.github.respond(
        HttpMethod::Get,
        first.clone(),
        200,
        &[("Link", next.as_str())],
        json!([pull_request("o/a", 1, "open", None), pull_request("o/a", 2, "open", None)]),
    );
    svc.github.respond(
        HttpMethod::Get,
        second.clone(),
        200,
        &[],
        json!([pull_request("o/a", 3, "open", None)]),
    );
    svc.github.respond(
        HttpMethod::Get,
        format!("{API}/repos/o/a/hooks"),
        200,
        &[],
        json!([]),
    );
    svc.github.respond(
        HttpMethod::Post,
        format!("{API}/repos/o/a/hooks"),
        201,
        &[],
        json!({ "id": 9, "active": true, "events": ["pull_request"], "config": { "url": TARGET, "content_type": "json" } }),
    );

    let report = processed(svc.crawler.tick_at(now()).await.unwrap());

    assert_eq!(report.fetched, 3);
    assert_eq!(report.indexed, 3);
    assert_eq!(report.webhook, WebhookOutcome::Created);
    for number in 1..=3 {
        let id = event_id("o/a", 5000 + number, number, "open").to_string();
        assert!(svc.index.get(&id).is_some(), "missing PR {number}");
    }
    let urls = svc.github.urls();
    assert_eq!(urls[1], first);
    assert_eq!(urls[2], second);
}

#[tokio::test]
async fn retention_boundary_and_document_shape() {
    let mut svc = service();
    script_listing(&svc.github, &["o/a"], "4000");
    script_repository(
        &svc.github,
        "o/a",
        json!([
            pull_request("o/a", 1, "closed", Some(now() - Duration::hours(47) - Duration::minutes(59))),
            pull_request("o/a", 2, "closed", Some(now() - Duration::hours(48) - Duration::minutes(1))),
            pull_request("o/a", 3, "open", None),
        ]),
    );

    let report = processed(svc.crawler.tick_at(now()).await.unwrap());
    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.indexed, 2);

    let kept = event_id("o/a", 5001, 1, "closed").to_string();
    let dropped = event_id("o/a", 5002, 2, "closed").to_string();
    assert!(svc.index.get(&dropped).is_none());

    let document = svc.index.get(&kept).expect("recently closed PR is indexed");
    assert_eq!(document["action"], "periodic_pull");
    assert_eq!(document["number"], 1);
    assert_eq!(document["repository"]["full_name"], "o/a");
    assert_eq!(document["sender"]["login"], "dev");
    assert_eq!(document["assignee"]["login"], "reviewer");
    assert_ne!(document["timestamp"], document["pull_request"]["created_at"]);
}

#[tokio::test]
async fn unauthorized_listing_stops_the_crawler() {
    let mut svc = service();
    svc.github.respond(
        HttpMethod::Get,
        format!("{API}/user/repos"),
        401,
        &[],
        json!({ "message": "Bad credentials" }),
    );

    let err = svc.crawler.tick_at(now()).await.unwrap_err();
    assert!(matches!(err, hookwatch::CrawlError::Unauthorized(_)));
}
