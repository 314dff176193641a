pub mod types;

pub use types::{PullRequestRef, RepoInfo};

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use types::{RepoResponse, SearchPage};

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "contrib-tracker";

/// Search page size; the termination checks below assume the API honors it.
const PAGE_SIZE: usize = 100;
/// Attempts per URL; rate-limited attempts count against this budget.
const MAX_FETCH_ATTEMPTS: u32 = 3;
/// Courtesy delay between search result pages.
const PAGE_DELAY: Duration = Duration::from_secs(1);
/// Courtesy delay between repository metadata fetches.
const REPO_DELAY: Duration = Duration::from_millis(300);
/// Assumed reset horizon when the rate-limit header is absent.
const DEFAULT_RESET_SLACK_SECS: u64 = 60;
const MIN_WAIT_SECS: u64 = 10;
const MAX_WAIT_SECS: u64 = 120;
/// Hard timeout on any single request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed after {attempts} retries: {url}")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Read-only JSON GET against the GitHub API.
///
/// The aggregation functions below are written against this trait so tests
/// can drive them with scripted responses.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, GitHubError>;
}

/// Outcome of a single fetch attempt. Rate limiting is the only retryable
/// state; every other failure propagates immediately.
enum Attempt {
    Done(Value),
    RateLimited(Duration),
}

pub struct GitHubClient {
    http: reqwest::Client,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self, GitHubError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, token })
    }

    async fn fetch_once(&self, url: &str) -> Result<Attempt, GitHubError> {
        let mut request = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::FORBIDDEN {
            let reset = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok());
            return Ok(Attempt::RateLimited(rate_limit_wait(reset, now_epoch())));
        }

        let body = response.error_for_status()?.json::<Value>().await?;
        Ok(Attempt::Done(body))
    }
}

#[async_trait]
impl ApiClient for GitHubClient {
    async fn get_json(&self, url: &str) -> Result<Value, GitHubError> {
        retry_rate_limited(url, || self.fetch_once(url)).await
    }
}

/// Drive fetch attempts until one yields a body, sleeping through rate
/// limits. Each rate-limited retry consumes one of the bounded attempts;
/// any other failure propagates without a retry.
async fn retry_rate_limited<F, Fut>(url: &str, mut fetch: F) -> Result<Value, GitHubError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Attempt, GitHubError>>,
{
    for attempt in 1..=MAX_FETCH_ATTEMPTS {
        match fetch().await? {
            Attempt::Done(body) => return Ok(body),
            Attempt::RateLimited(wait) => {
                println!("Rate limited. Waiting {}s...", wait.as_secs());
                warn!(attempt, wait_secs = wait.as_secs(), url, "rate limited");
                tokio::time::sleep(wait).await;
            }
        }
    }

    Err(GitHubError::RetriesExhausted {
        url: url.to_string(),
        attempts: MAX_FETCH_ATTEMPTS,
    })
}

/// Wait before retrying a rate-limited request: until the reported reset
/// (or 60s out when unreported), at least 10s and at most 120s.
fn rate_limit_wait(reset_epoch: Option<u64>, now_epoch: u64) -> Duration {
    let reset = reset_epoch.unwrap_or(now_epoch + DEFAULT_RESET_SLACK_SECS);
    let wait = reset.saturating_sub(now_epoch).max(MIN_WAIT_SECS);
    Duration::from_secs(wait.min(MAX_WAIT_SECS))
}

fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

fn search_url(user: &str, page: u32) -> String {
    format!(
        "{API_BASE}/search/issues?q=author:{user}+type:pr+is:merged+-user:{user}&per_page={PAGE_SIZE}&page={page}"
    )
}

/// Fetch every merged PR `user` authored in repositories the user does not
/// own, walking search pages until a short page or the reported total.
#[instrument(skip(client))]
pub async fn fetch_merged_prs(
    client: &impl ApiClient,
    user: &str,
) -> Result<Vec<PullRequestRef>, GitHubError> {
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
        let body = client.get_json(&search_url(user, page)).await?;
        let parsed: SearchPage = serde_json::from_value(body)?;

        let count = parsed.items.len();
        all.extend(parsed.items);
        debug!(page, count, total = parsed.total_count, "fetched search page");

        if count < PAGE_SIZE || all.len() >= parsed.total_count {
            break;
        }

        page += 1;
        tokio::time::sleep(PAGE_DELAY).await;
    }

    Ok(all)
}

/// Resolve metadata for every repository referenced by `prs`.
///
/// Each distinct repository URL is fetched exactly once, in first-encounter
/// order. PR counts are attributed by `full_name`, so two URLs that resolve
/// to the same repository (renames) merge into one entry.
#[instrument(skip(client, prs))]
pub async fn resolve_repositories(
    client: &impl ApiClient,
    prs: &[PullRequestRef],
) -> Result<Vec<RepoInfo>, GitHubError> {
    let mut seen = HashSet::new();
    let mut pending: Vec<&str> = Vec::new();
    for pr in prs {
        if seen.insert(pr.repository_url.as_str()) {
            pending.push(pr.repository_url.as_str());
        }
    }

    let mut cache: HashMap<String, RepoResponse> = HashMap::with_capacity(pending.len());
    for (i, url) in pending.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(REPO_DELAY).await;
        }
        let body = client.get_json(url).await?;
        let repo: RepoResponse = serde_json::from_value(body)?;
        debug!(url, full_name = repo.full_name.as_str(), "resolved repository");
        cache.insert((*url).to_string(), repo);
    }

    let mut repos: Vec<RepoInfo> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for pr in prs {
        let Some(response) = cache.get(&pr.repository_url) else {
            continue;
        };
        let slot = match index.get(response.full_name.as_str()) {
            Some(&slot) => slot,
            None => {
                index.insert(response.full_name.clone(), repos.len());
                repos.push(RepoInfo::from_response(response.clone()));
                repos.len() - 1
            }
        };
        repos[slot].pr_count += 1;
    }

    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted client: hands out canned bodies in order and records every
    /// requested URL.
    struct MockApi {
        responses: Mutex<VecDeque<Value>>,
        requests: Mutex<Vec<String>>,
    }

    impl MockApi {
        fn new(responses: Vec<Value>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApiClient for MockApi {
        async fn get_json(&self, url: &str) -> Result<Value, GitHubError> {
            self.requests.lock().unwrap().push(url.to_string());
            let body = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("no scripted response left");
            Ok(body)
        }
    }

    fn urls(range: std::ops::Range<usize>) -> Vec<String> {
        range
            .map(|i| format!("https://api.github.com/repos/o/r{i}"))
            .collect()
    }

    fn search_page(total: usize, urls: &[String]) -> Value {
        let items: Vec<Value> = urls
            .iter()
            .map(|url| serde_json::json!({ "repository_url": url }))
            .collect();
        serde_json::json!({ "total_count": total, "items": items })
    }

    fn repo_body(full_name: &str, stars: u64) -> Value {
        serde_json::json!({
            "full_name": full_name,
            "html_url": format!("https://github.com/{full_name}"),
            "description": "d",
            "stargazers_count": stars,
            "topics": [],
            "language": null,
        })
    }

    fn pr(url: &str) -> PullRequestRef {
        PullRequestRef {
            repository_url: url.to_string(),
        }
    }

    #[test]
    fn test_wait_defaults_to_sixty_seconds_without_reset_header() {
        assert_eq!(rate_limit_wait(None, 1_000), Duration::from_secs(60));
    }

    #[test]
    fn test_wait_has_a_ten_second_floor() {
        assert_eq!(rate_limit_wait(Some(1_003), 1_000), Duration::from_secs(10));
        // reset already in the past
        assert_eq!(rate_limit_wait(Some(900), 1_000), Duration::from_secs(10));
    }

    #[test]
    fn test_wait_is_capped_at_two_minutes() {
        assert_eq!(
            rate_limit_wait(Some(10_000), 1_000),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn test_wait_tracks_the_reported_reset() {
        assert_eq!(rate_limit_wait(Some(1_045), 1_000), Duration::from_secs(45));
    }

    #[test]
    fn test_client_construction() {
        assert!(GitHubClient::new(None).is_ok());
        assert!(GitHubClient::new(Some("ghp_token".to_string())).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_attempt_sleeps_then_retries() {
        let script: RefCell<VecDeque<Result<Attempt, GitHubError>>> =
            RefCell::new(VecDeque::from(vec![
                Ok(Attempt::RateLimited(Duration::from_secs(10))),
                Ok(Attempt::Done(serde_json::json!({"ok": true}))),
            ]));

        let body = retry_rate_limited("https://api.github.com/x", || {
            std::future::ready(script.borrow_mut().pop_front().expect("script exhausted"))
        })
        .await
        .unwrap();

        assert_eq!(body, serde_json::json!({"ok": true}));
        assert!(script.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_rate_limit_attempts_fail() {
        let mut calls = 0u32;
        let err = retry_rate_limited("https://api.github.com/x", || {
            calls += 1;
            std::future::ready(Ok(Attempt::RateLimited(Duration::from_secs(10))))
        })
        .await
        .unwrap_err();

        assert_eq!(calls, 3);
        match err {
            GitHubError::RetriesExhausted { url, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(url, "https://api.github.com/x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_non_rate_limit_failure_is_not_retried() {
        let mut calls = 0u32;
        let result = retry_rate_limited("https://api.github.com/x", || {
            calls += 1;
            let decode = serde_json::from_str::<Value>("not json").unwrap_err();
            std::future::ready(Err(GitHubError::Decode(decode)))
        })
        .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Err(GitHubError::Decode(_))));
    }

    #[test]
    fn test_search_url_filters_to_merged_external_prs() {
        let url = search_url("octocat", 2);
        assert!(url.contains("author:octocat"));
        assert!(url.contains("type:pr"));
        assert!(url.contains("is:merged"));
        assert!(url.contains("-user:octocat"));
        assert!(url.contains("per_page=100"));
        assert!(url.ends_with("&page=2"));
    }

    #[tokio::test]
    async fn test_single_short_page_stops_pagination() {
        let client = MockApi::new(vec![search_page(47, &urls(0..47))]);
        let prs = fetch_merged_prs(&client, "octocat").await.unwrap();
        assert_eq!(prs.len(), 47);
        assert_eq!(client.requested().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_every_page_until_total_reached() {
        let all = urls(0..250);
        let client = MockApi::new(vec![
            search_page(250, &all[..100]),
            search_page(250, &all[100..200]),
            search_page(250, &all[200..]),
        ]);

        let prs = fetch_merged_prs(&client, "octocat").await.unwrap();
        assert_eq!(prs.len(), 250);
        assert_eq!(prs[0].repository_url, all[0]);
        assert_eq!(prs[249].repository_url, all[249]);

        let requests = client.requested();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].ends_with("&page=1"));
        assert!(requests[1].ends_with("&page=2"));
        assert!(requests[2].ends_with("&page=3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_total_count_when_last_page_is_full() {
        let all = urls(0..200);
        let client = MockApi::new(vec![
            search_page(200, &all[..100]),
            search_page(200, &all[100..]),
        ]);

        let prs = fetch_merged_prs(&client, "octocat").await.unwrap();
        assert_eq!(prs.len(), 200);
        assert_eq!(client.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_search_result() {
        let client = MockApi::new(vec![search_page(0, &[])]);
        let prs = fetch_merged_prs(&client, "octocat").await.unwrap();
        assert!(prs.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolves_each_repository_once_and_counts_prs() {
        let prs = vec![
            pr("https://api.github.com/repos/x/y"),
            pr("https://api.github.com/repos/a/b"),
            pr("https://api.github.com/repos/x/y"),
        ];
        let client = MockApi::new(vec![repo_body("x/y", 10), repo_body("a/b", 5)]);

        let repos = resolve_repositories(&client, &prs).await.unwrap();

        assert_eq!(
            client.requested(),
            vec![
                "https://api.github.com/repos/x/y",
                "https://api.github.com/repos/a/b",
            ]
        );
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].full_name, "x/y");
        assert_eq!(repos[0].pr_count, 2);
        assert_eq!(repos[1].full_name, "a/b");
        assert_eq!(repos[1].pr_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_merges_distinct_urls_with_the_same_full_name() {
        // A renamed repository keeps its old search URL alive.
        let prs = vec![
            pr("https://api.github.com/repos/x/old-name"),
            pr("https://api.github.com/repos/x/new-name"),
        ];
        let client = MockApi::new(vec![
            repo_body("x/new-name", 10),
            repo_body("x/new-name", 10),
        ]);

        let repos = resolve_repositories(&client, &prs).await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].full_name, "x/new-name");
        assert_eq!(repos[0].pr_count, 2);
    }

    #[tokio::test]
    async fn test_resolve_with_no_prs() {
        let client = MockApi::new(vec![]);
        let repos = resolve_repositories(&client, &[]).await.unwrap();
        assert!(repos.is_empty());
        assert!(client.requested().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_then_classify_shared_repository() {
        use crate::classify::{self, Category, ClassifyRules};

        let prs = vec![
            pr("https://api.github.com/repos/x/y"),
            pr("https://api.github.com/repos/x/y"),
        ];
        let client = MockApi::new(vec![serde_json::json!({
            "full_name": "x/y",
            "html_url": "https://github.com/x/y",
            "description": "kubernetes deploy",
            "stargazers_count": 3,
            "topics": ["alpha", "beta", "gamma"],
            "language": "Go",
        })]);

        let repos = resolve_repositories(&client, &prs).await.unwrap();
        assert_eq!(client.requested().len(), 1);
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].pr_count, 2);

        let rules = ClassifyRules::new();
        assert_eq!(
            classify::categorize(&repos[0], &rules),
            Category::Infrastructure
        );
    }
}
