use serde::Deserialize;

/// One merged pull request as returned by the search endpoint.
///
/// Only the owning repository matters downstream, so the rest of the
/// search record is dropped at deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestRef {
    /// API URL of the repository the PR was merged into
    pub repository_url: String,
}

/// One page of search results.
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    /// Total matches across all pages, as reported by the API
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub items: Vec<PullRequestRef>,
}

/// Repository metadata as returned by the repository endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoResponse {
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub stargazers_count: u64,
    #[serde(default)]
    pub topics: Vec<String>,
    pub language: Option<String>,
}

/// A repository the tracked user has contributed to.
///
/// Built once from the API response; only `pr_count` changes afterwards,
/// incremented as merged PRs are attributed to the repository.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    /// `owner/name`
    pub full_name: String,
    /// Web URL used for the rendered link
    pub url: String,
    pub description: Option<String>,
    pub stars: u64,
    /// Owner-assigned topic labels
    pub topics: Vec<String>,
    /// Primary language reported by the API
    pub language: Option<String>,
    /// Merged PRs attributed to this repository during the run
    pub pr_count: usize,
}

impl RepoInfo {
    pub fn from_response(response: RepoResponse) -> Self {
        Self {
            full_name: response.full_name,
            url: response.html_url,
            description: response.description,
            stars: response.stargazers_count,
            topics: response.topics,
            language: response.language,
            pr_count: 0,
        }
    }
}
