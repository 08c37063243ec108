use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Metadata the resolver fetched for one repository.
///
/// Immutable once built; every calculator reads the same instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub canonical_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub issues: Vec<Issue>,
    /// Supplied by resolvers that query closed issues separately.
    #[serde(default)]
    pub closed_issues: Option<Vec<Issue>>,
    #[serde(default)]
    pub pull_requests: Vec<PullRequest>,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueState {
    Open,
    Closed,
    Other(String),
}

impl From<String> for IssueState {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "open" => IssueState::Open,
            "closed" => IssueState::Closed,
            _ => IssueState::Other(raw),
        }
    }
}

impl From<IssueState> for String {
    fn from(state: IssueState) -> Self {
        match state {
            IssueState::Open => "open".to_string(),
            IssueState::Closed => "closed".to_string(),
            IssueState::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    pub state: IssueState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub additions: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub additions: Option<u64>,
}

/// Anything with an optional open/close pair of instants.
pub trait Lifespan {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn closed_at(&self) -> Option<DateTime<Utc>>;

    /// Hours between creation and close, when both are known.
    fn hours_open(&self) -> Option<f64> {
        let (created, closed) = (self.created_at()?, self.closed_at()?);
        Some(closed.signed_duration_since(created).num_milliseconds() as f64 / 3_600_000.0)
    }
}

impl Lifespan for Issue {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
}

impl Lifespan for PullRequest {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }
}

impl RepositorySnapshot {
    pub fn new(canonical_url: impl Into<String>) -> Self {
        Self {
            canonical_url: canonical_url.into(),
            ..Self::default()
        }
    }

    /// Number of closed issues, preferring the resolver's separate list.
    pub fn closed_issue_count(&self) -> usize {
        match &self.closed_issues {
            Some(closed) => closed.len(),
            None => self
                .issues
                .iter()
                .filter(|issue| issue.state == IssueState::Closed)
                .count(),
        }
    }

    /// Distinct author names across every contributor entry.
    pub fn distinct_authors(&self) -> usize {
        self.contributors
            .iter()
            .map(|c| c.author_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}
