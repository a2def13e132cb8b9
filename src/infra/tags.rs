//! Latest-tag lookup
//!
//! Queries the GitHub GraphQL API for the most recently created tag of a
//! repository and the commit it points at. Annotated tags are peeled to
//! their commit.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use crate::error::AcquireError;
use crate::infra::download::http_client;

/// A resolved tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Tag name (e.g. `v1.2.13`)
    pub name: String,
    /// Commit id the tag points at
    pub commit: String,
}

/// Repository tag lookup service
#[async_trait]
pub trait TagSource: Send + Sync {
    /// Most recently created tag of `owner/name`
    async fn latest_tag(&self, owner: &str, name: &str) -> Result<TagRef, AcquireError>;
}

const LATEST_TAG_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    refs(refPrefix: "refs/tags/", last: 1, orderBy: {field: TAG_COMMIT_DATE, direction: ASC}) {
      edges {
        node {
          name
          target {
            oid
            ... on Tag { target { oid } }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<QueryData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct QueryData {
    repository: Option<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    refs: Refs,
}

#[derive(Debug, Deserialize)]
struct Refs {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: RefNode,
}

#[derive(Debug, Deserialize)]
struct RefNode {
    name: String,
    target: Target,
}

#[derive(Debug, Deserialize)]
struct Target {
    oid: String,
    target: Option<Box<Target>>,
}

impl Target {
    fn commit(&self) -> &str {
        self.target.as_ref().map_or(self.oid.as_str(), |peeled| peeled.commit())
    }
}

/// GitHub GraphQL tag lookup client
#[derive(Debug, Clone)]
pub struct GithubTagClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl GithubTagClient {
    /// Create a client for a GraphQL endpoint (see [`crate::config::urls::GITHUB_GRAPHQL`])
    pub fn with_endpoint(endpoint: &str, token: &str) -> Self {
        Self {
            client: http_client(),
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        }
    }
}

#[async_trait]
impl TagSource for GithubTagClient {
    async fn latest_tag(&self, owner: &str, name: &str) -> Result<TagRef, AcquireError> {
        let failure = |reason: String| AcquireError::TagResolutionFailure {
            owner: owner.to_string(),
            name: name.to_string(),
            reason,
        };

        let body = json!({
            "query": LATEST_TAG_QUERY,
            "variables": { "owner": owner, "name": name },
        });

        tracing::debug!("Querying latest tag of {owner}/{name}");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| failure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failure(format!("HTTP {}", response.status())));
        }

        let parsed: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| failure(format!("invalid response: {e}")))?;

        if !parsed.errors.is_empty() {
            let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(failure(messages.join("; ")));
        }

        let repository = parsed
            .data
            .and_then(|d| d.repository)
            .ok_or_else(|| failure("repository not found".to_string()))?;

        let mut edges = repository.refs.edges;
        if edges.len() != 1 {
            return Err(failure(format!(
                "expected exactly one tag reference, found {}",
                edges.len()
            )));
        }

        let node = edges.remove(0).node;
        Ok(TagRef {
            commit: node.target.commit().to_string(),
            name: node.name,
        })
    }
}
