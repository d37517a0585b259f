//! forge::github
//!
//! GitHub driver using the REST contents and commits APIs.
//!
//! # Design
//!
//! Documents are read and written through `/repos/{owner}/{repo}/contents`.
//! Content travels base64-encoded; the blob `sha` is the revision id and is
//! sent back on update and delete, so GitHub itself rejects stale writes
//! (409). A create on an occupied path is answered with 422 because no
//! `sha` was supplied.
//!
//! # GitHub Enterprise
//!
//! `base_url` replaces the whole API base, e.g.
//! `https://github.example.com/api/v3`.
//!
//! # Example
//!
//! ```ignore
//! use gitmark::core::config::ProviderConfig;
//! use gitmark::forge::github::GitHubDriver;
//! use gitmark::forge::ProviderDriver;
//!
//! let driver = GitHubDriver::new(&ProviderConfig {
//!     platform: "github".into(),
//!     token: "ghp_xxx".into(),
//!     owner: "acme".into(),
//!     repo: "handbook".into(),
//!     ..Default::default()
//! });
//! let files = driver.list_files().await?;
//! ```

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::http::{decode_base64, encode_base64, encode_path, AuthScheme, HttpTransport};
use super::traits::{ProviderDriver, ProviderError, RequestKind, HISTORY_PAGE_SIZE};
use crate::core::config::ProviderConfig;
use crate::core::frontmatter;
use crate::core::paths::{join_remote, strip_root};
use crate::core::types::{
    short_id, FileContent, FileInfo, Frontmatter, RevisionAuthor, RevisionHistoryEntry,
    UpdateResult,
};

/// Default GitHub API base URL.
const DEFAULT_API_BASE: &str = "https://api.github.com";

/// GitHub REST media type.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// GitHub provider driver.
#[derive(Debug)]
pub struct GitHubDriver {
    http: HttpTransport,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// Root directory inside the repository
    root: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

impl GitHubDriver {
    pub fn new(config: &ProviderConfig) -> Self {
        let api_base = config
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();
        Self {
            http: HttpTransport::new("github", AuthScheme::Token, config.token.clone())
                .with_accept(GITHUB_ACCEPT),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            root: config.path.clone(),
            api_base,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, endpoint
        )
    }

    /// Contents URL for a root-relative path.
    fn contents_url(&self, relative: &str) -> String {
        let full = join_remote(&self.root, relative);
        if full.is_empty() {
            self.repo_url("contents")
        } else {
            self.repo_url(&format!("contents/{}", encode_path(&full)))
        }
    }

    async fn read(&self, path: &str, revision: Option<&str>) -> Result<FileContent, ProviderError> {
        let url = self.contents_url(path);
        let query: Vec<(&str, &str)> = revision.map(|r| ("ref", r)).into_iter().collect();
        let file: ContentsFile = self.http.get(&url, &query).await?;
        file.into_content(path)
    }
}

#[async_trait]
impl ProviderDriver for GitHubDriver {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn list_entries(&self, dir: &str) -> Result<Vec<FileInfo>, ProviderError> {
        let listing: serde_json::Value = self.http.get(&self.contents_url(dir), &[]).await?;
        entries_from_listing(listing, &self.root)
    }

    async fn get_file(&self, path: &str) -> Result<FileContent, ProviderError> {
        self.read(path, None).await
    }

    async fn get_file_at_revision(
        &self,
        path: &str,
        revision: &str,
    ) -> Result<FileContent, ProviderError> {
        self.read(path, Some(revision)).await
    }

    async fn create_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let body = PutContentsBody {
            message: format!("Create {path}"),
            content: encode_base64(&frontmatter::encode(frontmatter, content)),
            sha: None,
        };
        let response: WriteResponse = self
            .http
            .send(Method::PUT, &self.contents_url(path), &body, RequestKind::Create)
            .await?;
        Ok(response.into())
    }

    async fn update_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let body = PutContentsBody {
            message: format!("Update {path}"),
            content: encode_base64(&frontmatter::encode(frontmatter, content)),
            sha: Some(revision_id.to_string()),
        };
        let response: WriteResponse = self
            .http
            .send(Method::PUT, &self.contents_url(path), &body, RequestKind::Update)
            .await?;
        Ok(response.into())
    }

    async fn delete_file(
        &self,
        path: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let body = DeleteContentsBody {
            message: format!("Delete {path}"),
            sha: revision_id.to_string(),
        };
        let response: WriteResponse = self
            .http
            .send(Method::DELETE, &self.contents_url(path), &body, RequestKind::Delete)
            .await?;
        Ok(response.into())
    }

    async fn list_revisions(&self, path: &str) -> Result<Vec<RevisionHistoryEntry>, ProviderError> {
        let full = join_remote(&self.root, path);
        let per_page = HISTORY_PAGE_SIZE.to_string();
        let commits: Vec<CommitListItem> = self
            .http
            .get(
                &self.repo_url("commits"),
                &[("path", full.as_str()), ("per_page", per_page.as_str())],
            )
            .await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }
}

// --------------------------------------------------------------------------
// Contents API types (shared with Gitea, which mirrors this API)
// --------------------------------------------------------------------------

/// One entry of a directory listing.
#[derive(Deserialize)]
pub(super) struct ContentsEntry {
    name: String,
    path: String,
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

/// A single file from the contents endpoint.
#[derive(Deserialize)]
pub(super) struct ContentsFile {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<String>,
    sha: String,
}

impl ContentsFile {
    pub(super) fn into_content(self, path: &str) -> Result<FileContent, ProviderError> {
        if self.kind != "file" {
            return Err(ProviderError::NotFound(format!("{path} is not a file")));
        }
        let raw = decode_base64(self.content.as_deref().unwrap_or(""))?;
        let mut decoded = frontmatter::decode(&raw);
        decoded.revision_id = Some(self.sha);
        decoded.path = Some(path.to_string());
        Ok(decoded)
    }
}

/// Convert a directory listing into root-relative file infos.
///
/// A listing that is not an array (the path named a file) has no entries.
pub(super) fn entries_from_listing(
    listing: serde_json::Value,
    root: &str,
) -> Result<Vec<FileInfo>, ProviderError> {
    if !listing.is_array() {
        return Ok(Vec::new());
    }
    let entries: Vec<ContentsEntry> = serde_json::from_value(listing)
        .map_err(|e| ProviderError::MalformedPayload(format!("invalid directory listing: {e}")))?;
    Ok(entries
        .into_iter()
        .filter(|e| e.kind == "file")
        .map(|e| FileInfo {
            name: e.name,
            path: strip_root(root, &e.path).to_string(),
            revision_id: e.sha,
        })
        .collect())
}

/// Body for create and update.
#[derive(Serialize)]
pub(super) struct PutContentsBody {
    pub(super) message: String,
    pub(super) content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) sha: Option<String>,
}

/// Body for delete.
#[derive(Serialize)]
pub(super) struct DeleteContentsBody {
    pub(super) message: String,
    pub(super) sha: String,
}

/// Response to create, update and delete.
#[derive(Deserialize)]
pub(super) struct WriteResponse {
    #[serde(default)]
    content: Option<ShaRef>,
    #[serde(default)]
    commit: Option<ShaRef>,
}

#[derive(Deserialize)]
pub(super) struct ShaRef {
    sha: String,
}

impl From<WriteResponse> for UpdateResult {
    fn from(response: WriteResponse) -> Self {
        UpdateResult {
            success: true,
            revision_id: response.content.map(|c| c.sha),
            commit_id: response.commit.map(|c| c.sha),
        }
    }
}

/// One item of the commits listing.
#[derive(Deserialize)]
pub(super) struct CommitListItem {
    sha: String,
    #[serde(default)]
    html_url: String,
    commit: CommitDetail,
}

#[derive(Deserialize)]
pub(super) struct CommitDetail {
    message: String,
    author: Option<CommitAuthor>,
}

#[derive(Deserialize)]
pub(super) struct CommitAuthor {
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    date: String,
}

impl From<CommitListItem> for RevisionHistoryEntry {
    fn from(item: CommitListItem) -> Self {
        let author = item.commit.author.unwrap_or(CommitAuthor {
            name: String::new(),
            email: String::new(),
            date: String::new(),
        });
        RevisionHistoryEntry {
            short_id: short_id(&item.sha),
            revision_id: item.sha,
            message: item.commit.message,
            author: RevisionAuthor {
                name: author.name,
                email: author.email,
                date: author.date,
            },
            url: item.html_url,
        }
    }
}
