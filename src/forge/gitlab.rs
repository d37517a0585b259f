//! forge::gitlab
//!
//! GitLab driver using the repository files, tree and commits APIs.
//!
//! # Design
//!
//! GitLab differs from GitHub in three ways that matter here:
//!
//! - The project is addressed by its URL-encoded path (`group%2Fproject`)
//!   or numeric id, and file paths are URL-encoded as one segment.
//! - Write responses carry neither the new blob id nor the commit id, so
//!   every write re-reads the file (or, for deletes, the newest commit on
//!   the path) to report authoritative ids.
//! - The concurrency token GitLab understands is a commit id
//!   (`last_commit_id`), while revision ids here are blob ids. Updates and
//!   deletes therefore read the file first, fail with `Conflict` when its
//!   `blob_id` differs from the caller's revision, and pass the file's
//!   `last_commit_id` so GitLab rejects a writer that slips in between.
//!
//! All reads and writes target the `main` branch.

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::http::{decode_base64, AuthScheme, HttpTransport};
use super::traits::{ProviderDriver, ProviderError, RequestKind, HISTORY_PAGE_SIZE};
use crate::core::config::ProviderConfig;
use crate::core::frontmatter;
use crate::core::paths::{join_remote, strip_root};
use crate::core::types::{
    FileContent, FileInfo, Frontmatter, RevisionAuthor, RevisionHistoryEntry, UpdateResult,
};

/// Default GitLab instance.
const DEFAULT_BASE_URL: &str = "https://gitlab.com";

/// Branch every operation targets.
const BRANCH: &str = "main";

/// Page size for tree listings.
const TREE_PAGE_SIZE: &str = "100";

/// GitLab provider driver.
#[derive(Debug)]
pub struct GitLabDriver {
    http: HttpTransport,
    /// URL-encoded project path or id
    project: String,
    root: String,
    /// `{instance}/api/v4`
    api_base: String,
}

impl GitLabDriver {
    /// Create a driver. `owner` alone is taken as the project id (or full
    /// path) when `repo` is empty.
    pub fn new(config: &ProviderConfig) -> Self {
        let instance = config
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        let project = if config.repo.is_empty() {
            config.owner.clone()
        } else {
            format!("{}/{}", config.owner, config.repo)
        };
        Self {
            http: HttpTransport::new("gitlab", AuthScheme::Bearer, config.token.clone()),
            project: urlencoding::encode(&project).into_owned(),
            root: config.path.clone(),
            api_base: format!("{instance}/api/v4"),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn project_url(&self, endpoint: &str) -> String {
        format!("{}/projects/{}/{}", self.api_base, self.project, endpoint)
    }

    fn file_url(&self, relative: &str) -> String {
        let full = join_remote(&self.root, relative);
        self.project_url(&format!(
            "repository/files/{}",
            urlencoding::encode(&full)
        ))
    }

    async fn fetch(&self, path: &str, reference: &str) -> Result<GitLabFile, ProviderError> {
        self.http
            .get(&self.file_url(path), &[("ref", reference)])
            .await
    }

    /// Read the current file and check the caller's revision against it.
    async fn fetch_expecting(
        &self,
        path: &str,
        revision_id: &str,
    ) -> Result<GitLabFile, ProviderError> {
        let current = self.fetch(path, BRANCH).await?;
        if current.blob_id != revision_id {
            return Err(ProviderError::Conflict(format!(
                "{path} is at revision {}, not {revision_id}",
                current.blob_id
            )));
        }
        Ok(current)
    }

    /// Re-read a file after a write to report its authoritative ids.
    async fn written(&self, path: &str) -> Result<UpdateResult, ProviderError> {
        let file = self.fetch(path, BRANCH).await?;
        Ok(UpdateResult {
            success: true,
            revision_id: Some(file.blob_id),
            commit_id: Some(file.last_commit_id),
        })
    }

    async fn commits(
        &self,
        path: &str,
        per_page: usize,
    ) -> Result<Vec<GitLabCommit>, ProviderError> {
        let full = join_remote(&self.root, path);
        let per_page = per_page.to_string();
        self.http
            .get(
                &self.project_url("repository/commits"),
                &[
                    ("path", full.as_str()),
                    ("ref_name", BRANCH),
                    ("per_page", per_page.as_str()),
                ],
            )
            .await
    }
}

#[async_trait]
impl ProviderDriver for GitLabDriver {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    async fn list_entries(&self, dir: &str) -> Result<Vec<FileInfo>, ProviderError> {
        let full = join_remote(&self.root, dir);
        let mut query = vec![("ref", BRANCH), ("per_page", TREE_PAGE_SIZE)];
        if !full.is_empty() {
            query.push(("path", full.as_str()));
        }
        let tree: Vec<TreeEntry> = self
            .http
            .get(&self.project_url("repository/tree"), &query)
            .await?;
        Ok(tree
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| FileInfo {
                path: strip_root(&self.root, &entry.path).to_string(),
                name: entry.name,
                revision_id: entry.id,
            })
            .collect())
    }

    async fn get_file(&self, path: &str) -> Result<FileContent, ProviderError> {
        self.fetch(path, BRANCH).await?.into_content(path)
    }

    async fn get_file_at_revision(
        &self,
        path: &str,
        revision: &str,
    ) -> Result<FileContent, ProviderError> {
        self.fetch(path, revision).await?.into_content(path)
    }

    async fn create_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let body = WriteBody {
            branch: BRANCH,
            content: frontmatter::encode(frontmatter, content),
            commit_message: format!("Create {path}"),
            encoding: "text",
            last_commit_id: None,
        };
        let _: serde_json::Value = self
            .http
            .send(Method::POST, &self.file_url(path), &body, RequestKind::Create)
            .await?;
        self.written(path).await
    }

    async fn update_file(
        &self,
        path: &str,
        frontmatter: &Frontmatter,
        content: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let current = self.fetch_expecting(path, revision_id).await?;
        let body = WriteBody {
            branch: BRANCH,
            content: frontmatter::encode(frontmatter, content),
            commit_message: format!("Update {path}"),
            encoding: "text",
            last_commit_id: Some(current.last_commit_id),
        };
        let _: serde_json::Value = self
            .http
            .send(Method::PUT, &self.file_url(path), &body, RequestKind::Update)
            .await?;
        self.written(path).await
    }

    async fn delete_file(
        &self,
        path: &str,
        revision_id: &str,
    ) -> Result<UpdateResult, ProviderError> {
        let current = self.fetch_expecting(path, revision_id).await?;
        let body = DeleteBody {
            branch: BRANCH,
            commit_message: format!("Delete {path}"),
            last_commit_id: current.last_commit_id,
        };
        self.http
            .send_no_content(Method::DELETE, &self.file_url(path), &body, RequestKind::Delete)
            .await?;

        let commit_id = match self.commits(path, 1).await {
            Ok(commits) => commits.into_iter().next().map(|c| c.id),
            Err(err) => {
                tracing::warn!(%path, error = %err, "could not read delete commit");
                None
            }
        };
        Ok(UpdateResult {
            success: true,
            revision_id: None,
            commit_id,
        })
    }

    async fn list_revisions(&self, path: &str) -> Result<Vec<RevisionHistoryEntry>, ProviderError> {
        let commits = self.commits(path, HISTORY_PAGE_SIZE).await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }
}

// --------------------------------------------------------------------------
// API Types
// --------------------------------------------------------------------------

#[derive(Deserialize)]
struct TreeEntry {
    id: String,
    name: String,
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct GitLabFile {
    content: String,
    blob_id: String,
    last_commit_id: String,
    #[serde(default)]
    encoding: Option<String>,
}

impl GitLabFile {
    fn into_content(self, path: &str) -> Result<FileContent, ProviderError> {
        let raw = match self.encoding.as_deref() {
            Some("text") => self.content,
            _ => decode_base64(&self.content)?,
        };
        let mut decoded = frontmatter::decode(&raw);
        decoded.revision_id = Some(self.blob_id);
        decoded.path = Some(path.to_string());
        Ok(decoded)
    }
}

#[derive(Serialize)]
struct WriteBody {
    branch: &'static str,
    content: String,
    commit_message: String,
    encoding: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_commit_id: Option<String>,
}

#[derive(Serialize)]
struct DeleteBody {
    branch: &'static str,
    commit_message: String,
    last_commit_id: String,
}

#[derive(Deserialize)]
struct GitLabCommit {
    id: String,
    short_id: String,
    message: String,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    author_email: String,
    #[serde(default)]
    authored_date: String,
    #[serde(default)]
    web_url: String,
}

impl From<GitLabCommit> for RevisionHistoryEntry {
    fn from(commit: GitLabCommit) -> Self {
        RevisionHistoryEntry {
            revision_id: commit.id,
            short_id: commit.short_id,
            message: commit.message,
            author: RevisionAuthor {
                name: commit.author_name,
                email: commit.author_email,
                date: commit.authored_date,
            },
            url: commit.web_url,
        }
    }
}
