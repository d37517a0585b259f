//! forge::gitea
//!
//! Gitea driver.
//!
//! # Design
//!
//! Gitea's `/api/v1/repos/{owner}/{repo}/contents` API mirrors GitHub's, so
//! the response types come from [`super::github`]. The differences are the
//! API prefix, `POST` for create (GitHub uses `PUT` for both), and the
//! `limit` parameter on the commits listing.

use async_trait::async_trait;
use reqwest::Method;

use super::github::{
    entries_from_listing, CommitListItem, ContentsFile, DeleteContentsBody, PutContentsBody,
    WriteResponse,
};
use super::http::{encode_base64, encode_path, AuthScheme, HttpTransport};
use super::traits::{ProviderDriver, ProviderError, RequestKind, HISTORY_PAGE_SIZE};
use crate::core::config::ProviderConfig;
use crate::core::frontmatter;
use crate::core::paths::join_remote;
use crate::core::types::{FileContent, FileInfo, Frontmatter, RevisionHistoryEntry, UpdateResult};

/// Default Gitea instance.
const DEFAULT_BASE_URL: &str = "https://gitea.com";

/// Gitea provider driver.
#[derive(Debug)]
pub struct GiteaDriver {
    http: HttpTransport,
    owner: String,
    repo: String,
    root: String,
    /// `{instance}/api/v1`
    api_base: String,
}

impl GiteaDriver {
    pub fn new(config: &ProviderConfig) -> Self {
        let instance = config
            .base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/');
        Self {
            http: HttpTransport::new("gitea", AuthScheme::Token, config.token.clone()),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            root: config.path.clone(),
            api_base: format!("{instance}/api/v1"),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn repo_url(&self, endpoint: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, endpoint
        )
    }

    fn contents_url(&self, relative: &str) -> String {
        let full = join_remote(&self.root, relative);
        if full.is_empty() {
            self.repo_url("contents")
        } else {
            self.repo_url(&format!("contents/{}", encode_path(&full)))
        }
    }

    async fn read(&self, path: &str, revision: Option<&str>) -> Result<FileContent, ProviderError> {
        let query: Vec<(&str, &str)> = revision.map(|r| ("ref", r)).into_iter().collect();
        let file: ContentsFile = self.http.get(&self.contents_url(path), &query).await?;
        file.into_content(path)
    }
}

#[async_trait]
impl ProviderDriver for GiteaDriver {
    fn name(&self) -> &'static str {
        "gitea"
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
            .send(Method::POST, &self.contents_url(path), &body, RequestKind::Create)
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
        let limit = HISTORY_PAGE_SIZE.to_string();
        let commits: Vec<CommitListItem> = self
            .http
            .get(
                &self.repo_url("commits"),
                &[("path", full.as_str()), ("limit", limit.as_str())],
            )
            .await?;
        Ok(commits.into_iter().map(Into::into).collect())
    }
}
