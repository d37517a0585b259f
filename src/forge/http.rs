//! forge::http
//!
//! Shared HTTP transport for the REST drivers.
//!
//! # Design
//!
//! Every driver talks JSON over HTTPS with a static token. This module owns
//! the parts that are the same for all three providers: header
//! construction, request logging, response decoding and the mapping from
//! HTTP status to [`ProviderError`]. Drivers only build URLs and bodies.
//!
//! Status mapping depends on the [`RequestKind`]: a 422 answering a create
//! means the path is taken, while a 422 answering an update or delete means
//! the revision id is stale.

use std::time::Duration;

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::traits::{ProviderError, RequestKind};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = concat!("gitmark/", env!("CARGO_PKG_VERSION"));

/// Upper bound on one API request, connect to last body byte.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// How the token is presented in the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthScheme {
    /// `Authorization: token <t>` (GitHub, Gitea)
    Token,
    /// `Authorization: Bearer <t>` (GitLab)
    Bearer,
}

/// HTTP client bound to one provider and token.
#[derive(Clone)]
pub(crate) struct HttpTransport {
    client: Client,
    provider: &'static str,
    auth: AuthScheme,
    token: String,
    accept: &'static str,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("provider", &self.provider)
            .field("auth", &self.auth)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl HttpTransport {
    pub(crate) fn new(provider: &'static str, auth: AuthScheme, token: impl Into<String>) -> Self {
        Self {
            client: build_client(REQUEST_TIMEOUT),
            provider,
            auth,
            token: token.into(),
            accept: "application/json",
        }
    }

    /// Replace the request timeout.
    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    /// Override the `Accept` header (GitHub wants its vendor media type).
    pub(crate) fn with_accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    fn headers(&self) -> Result<HeaderMap, ProviderError> {
        let mut headers = HeaderMap::new();
        let value = match self.auth {
            AuthScheme::Token => format!("token {}", self.token),
            AuthScheme::Bearer => format!("Bearer {}", self.token),
        };
        let mut auth = HeaderValue::from_str(&value)
            .map_err(|_| ProviderError::InvalidConfig("token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(self.accept));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    /// GET a JSON document.
    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        tracing::debug!(provider = self.provider, %url, "GET");
        let response = self
            .client
            .get(url)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        self.handle_response(response, RequestKind::Read).await
    }

    /// Send a JSON body and decode a JSON response.
    pub(crate) async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        kind: RequestKind,
    ) -> Result<T, ProviderError> {
        let response = self.execute(method, url, body).await?;
        self.handle_response(response, kind).await
    }

    /// Send a JSON body and ignore the response body (e.g., 204 No Content).
    pub(crate) async fn send_no_content<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        kind: RequestKind,
    ) -> Result<(), ProviderError> {
        let response = self.execute(method, url, body).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.error_for(response, status, kind).await)
        }
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<Response, ProviderError> {
        tracing::debug!(provider = self.provider, %method, %url, "request");
        self.client
            .request(method, url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
        kind: RequestKind,
    ) -> Result<T, ProviderError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| {
                ProviderError::MalformedPayload(format!(
                    "failed to parse {} response: {}",
                    self.provider, e
                ))
            })
        } else {
            Err(self.error_for(response, status, kind).await)
        }
    }

    async fn error_for(&self, response: Response, status: StatusCode, kind: RequestKind) -> ProviderError {
        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        tracing::debug!(
            provider = self.provider,
            status = status.as_u16(),
            %message,
            "request failed"
        );
        map_status(status.as_u16(), message, kind)
    }
}

/// Pull a human-readable message out of an error body.
///
/// GitHub and Gitea answer `{"message": "..."}`; GitLab answers
/// `{"message": ...}` (sometimes an object) or `{"error": "..."}`.
fn extract_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        };
    };
    for key in ["message", "error"] {
        match value.get(key) {
            Some(serde_json::Value::String(s)) => return s.clone(),
            Some(other) if !other.is_null() => return other.to_string(),
            _ => {}
        }
    }
    "Unknown error".to_string()
}

/// Map a non-success status to a provider error.
pub(crate) fn map_status(status: u16, message: String, kind: RequestKind) -> ProviderError {
    let lower = message.to_lowercase();
    match status {
        401 | 403 => ProviderError::AuthFailed(message),
        404 => ProviderError::NotFound(message),
        409 | 412 => ProviderError::Conflict(message),
        422 => match kind {
            RequestKind::Create => ProviderError::AlreadyExists(message),
            RequestKind::Update | RequestKind::Delete => ProviderError::Conflict(message),
            RequestKind::Read => ProviderError::Api { status, message },
        },
        400 if kind == RequestKind::Create && lower.contains("already exists") => {
            ProviderError::AlreadyExists(message)
        }
        400 if lower.contains("has changed") => ProviderError::Conflict(message),
        429 => ProviderError::RateLimited,
        _ => ProviderError::Api { status, message },
    }
}

/// Percent-encode each segment of a repository path for use in a URL path.
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Base64-encode document text for a provider write.
pub(crate) fn encode_base64(text: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(text.as_bytes())
}

/// Decode provider base64 content (line-wrapped on GitHub) into text.
pub(crate) fn decode_base64(encoded: &str) -> Result<String, ProviderError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| ProviderError::MalformedPayload(format!("invalid base64 content: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| ProviderError::MalformedPayload(format!("content is not UTF-8: {e}")))
}

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, "HTTP client setup failed, using defaults");
            Client::new()
        })
}
