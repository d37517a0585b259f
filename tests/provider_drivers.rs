//! Wire-level tests for the provider drivers.
//!
//! Each test stands up a wiremock server in place of the provider API and
//! checks the requests a driver sends and how it reads the answers.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitmark::core::config::ProviderConfig;
use gitmark::core::types::Frontmatter;
use gitmark::forge::gitea::GiteaDriver;
use gitmark::forge::github::GitHubDriver;
use gitmark::forge::gitlab::GitLabDriver;
use gitmark::forge::{ProviderDriver, ProviderError};

fn b64(text: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(text)
}

fn config(platform: &str, server: &MockServer) -> ProviderConfig {
    ProviderConfig {
        platform: platform.into(),
        token: "t0k3n".into(),
        owner: "acme".into(),
        repo: "handbook".into(),
        path: String::new(),
        base_url: Some(server.uri()),
    }
}

fn title(value: &str) -> Frontmatter {
    let mut fm = Frontmatter::new();
    fm.insert("title".into(), json!(value));
    fm
}

mod github {
    use super::*;

    fn driver(server: &MockServer, root: &str) -> GitHubDriver {
        GitHubDriver::new(&ProviderConfig {
            path: root.into(),
            ..config("github", server)
        })
    }

    #[tokio::test]
    async fn lists_files_relative_to_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/docs/team-x"))
            .and(header("authorization", "token t0k3n"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "a.note.md", "path": "docs/team-x/a.note.md", "sha": "s1", "type": "file"},
                {"name": "old", "path": "docs/team-x/old", "sha": "s2", "type": "dir"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let files = driver(&server, "docs")
            .list_files_under_namespaces(&["team-x".to_string()])
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "team-x/a.note.md");
        assert_eq!(files[0].revision_id, "s1");
    }

    #[tokio::test]
    async fn missing_namespace_directory_lists_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/ghost"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let files = driver(&server, "")
            .list_files_under_namespaces(&["ghost".to_string()])
            .await
            .unwrap();
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn reads_wrapped_base64_at_a_revision() {
        let server = MockServer::start().await;
        let encoded = b64("---\ntitle: Hi\n---\n# Body");
        let wrapped = format!("{}\n{}", &encoded[..8], &encoded[8..]);
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/a.md"))
            .and(query_param("ref", "c0ffee"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file", "content": wrapped, "sha": "blob1"
            })))
            .mount(&server)
            .await;

        let doc = driver(&server, "")
            .get_file_at_revision("a.md", "c0ffee")
            .await
            .unwrap();
        assert_eq!(doc.frontmatter["title"], "Hi");
        assert_eq!(doc.content, "# Body");
        assert_eq!(doc.revision_id.as_deref(), Some("blob1"));
    }

    #[tokio::test]
    async fn create_sends_encoded_document_without_sha() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/repos/acme/handbook/contents/a.md"))
            .and(body_partial_json(json!({
                "message": "Create a.md",
                "content": b64("---\ntitle: Hi\n---\nbody")
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "content": {"sha": "blob1"}, "commit": {"sha": "commit1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = driver(&server, "")
            .create_file("a.md", &title("Hi"), "body")
            .await
            .unwrap();
        assert_eq!(result.revision_id.as_deref(), Some("blob1"));
        assert_eq!(result.commit_id.as_deref(), Some("commit1"));

        let received = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
        assert!(body.get("sha").is_none());
    }

    #[tokio::test]
    async fn occupied_create_is_already_exists() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "message": "Invalid request.\n\n\"sha\" wasn't supplied."
            })))
            .mount(&server)
            .await;

        let err = driver(&server, "")
            .create_file("a.md", &Frontmatter::new(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AlreadyExists(_)), "{err:?}");
    }

    #[tokio::test]
    async fn stale_update_is_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(body_partial_json(json!({"sha": "old"})))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "a.md does not match old"
            })))
            .mount(&server)
            .await;

        let err = driver(&server, "")
            .update_file("a.md", &Frontmatter::new(), "x", "old")
            .await
            .unwrap_err();
        match err {
            ProviderError::Conflict(message) => assert!(message.contains("does not match")),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_sends_sha_in_body() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/handbook/contents/a.md"))
            .and(body_partial_json(json!({"sha": "blob1", "message": "Delete a.md"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": null, "commit": {"sha": "commit2"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = driver(&server, "")
            .delete_file("a.md", "blob1")
            .await
            .unwrap();
        assert!(result.revision_id.is_none());
        assert_eq!(result.commit_id.as_deref(), Some("commit2"));
    }

    #[tokio::test]
    async fn history_queries_path_under_root() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/commits"))
            .and(query_param("path", "docs/a.md"))
            .and(query_param("per_page", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "sha": "0123456789abcdef",
                "html_url": "https://example.com/c/0123456",
                "commit": {
                    "message": "Update a.md",
                    "author": {"name": "Ada", "email": "ada@example.com", "date": "2024-05-01T00:00:00Z"}
                }
            }])))
            .mount(&server)
            .await;

        let history = driver(&server, "docs").list_revisions("a.md").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].short_id, "0123456");
        assert_eq!(history[0].author.email, "ada@example.com");
    }

    #[tokio::test]
    async fn status_codes_map_to_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/denied.md"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/busy.md"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/broken.md"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let driver = driver(&server, "");
        assert!(matches!(
            driver.get_file("denied.md").await.unwrap_err(),
            ProviderError::AuthFailed(m) if m == "Bad credentials"
        ));
        assert!(matches!(
            driver.get_file("busy.md").await.unwrap_err(),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            driver.get_file("broken.md").await.unwrap_err(),
            ProviderError::Api { status: 500, message } if message == "upstream down"
        ));
    }
}

mod gitlab {
    use super::*;

    const FILE: &str = "/api/v4/projects/acme%2Fhandbook/repository/files/team-x%2Fa.md";

    fn driver(server: &MockServer) -> GitLabDriver {
        GitLabDriver::new(&config("gitlab", server))
    }

    fn file_body(raw: &str, blob: &str, commit: &str) -> serde_json::Value {
        json!({
            "content": b64(raw),
            "encoding": "base64",
            "blob_id": blob,
            "last_commit_id": commit
        })
    }

    #[tokio::test]
    async fn reads_file_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILE))
            .and(query_param("ref", "main"))
            .and(header("authorization", "Bearer t0k3n"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(file_body("---\ntitle: Hi\n---\nbody", "b1", "c1")),
            )
            .mount(&server)
            .await;

        let doc = driver(&server).get_file("team-x/a.md").await.unwrap();
        assert_eq!(doc.frontmatter["title"], "Hi");
        assert_eq!(doc.revision_id.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn tree_listing_keeps_blobs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/acme%2Fhandbook/repository/tree"))
            .and(query_param("path", "team-x"))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "b1", "name": "a.md", "path": "team-x/a.md", "type": "blob"},
                {"id": "t1", "name": "sub", "path": "team-x/sub", "type": "tree"}
            ])))
            .mount(&server)
            .await;

        let entries = driver(&server).list_entries("team-x").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "team-x/a.md");
        assert_eq!(entries[0].revision_id, "b1");
    }

    #[tokio::test]
    async fn stale_blob_id_conflicts_before_writing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_body("x", "b2", "c2")))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = driver(&server)
            .update_file("team-x/a.md", &Frontmatter::new(), "y", "b1")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Conflict(_)), "{err:?}");
    }

    #[tokio::test]
    async fn update_pins_last_commit_and_rereads_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(FILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_body("x", "b1", "c1")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(FILE))
            .and(body_partial_json(json!({
                "branch": "main",
                "encoding": "text",
                "last_commit_id": "c1",
                "content": "---\ntitle: New\n---\ny"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file_path": "team-x/a.md", "branch": "main"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(FILE))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_body("y", "b2", "c2")))
            .mount(&server)
            .await;

        let result = driver(&server)
            .update_file("team-x/a.md", &title("New"), "y", "b1")
            .await
            .unwrap();
        assert_eq!(result.revision_id.as_deref(), Some("b2"));
        assert_eq!(result.commit_id.as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn existing_file_on_create() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(FILE))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "message": "A file with this name already exists"
            })))
            .mount(&server)
            .await;

        let err = driver(&server)
            .create_file("team-x/a.md", &Frontmatter::new(), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::AlreadyExists(_)), "{err:?}");
    }

    #[tokio::test]
    async fn project_id_without_repo() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/42/repository/commits"))
            .and(query_param("path", "a.md"))
            .and(query_param("ref_name", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "id": "c1full", "short_id": "c1", "message": "Create a.md",
                "author_name": "Ada", "author_email": "ada@example.com",
                "authored_date": "2024-05-01T00:00:00Z", "web_url": "https://example.com/c1"
            }])))
            .mount(&server)
            .await;

        let driver = GitLabDriver::new(&ProviderConfig {
            owner: "42".into(),
            repo: String::new(),
            ..config("gitlab", &server)
        });
        let history = driver.list_revisions("a.md").await.unwrap();
        assert_eq!(history[0].revision_id, "c1full");
        assert_eq!(history[0].author.name, "Ada");
    }
}

mod gitea {
    use super::*;

    fn driver(server: &MockServer) -> GiteaDriver {
        GiteaDriver::new(&config("gitea", server))
    }

    #[tokio::test]
    async fn create_posts_to_contents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/repos/acme/handbook/contents/a.md"))
            .and(header("authorization", "token t0k3n"))
            .and(body_partial_json(json!({"content": b64("plain")})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "content": {"sha": "blob1"}, "commit": {"sha": "commit1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = driver(&server)
            .create_file("a.md", &Frontmatter::new(), "plain")
            .await
            .unwrap();
        assert_eq!(result.revision_id.as_deref(), Some("blob1"));
    }

    #[tokio::test]
    async fn history_uses_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/repos/acme/handbook/commits"))
            .and(query_param("path", "a.md"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        assert!(driver(&server).list_revisions("a.md").await.unwrap().is_empty());
    }
}
