//! File service against a provider API.
//!
//! Drives the public service stack (factory-built driver, namespace
//! resolver, file service) against a wiremock GitHub API to check which
//! repository paths each namespace-scoped operation touches.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gitmark::auth::Identity;
use gitmark::core::config::{NamespaceSettings, ProviderConfig};
use gitmark::core::errors::ErrorKind;
use gitmark::files::{CreateFile, FileService, ListQuery, UpdateFile};
use gitmark::forge::create_driver;
use gitmark::namespace::NamespaceResolver;

const CONTENTS: &str = "/repos/acme/handbook/contents";

fn service(server: &MockServer) -> (FileService, Arc<NamespaceResolver>) {
    let driver = create_driver(&ProviderConfig {
        platform: "github".into(),
        token: "t".into(),
        owner: "acme".into(),
        repo: "handbook".into(),
        path: String::new(),
        base_url: Some(server.uri()),
    })
    .unwrap();
    let namespaces = Arc::new(NamespaceResolver::new(NamespaceSettings {
        enabled: true,
        ..NamespaceSettings::default()
    }));
    (FileService::new(driver, Arc::clone(&namespaces)), namespaces)
}

fn entry(path: &str, sha: &str) -> serde_json::Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    json!({"name": name, "path": path, "sha": sha, "type": "file"})
}

#[tokio::test]
async fn caller_lists_own_and_group_namespaces() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{CONTENTS}/alice")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            entry("alice/todo.note.md", "a1"),
            entry("alice/avatar.png", "a2")
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{CONTENTS}/team-x")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            entry("team-x/plan.user-story.md", "t1")
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([entry("root.md", "r1")])))
        .expect(0)
        .mount(&server)
        .await;

    let (service, namespaces) = service(&server);
    let identity = Identity::from_json(r#"{"sub":"Alice","groups":["Team X"]}"#).unwrap();
    let caller = namespaces.resolve(Some(&identity));
    assert_eq!(caller.available_namespaces, vec!["alice", "team-x"]);

    let items = service.list_for(&ListQuery::default(), &caller).await.unwrap();
    let paths: Vec<&str> = items.iter().map(|i| i.path.as_str()).collect();
    assert_eq!(paths, vec!["alice/todo.note.md", "team-x/plan.user-story.md"]);
    assert_eq!(items[1].namespace, "team-x");
    assert_eq!(items[1].schema_type.as_deref(), Some("user-story"));
}

#[tokio::test]
async fn anonymous_caller_lists_the_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            entry("guide.md", "r1"),
            entry("config.json", "r2")
        ])))
        .mount(&server)
        .await;

    let (service, namespaces) = service(&server);
    let caller = namespaces.resolve(None);
    let items = service.list_for(&ListQuery::default(), &caller).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].namespace, "shared");
    assert!(!items[0].is_valid_format);
}

#[tokio::test]
async fn create_writes_under_namespace_directory() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTENTS}/team-x/plan.user-story.md")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": {"sha": "b1"}, "commit": {"sha": "c1"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _) = service(&server);
    let outcome = service
        .create(CreateFile {
            filename: "plan.user-story.md".into(),
            namespace: Some("team-x".into()),
            content: "# Plan".into(),
            ..CreateFile::default()
        })
        .await
        .unwrap();
    assert_eq!(outcome.path, "team-x/plan.user-story.md");
    assert_eq!(outcome.revision_id.as_deref(), Some("b1"));
}

#[tokio::test]
async fn update_without_revision_sends_current_sha() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{CONTENTS}/alice/todo.md")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file", "content": "", "sha": "current-sha"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTENTS}/alice/todo.md")))
        .and(body_partial_json(json!({"sha": "current-sha"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": {"sha": "next-sha"}, "commit": {"sha": "c2"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _) = service(&server);
    let outcome = service
        .update(
            "todo.md",
            UpdateFile {
                content: "done".into(),
                ..UpdateFile::default()
            },
            Some("alice"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.revision_id.as_deref(), Some("next-sha"));
}

#[tokio::test]
async fn provider_answers_become_app_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{CONTENTS}/missing.md")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTENTS}/busy.md")))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "sha mismatch"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTENTS}/taken.md")))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({"message": "sha wasn't supplied"})))
        .mount(&server)
        .await;

    let (service, _) = service(&server);

    let err = service.get("missing.md", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = service
        .update(
            "busy.md",
            UpdateFile {
                revision_id: Some("stale".into()),
                ..UpdateFile::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = service
        .create(CreateFile {
            filename: "taken.md".into(),
            ..CreateFile::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("already exists"));
}

#[tokio::test]
async fn escaping_paths_never_reach_the_provider() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (service, _) = service(&server);
    for name in ["../secrets.md", "/etc/passwd.md", "a/./b.md"] {
        let err = service.get(name, Some("alice")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
    }
    let err = service.get("notes.md", Some("../alice")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}
