//! Integration tests for the gitmark binary.
//!
//! Every run gets a clean environment and an explicit config file, so no
//! developer configuration or provider token leaks into the results.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A config file in its own home directory.
struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new(config: &str) -> Self {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), config).unwrap();
        Sandbox { home }
    }

    fn config_path(&self) -> PathBuf {
        self.home.path().join("config.toml")
    }

    fn gitmark(&self) -> Command {
        let mut cmd = Command::cargo_bin("gitmark").unwrap();
        cmd.env_clear()
            .env("HOME", self.home.path())
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

fn empty() -> Sandbox {
    Sandbox::new("")
}

#[test]
fn help_lists_command_groups() {
    empty()
        .gitmark()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("files"))
        .stdout(predicate::str::contains("templates"))
        .stdout(predicate::str::contains("--claims"));
}

#[test]
fn version_flag_works() {
    empty()
        .gitmark()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gitmark"));
}

mod templates {
    use super::*;

    #[test]
    fn list_falls_back_to_builtins() {
        empty()
            .gitmark()
            .args(["templates", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"id\": \"user-story/basic\""))
            .stdout(predicate::str::contains("\"id\": \"bug-report/detailed\""));
    }

    #[test]
    fn list_filters_by_type() {
        empty()
            .gitmark()
            .args(["templates", "list", "--schema-type", "bug-report"])
            .assert()
            .success()
            .stdout(predicate::str::contains("bug-report/detailed"))
            .stdout(predicate::str::contains("user-story/basic").not());
    }

    #[test]
    fn render_substitutes_values() {
        empty()
            .gitmark()
            .args([
                "templates",
                "render",
                "user-story/basic",
                "--values",
                r#"{"title":"Login","description":"to sign in","acceptanceCriteria":["works","fast"]}"#,
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("# Login"))
            .stdout(predicate::str::contains("**I want** to sign in"))
            .stdout(predicate::str::contains("- fast"));
    }

    #[test]
    fn validate_reports_missing_fields() {
        empty()
            .gitmark()
            .args(["templates", "validate", "bug-report/detailed", "--values", r#"{"title":"Crash"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"valid\": false"))
            .stdout(predicate::str::contains("Field 'description' is required"))
            .stdout(predicate::str::contains("Field 'title' is required").not());
    }

    #[test]
    fn values_must_be_an_object() {
        empty()
            .gitmark()
            .args(["templates", "render", "user-story/basic", "--values", "[1,2]"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("error: --values must be a JSON object"));
    }
}

mod schemas {
    use super::*;

    #[test]
    fn get_builtin_schema() {
        empty()
            .gitmark()
            .args(["schemas", "get", "user-story"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"title\": \"User Story\""))
            .stdout(predicate::str::contains("acceptanceCriteria"));
    }

    #[test]
    fn unknown_schema_fails() {
        empty()
            .gitmark()
            .args(["schemas", "get", "nope"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("error: schema not found: nope"));
    }

    #[test]
    fn unsafe_schema_id_fails() {
        empty()
            .gitmark()
            .args(["schemas", "get", "../etc"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("validation error"));
    }
}

#[test]
fn cache_stats_when_disabled() {
    empty()
        .gitmark()
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"uninitialized\""))
        .stdout(predicate::str::contains("\"git\"").not());
}

mod status {
    use super::*;

    #[test]
    fn namespaces_lists_user_and_groups() {
        Sandbox::new("[namespaces]\nenabled = true\n")
            .gitmark()
            .args(["--claims", r#"{"sub":"Alice","groups":["Team X"]}"#, "namespaces"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"user_claim\": \"sub\""))
            .stdout(predicate::str::contains("\"userId\": \"alice\""))
            .stdout(predicate::str::contains("\"type\": \"user\""))
            .stdout(predicate::str::contains("\"directory\": \"team-x\""));
    }

    #[test]
    fn namespaces_without_separation_is_the_root() {
        empty()
            .gitmark()
            .args(["--claims", r#"{"sub":"alice"}"#, "namespaces"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"type\": \"system\""))
            .stdout(predicate::str::contains("\"type\": \"user\"").not());
    }

    #[test]
    fn status_reports_feature_flags() {
        Sandbox::new("[provider]\nplatform = \"gitea\"\n\n[namespaces]\nenabled = true\n")
            .gitmark()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("\"gitPlatform\": \"gitea\""))
            .stdout(predicate::str::contains("\"namespaces\": true"))
            .stdout(predicate::str::contains("\"templates\": false"))
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn cache_clear_help_explains_scope() {
        empty()
            .gitmark()
            .args(["cache", "clear", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("single command"));
    }
}

mod files {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_config(server: &MockServer) -> String {
        format!(
            r#"
[provider]
platform = "github"
token = "t"
owner = "acme"
repo = "handbook"
base_url = "{}"

[namespaces]
enabled = true
"#,
            server.uri()
        )
    }

    #[test]
    fn list_without_token_fails() {
        empty()
            .gitmark()
            .args(["files", "list"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("token is required"));
    }

    #[test]
    fn unknown_config_file_fails() {
        Command::cargo_bin("gitmark")
            .unwrap()
            .env_clear()
            .args(["--config", "/nonexistent/gitmark.toml", "templates", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("config file not found"));
    }

    #[tokio::test]
    async fn show_reads_from_own_namespace() {
        let server = MockServer::start().await;
        let raw = "---\ntitle: Todo\n---\n- [ ] write tests\n";
        Mock::given(method("GET"))
            .and(path("/repos/acme/handbook/contents/alice/todo.md"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "type": "file",
                "content": base64_encode(raw),
                "sha": "b1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sandbox = Sandbox::new(&provider_config(&server));
        sandbox
            .gitmark()
            .args(["--claims", r#"{"sub":"alice"}"#, "files", "show", "todo.md"])
            .assert()
            .success()
            .stdout(raw);
    }

    #[tokio::test]
    async fn foreign_namespace_is_refused_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let sandbox = Sandbox::new(&provider_config(&server));
        sandbox
            .gitmark()
            .args(["--claims", r#"{"sub":"alice"}"#, "-n", "finance", "files", "list"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("finance"));
    }

    fn base64_encode(text: &str) -> String {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(text)
    }
}
