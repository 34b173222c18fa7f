//! End-to-end tests for the `lessonkit` binary.
//!
//! Each test points `HOME` and `XDG_CONFIG_HOME` at a temporary directory so
//! no real config file is read, and talks to a stub Gemini server instead
//! of the network.

use std::path::Path;
use std::process::Output;

use axum::http::StatusCode;
use tokio::process::Command;

use lessonkit_test_utils::{gemini_text_response, spawn_stub_gemini};

fn lessonkit(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lessonkit"));
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("LESSONKIT_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("LESSONKIT_MODEL")
        .env("RUST_LOG", "warn");
    cmd
}

async fn run(cmd: &mut Command) -> Output {
    cmd.output().await.expect("failed to run lessonkit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[tokio::test]
async fn prompt_prints_default_lesson_plan() {
    let home = tempfile::TempDir::new().unwrap();
    let output = run(lessonkit(home.path()).arg("prompt")).await;

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Toán"));
    assert!(text.contains("Lớp 6"));
    assert!(text.contains("[Tên bài]"));
}

#[tokio::test]
async fn generate_without_key_fails() {
    let home = tempfile::TempDir::new().unwrap();
    let output = run(lessonkit(home.path()).args(["generate", "--prompt", "Soạn đề"])).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("API key"), "stderr: {}", stderr(&output));
}

#[tokio::test]
async fn init_then_config_set_and_show() {
    let home = tempfile::TempDir::new().unwrap();

    let output = run(lessonkit(home.path()).args(["init", "--api-key", "AIzaSyExample1234"])).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(home.path().join(".config/lessonkit/config.toml").exists());

    let output = run(lessonkit(home.path()).arg("init")).await;
    assert!(!output.status.success(), "init without --force must not overwrite");

    let output = run(lessonkit(home.path()).args(["config", "set", "export.prefix", "DeThi"])).await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run(lessonkit(home.path()).args(["config", "show"])).await;
    let text = stdout(&output);
    assert!(text.contains("AIza...1234"));
    assert!(!text.contains("AIzaSyExample1234"));
    assert!(text.contains("DeThi"));
}

#[tokio::test]
async fn generate_against_stub_exports_files() {
    let home = tempfile::TempDir::new().unwrap();
    let out = home.path().join("out");
    let stub = spawn_stub_gemini(StatusCode::OK, gemini_text_response("<h2>Phân số</h2>")).await;

    let output = run(lessonkit(home.path()).args([
        "config",
        "set",
        "generation.base_url",
        &stub.base_url,
    ]))
    .await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run(lessonkit(home.path())
        .env("LESSONKIT_API_KEY", "stub-key")
        .args(["generate", "--title", "Phân số", "--export", "html", "--export", "pdf"])
        .arg("--output-dir")
        .arg(&out))
    .await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "<h2>Phân số</h2>");

    for ext in ["html", "pdf"] {
        let path = out.join(format!("GiaoAn_Phân số.{ext}"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<h2>Phân số</h2>");
    }

    let seen = stub.last_request().unwrap();
    assert_eq!(seen.api_key.as_deref(), Some("stub-key"));
    let sent = seen.body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(sent.contains("bài \"Phân số\""));
}

#[tokio::test]
async fn generate_reports_service_error() {
    let home = tempfile::TempDir::new().unwrap();
    let body = serde_json::json!({ "error": { "message": "API key not valid" } });
    let stub = spawn_stub_gemini(StatusCode::BAD_REQUEST, body).await;

    run(lessonkit(home.path()).args(["config", "set", "generation.base_url", &stub.base_url])).await;

    let output = run(lessonkit(home.path())
        .args(["--api-key", "bad-key", "generate", "--prompt", "x"]))
    .await;
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Lỗi: HTTP 400 Bad Request: API key not valid"));
}

#[tokio::test]
async fn export_renames_saved_document() {
    let home = tempfile::TempDir::new().unwrap();
    let input = home.path().join("saved.html");
    std::fs::write(&input, "<p>Ôn tập</p>").unwrap();

    let output = run(lessonkit(home.path())
        .args(["export", "--format", "word", "--title", "Ôn tập"])
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(home.path()))
    .await;
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        std::fs::read_to_string(home.path().join("GiaoAn_Ôn tập.doc")).unwrap(),
        "<p>Ôn tập</p>"
    );
}
