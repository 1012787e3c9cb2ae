//! Mock driver tests

use std::time::Duration;

use greeter_core::{Dataset, GreeterConfig, GreeterError, PromptKind, TerminalEffect};
use greeter_runtime::{DirectorySource, MemorySource, Mock, RecordingTheme, SystemEnv, ThemeEvent};
use serde_json::json;

fn source() -> MemorySource {
    MemorySource::new()
        .with_body(Dataset::Accounts, r#"[{"username":"alice"},{"username":"bob"}]"#)
        .with_body(Dataset::Languages, r#"[{"code":"en_US","name":"English"}]"#)
        .with_body(Dataset::Layouts, r#"[{"code":"us","name":"English (US)"}]"#)
        .with_body(Dataset::Sessions, r#"[{"key":"gnome","name":"GNOME"}]"#)
}

fn autofill() -> GreeterConfig {
    GreeterConfig { autofill: true, ..GreeterConfig::default() }
}

type TestMock = Mock<SystemEnv, MemorySource, RecordingTheme>;

async fn start(config: GreeterConfig, source: MemorySource) -> TestMock {
    Mock::start(SystemEnv::new(), config, source, RecordingTheme::new()).await
}

#[tokio::test]
async fn becomes_ready_once() {
    let source = source()
        .with_delay(Dataset::Accounts, Duration::from_millis(30))
        .with_delay(Dataset::Sessions, Duration::from_millis(10));
    let mock = start(autofill(), source).await;

    assert_eq!(mock.wait_ready().await, 0);
    assert!(mock.is_ready());

    let snapshot = mock.snapshot().await;
    assert_eq!(snapshot.num_users, 2);
    assert_eq!(snapshot.default_session.as_deref(), Some("GNOME"));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(mock.theme().count(|e| matches!(e, ThemeEvent::Ready(_))), 1);
}

#[tokio::test]
async fn failed_dataset_never_becomes_ready() {
    let source = source().with_response(Dataset::Layouts, Err("connection reset".to_string()));
    let mock = start(autofill(), source).await;

    let waited = tokio::time::timeout(Duration::from_millis(100), mock.wait_ready()).await;
    assert!(waited.is_err());
    assert!(!mock.is_ready());
    assert_eq!(mock.property("num_users").await.unwrap(), json!(0));
}

#[tokio::test]
async fn login_flow_reaches_theme_hooks() {
    let mock = start(autofill(), source()).await;
    mock.wait_ready().await;

    mock.call("authenticate", &[json!("alice")]).await.unwrap();
    mock.call("respond", &[json!("password")]).await.unwrap();
    mock.call("start_session", &[json!("gnome")]).await.unwrap();

    let events = mock.theme().events();
    assert!(events.contains(&ThemeEvent::Prompt("Password:".to_string(), PromptKind::Password)));
    assert!(events.contains(&ThemeEvent::AuthenticationComplete));

    let effect =
        TerminalEffect::SessionStarted { user: "alice".to_string(), session: "gnome".to_string() };
    assert_eq!(mock.theme().count(|e| *e == ThemeEvent::Terminal(effect.clone())), 1);

    // The reset generation loads again.
    assert_eq!(mock.wait_ready().await, 1);
    assert_eq!(mock.snapshot().await.authentication_user, None);
}

#[tokio::test]
async fn rejected_calls_surface_errors() {
    let mock = start(autofill(), source()).await;
    mock.wait_ready().await;

    assert_eq!(
        mock.call("respond", &[json!("password")]).await,
        Err(GreeterError::NotAuthenticating)
    );
    assert!(matches!(mock.call("suspend", &[]).await, Err(GreeterError::CapabilityDenied { .. })));
    assert!(matches!(
        mock.call("login", &[json!("alice"), json!("gnome")]).await,
        Err(GreeterError::Deprecation { .. })
    ));
    assert!(matches!(
        mock.set_property("select_guest", json!(true)).await,
        Err(GreeterError::Deprecation { .. })
    ));
}

#[tokio::test]
async fn directory_source_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let json_dir = dir.path().join("json");
    std::fs::create_dir(&json_dir).unwrap();
    std::fs::write(json_dir.join("users.json"), r#"[{"username":"carol","real_name":"Carol"}]"#)
        .unwrap();
    std::fs::write(json_dir.join("languages.json"), r#"[{"code":"fr","name":"Français"}]"#)
        .unwrap();
    std::fs::write(json_dir.join("layouts.json"), r#"[{"code":"fr","name":"French"}]"#).unwrap();
    std::fs::write(json_dir.join("sessions.json"), r#"[{"key":"xfce","name":"Xfce"}]"#).unwrap();

    let mock = Mock::start(
        SystemEnv::new(),
        autofill(),
        DirectorySource::new(dir.path()),
        RecordingTheme::new(),
    )
    .await;
    mock.wait_ready().await;

    assert_eq!(mock.property("language").await.unwrap(), json!("Français"));
    assert_eq!(mock.property("users").await.unwrap()[0]["display_name"], json!("Carol"));
}

#[tokio::test]
async fn autologin_fires_after_delay() {
    let config = GreeterConfig { autologin_timeout_seconds: 1, ..autofill() };
    let mock = start(config, source()).await;
    mock.wait_ready().await;
    assert!(mock.autologin_pending());

    tokio::time::sleep(Duration::from_millis(1300)).await;

    let theme = mock.theme();
    assert_eq!(theme.count(|e| *e == ThemeEvent::AutologinTimerExpired), 1);
    assert_eq!(mock.property("is_authenticated").await.unwrap(), json!(true));
    assert_eq!(mock.property("authentication_user").await.unwrap(), json!("alice"));
}

#[tokio::test]
async fn cancelled_autologin_never_fires() {
    let config = GreeterConfig { autologin_timeout_seconds: 1, ..autofill() };
    let mock = start(config, source()).await;
    mock.wait_ready().await;

    mock.call("cancel_autologin", &[]).await.unwrap();
    assert!(!mock.autologin_pending());

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert_eq!(mock.theme().count(|e| *e == ThemeEvent::AutologinTimerExpired), 0);
    assert_eq!(mock.property("autologin_user").await.unwrap(), json!(null));
}
