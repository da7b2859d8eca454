//! Integration tests for authwatchd
//!
//! These tests run the monitor end to end against a mock Auth2 server, with
//! mock dialogs and navigation.

use authwatch_api::{DialogKind, DialogOutcome, MonitorState};
use authwatch_config::{load_config, Settings, TimingPolicy};
use authwatch_core::Monitor;
use authwatch_host_api::{
    CredentialStore, MockCredentials, MockDialogs, MockNavigator, ReauthAction,
};
use authwatch_host_kbase::{build_http_client, Auth2Reauth, Auth2TokenSource, AuthEndpoints};
use authwatch_util::{now_ms, SystemClock};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/services/auth/api/V2/token";
const LOGOUT_PATH: &str = "/services/auth/logout";
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

fn settings_for(server: &MockServer, timing: TimingPolicy) -> Settings {
    let config = format!(
        r#"
        config_version = 1

        [auth]
        origin = "{}"
        return_url = "https://hub.example.org/hub/home"
        request_timeout_seconds = 2
        "#,
        server.uri()
    );
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(config.as_bytes()).unwrap();

    let mut settings = load_config(file.path()).unwrap();
    settings.timing = timing;
    settings
}

fn fast_timing() -> TimingPolicy {
    TimingPolicy {
        warning_lead: Duration::from_millis(1_000),
        cooldown: Duration::from_millis(300),
        poll_interval: Duration::from_millis(200),
        retry_attempts: 2,
        retry_delay: Duration::from_millis(50),
    }
}

async fn mount_token(server: &MockServer, expires_at_ms: i64) {
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .and(header("Authorization", "SESSION123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "Login",
            "id": "8f2a1c3e-0000-4000-8000-000000000002",
            "expires": expires_at_ms,
            "created": expires_at_ms - 3_600_000,
            "name": null,
            "user": "alice",
            "custom": {},
            "cachefor": 300000
        })))
        .mount(server)
        .await;
}

async fn mount_logout(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(LOGOUT_PATH))
        .and(header("x-kbase-ui-auth", "SESSION123"))
        .respond_with(ResponseTemplate::new(204))
        .expect(expected_calls)
        .mount(server)
        .await;
}

struct Running {
    dialogs: Arc<MockDialogs>,
    navigator: Arc<MockNavigator>,
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<authwatch_api::MonitorStatus>,
}

fn start_monitor(settings: &Settings, credential: Option<&str>, dialogs: MockDialogs) -> Running {
    let endpoints = AuthEndpoints::from_settings(&settings.auth).unwrap();
    let client = build_http_client(settings.auth.request_timeout).unwrap();
    let credentials: Arc<dyn CredentialStore> = Arc::new(MockCredentials::new(credential));
    let navigator = Arc::new(MockNavigator::new());
    let dialogs = Arc::new(dialogs);

    let source = Arc::new(Auth2TokenSource::new(
        client.clone(),
        &endpoints,
        credentials.clone(),
    ));
    let reauth: Arc<dyn ReauthAction> = Arc::new(Auth2Reauth::new(
        client,
        &endpoints,
        credentials,
        navigator.clone(),
    ));

    let monitor = Monitor::new(
        settings.timing,
        source,
        dialogs.clone(),
        reauth,
        Arc::new(SystemClock),
    );
    let (shutdown, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(monitor.run(shutdown_rx));

    Running {
        dialogs,
        navigator,
        shutdown,
        task,
    }
}

fn expected_login_url(server: &MockServer) -> String {
    format!(
        "{}/login?nextrequest=https%3A%2F%2Fhub.example.org%2Fhub%2Fhome",
        server.uri()
    )
}

#[tokio::test]
async fn expired_session_blocks_logs_out_and_redirects() {
    let server = MockServer::start().await;
    mount_token(&server, now_ms() - 1_000).await;
    mount_logout(&server, 1).await;

    let settings = settings_for(&server, TimingPolicy::default());
    let running = start_monitor(
        &settings,
        Some("SESSION123"),
        MockDialogs::new().with_auto_outcome(DialogOutcome::accepted()),
    );

    let status = tokio::time::timeout(TEST_TIMEOUT, running.task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.state, Some(MonitorState::Blocked));
    assert_eq!(running.dialogs.shown(), vec![DialogKind::Blocked]);
    assert_eq!(running.navigator.visited(), vec![expected_login_url(&server)]);
}

#[tokio::test]
async fn missing_credential_redirects_without_logout() {
    let server = MockServer::start().await;

    let settings = settings_for(&server, TimingPolicy::default());
    let running = start_monitor(
        &settings,
        None,
        MockDialogs::new().with_auto_outcome(DialogOutcome::dismissed()),
    );

    let status = tokio::time::timeout(TEST_TIMEOUT, running.task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.state, Some(MonitorState::Blocked));
    assert_eq!(running.dialogs.shown(), vec![DialogKind::NoCredential]);
    assert_eq!(running.navigator.visited(), vec![expected_login_url(&server)]);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_auth_service_fails_safe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    mount_logout(&server, 1).await;

    let settings = settings_for(&server, fast_timing());
    let running = start_monitor(
        &settings,
        Some("SESSION123"),
        MockDialogs::new().with_auto_outcome(DialogOutcome::accepted()),
    );

    let status = tokio::time::timeout(TEST_TIMEOUT, running.task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.state, Some(MonitorState::Blocked));
    assert_eq!(running.dialogs.shown(), vec![DialogKind::NoCredential]);
    assert_eq!(running.navigator.visited().len(), 1);
}

#[tokio::test]
async fn warning_then_expiry_then_reauth() {
    let server = MockServer::start().await;
    mount_token(&server, now_ms() + 1_600).await;
    mount_logout(&server, 1).await;

    let settings = settings_for(&server, fast_timing());
    let running = start_monitor(&settings, Some("SESSION123"), MockDialogs::new());

    tokio::time::timeout(TEST_TIMEOUT, running.dialogs.wait_for_shown(1))
        .await
        .unwrap();
    assert_eq!(
        running.dialogs.shown()[0],
        DialogKind::Warning { minutes_left: 1 }
    );

    // leave the warning open until the token expires
    tokio::time::timeout(TEST_TIMEOUT, running.dialogs.wait_for_shown(2))
        .await
        .unwrap();
    assert_eq!(running.dialogs.shown()[1], DialogKind::Blocked);
    assert_eq!(running.dialogs.dismiss_count(), 1);
    assert!(running.navigator.visited().is_empty());

    running.dialogs.resolve(DialogOutcome::accepted());
    let status = tokio::time::timeout(TEST_TIMEOUT, running.task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(status.state, Some(MonitorState::Blocked));
    assert_eq!(running.navigator.visited(), vec![expected_login_url(&server)]);
    assert_eq!(running.dialogs.max_pending_shows(), 1);
}

#[tokio::test]
async fn dismissed_warning_reappears_after_cooldown() {
    let server = MockServer::start().await;
    mount_token(&server, now_ms() + 60_000).await;
    mount_logout(&server, 0).await;

    let timing = TimingPolicy {
        warning_lead: Duration::from_secs(120),
        ..fast_timing()
    };
    let settings = settings_for(&server, timing);
    let running = start_monitor(&settings, Some("SESSION123"), MockDialogs::new());

    tokio::time::timeout(TEST_TIMEOUT, running.dialogs.wait_for_shown(1))
        .await
        .unwrap();
    let dismissed_at = now_ms();
    running.dialogs.resolve(DialogOutcome::dismissed());

    tokio::time::timeout(TEST_TIMEOUT, running.dialogs.wait_for_shown(2))
        .await
        .unwrap();
    assert!(now_ms() - dismissed_at >= 250);
    assert!(matches!(
        running.dialogs.shown()[1],
        DialogKind::Warning { .. }
    ));

    running.shutdown.send(true).unwrap();
    let status = tokio::time::timeout(TEST_TIMEOUT, running.task)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.state, Some(MonitorState::Warning));
    assert!(running.navigator.visited().is_empty());
}
