//! The scripted redirect walk against a mock provider: redirect handling,
//! form scraping, credential POST, and cookie harvesting.

mod common;

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::test_settings;
use loadcred::{
    run, AcquireError, CookiePolicy, RedirectWalkAcquirer, SessionAcquirer, SessionBundle,
};

const AUTH_PATH: &str = "/realms/perf/protocol/openid-connect/auth";
const AUTHENTICATE_PATH: &str = "/realms/perf/login-actions/authenticate";

/// Login page carrying two forms; the walk must pick the first action.
fn login_page_html(server_uri: &str) -> String {
    format!(
        r#"<html><body>
        <form id="kc-form-login" action="{server_uri}{AUTHENTICATE_PATH}?session_code=xyz" method="post">
            <input name="username"/><input name="password" type="password"/>
            <button type="submit">Log in</button>
        </form>
        <form id="kc-locale" action="{server_uri}/realms/perf/locale" method="get"></form>
        </body></html>"#
    )
}

/// Login URL answers with a *relative* redirect and seeds the provider's own
/// session cookie; the authenticate POST sets the product session cookies.
async fn mount_login_flow(server: &MockServer, set_cookies: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/vui/login/generic_oauth"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{AUTH_PATH}?client_id=ui&state=s1").as_str())
                .append_header("Set-Cookie", "AUTH_SESSION_ID=abc; Path=/"),
        )
        .expect(2)
        .named("login URL: initial redirect + finalization pass")
        .mount(server)
        .await;

    // Fetched once during the walk; the finalization pass re-follows the
    // login URL's redirect here a second time.
    Mock::given(method("GET"))
        .and(path(AUTH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_page_html(&server.uri())))
        .expect(2)
        .named("provider login page")
        .mount(server)
        .await;

    let mut authenticated = ResponseTemplate::new(302)
        .insert_header("Location", "/vui/login/generic_oauth?code=authcode&state=s1");
    for cookie in set_cookies {
        authenticated = authenticated.append_header("Set-Cookie", *cookie);
    }
    Mock::given(method("POST"))
        .and(path(AUTHENTICATE_PATH))
        .and(header("User-Agent", "Mozilla/5.0"))
        .and(body_string_contains("username=load_user_"))
        .and(body_string_contains("password=Password123%21"))
        .respond_with(authenticated)
        .expect(1)
        .named("credential submission")
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_walk_harvests_all_session_cookies() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    mount_login_flow(
        &server,
        &[
            "vunet_session=sess-1; Path=/",
            "X-VuNet-HTTP-Info=info-1; Path=/",
            "grafana_session_expiry=exp-1; Path=/",
        ],
    )
    .await;

    let settings = test_settings(&server.uri(), &dir.path().join("out.csv"));
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let bundle = acquirer
        .acquire("load_user_7", "Password123!")
        .await
        .expect("walk succeeds");

    match bundle {
        SessionBundle::Cookies(cookies) => {
            assert_eq!(cookies.session.as_deref(), Some("sess-1"));
            assert_eq!(cookies.http_info.as_deref(), Some("info-1"));
            assert_eq!(cookies.session_expiry.as_deref(), Some("exp-1"));
        }
        other => panic!("expected cookie bundle, got {other:?}"),
    }
}

/// End to end with the run loop: cookie-variant rows land in the sink with
/// the cookie header.
#[tokio::test]
async fn test_walk_run_writes_cookie_rows() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    let sink = dir.path().join("cookies.csv");
    mount_login_flow(
        &server,
        &[
            "vunet_session=sess-1; Path=/",
            "X-VuNet-HTTP-Info=info-1; Path=/",
            "grafana_session_expiry=exp-1; Path=/",
        ],
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/realms/perf/protocol/openid-connect/token"))
        .and(body_string_contains("client_id=admin-cli"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "admin-token"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/admin/realms/perf/users"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let settings = test_settings(&server.uri(), &sink);
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let summary = run(&settings, &acquirer, 1).await.expect("run completes");
    assert_eq!(summary.recorded(), 1);

    let contents = std::fs::read_to_string(&sink).expect("sink readable");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[0],
        "username,password,vunet_session,X-VuNet-HTTP-Info,grafana_session_expiry"
    );
    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields.len(), 5);
    assert_eq!(fields[0], summary.outcomes[0].username());
    assert_eq!(&fields[1..], &["Password123!", "sess-1", "info-1", "exp-1"]);
}

#[tokio::test]
async fn test_missing_location_header_fails_this_user() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    // The login URL answers 200 instead of redirecting.
    Mock::given(method("GET"))
        .and(path("/vui/login/generic_oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>unexpected</html>"))
        .mount(&server)
        .await;

    let settings = test_settings(&server.uri(), &dir.path().join("out.csv"));
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let err = acquirer
        .acquire("load_user_7", "Password123!")
        .await
        .expect_err("no redirect must fail");
    assert!(matches!(err, AcquireError::MissingRedirect));
}

#[tokio::test]
async fn test_login_page_without_form_action_fails_this_user() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");

    Mock::given(method("GET"))
        .and(path("/vui/login/generic_oauth"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{AUTH_PATH}?client_id=ui").as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(AUTH_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>No form here</body></html>"),
        )
        .mount(&server)
        .await;

    let settings = test_settings(&server.uri(), &dir.path().join("out.csv"));
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let err = acquirer
        .acquire("load_user_7", "Password123!")
        .await
        .expect_err("missing action must fail");
    assert!(matches!(err, AcquireError::FormActionNotFound));
}

#[tokio::test]
async fn test_strict_policy_rejects_incomplete_cookie_set() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    // Only one of the three expected cookies comes back.
    mount_login_flow(&server, &["vunet_session=sess-1; Path=/"]).await;

    let settings = test_settings(&server.uri(), &dir.path().join("out.csv"));
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let err = acquirer
        .acquire("load_user_7", "Password123!")
        .await
        .expect_err("require-all must reject a partial harvest");
    match err {
        AcquireError::MissingCookies(missing) => {
            assert!(missing.contains("X-VuNet-HTTP-Info"));
            assert!(missing.contains("grafana_session_expiry"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_best_effort_policy_keeps_partial_harvest() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().expect("tempdir");
    mount_login_flow(&server, &["vunet_session=sess-1; Path=/"]).await;

    let mut settings = test_settings(&server.uri(), &dir.path().join("out.csv"));
    settings.cookie_policy = CookiePolicy::BestEffort;
    let acquirer = RedirectWalkAcquirer::new(&settings).expect("acquirer builds");

    let bundle = acquirer
        .acquire("load_user_7", "Password123!")
        .await
        .expect("best effort accepts partial");
    match bundle {
        SessionBundle::Cookies(cookies) => {
            assert_eq!(cookies.session.as_deref(), Some("sess-1"));
            assert!(cookies.http_info.is_none());
            assert!(cookies.session_expiry.is_none());
        }
        other => panic!("expected cookie bundle, got {other:?}"),
    }
}
