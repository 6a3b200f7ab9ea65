//! Shared fixtures for the integration suite: settings pointed at a mock
//! identity provider.

use std::path::Path;
use std::time::Duration;

use loadcred::{CookieNames, CookiePolicy, Settings, SinkMode};

/// Settings wired to a single mock server standing in for both the identity
/// provider and the product UI. Propagation delay is zero so tests run at
/// full speed.
pub fn test_settings(server_uri: &str, sink_path: &Path) -> Settings {
    Settings {
        provider_base: server_uri.to_string(),
        realm: "perf".to_string(),
        app_origin: server_uri.to_string(),
        admin_client_id: "admin-cli".to_string(),
        admin_client_secret: None,
        admin_username: "operator".to_string(),
        admin_password: "admin-secret".to_string(),
        client_id: "ui".to_string(),
        client_secret: "ui-secret".to_string(),
        token_scope: "openid email profile".to_string(),
        login_url: format!("{server_uri}/vui/login/generic_oauth"),
        logged_in_prefix: format!("{server_uri}/vui/"),
        username_prefix: "load_user_".to_string(),
        email_domain: "example.com".to_string(),
        common_password: "Password123!".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        group_name: None,
        accept_invalid_certs: false,
        request_timeout: Duration::from_secs(5),
        login_timeout: Duration::from_secs(5),
        propagation_delay: Duration::ZERO,
        sink_path: sink_path.to_path_buf(),
        sink_mode: SinkMode::Truncate,
        cookie_policy: CookiePolicy::RequireAll,
        cookie_names: CookieNames::default(),
    }
}
