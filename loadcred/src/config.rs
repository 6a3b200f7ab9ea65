//! Run configuration for the provisioning workflow.
//!
//! Everything the components need is carried in an explicit [`Settings`]
//! struct passed in at construction. [`Settings::from_env`] reads the
//! `LOADCRED_*` environment (load a `.env` first with `dotenvy` if you want
//! file-based configuration).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Whether the sink is recreated per run or extended across runs.
///
/// The header row is written only when truncating; appending to an existing
/// file must not interleave a second header into the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMode {
    Truncate,
    Append,
}

/// What to do when a login walk yields fewer cookies than expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookiePolicy {
    /// Reject the user unless all expected cookies are present.
    RequireAll,
    /// Record whatever was harvested, leaving missing fields empty.
    BestEffort,
}

/// Names of the session cookies harvested after a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieNames {
    pub session: String,
    pub http_info: String,
    pub session_expiry: String,
}

impl Default for CookieNames {
    fn default() -> Self {
        Self {
            session: "vunet_session".to_string(),
            http_info: "X-VuNet-HTTP-Info".to_string(),
            session_expiry: "grafana_session_expiry".to_string(),
        }
    }
}

/// Configuration for a provisioning run.
///
/// The admin token obtained with `admin_*` credentials is fetched once per
/// run and never refreshed; a run long enough to outlive the token keeps the
/// original tooling's failure mode.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Identity provider base URL, e.g. `https://idp.example.com`.
    pub provider_base: String,
    /// Realm containing the users, clients and groups.
    pub realm: String,
    /// Product UI origin, used to resolve relative redirects.
    pub app_origin: String,

    /// Client id for the admin password grant.
    pub admin_client_id: String,
    pub admin_client_secret: Option<String>,
    pub admin_username: String,
    pub admin_password: String,

    /// Non-admin client id/secret for the direct token grant.
    pub client_id: String,
    pub client_secret: String,
    pub token_scope: String,

    /// Authorization-code login URL walked by the scripted and browser
    /// strategies.
    pub login_url: String,
    /// URL prefix that signals a completed browser login.
    pub logged_in_prefix: String,

    pub username_prefix: String,
    pub email_domain: String,
    /// Shared password assigned to every provisioned account.
    pub common_password: String,
    pub first_name: String,
    pub last_name: String,
    /// When set, each created user is added to this group.
    pub group_name: Option<String>,

    /// Accept self-signed certificates on every request.
    pub accept_invalid_certs: bool,
    pub request_timeout: Duration,
    /// Bound on the browser strategy's wait for the post-login URL.
    pub login_timeout: Duration,
    /// Pause between account creation and the login attempt.
    pub propagation_delay: Duration,

    pub sink_path: PathBuf,
    pub sink_mode: SinkMode,
    pub cookie_policy: CookiePolicy,
    pub cookie_names: CookieNames,
}

impl Settings {
    /// Build settings from `LOADCRED_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider_base = trim_origin(require("LOADCRED_PROVIDER_URL")?);
        let realm = require("LOADCRED_REALM")?;
        let app_origin = trim_origin(require("LOADCRED_APP_URL")?);
        let admin_username = require("LOADCRED_ADMIN_USERNAME")?;
        let admin_password = require("LOADCRED_ADMIN_PASSWORD")?;
        let common_password = require("LOADCRED_USER_PASSWORD")?;

        let login_url = var_or(
            "LOADCRED_LOGIN_URL",
            &format!("{app_origin}/vui/login/generic_oauth"),
        );
        let logged_in_prefix =
            var_or("LOADCRED_LOGGED_IN_PREFIX", &format!("{app_origin}/vui/"));

        Ok(Self {
            provider_base,
            realm,
            app_origin,
            admin_client_id: var_or("LOADCRED_ADMIN_CLIENT_ID", "admin-cli"),
            admin_client_secret: env::var("LOADCRED_ADMIN_CLIENT_SECRET").ok(),
            admin_username,
            admin_password,
            client_id: var_or("LOADCRED_CLIENT_ID", ""),
            client_secret: var_or("LOADCRED_CLIENT_SECRET", ""),
            token_scope: var_or("LOADCRED_TOKEN_SCOPE", "openid email profile"),
            login_url,
            logged_in_prefix,
            username_prefix: var_or("LOADCRED_USERNAME_PREFIX", "load_user_"),
            email_domain: var_or("LOADCRED_EMAIL_DOMAIN", "example.com"),
            common_password,
            first_name: var_or("LOADCRED_FIRST_NAME", "Test"),
            last_name: var_or("LOADCRED_LAST_NAME", "User"),
            group_name: env::var("LOADCRED_GROUP_NAME").ok(),
            accept_invalid_certs: parse_bool("LOADCRED_ACCEPT_INVALID_CERTS", true)?,
            request_timeout: Duration::from_secs(parse_u64("LOADCRED_REQUEST_TIMEOUT_SECS", 30)?),
            login_timeout: Duration::from_secs(parse_u64("LOADCRED_LOGIN_TIMEOUT_SECS", 20)?),
            propagation_delay: Duration::from_secs(parse_u64("LOADCRED_DELAY_SECS", 2)?),
            sink_path: PathBuf::from(var_or("LOADCRED_OUTPUT", "user_credentials.csv")),
            sink_mode: parse_sink_mode("LOADCRED_SINK_MODE")?,
            cookie_policy: parse_cookie_policy("LOADCRED_COOKIE_POLICY")?,
            cookie_names: CookieNames {
                session: var_or("LOADCRED_COOKIE_SESSION", "vunet_session"),
                http_info: var_or("LOADCRED_COOKIE_HTTP_INFO", "X-VuNet-HTTP-Info"),
                session_expiry: var_or(
                    "LOADCRED_COOKIE_SESSION_EXPIRY",
                    "grafana_session_expiry",
                ),
            },
        })
    }

    /// `POST` target for both the admin and the user password grant.
    pub fn token_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.provider_base, self.realm
        )
    }

    pub fn admin_users_url(&self) -> String {
        format!("{}/admin/realms/{}/users", self.provider_base, self.realm)
    }

    pub fn admin_groups_url(&self) -> String {
        format!("{}/admin/realms/{}/groups", self.provider_base, self.realm)
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).ok().filter(|v| !v.is_empty()).unwrap_or_else(|| default.to_string())
}

fn trim_origin(origin: String) -> String {
    origin.trim_end_matches('/').to_string()
}

fn parse_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidVar { name, value }),
        },
    }
}

fn parse_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { name, value }),
    }
}

fn parse_sink_mode(name: &'static str) -> Result<SinkMode, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(SinkMode::Truncate),
        Ok(value) => match value.to_lowercase().as_str() {
            "truncate" | "overwrite" => Ok(SinkMode::Truncate),
            "append" => Ok(SinkMode::Append),
            _ => Err(ConfigError::InvalidVar { name, value }),
        },
    }
}

fn parse_cookie_policy(name: &'static str) -> Result<CookiePolicy, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(CookiePolicy::RequireAll),
        Ok(value) => match value.to_lowercase().as_str() {
            "require-all" | "require_all" | "strict" => Ok(CookiePolicy::RequireAll),
            "best-effort" | "best_effort" | "partial" => Ok(CookiePolicy::BestEffort),
            _ => Err(ConfigError::InvalidVar { name, value }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(name: &str, value: &str) {
        unsafe {
            env::set_var(name, value);
        }
    }

    fn unset(name: &str) {
        unsafe {
            env::remove_var(name);
        }
    }

    /// Exercises `from_env` end to end in one test to avoid racing other
    /// tests on process-global environment state.
    #[test]
    fn test_settings_from_env() {
        for name in [
            "LOADCRED_PROVIDER_URL",
            "LOADCRED_REALM",
            "LOADCRED_APP_URL",
            "LOADCRED_ADMIN_USERNAME",
            "LOADCRED_ADMIN_PASSWORD",
            "LOADCRED_USER_PASSWORD",
            "LOADCRED_SINK_MODE",
            "LOADCRED_COOKIE_POLICY",
            "LOADCRED_DELAY_SECS",
        ] {
            unset(name);
        }

        // Missing required variable is an error, not a default.
        let err = Settings::from_env().expect_err("should fail without provider URL");
        assert!(matches!(err, ConfigError::MissingVar("LOADCRED_PROVIDER_URL")));

        set("LOADCRED_PROVIDER_URL", "https://idp.example.com/");
        set("LOADCRED_REALM", "perf");
        set("LOADCRED_APP_URL", "https://app.example.com");
        set("LOADCRED_ADMIN_USERNAME", "operator");
        set("LOADCRED_ADMIN_PASSWORD", "secret");
        set("LOADCRED_USER_PASSWORD", "Password123!");

        let settings = Settings::from_env().expect("all required variables set");
        assert_eq!(settings.provider_base, "https://idp.example.com");
        assert_eq!(
            settings.token_url(),
            "https://idp.example.com/realms/perf/protocol/openid-connect/token"
        );
        assert_eq!(
            settings.admin_users_url(),
            "https://idp.example.com/admin/realms/perf/users"
        );
        assert_eq!(settings.admin_client_id, "admin-cli");
        assert_eq!(settings.login_url, "https://app.example.com/vui/login/generic_oauth");
        assert_eq!(settings.sink_mode, SinkMode::Truncate);
        assert_eq!(settings.cookie_policy, CookiePolicy::RequireAll);
        assert_eq!(settings.propagation_delay, Duration::from_secs(2));
        assert!(settings.accept_invalid_certs);
        assert_eq!(settings.cookie_names, CookieNames::default());

        set("LOADCRED_SINK_MODE", "append");
        set("LOADCRED_COOKIE_POLICY", "best-effort");
        set("LOADCRED_DELAY_SECS", "0");
        let settings = Settings::from_env().expect("overrides parse");
        assert_eq!(settings.sink_mode, SinkMode::Append);
        assert_eq!(settings.cookie_policy, CookiePolicy::BestEffort);
        assert!(settings.propagation_delay.is_zero());

        set("LOADCRED_SINK_MODE", "sideways");
        let err = Settings::from_env().expect_err("bad sink mode rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidVar { name: "LOADCRED_SINK_MODE", .. }
        ));

        for name in [
            "LOADCRED_PROVIDER_URL",
            "LOADCRED_REALM",
            "LOADCRED_APP_URL",
            "LOADCRED_ADMIN_USERNAME",
            "LOADCRED_ADMIN_PASSWORD",
            "LOADCRED_USER_PASSWORD",
            "LOADCRED_SINK_MODE",
            "LOADCRED_COOKIE_POLICY",
            "LOADCRED_DELAY_SECS",
        ] {
            unset(name);
        }
    }
}
