//! Scripted authorization-code login: the browser-less redirect walk.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header;
use url::Url;

use crate::acquire::errors::AcquireError;
use crate::acquire::form::{FormLocator, RegexFormLocator};
use crate::acquire::types::{BundleKind, CookieBundle, SessionBundle};
use crate::acquire::SessionAcquirer;
use crate::config::{CookieNames, CookiePolicy, Settings};

/// Matches what the provider's login theme expects from a real browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// One user's worth of HTTP state: a shared cookie jar behind two clients,
/// one that follows redirects and one that surfaces them. Dropped whole at
/// the end of the attempt so cookies never leak across users.
struct WalkSession {
    direct: reqwest::Client,
    following: reqwest::Client,
    jar: Arc<Jar>,
}

impl WalkSession {
    fn new(accept_invalid_certs: bool, timeout: Duration) -> Result<Self, AcquireError> {
        let jar = Arc::new(Jar::default());

        let base = move || {
            let mut builder = reqwest::Client::builder().timeout(timeout);
            if accept_invalid_certs {
                builder = builder.danger_accept_invalid_certs(true);
            }
            builder
        };

        let direct = base()
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AcquireError::Http(e.to_string()))?;
        let following = base()
            .cookie_provider(jar.clone())
            .build()
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        Ok(Self {
            direct,
            following,
            jar,
        })
    }

    /// Flatten everything the jar holds for the given URLs into name→value
    /// pairs. Later URLs win on a name clash.
    fn harvest(&self, urls: &[&Url]) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        for url in urls {
            let Some(header_value) = self.jar.cookies(url) else {
                continue;
            };
            let Ok(raw) = header_value.to_str() else {
                continue;
            };
            for pair in raw.split("; ") {
                if let Some((name, value)) = pair.split_once('=') {
                    cookies.insert(name.to_string(), value.to_string());
                }
            }
        }
        cookies
    }
}

/// Strategy A: walk the authorization-code login flow with a raw HTTP
/// client, extract the login form target from the page, post the
/// credentials, and read the session cookies back out of the jar.
pub struct RedirectWalkAcquirer {
    login_url: Url,
    base_origin: Url,
    cookie_names: CookieNames,
    cookie_policy: CookiePolicy,
    accept_invalid_certs: bool,
    request_timeout: Duration,
    form_locator: Box<dyn FormLocator>,
}

impl RedirectWalkAcquirer {
    pub fn new(settings: &Settings) -> Result<Self, AcquireError> {
        let login_url = Url::parse(&settings.login_url)
            .map_err(|e| AcquireError::InvalidUrl(format!("login URL: {e}")))?;
        let base_origin = Url::parse(&settings.app_origin)
            .map_err(|e| AcquireError::InvalidUrl(format!("app origin: {e}")))?;

        Ok(Self {
            login_url,
            base_origin,
            cookie_names: settings.cookie_names.clone(),
            cookie_policy: settings.cookie_policy,
            accept_invalid_certs: settings.accept_invalid_certs,
            request_timeout: settings.request_timeout,
            form_locator: Box::new(RegexFormLocator),
        })
    }

    /// Swap the HTML scrape for a different locator implementation.
    pub fn with_form_locator(mut self, locator: Box<dyn FormLocator>) -> Self {
        self.form_locator = locator;
        self
    }
}

#[async_trait]
impl SessionAcquirer for RedirectWalkAcquirer {
    async fn acquire(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionBundle, AcquireError> {
        let session = WalkSession::new(self.accept_invalid_certs, self.request_timeout)?;
        tracing::debug!(username, "starting redirect walk");

        // The login URL answers with a redirect to the provider's login page.
        let response = session
            .direct
            .get(self.login_url.clone())
            .send()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or(AcquireError::MissingRedirect)?;

        let login_page_url = resolve_redirect(&self.base_origin, &location)?;
        tracing::debug!(%login_page_url, "fetching login page");
        let login_page = session
            .following
            .get(login_page_url)
            .send()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;
        let html = login_page
            .text()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        let action = self
            .form_locator
            .form_action(&html)
            .ok_or(AcquireError::FormActionNotFound)?;
        let action_url = resolve_redirect(&self.base_origin, &action)?;

        tracing::debug!(%action_url, "submitting credentials");
        session
            .direct
            .post(action_url)
            .header(header::USER_AGENT, BROWSER_USER_AGENT)
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        // One more pass over the login URL lets the provider finish the
        // authorization exchange and set the product session cookies.
        session
            .following
            .get(self.login_url.clone())
            .send()
            .await
            .map_err(|e| AcquireError::Http(e.to_string()))?;

        let cookies = session.harvest(&[&self.login_url, &self.base_origin]);
        tracing::debug!(username, count = cookies.len(), "cookies harvested");

        let bundle = CookieBundle::from_map(&cookies, &self.cookie_names)
            .enforce(self.cookie_policy, &self.cookie_names)?;
        Ok(SessionBundle::Cookies(bundle))
    }

    fn bundle_kind(&self) -> BundleKind {
        BundleKind::Cookies
    }
}

/// Resolve a `Location` header (or form action) against the base origin.
/// Absolute targets pass through untouched.
pub(crate) fn resolve_redirect(base: &Url, target: &str) -> Result<Url, AcquireError> {
    match Url::parse(target) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => base
            .join(target)
            .map_err(|e| AcquireError::InvalidUrl(format!("{target}: {e}"))),
        Err(e) => Err(AcquireError::InvalidUrl(format!("{target}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_location_is_joined_against_base() {
        let base = Url::parse("https://host").expect("base parses");
        let resolved = resolve_redirect(&base, "/auth?x=1").expect("relative target resolves");
        assert_eq!(resolved.as_str(), "https://host/auth?x=1");
    }

    #[test]
    fn test_absolute_location_is_not_reprefixed() {
        let base = Url::parse("https://host").expect("base parses");
        let resolved =
            resolve_redirect(&base, "https://other/auth").expect("absolute target resolves");
        assert_eq!(resolved.as_str(), "https://other/auth");
    }

    #[test]
    fn test_query_and_fragment_survive_resolution() {
        let base = Url::parse("https://app.example.com").expect("base parses");
        let resolved = resolve_redirect(
            &base,
            "/realms/perf/protocol/openid-connect/auth?client_id=ui&state=s%3D1",
        )
        .expect("resolves");
        assert_eq!(
            resolved.as_str(),
            "https://app.example.com/realms/perf/protocol/openid-connect/auth?client_id=ui&state=s%3D1"
        );
    }

    #[test]
    fn test_jar_harvest_flattens_and_merges_hosts() {
        let session = WalkSession::new(false, Duration::from_secs(5)).expect("session builds");
        let idp = Url::parse("https://idp.example.com/").expect("idp url");
        let app = Url::parse("https://app.example.com/").expect("app url");

        session
            .jar
            .add_cookie_str("AUTH_SESSION_ID=abc; Path=/", &idp);
        session
            .jar
            .add_cookie_str("vunet_session=s1; Path=/", &app);
        session
            .jar
            .add_cookie_str("X-VuNet-HTTP-Info=info; Path=/", &app);

        let cookies = session.harvest(&[&idp, &app]);
        assert_eq!(cookies.get("AUTH_SESSION_ID").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("vunet_session").map(String::as_str), Some("s1"));
        assert_eq!(cookies.get("X-VuNet-HTTP-Info").map(String::as_str), Some("info"));
    }

    #[test]
    fn test_cookie_value_with_equals_sign_is_kept_whole() {
        let session = WalkSession::new(false, Duration::from_secs(5)).expect("session builds");
        let app = Url::parse("https://app.example.com/").expect("app url");
        session
            .jar
            .add_cookie_str("grafana_session_expiry=ZXhwPTE=; Path=/", &app);

        let cookies = session.harvest(&[&app]);
        assert_eq!(
            cookies.get("grafana_session_expiry").map(String::as_str),
            Some("ZXhwPTE=")
        );
    }
}
