//! Strategy B: drive a real headless browser through the login page.
//!
//! Each attempt gets its own browser process with a throwaway profile, so no
//! cookie can survive from one user to the next. Teardown runs on every exit
//! path, including the login timeout.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::{Element, Page};
use futures::StreamExt;

use crate::acquire::SessionAcquirer;
use crate::acquire::errors::AcquireError;
use crate::acquire::types::{BundleKind, CookieBundle, SessionBundle};
use crate::config::{CookieNames, CookiePolicy, Settings};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct BrowserLoginAcquirer {
    login_url: String,
    logged_in_prefix: String,
    login_timeout: Duration,
    cookie_names: CookieNames,
    cookie_policy: CookiePolicy,
}

impl BrowserLoginAcquirer {
    pub fn new(settings: &Settings) -> Result<Self, AcquireError> {
        Ok(Self {
            login_url: settings.login_url.clone(),
            logged_in_prefix: settings.logged_in_prefix.clone(),
            login_timeout: settings.login_timeout,
            cookie_names: settings.cookie_names.clone(),
            cookie_policy: settings.cookie_policy,
        })
    }

    async fn login(
        &self,
        page: &Page,
        username: &str,
        password: &str,
    ) -> Result<HashMap<String, String>, AcquireError> {
        page.wait_for_navigation()
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;

        let user_field = find_with_deadline(page, "input[name=username]", self.login_timeout).await?;
        user_field
            .click()
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;
        user_field
            .type_str(username)
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;

        let pass_field = find_with_deadline(page, "input[name=password]", self.login_timeout).await?;
        pass_field
            .click()
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;
        pass_field
            .type_str(password)
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;

        find_with_deadline(page, "button[type=submit]", self.login_timeout)
            .await?
            .click()
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;

        self.wait_for_logged_in(page).await?;

        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;
        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }

    /// Poll the page URL until it enters the logged-in prefix or the bounded
    /// wait expires.
    async fn wait_for_logged_in(&self, page: &Page) -> Result<(), AcquireError> {
        let deadline = tokio::time::Instant::now() + self.login_timeout;
        loop {
            if let Ok(Some(url)) = page.url().await {
                if is_logged_in(&url, &self.logged_in_prefix) {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AcquireError::LoginTimeout(self.login_timeout));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl SessionAcquirer for BrowserLoginAcquirer {
    async fn acquire(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionBundle, AcquireError> {
        tracing::debug!(username, "launching browser login");
        let session = BrowserSession::launch(&self.login_url).await?;

        // Run the fallible part first, tear down unconditionally, then
        // surface the login result.
        let result = self.login(&session.page, username, password).await;
        session.close().await;
        let cookies = result?;

        tracing::debug!(username, count = cookies.len(), "cookies harvested");
        let bundle = CookieBundle::from_map(&cookies, &self.cookie_names)
            .enforce(self.cookie_policy, &self.cookie_names)?;
        Ok(SessionBundle::Cookies(bundle))
    }

    fn bundle_kind(&self) -> BundleKind {
        BundleKind::Cookies
    }
}

/// An ephemeral browser: one process, one throwaway profile, one page.
struct BrowserSession {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
    page: Page,
    _profile_dir: tempfile::TempDir,
}

impl BrowserSession {
    async fn launch(login_url: &str) -> Result<Self, AcquireError> {
        let profile_dir =
            tempfile::tempdir().map_err(|e| AcquireError::Browser(e.to_string()))?;

        let config = BrowserConfig::builder()
            .user_data_dir(profile_dir.path())
            .arg("--ignore-certificate-errors")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(AcquireError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| AcquireError::Browser(e.to_string()))?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = match browser.new_page(login_url).await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                let _ = browser.wait().await;
                handler_task.abort();
                return Err(AcquireError::Browser(e.to_string()));
            }
        };

        Ok(Self {
            browser,
            handler_task,
            page,
            _profile_dir: profile_dir,
        })
    }

    async fn close(mut self) {
        let _ = self.browser.close().await;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

async fn find_with_deadline(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<Element, AcquireError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match page.find_element(selector).await {
            Ok(element) => return Ok(element),
            Err(e) if tokio::time::Instant::now() >= deadline => {
                return Err(AcquireError::Browser(format!("{selector}: {e}")));
            }
            Err(_) => tokio::time::sleep(POLL_INTERVAL).await,
        }
    }
}

fn is_logged_in(url: &str, prefix: &str) -> bool {
    url.starts_with(prefix)
}
