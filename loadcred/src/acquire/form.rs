//! Locating the login form's submission target in returned HTML.

use std::sync::LazyLock;

use regex::Regex;

static ACTION_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"action="([^"]+)""#).expect("action pattern compiles"));

/// Narrow seam over the HTML scrape so a stricter parser can replace the
/// pattern match without touching the walk itself.
pub trait FormLocator: Send + Sync {
    /// Return the first submission URL found in `html`, if any.
    fn form_action(&self, html: &str) -> Option<String>;
}

/// Default locator: first `action="..."` attribute wins, even when the page
/// carries more than one form.
#[derive(Debug, Default)]
pub struct RegexFormLocator;

impl FormLocator for RegexFormLocator {
    fn form_action(&self, html: &str) -> Option<String> {
        ACTION_ATTR
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}
