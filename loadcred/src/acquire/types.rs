use std::collections::HashMap;

use serde::Deserialize;

use crate::acquire::errors::AcquireError;
use crate::config::{CookieNames, CookiePolicy};

/// Discriminates the two bundle variants without carrying their payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    Cookies,
    Tokens,
}

/// Session credentials harvested for one user, ready for the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionBundle {
    Cookies(CookieBundle),
    Tokens(TokenBundle),
}

impl SessionBundle {
    pub fn kind(&self) -> BundleKind {
        match self {
            SessionBundle::Cookies(_) => BundleKind::Cookies,
            SessionBundle::Tokens(_) => BundleKind::Tokens,
        }
    }
}

/// Session cookies pulled out of a jar after a completed login walk.
///
/// Every field is optional; whether a partial bundle is usable is decided by
/// the configured [`CookiePolicy`], not here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieBundle {
    pub session: Option<String>,
    pub http_info: Option<String>,
    pub session_expiry: Option<String>,
}

impl CookieBundle {
    /// Pick the expected cookies out of a flat name→value harvest.
    pub fn from_map(cookies: &HashMap<String, String>, names: &CookieNames) -> Self {
        Self {
            session: cookies.get(&names.session).cloned(),
            http_info: cookies.get(&names.http_info).cloned(),
            session_expiry: cookies.get(&names.session_expiry).cloned(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_some() && self.http_info.is_some() && self.session_expiry.is_some()
    }

    /// Configured names of the cookies that were not harvested.
    pub fn missing_names(&self, names: &CookieNames) -> Vec<String> {
        let mut missing = Vec::new();
        if self.session.is_none() {
            missing.push(names.session.clone());
        }
        if self.http_info.is_none() {
            missing.push(names.http_info.clone());
        }
        if self.session_expiry.is_none() {
            missing.push(names.session_expiry.clone());
        }
        missing
    }

    /// Apply the strictness policy: `RequireAll` turns an incomplete bundle
    /// into a per-user failure, `BestEffort` lets it through for partial
    /// recording.
    pub fn enforce(self, policy: CookiePolicy, names: &CookieNames) -> Result<Self, AcquireError> {
        if policy == CookiePolicy::RequireAll && !self.is_complete() {
            return Err(AcquireError::MissingCookies(
                self.missing_names(names).join(", "),
            ));
        }
        Ok(self)
    }
}

/// Token triple returned verbatim by the token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: String,
}
