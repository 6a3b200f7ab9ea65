//! Session acquisition: turn a provisioned account into reusable session
//! credentials.
//!
//! Three interchangeable strategies sit behind [`SessionAcquirer`]:
//!
//! - [`RedirectWalkAcquirer`] simulates the OAuth authorization-code login in
//!   plain HTTP: follow the initial redirect by hand, scrape the login form's
//!   submission target out of the HTML, post the credentials, then drain the
//!   cookie jar.
//! - [`TokenGrantAcquirer`] skips the interactive flow entirely and asks the
//!   token endpoint for a password grant with the product client.
//! - `BrowserLoginAcquirer` (feature `browser-login`) drives a real headless
//!   browser through the login page and harvests its cookies.
//!
//! The run loop and the recorder only ever see the shared contract, so the
//! strategies can be swapped without touching either.

#[cfg(feature = "browser-login")]
mod browser;
mod errors;
mod form;
mod redirect;
mod token;
mod types;

use async_trait::async_trait;

#[cfg(feature = "browser-login")]
pub use browser::BrowserLoginAcquirer;
pub use errors::AcquireError;
pub use form::{FormLocator, RegexFormLocator};
pub use redirect::RedirectWalkAcquirer;
pub use token::TokenGrantAcquirer;
pub use types::{BundleKind, CookieBundle, SessionBundle, TokenBundle};

/// A strategy that logs `username` in and returns its session credentials.
#[async_trait]
pub trait SessionAcquirer: Send + Sync {
    async fn acquire(
        &self,
        username: &str,
        password: &str,
    ) -> Result<SessionBundle, AcquireError>;

    /// Which bundle variant this strategy produces. Lets the recorder commit
    /// to a column set before the first login completes.
    fn bundle_kind(&self) -> BundleKind;
}
