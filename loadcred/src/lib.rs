//! loadcred - synthetic user provisioning and session harvesting
//!
//! Provisions accounts against a Keycloak-style identity provider's admin
//! API, logs each one in, and appends the harvested session credentials
//! (cookies or a token triple) to a CSV sink for a downstream load-testing
//! tool.
//!
//! The interesting part is session acquisition: three interchangeable
//! [`SessionAcquirer`] strategies cover the scripted OAuth redirect walk, a
//! headless-browser login (feature `browser-login`), and the direct password
//! grant. The run loop in [`run`] is strategy-agnostic and strictly
//! sequential, so sink row order always matches processing order.

mod acquire;
mod admin;
mod config;
mod provision;
mod record;
mod runner;

#[cfg(feature = "browser-login")]
pub use acquire::BrowserLoginAcquirer;
pub use acquire::{
    AcquireError, BundleKind, CookieBundle, FormLocator, RedirectWalkAcquirer, RegexFormLocator,
    SessionAcquirer, SessionBundle, TokenBundle, TokenGrantAcquirer,
};
pub use admin::{AdminApi, AdminError, CredentialRepresentation, UserRepresentation};
pub use config::{ConfigError, CookieNames, CookiePolicy, Settings, SinkMode};
pub use provision::{derive_email, generate_username, user_representation};
pub use record::{RecordError, Recorder};
pub use runner::{run, RunError, RunSummary, Stage, UserOutcome};
