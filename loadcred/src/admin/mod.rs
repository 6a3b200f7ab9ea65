//! Management-plane client for the identity provider.
//!
//! Covers the two setup operations of a run: obtaining the admin bearer
//! token via the password grant and creating the synthetic user accounts,
//! plus the optional group-membership assignment.

mod client;
mod errors;
mod types;

pub use client::AdminApi;
pub use errors::AdminError;
pub use types::{CredentialRepresentation, UserRepresentation};
