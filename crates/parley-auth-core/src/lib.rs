//! Parley Auth Core - Authentication business logic
//!
//! Token issuance and validation, password hashing, access-token
//! revocation, federated identity verification, and the orchestrator
//! tying them to the account and session stores.

pub mod config;
pub mod error;
pub mod federation;
pub mod password;
pub mod revocation;
pub mod service;
pub mod token;

pub use config::{AuthConfig, ConfigError};
pub use error::AuthError;
pub use federation::{FederatedIdentity, GoogleIdentityVerifier, IdentityVerifier};
pub use revocation::RevocationStore;
pub use service::*;
pub use token::{TokenChecked, TokenClaims, TokenCodec};
