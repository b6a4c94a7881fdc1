//! Parley Store - Account and session persistence
//!
//! Repository traits consumed by the auth core, the record models they
//! operate on, and a DashMap-backed in-memory backend suitable for
//! single-node deployments and tests. Networked backends implement the
//! same traits.

pub mod error;
pub mod memory;
pub mod models;
pub mod repo;

pub use error::*;
pub use memory::*;
pub use models::*;
pub use repo::*;
