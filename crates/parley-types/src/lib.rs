//! Parley Types - Shared domain types
//!
//! This crate contains domain types used across Parley services:
//! - Account identity and linked federation providers
//! - Device platform and metadata
//! - Bearer token kinds and token pairs

pub mod account;
pub mod device;
pub mod token;

pub use account::*;
pub use device::*;
pub use token::*;
