//! Domain layer for promptvault
//!
//! This module contains the key/value models, render types and port traits.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
