//! Common test utilities and fixtures
//!
//! - Cluster nodes sharing one in-memory coordination store
//! - Collaborator doubles that fail on demand
//! - Assertions over stores and tree heads

#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

pub use std::sync::Arc;
