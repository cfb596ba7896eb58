//! Core types and algorithms for the meeting-leader rotation.
//!
//! This crate holds the domain model, the storage abstraction, and the two
//! pure pieces of the rotation engine: resolving the next meeting occurrence
//! and drawing the next leader. It has no database, HTTP, or runtime
//! dependencies; `mlm-store-sqlite` and `mlm-engine` build on it.

pub mod error;
pub mod participant;
pub mod schedule;
pub mod selection;
pub mod selector;
pub mod store;

pub use error::{Error, Result};
