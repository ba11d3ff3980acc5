//! Shared utilities for the strata resolution engine.
//!
//! This crate provides cross-cutting concerns used by all other strata
//! crates: the resolution error taxonomy and filesystem helpers for
//! locating recipe corpora.

pub mod errors;
pub mod fs;
pub mod progress;
