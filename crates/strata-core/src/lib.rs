//! Core data model for the strata resolution engine.
//!
//! This crate defines the declarative half of the system: release versions
//! and range constraints, variant schemas, activation predicates, abstract
//! package specs, recipe files, and the immutable package registry built
//! from them. It contains no resolution logic and performs no I/O beyond
//! reading recipe files.

pub mod package;
pub mod predicate;
pub mod recipe;
pub mod registry;
pub mod spec;
pub mod variant;
pub mod version;
