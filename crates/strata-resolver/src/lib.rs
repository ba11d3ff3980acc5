//! Resolution engine for strata: evaluates activation predicates against
//! concrete configurations, builds per-request dependency graphs, and
//! projects resolved configurations into build-tool argument sequences.

pub mod context;
pub mod eval;
pub mod graph;
pub mod project;
pub mod resolver;
