//! The evaluation context: compiler identity, target platform, and
//! microarchitecture features.
//!
//! Context is an explicit parameter threaded through every predicate
//! evaluation, never ambient state, so resolution stays deterministic and
//! testable in isolation.

use std::collections::BTreeSet;

use strata_core::version::Version;

/// The active compiler, as matched by `%name@range` terms.
#[derive(Debug, Clone)]
pub struct CompilerId {
    pub name: String,
    pub version: Version,
}

impl CompilerId {
    pub fn new(name: impl Into<String>, version: &str) -> Self {
        Self {
            name: name.into(),
            version: Version::parse(version),
        }
    }
}

/// Everything a predicate may read besides the configuration itself.
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    pub compiler: Option<CompilerId>,
    /// Platform family, as matched by `platform=family` terms.
    pub platform: String,
    /// Microarchitecture features, consumed by the auto-probe step.
    pub target_features: BTreeSet<String>,
}

impl EvalContext {
    /// A context describing the running host, with no compiler pinned and
    /// no probed features.
    pub fn host() -> Self {
        let platform = if cfg!(target_os = "linux") {
            "linux"
        } else if cfg!(target_os = "macos") {
            "darwin"
        } else if cfg!(windows) {
            "windows"
        } else {
            "unknown"
        };
        Self {
            compiler: None,
            platform: platform.to_string(),
            target_features: BTreeSet::new(),
        }
    }

    pub fn with_compiler(mut self, name: &str, version: &str) -> Self {
        self.compiler = Some(CompilerId::new(name, version));
        self
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_features = features.into_iter().map(Into::into).collect();
        self
    }
}
