//! The immutable package entity produced by the recipe loader.
//!
//! A `Package` is loaded once at registry start and never mutated during a
//! build. All conditional structure (dependency edges, conflicts, provides,
//! patches, projection rules, environment rules) is carried as data; the
//! resolver evaluates it without touching the package again.

use std::fmt;

use crate::predicate::Predicate;
use crate::spec::Spec;
use crate::variant::VariantSchema;
use crate::version::{Version, VersionRange};

/// One registered release of a package.
#[derive(Debug, Clone)]
pub struct VersionDecl {
    pub version: Version,
    pub source: ReleaseSource,
}

/// Where a release's bytes come from. Verification is the fetch layer's
/// concern; the resolver only carries the reference.
#[derive(Debug, Clone)]
pub enum ReleaseSource {
    /// An archive with a pinned content digest.
    Archive { sha256: String },
    /// A floating git reference (branch or tag).
    Git { reference: String },
}

/// Usage kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepKind {
    Build,
    Run,
    Both,
}

impl fmt::Display for DepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DepKind::Build => "build",
            DepKind::Run => "run",
            DepKind::Both => "build+run",
        })
    }
}

/// A conditional dependency edge: the target spec (name, version range,
/// imposed variant settings), the activation predicate over the consumer's
/// own configuration, and the usage kind.
#[derive(Debug, Clone)]
pub struct DependencyEdge {
    pub spec: Spec,
    pub when: Predicate,
    pub kind: DepKind,
}

/// A predicate over a package's own resolved configuration (and compiler/
/// platform) that invalidates the configuration when true.
#[derive(Debug, Clone)]
pub struct ConflictRule {
    pub when: Predicate,
    pub message: Option<String>,
}

/// An assertion that, under `when`, this package satisfies an abstract
/// capability (e.g. `gl@4.5`) and is substitutable for it.
#[derive(Debug, Clone)]
pub struct ProvidesDecl {
    pub capability: Spec,
    pub when: Predicate,
}

/// A source patch with an applicability window.
#[derive(Debug, Clone)]
pub struct Patch {
    pub url: String,
    pub sha256: String,
    pub when: Predicate,
}

/// The build-system binding and argument projection rules.
#[derive(Debug, Clone, Default)]
pub struct BuildSpec {
    pub system: BuildSystem,
    /// Unconditional flags, emitted first in declared order.
    pub static_args: Vec<String>,
    /// Conditional/derived flags, emitted in declared order.
    pub args: Vec<ArgRule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildSystem {
    Meson,
    Python,
    R,
    #[default]
    Generic,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildSystem::Meson => "meson",
            BuildSystem::Python => "python",
            BuildSystem::R => "r",
            BuildSystem::Generic => "generic",
        })
    }
}

/// One projection rule from the resolved configuration to a build flag.
#[derive(Debug, Clone)]
pub struct ArgRule {
    /// Flag name, rendered as `-D<flag>=<value>`.
    pub flag: String,
    pub style: ArgStyle,
    /// Gate on the rule itself (e.g. version-dependent flag spellings).
    pub when: Predicate,
}

/// How a rule derives its value from the configuration.
#[derive(Debug, Clone)]
pub enum ArgStyle {
    /// `true` / `false` from a boolean variant.
    Bool { variant: String },
    /// `enabled` / `disabled` from a boolean variant.
    Feature { variant: String },
    /// Custom on/off spellings from a boolean variant, or from a multi
    /// variant (on when any value is selected).
    Choice {
        variant: String,
        on: String,
        off: String,
    },
    /// The single value of an enum variant.
    Value { variant: String },
    /// Comma-joined values of a multi variant.
    List { variant: String },
    /// A fixed value, emitted whenever the rule's gate holds.
    Const { value: String },
    /// Derived: counts how many of the listed boolean variants are on
    /// and renders the `on`/`off` spelling against `min`.
    Count {
        of: Vec<String>,
        min: usize,
        on: String,
        off: String,
    },
}

/// A runtime environment rule applied after install.
#[derive(Debug, Clone)]
pub struct EnvRule {
    pub name: String,
    /// Literal value; a `{prefix}` placeholder is substituted by the
    /// external build driver, never by the resolver.
    pub value: String,
    pub when: Predicate,
}

/// A fully-loaded package declaration.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub url: Option<String>,
    pub git: Option<String>,
    pub maintainers: Vec<String>,
    /// Declared releases in preference order (newest first).
    pub versions: Vec<VersionDecl>,
    pub variants: VariantSchema,
    pub dependencies: Vec<DependencyEdge>,
    pub conflicts: Vec<ConflictRule>,
    pub provides: Vec<ProvidesDecl>,
    pub patches: Vec<Patch>,
    pub build: BuildSpec,
    pub env: Vec<EnvRule>,
}

impl Package {
    /// Select the preferred registered release satisfying `range`.
    ///
    /// Non-floating releases win; a floating reference is chosen only when
    /// the range admits no numbered release. Returns `None` when nothing
    /// satisfies the range.
    pub fn select_version(&self, range: Option<&VersionRange>) -> Option<&VersionDecl> {
        let admits = |decl: &&VersionDecl| match range {
            Some(r) => r.satisfies(&decl.version),
            None => true,
        };
        self.versions
            .iter()
            .filter(admits)
            .find(|d| !d.version.is_floating())
            .or_else(|| self.versions.iter().find(admits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_with_versions(versions: &[(&str, bool)]) -> Package {
        Package {
            name: "demo".to_string(),
            description: None,
            homepage: None,
            url: None,
            git: None,
            maintainers: Vec::new(),
            versions: versions
                .iter()
                .map(|(v, floating)| VersionDecl {
                    version: Version::parse(v),
                    source: if *floating {
                        ReleaseSource::Git {
                            reference: v.to_string(),
                        }
                    } else {
                        ReleaseSource::Archive {
                            sha256: "0".repeat(64),
                        }
                    },
                })
                .collect(),
            variants: VariantSchema::default(),
            dependencies: Vec::new(),
            conflicts: Vec::new(),
            provides: Vec::new(),
            patches: Vec::new(),
            build: BuildSpec::default(),
            env: Vec::new(),
        }
    }

    #[test]
    fn select_prefers_first_declared_release() {
        let pkg = package_with_versions(&[("21.2.1", false), ("21.0.3", false), ("20.2.1", false)]);
        let decl = pkg.select_version(None).unwrap();
        assert_eq!(decl.version.as_str(), "21.2.1");
    }

    #[test]
    fn select_honors_range() {
        let pkg = package_with_versions(&[("21.2.1", false), ("21.0.3", false), ("20.2.1", false)]);
        let range = VersionRange::parse("21.0.0:21.0.3").unwrap();
        let decl = pkg.select_version(Some(&range)).unwrap();
        assert_eq!(decl.version.as_str(), "21.0.3");
    }

    #[test]
    fn select_skips_floating_when_release_matches() {
        let pkg = package_with_versions(&[("master", true), ("21.2.1", false)]);
        let decl = pkg.select_version(None).unwrap();
        assert_eq!(decl.version.as_str(), "21.2.1");
    }

    #[test]
    fn select_falls_back_to_floating() {
        let pkg = package_with_versions(&[("master", true), ("21.2.1", false)]);
        let range = VersionRange::parse("22:").unwrap();
        let decl = pkg.select_version(Some(&range)).unwrap();
        assert_eq!(decl.version.as_str(), "master");
    }

    #[test]
    fn select_none_when_unsatisfiable() {
        let pkg = package_with_versions(&[("21.2.1", false)]);
        let range = VersionRange::parse("22:23").unwrap();
        assert!(pkg.select_version(Some(&range)).is_none());
    }
}
