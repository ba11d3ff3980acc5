//! The constraint evaluator: pure, deterministic predicate evaluation
//! against a candidate configuration and an explicit context.
//!
//! The same predicate is evaluated independently for edge activation,
//! conflict checking, patch applicability, and provides gating; because
//! evaluation is side-effect free, all call sites agree by construction.

use std::collections::BTreeMap;

use strata_core::package::Package;
use strata_core::predicate::{DepTerm, Predicate, Term};
use strata_core::variant::{Configuration, MultiValue, VariantDef, VariantValue};
use strata_core::version::Version;

use crate::context::EvalContext;

/// Read-only view of already-resolved dependencies, consulted by
/// `^dep...` terms. A package absent from the view makes the term false.
#[derive(Debug, Clone, Default)]
pub struct DepView {
    entries: BTreeMap<String, (Version, Configuration)>,
}

impl DepView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, version: Version, config: Configuration) {
        self.entries.insert(name.into(), (version, config));
    }

    pub fn get(&self, name: &str) -> Option<&(Version, Configuration)> {
        self.entries.get(name)
    }
}

/// Evaluate a predicate. The empty predicate is vacuously true; a
/// multi-term predicate is the AND of its terms.
pub fn evaluate(
    predicate: &Predicate,
    config: &Configuration,
    own_version: Option<&Version>,
    ctx: &EvalContext,
    deps: &DepView,
) -> bool {
    predicate
        .terms()
        .iter()
        .all(|term| evaluate_term(term, config, own_version, ctx, deps))
}

fn evaluate_term(
    term: &Term,
    config: &Configuration,
    own_version: Option<&Version>,
    ctx: &EvalContext,
    deps: &DepView,
) -> bool {
    match term {
        Term::VariantOn(name) => config.is_on(name) == Some(true),
        Term::VariantOff(name) => config.is_on(name) == Some(false),
        Term::VariantEq { name, value } => config.has_value(name, value),
        Term::VersionIn(range) => own_version.is_some_and(|v| range.satisfies(v)),
        Term::Compiler { name, range } => match &ctx.compiler {
            Some(compiler) => {
                compiler.name == *name
                    && range.as_ref().map_or(true, |r| r.satisfies(&compiler.version))
            }
            None => false,
        },
        Term::Platform(family) => ctx.platform == *family,
        Term::Dependency { package, terms } => match deps.get(package) {
            Some((version, dep_config)) => terms.iter().all(|t| match t {
                DepTerm::On(name) => dep_config.is_on(name) == Some(true),
                DepTerm::Off(name) => dep_config.is_on(name) == Some(false),
                DepTerm::VersionIn(range) => range.satisfies(version),
            }),
            None => false,
        },
    }
}

/// The platform-probing step: rewrite every `Auto` multi-variant
/// selection to an explicit value set derived from the context's target
/// features. Runs strictly before any predicate evaluation, so the
/// evaluator never sees an `Auto` value.
///
/// A value is selected when all of its required features (per the
/// variant's declared auto table) are present; a variant without an auto
/// table resolves to the empty set.
pub fn resolve_auto(package: &Package, mut config: Configuration, ctx: &EvalContext) -> Configuration {
    let mut rewrites = Vec::new();
    for (name, value) in config.iter() {
        let VariantValue::Many(MultiValue::Auto) = value else {
            continue;
        };
        let selected: std::collections::BTreeSet<String> = match package.variants.get(name) {
            Some(VariantDef::Multi { auto: Some(table), .. }) => table
                .iter()
                .filter(|(_, features)| {
                    features.iter().all(|f| ctx.target_features.contains(f))
                })
                .map(|(value, _)| value.clone())
                .collect(),
            _ => Default::default(),
        };
        rewrites.push((name.clone(), selected));
    }
    for (name, selected) in rewrites {
        config.set(name, VariantValue::Many(MultiValue::Explicit(selected)));
    }
    config
}
