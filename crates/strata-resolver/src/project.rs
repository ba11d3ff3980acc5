//! Build-argument projection: map a resolved configuration to a flat,
//! deterministic sequence of build-tool flags.
//!
//! Projection is a pure function of (package, configuration, version,
//! context): static args are emitted first in declared order, then one
//! flag per matching rule in declared order, so repeated projections of
//! an identical configuration are byte-identical. Derived values (e.g.
//! "more than one front-end enabled") are computed here and never stored
//! in the configuration.

use strata_core::package::{ArgStyle, Package};
use strata_core::variant::{Configuration, MultiValue, VariantValue};
use strata_core::version::Version;

use crate::context::EvalContext;
use crate::eval::{evaluate, DepView};

/// Project the resolved configuration of one node into build flags.
/// `deps` supplies the resolved dependencies for rule predicates that
/// read them (e.g. shared-vs-static sub-variants of a dependency).
pub fn project(
    package: &Package,
    config: &Configuration,
    version: &Version,
    ctx: &EvalContext,
    deps: &DepView,
) -> Vec<String> {
    let mut args: Vec<String> = package.build.static_args.clone();

    for rule in &package.build.args {
        if !evaluate(&rule.when, config, Some(version), ctx, deps) {
            continue;
        }
        let value = match &rule.style {
            ArgStyle::Bool { variant } => match config.is_on(variant) {
                Some(on) => on.to_string(),
                None => continue,
            },
            ArgStyle::Feature { variant } => match config.is_on(variant) {
                Some(on) => feature(on),
                None => continue,
            },
            ArgStyle::Choice { variant, on, off } => match config.get(variant) {
                Some(VariantValue::Bool(true)) => on.clone(),
                Some(VariantValue::Bool(false)) => off.clone(),
                // a multi variant reads as "on" when anything is selected
                Some(VariantValue::Many(MultiValue::Explicit(set))) => {
                    if set.is_empty() { off.clone() } else { on.clone() }
                }
                _ => continue,
            },
            ArgStyle::Value { variant } => match config.get(variant) {
                Some(VariantValue::One(v)) => v.clone(),
                _ => continue,
            },
            ArgStyle::List { variant } => match config.get(variant) {
                Some(VariantValue::Many(MultiValue::Explicit(set))) => {
                    let values: Vec<&str> = set.iter().map(String::as_str).collect();
                    values.join(",")
                }
                _ => continue,
            },
            ArgStyle::Const { value } => value.clone(),
            ArgStyle::Count { of, min, on, off } => {
                let enabled = of
                    .iter()
                    .filter(|name| config.is_on(name) == Some(true))
                    .count();
                if enabled >= *min { on.clone() } else { off.clone() }
            }
        };
        args.push(format!("-D{}={value}", rule.flag));
    }

    args
}

fn feature(on: bool) -> String {
    if on { "enabled" } else { "disabled" }.to_string()
}
