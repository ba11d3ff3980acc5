//! Operation: print the merged runtime environment of a resolution.

use std::path::Path;

use strata_resolver::context::EvalContext;

use crate::load_and_resolve;

/// Resolve a request and print its runtime environment as shell-style
/// `NAME=value` lines. `{prefix}` placeholders are printed verbatim and
/// substituted by the external build driver at install time.
pub fn env(recipes_dir: &Path, request: &str, ctx: &EvalContext) -> miette::Result<()> {
    let (_registry, resolution) = load_and_resolve(recipes_dir, request, ctx)?;

    if resolution.environment.is_empty() {
        println!("No environment settings for this resolution.");
        return Ok(());
    }
    for (name, value) in &resolution.environment {
        println!("{name}={value}");
    }
    Ok(())
}
