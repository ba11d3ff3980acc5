pub mod ops_args;
pub mod ops_check;
pub mod ops_env;
pub mod ops_list;
pub mod ops_resolve;
pub mod ops_tree;

use std::path::Path;

use strata_core::registry::Registry;
use strata_core::spec::Spec;
use strata_resolver::context::EvalContext;
use strata_resolver::resolver::{self, Resolution};

/// Load the recipe corpus and resolve a request spec under the context.
/// Shared entry point for every operation that needs a concrete graph.
pub fn load_and_resolve(
    recipes_dir: &Path,
    request: &str,
    ctx: &EvalContext,
) -> miette::Result<(Registry, Resolution)> {
    let registry = Registry::load_dir(recipes_dir)?;
    tracing::debug!(recipes = registry.len(), request, "corpus loaded");
    let spec = Spec::parse(request).map_err(|message| {
        strata_util::errors::StrataError::MalformedRequest {
            request: request.to_string(),
            message,
        }
    })?;
    let resolution = resolver::resolve(&registry, &spec, ctx)?;
    Ok((registry, resolution))
}
