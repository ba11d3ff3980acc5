//! Operation: print the projected build arguments for a resolved node.

use std::path::Path;

use strata_resolver::context::EvalContext;
use strata_resolver::eval::DepView;
use strata_resolver::project;
use strata_util::errors::StrataError;

use crate::load_and_resolve;

/// Resolve a request and print the build-tool arguments for one node
/// (the root unless `package` names another resolved package).
pub fn args(
    recipes_dir: &Path,
    request: &str,
    package: Option<&str>,
    ctx: &EvalContext,
) -> miette::Result<()> {
    let (registry, resolution) = load_and_resolve(recipes_dir, request, ctx)?;

    let idx = match package {
        Some(name) => resolution.graph.find(name).ok_or_else(|| {
            StrataError::PackageNotFound {
                package: name.to_string(),
                requirer: request.to_string(),
            }
        })?,
        None => resolution.graph.root.ok_or_else(|| {
            StrataError::MalformedRequest {
                request: request.to_string(),
                message: "resolution produced no root node".to_string(),
            }
        })?,
    };
    let node = resolution.graph.node(idx);
    let pkg = registry.get(&node.name, request)?;

    // Rebuild the dependency view the resolver saw for this node, so
    // version- and dependency-gated arg rules project identically.
    let mut deps = DepView::new();
    for (child, _edge) in resolution.graph.dependencies_of(idx) {
        let dep = resolution.graph.node(child);
        deps.insert(dep.name.clone(), dep.version.clone(), dep.config.clone());
    }

    for arg in project::project(pkg, &node.config, &node.version, ctx, &deps) {
        println!("{arg}");
    }
    Ok(())
}
