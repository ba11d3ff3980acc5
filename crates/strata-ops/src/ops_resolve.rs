//! Operation: resolve a request spec and print the concrete configuration.

use std::path::Path;

use serde_json::json;
use strata_resolver::context::EvalContext;
use strata_util::progress;

use crate::load_and_resolve;

/// Options for `strata resolve`.
#[derive(Default)]
pub struct ResolveOptions {
    /// Emit the resolution as a JSON document instead of a summary.
    pub json: bool,
}

/// Resolve a request and print each concretized node.
pub fn resolve(
    recipes_dir: &Path,
    request: &str,
    ctx: &EvalContext,
    opts: &ResolveOptions,
) -> miette::Result<()> {
    let (_registry, resolution) = load_and_resolve(recipes_dir, request, ctx)?;

    if opts.json {
        let nodes: Vec<_> = resolution
            .root()
            .into_iter()
            .chain(resolution.graph.all_nodes())
            .map(|node| {
                json!({
                    "name": node.name,
                    "version": node.version.to_string(),
                    "variants": node.config.to_string(),
                })
            })
            .collect();
        let patches: serde_json::Map<String, serde_json::Value> = resolution
            .patches
            .iter()
            .map(|(name, patches)| {
                let list: Vec<_> = patches
                    .iter()
                    .map(|p| json!({ "url": p.url, "sha256": p.sha256 }))
                    .collect();
                (name.clone(), serde_json::Value::Array(list))
            })
            .collect();
        let doc = json!({
            "request": request,
            "nodes": nodes,
            "patches": patches,
            "environment": resolution.environment,
        });
        println!("{}", serde_json::to_string_pretty(&doc).expect("serializable"));
        return Ok(());
    }

    if let Some(root) = resolution.root() {
        progress::status("Resolved", &root.to_string());
    }
    for node in resolution
        .root()
        .into_iter()
        .chain(resolution.graph.all_nodes())
    {
        println!("{node}");
        if let Some(patches) = resolution.patches.get(&node.name) {
            for patch in patches {
                println!("    patch {}", patch.url);
            }
        }
    }
    if !resolution.environment.is_empty() {
        println!();
        for (name, value) in &resolution.environment {
            println!("env {name}={value}");
        }
    }
    Ok(())
}
