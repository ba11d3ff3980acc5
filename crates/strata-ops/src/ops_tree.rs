//! Operation: display the resolved dependency tree.

use std::path::Path;

use strata_resolver::context::EvalContext;

use crate::load_and_resolve;

/// Options for `strata tree`.
#[derive(Default)]
pub struct TreeOptions {
    /// Maximum tree depth to display.
    pub depth: Option<usize>,
    /// Show the dependency path leading to a specific package instead.
    pub why: Option<String>,
}

/// Display the resolved dependency tree for a request.
pub fn tree(
    recipes_dir: &Path,
    request: &str,
    ctx: &EvalContext,
    opts: &TreeOptions,
) -> miette::Result<()> {
    let (_registry, resolution) = load_and_resolve(recipes_dir, request, ctx)?;

    if let Some(ref target) = opts.why {
        match resolution.graph.find_path(target) {
            Some(path) => {
                println!("Path to {target}:");
                for (i, node) in path.iter().enumerate() {
                    let indent = "  ".repeat(i);
                    println!("{indent}{node}");
                }
            }
            None => println!("Package '{target}' is not part of the resolution."),
        }
        return Ok(());
    }

    print!("{}", resolution.graph.print_tree(opts.depth));
    Ok(())
}
