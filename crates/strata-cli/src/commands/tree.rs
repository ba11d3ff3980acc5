//! Handler for `strata tree`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_tree::{self, TreeOptions};
use strata_resolver::context::EvalContext;

pub fn exec(
    recipes: &Path,
    request: &str,
    ctx: &EvalContext,
    depth: Option<u32>,
    why: Option<String>,
) -> Result<()> {
    let opts = TreeOptions {
        depth: depth.map(|d| d as usize),
        why,
    };
    ops_tree::tree(recipes, request, ctx, &opts)
}
