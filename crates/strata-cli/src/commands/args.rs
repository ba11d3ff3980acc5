//! Handler for `strata args`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_args;
use strata_resolver::context::EvalContext;

pub fn exec(
    recipes: &Path,
    request: &str,
    package: Option<&str>,
    ctx: &EvalContext,
) -> Result<()> {
    ops_args::args(recipes, request, package, ctx)
}
