//! Handler for `strata env`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_env;
use strata_resolver::context::EvalContext;

pub fn exec(recipes: &Path, request: &str, ctx: &EvalContext) -> Result<()> {
    ops_env::env(recipes, request, ctx)
}
