//! Handler for `strata resolve`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_resolve::{self, ResolveOptions};
use strata_resolver::context::EvalContext;

pub fn exec(recipes: &Path, request: &str, ctx: &EvalContext, json: bool) -> Result<()> {
    ops_resolve::resolve(recipes, request, ctx, &ResolveOptions { json })
}
