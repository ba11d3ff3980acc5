//! Handler for `strata check`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_check;

pub fn exec(recipes: &Path) -> Result<()> {
    ops_check::check(recipes)
}
