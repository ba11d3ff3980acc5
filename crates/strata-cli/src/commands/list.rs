//! Handler for `strata list`.

use std::path::Path;

use miette::Result;

use strata_ops::ops_list;

pub fn exec(recipes: &Path, package: Option<&str>) -> Result<()> {
    ops_list::list(recipes, package)
}
