//! Operation: lint the recipe corpus without resolving anything.
//!
//! Loading already enforces the per-file invariants (digest shape, closed
//! variant sets, declared-variant predicates). The checks here are the
//! cross-recipe ones a single load cannot see: dangling dependency names
//! and capabilities with no registered provider.

use std::path::Path;

use strata_core::registry::Registry;
use strata_util::progress;

/// Load every recipe and report cross-recipe problems. Returns an error
/// if any recipe fails to load; dangling references are warnings because
/// a corpus may intentionally ship a partial package set.
pub fn check(recipes_dir: &Path) -> miette::Result<()> {
    let registry = Registry::load_dir(recipes_dir)?;

    let mut warnings = 0usize;
    for pkg in registry.packages() {
        for edge in &pkg.dependencies {
            let target = &edge.spec.name;
            if !registry.contains(target) && !registry.is_capability(target) {
                progress::status_warn(
                    "Warning",
                    &format!("{}: dependency '{target}' has no recipe or provider", pkg.name),
                );
                warnings += 1;
            }
        }
    }

    if warnings == 0 {
        progress::status_info("Checked", &format!("{} recipes, no problems", registry.len()));
    } else {
        progress::status_warn(
            "Checked",
            &format!("{} recipes, {warnings} warning(s)", registry.len()),
        );
    }
    Ok(())
}
