//! Command dispatch and handler modules.

mod args;
mod check;
mod env;
mod list;
mod resolve;
mod tree;

use std::path::PathBuf;

use miette::Result;

use strata_resolver::context::EvalContext;
use strata_util::errors::StrataError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let ctx = build_context(&cli)?;
    let recipes = recipes_dir(&cli);
    match cli.command {
        Command::Resolve { ref request, json } => {
            resolve::exec(&recipes, request, &ctx, json)
        }
        Command::Tree {
            ref request,
            depth,
            ref why,
        } => tree::exec(&recipes, request, &ctx, depth, why.clone()),
        Command::Args {
            ref request,
            ref package,
        } => args::exec(&recipes, request, package.as_deref(), &ctx),
        Command::Env { ref request } => env::exec(&recipes, request, &ctx),
        Command::List { ref package } => list::exec(&recipes, package.as_deref()),
        Command::Check => check::exec(&recipes),
    }
}

/// Locate the recipe corpus. A relative `--recipes` that does not exist
/// under the current directory is searched for in ancestor directories,
/// so the tool works from anywhere inside a checkout.
fn recipes_dir(cli: &Cli) -> PathBuf {
    if cli.recipes.is_absolute() || cli.recipes.is_dir() {
        return cli.recipes.clone();
    }
    let name = cli.recipes.to_string_lossy();
    std::env::current_dir()
        .ok()
        .and_then(|cwd| strata_util::fs::find_ancestor_dir(&cwd, &name))
        .unwrap_or_else(|| cli.recipes.clone())
}

/// Build the evaluation context from the global flags. Platform defaults
/// to the host family when not overridden.
fn build_context(cli: &Cli) -> Result<EvalContext> {
    let mut ctx = EvalContext::host().with_features(cli.target_features.iter().cloned());
    if let Some(ref platform) = cli.platform {
        ctx = ctx.with_platform(platform);
    }
    if let Some(ref compiler) = cli.compiler {
        let (name, version) = compiler.split_once('@').ok_or_else(|| {
            StrataError::MalformedRequest {
                request: compiler.clone(),
                message: "compiler spec must look like 'gcc@10.2.0'".to_string(),
            }
        })?;
        ctx = ctx.with_compiler(name, version);
    }
    Ok(ctx)
}
