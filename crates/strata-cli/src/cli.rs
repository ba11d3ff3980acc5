//! CLI argument definitions for strata.
//!
//! Uses `clap` derive macros to define the full command surface. Each command
//! corresponds to a handler in the [`super::commands`] module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "strata",
    version,
    about = "A conditional dependency resolver for build recipes",
    long_about = "Strata resolves abstract package requests against a corpus of declarative \
                  recipes: conditional dependencies, variant schemas, version windows, and \
                  capability providers collapse into one concrete build graph."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the recipe corpus
    #[arg(long, global = true, default_value = "recipes")]
    pub recipes: PathBuf,

    /// Compiler spec to evaluate %-terms against (e.g. gcc@10.2.0)
    #[arg(long, global = true)]
    pub compiler: Option<String>,

    /// Platform family to evaluate platform= terms against
    #[arg(long, global = true)]
    pub platform: Option<String>,

    /// Target CPU feature for auto-valued variants (repeatable)
    #[arg(long = "target-feature", global = true)]
    pub target_features: Vec<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a request spec into a concrete configuration
    Resolve {
        /// Request spec, e.g. "mesa@21.2:+glx~egl swr=avx,avx2"
        request: String,
        /// Emit the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the resolved dependency tree
    Tree {
        /// Request spec
        request: String,
        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<u32>,
        /// Show the dependency path leading to a package
        #[arg(long)]
        why: Option<String>,
    },

    /// Print the projected build arguments for a resolved node
    Args {
        /// Request spec
        request: String,
        /// Project arguments for this package instead of the root
        #[arg(short, long)]
        package: Option<String>,
    },

    /// Print the merged runtime environment of a resolution
    Env {
        /// Request spec
        request: String,
    },

    /// List recipes, or describe one package
    List {
        /// Package to describe in detail
        package: Option<String>,
    },

    /// Lint the recipe corpus without resolving
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}
