//! Operation: list the recipe corpus, or describe one package in detail.

use std::path::Path;

use console::style;
use strata_core::package::Package;
use strata_core::registry::Registry;
use strata_core::variant::{MultiValue, VariantDef};

/// List registered packages, or print the full surface of one package:
/// versions, variants with defaults, dependency edges, and provides.
pub fn list(recipes_dir: &Path, package: Option<&str>) -> miette::Result<()> {
    let registry = Registry::load_dir(recipes_dir)?;

    match package {
        Some(name) => {
            let pkg = registry.get(name, "strata list")?;
            describe(pkg);
        }
        None => {
            for pkg in registry.packages() {
                let versions: Vec<String> = pkg
                    .versions
                    .iter()
                    .map(|v| v.version.to_string())
                    .collect();
                println!("{:<24} {}", pkg.name, versions.join(", "));
            }
            println!();
            println!("{} packages", registry.len());
        }
    }
    Ok(())
}

fn join<'a>(values: impl Iterator<Item = &'a String>) -> String {
    values.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn describe(pkg: &Package) {
    println!("{}", style(&pkg.name).bold());
    if let Some(ref description) = pkg.description {
        println!("  {description}");
    }
    if let Some(ref homepage) = pkg.homepage {
        println!("  {homepage}");
    }

    println!();
    println!("versions:");
    for decl in &pkg.versions {
        println!("  {}", decl.version);
    }

    if !pkg.variants.is_empty() {
        println!();
        println!("variants:");
        for (name, def) in pkg.variants.iter() {
            match def {
                VariantDef::Bool { default } => {
                    println!("  {name} = {default} (bool)");
                }
                VariantDef::Single { values, default } => {
                    println!("  {name} = {default} (one of {})", join(values.iter()));
                }
                VariantDef::Multi { values, default, .. } => {
                    let default = match default {
                        MultiValue::Auto => "auto".to_string(),
                        MultiValue::Explicit(set) if set.is_empty() => "none".to_string(),
                        MultiValue::Explicit(set) => join(set.iter()),
                    };
                    println!("  {name} = {default} (any of {})", join(values.iter()));
                }
            }
        }
    }

    if !pkg.dependencies.is_empty() {
        println!();
        println!("dependencies:");
        for edge in &pkg.dependencies {
            if edge.when.is_empty() {
                println!("  {} [{}]", edge.spec, edge.kind);
            } else {
                println!("  {} [{}] when {}", edge.spec, edge.kind, edge.when);
            }
        }
    }

    if !pkg.provides.is_empty() {
        println!();
        println!("provides:");
        for decl in &pkg.provides {
            if decl.when.is_empty() {
                println!("  {}", decl.capability);
            } else {
                println!("  {} when {}", decl.capability, decl.when);
            }
        }
    }
}
