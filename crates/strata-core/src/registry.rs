//! The immutable package registry and its atomic-swap handle.
//!
//! A registry is built once from a recipe directory and never mutated.
//! Concurrent resolutions share it through `Arc` clones; a reload is a
//! single pointer swap observed only by resolutions that start afterwards.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::debug;

use strata_util::errors::StrataError;

use crate::package::{Package, ProvidesDecl};
use crate::recipe;

/// All loaded packages, keyed by name, plus a capability index for
/// provides-based substitution.
#[derive(Debug, Default)]
pub struct Registry {
    packages: BTreeMap<String, Arc<Package>>,
    /// capability name -> packages declaring a provides for it
    capabilities: BTreeMap<String, Vec<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.toml` recipe under `dir`. The file stem must match
    /// the declared package name.
    pub fn load_dir(dir: &Path) -> Result<Self, StrataError> {
        let mut registry = Self::new();
        for path in strata_util::fs::list_toml_files(dir)? {
            let pkg = recipe::load_path(&path)?;
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if stem != pkg.name {
                return Err(StrataError::MalformedRecipe {
                    recipe: stem,
                    message: format!("file name does not match package name '{}'", pkg.name),
                });
            }
            registry.insert(pkg)?;
        }
        debug!(packages = registry.packages.len(), "registry loaded");
        Ok(registry)
    }

    /// Insert one package, rejecting duplicates.
    pub fn insert(&mut self, pkg: Package) -> Result<(), StrataError> {
        if self.packages.contains_key(&pkg.name) {
            return Err(StrataError::MalformedRecipe {
                recipe: pkg.name.clone(),
                message: "package declared more than once".to_string(),
            });
        }
        for decl in &pkg.provides {
            self.capabilities
                .entry(decl.capability.name.clone())
                .or_default()
                .push(pkg.name.clone());
        }
        self.packages.insert(pkg.name.clone(), Arc::new(pkg));
        Ok(())
    }

    /// Read-only lookup. `requirer` names the package whose edge asked,
    /// for error context.
    pub fn get(&self, name: &str, requirer: &str) -> Result<&Arc<Package>, StrataError> {
        self.packages.get(name).ok_or_else(|| StrataError::PackageNotFound {
            package: name.to_string(),
            requirer: requirer.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Whether `name` is an abstract capability rather than a concrete
    /// package.
    pub fn is_capability(&self, name: &str) -> bool {
        !self.packages.contains_key(name) && self.capabilities.contains_key(name)
    }

    /// Candidate providers for a capability, with their provides
    /// declarations. Order is deterministic (declaration order within a
    /// name-sorted package walk).
    pub fn providers_of(&self, capability: &str) -> Vec<(&Arc<Package>, &ProvidesDecl)> {
        let mut out = Vec::new();
        if let Some(names) = self.capabilities.get(capability) {
            for name in names {
                if let Some(pkg) = self.packages.get(name) {
                    for decl in &pkg.provides {
                        if decl.capability.name == capability {
                            out.push((pkg, decl));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn packages(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.packages.values()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Atomic-swap handle around an immutable registry.
///
/// `snapshot` hands out the current `Arc`; in-flight resolutions keep the
/// snapshot they started with across a `swap`.
#[derive(Debug)]
pub struct SharedRegistry {
    inner: RwLock<Arc<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: RwLock::new(Arc::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Arc<Registry> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the registry for all future snapshots.
    pub fn swap(&self, registry: Registry) {
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Arc::new(registry);
    }
}
