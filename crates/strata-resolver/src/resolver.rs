//! Dependency graph construction: recursive edge activation, version
//! selection, provider substitution, cycle detection, and conflict
//! checking.
//!
//! Resolution is strictly sequential and non-suspending. It reads the
//! immutable registry and produces a request-scoped [`Resolution`]; the
//! first failure aborts the whole request and no partial graph is
//! returned.

use std::collections::BTreeMap;

use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use strata_core::package::{Package, Patch};
use strata_core::registry::Registry;
use strata_core::spec::Spec;
use strata_core::variant::Configuration;
use strata_core::version::VersionRange;
use strata_util::errors::StrataError;

use crate::context::EvalContext;
use crate::eval::{evaluate, resolve_auto, DepView};
use crate::graph::{ResolveGraph, ResolvedEdge, ResolvedNode};

/// The output of one resolution request.
#[derive(Debug)]
pub struct Resolution {
    pub graph: ResolveGraph,
    /// Patches applicable to each resolved node, in declaration order.
    pub patches: BTreeMap<String, Vec<Patch>>,
    /// Merged runtime environment from every node's active env rules.
    /// `{prefix}` placeholders are left for the external build driver.
    pub environment: BTreeMap<String, String>,
}

impl Resolution {
    /// The root node of the request.
    pub fn root(&self) -> Option<&ResolvedNode> {
        self.graph.root.map(|idx| self.graph.node(idx))
    }
}

/// Resolve a request spec against the registry under the given context.
pub fn resolve(
    registry: &Registry,
    request: &Spec,
    ctx: &EvalContext,
) -> Result<Resolution, StrataError> {
    let mut walker = Walker {
        registry,
        ctx,
        graph: ResolveGraph::new(),
        stack: Vec::new(),
        patches: BTreeMap::new(),
        environment: BTreeMap::new(),
    };

    debug!(request = %request, "resolving");
    let root = walker.resolve_package(&request.name, Some(request), "request")?;
    walker.graph.set_root(root);
    walker.check_provider_ambiguity()?;

    Ok(Resolution {
        graph: walker.graph,
        patches: walker.patches,
        environment: walker.environment,
    })
}

struct Walker<'a> {
    registry: &'a Registry,
    ctx: &'a EvalContext,
    graph: ResolveGraph,
    /// Packages currently being resolved, for cycle detection.
    stack: Vec<String>,
    patches: BTreeMap<String, Vec<Patch>>,
    environment: BTreeMap<String, String>,
}

impl<'a> Walker<'a> {
    /// Resolve the target of a dependency edge: a concrete package, or a
    /// capability substituted through the provider index.
    fn resolve_edge_target(&mut self, spec: &Spec, requirer: &str) -> Result<NodeIndex, StrataError> {
        if self.registry.is_capability(&spec.name) {
            self.resolve_capability(spec, requirer)
        } else {
            self.resolve_package(&spec.name, Some(spec), requirer)
        }
    }

    /// Resolve a concrete package, creating at most one node per name.
    fn resolve_package(
        &mut self,
        name: &str,
        spec: Option<&Spec>,
        requirer: &str,
    ) -> Result<NodeIndex, StrataError> {
        let range = spec.and_then(|s| s.range.as_ref());

        if let Some(idx) = self.graph.find(name) {
            return self.reuse_node(idx, name, spec, range, requirer);
        }

        let pkg = self.registry.get(name, requirer)?.clone();

        let partial = match spec {
            Some(spec) => spec.partial_config(&pkg.variants)?,
            None => Configuration::new(),
        };
        let config = pkg.variants.validate(&pkg.name, &partial)?;
        let config = resolve_auto(&pkg, config, self.ctx);

        let decl = pkg.select_version(range).ok_or_else(|| StrataError::UnsatisfiableVersion {
            package: name.to_string(),
            constraint: range.map(VersionRange::as_str).unwrap_or(":").to_string(),
            requirer: requirer.to_string(),
        })?;
        let version = decl.version.clone();
        trace!(package = name, version = %version, config = %config, "selected");

        let idx = self.graph.add_node(ResolvedNode {
            name: name.to_string(),
            version: version.clone(),
            config: config.clone(),
        });
        self.stack.push(name.to_string());

        // Edges activate in declaration order; `^dep` terms see only the
        // dependencies resolved before them.
        let mut deps = DepView::new();
        for edge in &pkg.dependencies {
            if !evaluate(&edge.when, &config, Some(&version), self.ctx, &deps) {
                continue;
            }
            let child = self.resolve_edge_target(&edge.spec, &pkg.name)?;
            self.graph.add_edge(idx, child, ResolvedEdge { kind: edge.kind });
            let node = self.graph.node(child);
            deps.insert(node.name.clone(), node.version.clone(), node.config.clone());
        }

        for rule in &pkg.conflicts {
            if evaluate(&rule.when, &config, Some(&version), self.ctx, &deps) {
                return Err(StrataError::ConfigurationConflict {
                    package: pkg.name.clone(),
                    rule: rule.when.to_string(),
                    settings: offending_settings(&rule.when, &config),
                    message: rule
                        .message
                        .as_ref()
                        .map(|m| format!(": {m}"))
                        .unwrap_or_default(),
                });
            }
        }

        let active: Vec<Patch> = pkg
            .patches
            .iter()
            .filter(|p| evaluate(&p.when, &config, Some(&version), self.ctx, &deps))
            .cloned()
            .collect();
        if !active.is_empty() {
            self.patches.insert(pkg.name.clone(), active);
        }

        for rule in &pkg.env {
            if evaluate(&rule.when, &config, Some(&version), self.ctx, &deps) {
                self.environment.insert(rule.name.clone(), rule.value.clone());
            }
        }

        self.stack.pop();
        Ok(idx)
    }

    /// A package already in the graph is reused when the incoming
    /// constraints are compatible with the node as resolved. A revisit on
    /// the active stack with incompatible constraints is a cycle.
    fn reuse_node(
        &mut self,
        idx: NodeIndex,
        name: &str,
        spec: Option<&Spec>,
        range: Option<&VersionRange>,
        requirer: &str,
    ) -> Result<NodeIndex, StrataError> {
        let node = self.graph.node(idx);
        let on_stack = self.stack.iter().any(|s| s == name);

        let version_ok = range.map_or(true, |r| r.satisfies(&node.version));
        let settings_ok = match spec {
            Some(spec) => {
                let pkg = self.registry.get(name, requirer)?;
                let partial = spec.partial_config(&pkg.variants)?;
                let compatible = partial.iter().all(|(k, v)| node.config.get(k) == Some(v));
                compatible
            }
            None => true,
        };

        if version_ok && settings_ok {
            return Ok(idx);
        }
        if on_stack {
            let chain = format!("{} -> {name}", self.stack.join(" -> "));
            return Err(StrataError::CyclicDependency { chain });
        }
        if !version_ok {
            return Err(StrataError::UnsatisfiableVersion {
                package: name.to_string(),
                constraint: range.map(VersionRange::as_str).unwrap_or(":").to_string(),
                requirer: requirer.to_string(),
            });
        }
        Err(StrataError::ConfigurationConflict {
            package: name.to_string(),
            rule: spec.map(|s| s.to_string()).unwrap_or_default(),
            settings: node.config.to_string(),
            message: format!(": conflicting requirement from '{requirer}'"),
        })
    }

    /// Substitute a capability through the provider index. Exactly one
    /// candidate must qualify; ambiguity is a hard error, never a
    /// lexical tie-break.
    fn resolve_capability(&mut self, spec: &Spec, requirer: &str) -> Result<NodeIndex, StrataError> {
        let mut qualified: Vec<&str> = Vec::new();
        for (pkg, decl) in self.registry.providers_of(&spec.name) {
            if !provider_qualifies(pkg, decl.capability.range.as_ref(), &decl.when, spec, self.ctx) {
                continue;
            }
            if !qualified.contains(&pkg.name.as_str()) {
                qualified.push(&pkg.name);
            }
        }

        match qualified.as_slice() {
            [] => Err(StrataError::UnsatisfiableVersion {
                package: spec.name.clone(),
                constraint: spec.range.as_ref().map(VersionRange::as_str).unwrap_or(":").to_string(),
                requirer: requirer.to_string(),
            }),
            [provider] => {
                let provider = provider.to_string();
                debug!(capability = %spec.name, provider = %provider, "substituted");
                self.resolve_package(&provider, None, requirer)
            }
            many => Err(StrataError::AmbiguousProvider {
                capability: spec.name.clone(),
                providers: many.join(", "),
            }),
        }
    }

    /// After the graph is complete, no capability may be actively
    /// provided by more than one resolved node.
    fn check_provider_ambiguity(&self) -> Result<(), StrataError> {
        let mut providers: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for node in self.graph.all_nodes().into_iter().chain(self.root_node()) {
            let Ok(pkg) = self.registry.get(&node.name, "provider check") else {
                continue;
            };
            for decl in &pkg.provides {
                let active = evaluate(
                    &decl.when,
                    &node.config,
                    Some(&node.version),
                    self.ctx,
                    &DepView::new(),
                );
                if active {
                    let entry = providers.entry(&decl.capability.name).or_default();
                    if !entry.contains(&node.name.as_str()) {
                        entry.push(&node.name);
                    }
                }
            }
        }
        for (capability, names) in providers {
            if names.len() > 1 {
                return Err(StrataError::AmbiguousProvider {
                    capability: capability.to_string(),
                    providers: names.join(", "),
                });
            }
        }
        Ok(())
    }

    fn root_node(&self) -> Option<&ResolvedNode> {
        self.graph.root.map(|idx| self.graph.node(idx))
    }
}

/// Whether a provider package qualifies for a requested capability: its
/// provides predicate must hold under its own default configuration, and
/// the provided capability version must satisfy the requested range.
fn provider_qualifies(
    pkg: &Package,
    provided: Option<&VersionRange>,
    when: &strata_core::predicate::Predicate,
    requested: &Spec,
    ctx: &EvalContext,
) -> bool {
    let Ok(config) = pkg.variants.validate(&pkg.name, &Configuration::new()) else {
        return false;
    };
    let config = resolve_auto(pkg, config, ctx);
    let Some(decl) = pkg.select_version(None) else {
        return false;
    };
    if !evaluate(when, &config, Some(&decl.version), ctx, &DepView::new()) {
        return false;
    }
    match (&requested.range, provided) {
        // Capability versions are exact points (`gl@4.5`); a ranged
        // declaration never matches a versioned request.
        (Some(required), Some(provided)) => provided
            .as_exact()
            .is_some_and(|version| required.satisfies(version)),
        _ => true,
    }
}

/// Render only the variant settings a rule actually reads, for error
/// context.
fn offending_settings(
    rule: &strata_core::predicate::Predicate,
    config: &Configuration,
) -> String {
    let referenced = rule.referenced_variants();
    let mut restricted = Configuration::new();
    for (name, value) in config.iter() {
        if referenced.contains(&name.as_str()) {
            restricted.set(name.clone(), value.clone());
        }
    }
    if restricted.is_empty() {
        config.to_string()
    } else {
        restricted.to_string()
    }
}
