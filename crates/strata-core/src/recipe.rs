//! Recipe file parsing: the declarative TOML form of one package.
//!
//! A recipe carries versions, variants, conditional dependency edges,
//! conflicts, provides declarations, patches, build-argument projection
//! rules, and runtime environment rules. Parsing is two-phase: serde
//! deserializes the raw structure, then [`RecipeFile::into_package`]
//! cross-validates it into an immutable [`Package`]. Any violation of the
//! structural invariants (closed value sets, known variant references,
//! well-formed digests) is a `MalformedRecipe` error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use strata_util::errors::StrataError;

use crate::package::{
    ArgRule, ArgStyle, BuildSpec, BuildSystem, ConflictRule, DepKind, DependencyEdge, EnvRule,
    Package, Patch, ProvidesDecl, ReleaseSource, VersionDecl,
};
use crate::predicate::Predicate;
use crate::spec::Spec;
use crate::variant::{MultiValue, VariantDef, VariantSchema};
use crate::version::Version;

/// The raw serde model of a `recipes/<name>.toml` file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipeFile {
    pub package: PackageMeta,

    #[serde(default, rename = "version")]
    pub versions: Vec<RawVersion>,

    #[serde(default)]
    pub variants: BTreeMap<String, RawVariant>,

    #[serde(default, rename = "dependency")]
    pub dependencies: Vec<RawDependency>,

    #[serde(default, rename = "conflict")]
    pub conflicts: Vec<RawConflict>,

    #[serde(default)]
    pub provides: Vec<RawProvides>,

    #[serde(default, rename = "patch")]
    pub patches: Vec<RawPatch>,

    #[serde(default)]
    pub build: Option<RawBuild>,

    #[serde(default, rename = "env")]
    pub env: Vec<RawEnv>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageMeta {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub git: Option<String>,
    #[serde(default)]
    pub maintainers: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawVersion {
    pub version: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawVariant {
    pub kind: VariantKind,
    pub default: RawDefault,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Auto-detection table for multi variants: value -> required features.
    #[serde(default)]
    pub auto: Option<BTreeMap<String, Vec<String>>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Bool,
    Single,
    Multi,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawDefault {
    Bool(bool),
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDependency {
    pub spec: Spec,
    #[serde(default)]
    pub when: Predicate,
    #[serde(default)]
    pub kind: RawDepKind,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawDepKind {
    Build,
    Run,
    #[default]
    Both,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConflict {
    pub when: Predicate,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawProvides {
    pub capability: Spec,
    #[serde(default)]
    pub when: Predicate,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawPatch {
    pub url: String,
    pub sha256: String,
    #[serde(default)]
    pub when: Predicate,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawBuild {
    #[serde(default)]
    pub system: RawBuildSystem,
    #[serde(default)]
    pub static_args: Vec<String>,
    #[serde(default)]
    pub args: Vec<RawArgRule>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RawBuildSystem {
    Meson,
    Python,
    R,
    #[default]
    Generic,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawArgRule {
    pub flag: String,
    pub style: RawArgStyle,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub on: Option<String>,
    #[serde(default)]
    pub off: Option<String>,
    #[serde(default)]
    pub of: Vec<String>,
    #[serde(default)]
    pub min: Option<usize>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub when: Predicate,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RawArgStyle {
    Bool,
    Feature,
    Choice,
    Value,
    List,
    Const,
    Count,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEnv {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub when: Predicate,
}

impl RecipeFile {
    /// Parse a recipe from TOML text. `label` identifies the recipe in
    /// error messages (usually the file name).
    pub fn from_str(content: &str, label: &str) -> Result<Self, StrataError> {
        toml::from_str(content).map_err(|e| StrataError::MalformedRecipe {
            recipe: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Read and parse a recipe file.
    pub fn from_path(path: &Path) -> Result<Self, StrataError> {
        let label = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content, &label)
    }

    /// Cross-validate the raw recipe into an immutable package entity.
    pub fn into_package(self, label: &str) -> Result<Package, StrataError> {
        let malformed = |message: String| StrataError::MalformedRecipe {
            recipe: label.to_string(),
            message,
        };

        if self.package.name.is_empty() {
            return Err(malformed("package name is empty".to_string()));
        }
        if self.versions.is_empty() {
            return Err(malformed("recipe declares no versions".to_string()));
        }

        let mut versions = Vec::with_capacity(self.versions.len());
        for raw in self.versions {
            versions.push(convert_version(raw).map_err(&malformed)?);
        }
        let mut seen = std::collections::BTreeSet::new();
        for decl in &versions {
            if !seen.insert(decl.version.as_str().to_string()) {
                return Err(malformed(format!(
                    "version '{}' declared more than once",
                    decl.version
                )));
            }
        }

        let mut variants = BTreeMap::new();
        for (name, raw) in self.variants {
            let def = convert_variant(&name, raw).map_err(&malformed)?;
            variants.insert(name, def);
        }
        let schema = VariantSchema::new(variants);

        let check_when = |when: &Predicate, site: &str| -> Result<(), StrataError> {
            for name in when.referenced_variants() {
                if schema.get(name).is_none() {
                    return Err(malformed(format!(
                        "{site} references undeclared variant '{name}'"
                    )));
                }
            }
            Ok(())
        };

        let mut dependencies = Vec::new();
        for raw in self.dependencies {
            if raw.spec.name == self.package.name {
                return Err(malformed("package depends on itself".to_string()));
            }
            check_when(&raw.when, &format!("dependency '{}'", raw.spec))?;
            dependencies.push(DependencyEdge {
                spec: raw.spec,
                when: raw.when,
                kind: match raw.kind {
                    RawDepKind::Build => DepKind::Build,
                    RawDepKind::Run => DepKind::Run,
                    RawDepKind::Both => DepKind::Both,
                },
            });
        }

        let mut conflicts = Vec::new();
        for raw in self.conflicts {
            check_when(&raw.when, "conflict rule")?;
            conflicts.push(ConflictRule {
                when: raw.when,
                message: raw.message,
            });
        }

        let mut provides = Vec::new();
        for raw in self.provides {
            check_when(&raw.when, &format!("provides '{}'", raw.capability))?;
            provides.push(ProvidesDecl {
                capability: raw.capability,
                when: raw.when,
            });
        }

        let mut patches = Vec::new();
        for raw in self.patches {
            check_digest(&raw.sha256).map_err(&malformed)?;
            check_when(&raw.when, &format!("patch '{}'", raw.url))?;
            patches.push(Patch {
                url: raw.url,
                sha256: raw.sha256,
                when: raw.when,
            });
        }

        let build = match self.build {
            Some(raw) => {
                let mut args = Vec::new();
                for rule in raw.args {
                    check_when(&rule.when, &format!("build arg '{}'", rule.flag))?;
                    args.push(convert_arg_rule(rule, &schema).map_err(&malformed)?);
                }
                BuildSpec {
                    system: match raw.system {
                        RawBuildSystem::Meson => BuildSystem::Meson,
                        RawBuildSystem::Python => BuildSystem::Python,
                        RawBuildSystem::R => BuildSystem::R,
                        RawBuildSystem::Generic => BuildSystem::Generic,
                    },
                    static_args: raw.static_args,
                    args,
                }
            }
            None => BuildSpec::default(),
        };

        let mut env = Vec::new();
        for raw in self.env {
            check_when(&raw.when, &format!("env rule '{}'", raw.name))?;
            env.push(EnvRule {
                name: raw.name,
                value: raw.value,
                when: raw.when,
            });
        }

        Ok(Package {
            name: self.package.name,
            description: self.package.description,
            homepage: self.package.homepage,
            url: self.package.url,
            git: self.package.git,
            maintainers: self.package.maintainers,
            versions,
            variants: schema,
            dependencies,
            conflicts,
            provides,
            patches,
            build,
            env,
        })
    }
}

/// Parse and validate a recipe file into a package in one step.
pub fn load_path(path: &Path) -> Result<Package, StrataError> {
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    RecipeFile::from_path(path)?.into_package(&label)
}

/// Parse and validate a recipe from TOML text.
pub fn load_str(content: &str, label: &str) -> Result<Package, StrataError> {
    RecipeFile::from_str(content, label)?.into_package(label)
}

fn convert_version(raw: RawVersion) -> Result<VersionDecl, String> {
    let version = Version::parse(&raw.version);
    let source = match (raw.sha256, raw.tag, raw.branch) {
        (Some(sha256), None, None) => {
            check_digest(&sha256)?;
            ReleaseSource::Archive { sha256 }
        }
        (None, Some(reference), None) | (None, None, Some(reference)) => {
            ReleaseSource::Git { reference }
        }
        _ => {
            return Err(format!(
                "version '{}' needs exactly one of sha256, tag, or branch",
                raw.version
            ))
        }
    };
    Ok(VersionDecl { version, source })
}

fn check_digest(digest: &str) -> Result<(), String> {
    if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
        return Err(format!("'{digest}' is not a lowercase sha256 digest"));
    }
    Ok(())
}

fn convert_variant(name: &str, raw: RawVariant) -> Result<VariantDef, String> {
    match raw.kind {
        VariantKind::Bool => {
            let RawDefault::Bool(default) = raw.default else {
                return Err(format!("variant '{name}' is bool but default is not"));
            };
            if !raw.values.is_empty() {
                return Err(format!("bool variant '{name}' must not declare values"));
            }
            Ok(VariantDef::Bool { default })
        }
        VariantKind::Single => {
            let RawDefault::One(default) = raw.default else {
                return Err(format!("variant '{name}' needs a single string default"));
            };
            let values: std::collections::BTreeSet<String> = raw.values.into_iter().collect();
            if !values.contains(&default) {
                return Err(format!(
                    "default '{default}' of variant '{name}' is outside its value set"
                ));
            }
            Ok(VariantDef::Single { values, default })
        }
        VariantKind::Multi => {
            let defaults = match raw.default {
                RawDefault::Many(v) => v,
                RawDefault::One(v) => vec![v],
                RawDefault::Bool(_) => {
                    return Err(format!("variant '{name}' needs a list default"));
                }
            };
            let values: std::collections::BTreeSet<String> = raw.values.into_iter().collect();
            for d in &defaults {
                if !values.contains(d) {
                    return Err(format!(
                        "default '{d}' of variant '{name}' is outside its value set"
                    ));
                }
            }
            if let Some(auto) = &raw.auto {
                for value in auto.keys() {
                    if !values.contains(value) {
                        return Err(format!(
                            "auto table of variant '{name}' names undeclared value '{value}'"
                        ));
                    }
                }
            }
            let default = if defaults.iter().any(|d| d == "auto") {
                MultiValue::Auto
            } else if defaults.iter().any(|d| d == "none") {
                MultiValue::explicit(Vec::<String>::new())
            } else {
                MultiValue::explicit(defaults)
            };
            Ok(VariantDef::Multi {
                values,
                default,
                auto: raw.auto,
            })
        }
    }
}

fn convert_arg_rule(raw: RawArgRule, schema: &VariantSchema) -> Result<ArgRule, String> {
    let need_variant = |raw: &RawArgRule| -> Result<String, String> {
        raw.variant
            .clone()
            .ok_or_else(|| format!("arg '{}' needs a variant", raw.flag))
    };
    let check_exists = |name: &str| -> Result<(), String> {
        if schema.get(name).is_none() {
            return Err(format!("arg rule references undeclared variant '{name}'"));
        }
        Ok(())
    };

    let style = match raw.style {
        RawArgStyle::Bool => {
            let variant = need_variant(&raw)?;
            check_exists(&variant)?;
            ArgStyle::Bool { variant }
        }
        RawArgStyle::Feature => {
            let variant = need_variant(&raw)?;
            check_exists(&variant)?;
            ArgStyle::Feature { variant }
        }
        RawArgStyle::Choice => {
            let variant = need_variant(&raw)?;
            check_exists(&variant)?;
            let (Some(on), Some(off)) = (raw.on.clone(), raw.off.clone()) else {
                return Err(format!("choice arg '{}' needs 'on' and 'off'", raw.flag));
            };
            ArgStyle::Choice { variant, on, off }
        }
        RawArgStyle::Value => {
            let variant = need_variant(&raw)?;
            check_exists(&variant)?;
            ArgStyle::Value { variant }
        }
        RawArgStyle::List => {
            let variant = need_variant(&raw)?;
            check_exists(&variant)?;
            ArgStyle::List { variant }
        }
        RawArgStyle::Const => {
            let Some(value) = raw.value.clone() else {
                return Err(format!("const arg '{}' needs a 'value'", raw.flag));
            };
            ArgStyle::Const { value }
        }
        RawArgStyle::Count => {
            if raw.of.is_empty() {
                return Err(format!("count arg '{}' needs a non-empty 'of' list", raw.flag));
            }
            for name in &raw.of {
                check_exists(name)?;
            }
            ArgStyle::Count {
                of: raw.of.clone(),
                min: raw.min.unwrap_or(1),
                on: raw.on.clone().unwrap_or_else(|| "enabled".to_string()),
                off: raw.off.clone().unwrap_or_else(|| "disabled".to_string()),
            }
        }
    };

    Ok(ArgRule {
        flag: raw.flag,
        style,
        when: raw.when,
    })
}
