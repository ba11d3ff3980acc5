//! Variant schemas: the declared configuration axes of a package.
//!
//! A variant is a named, package-scoped configuration axis with a closed
//! set of legal values. Three kinds exist: boolean on/off switches,
//! single-valued enums, and multi-valued enums (zero or more selections,
//! optionally with an `auto` mode deferred to platform probing).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use strata_util::errors::StrataError;

/// Definition of one configuration axis.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantDef {
    Bool {
        default: bool,
    },
    Single {
        values: BTreeSet<String>,
        default: String,
    },
    Multi {
        values: BTreeSet<String>,
        default: MultiValue,
        /// Auto-detection table: value -> target features that imply it.
        /// Consulted by the platform probe when the selection is `Auto`.
        auto: Option<BTreeMap<String, Vec<String>>>,
    },
}

/// A concrete setting of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantValue {
    Bool(bool),
    One(String),
    Many(MultiValue),
}

/// The selection state of a multi-valued variant. `Auto` defers the choice
/// to platform/hardware detection and must be rewritten to `Explicit`
/// before predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultiValue {
    Auto,
    Explicit(BTreeSet<String>),
}

impl MultiValue {
    pub fn explicit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MultiValue::Explicit(values.into_iter().map(Into::into).collect())
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, MultiValue::Auto)
    }
}

/// A resolved (or partially resolved) assignment of variants to values.
///
/// Backed by a `BTreeMap` so iteration and rendering are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    settings: BTreeMap<String, VariantValue>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: VariantValue) {
        self.settings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&VariantValue> {
        self.settings.get(name)
    }

    /// Truth value of a boolean variant; `None` for absent or non-boolean.
    pub fn is_on(&self, name: &str) -> Option<bool> {
        match self.settings.get(name) {
            Some(VariantValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Membership test: does `name` carry the value `value`?
    /// Equality for single-enums, set membership for multi-enums.
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        match self.settings.get(name) {
            Some(VariantValue::One(v)) => v == value,
            Some(VariantValue::Many(MultiValue::Explicit(set))) => set.contains(value),
            Some(VariantValue::Many(MultiValue::Auto)) => value == "auto",
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariantValue)> {
        self.settings.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.settings {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            match value {
                VariantValue::Bool(true) => write!(f, "+{name}")?,
                VariantValue::Bool(false) => write!(f, "~{name}")?,
                VariantValue::One(v) => write!(f, "{name}={v}")?,
                VariantValue::Many(MultiValue::Auto) => write!(f, "{name}=auto")?,
                VariantValue::Many(MultiValue::Explicit(set)) => {
                    let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                    if joined.is_empty() {
                        write!(f, "{name}=none")?;
                    } else {
                        write!(f, "{name}={}", joined.join(","))?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// The full variant schema of one package: every declared axis with its
/// default. Variant names are unique by construction (map keys).
#[derive(Debug, Clone, Default)]
pub struct VariantSchema {
    variants: BTreeMap<String, VariantDef>,
}

impl VariantSchema {
    pub fn new(variants: BTreeMap<String, VariantDef>) -> Self {
        Self { variants }
    }

    pub fn get(&self, name: &str) -> Option<&VariantDef> {
        self.variants.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariantDef)> {
        self.variants.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// Every variant at its declared default.
    pub fn defaults(&self) -> Configuration {
        let mut config = Configuration::new();
        for (name, def) in &self.variants {
            let value = match def {
                VariantDef::Bool { default } => VariantValue::Bool(*default),
                VariantDef::Single { default, .. } => VariantValue::One(default.clone()),
                VariantDef::Multi { default, .. } => VariantValue::Many(default.clone()),
            };
            config.set(name.clone(), value);
        }
        config
    }

    /// Merge caller overrides onto defaults, rejecting unknown variants,
    /// kind mismatches, and values outside the declared closed set.
    ///
    /// Idempotent: validating an already-validated configuration returns
    /// the same configuration.
    pub fn validate(&self, package: &str, partial: &Configuration) -> Result<Configuration, StrataError> {
        let mut config = self.defaults();
        for (name, value) in partial.iter() {
            let def = self.variants.get(name).ok_or_else(|| StrataError::InvalidVariantValue {
                package: package.to_string(),
                variant: name.clone(),
                value: "<unknown variant>".to_string(),
            })?;
            self.check_value(package, name, def, value)?;
            config.set(name.clone(), value.clone());
        }
        Ok(config)
    }

    fn check_value(
        &self,
        package: &str,
        name: &str,
        def: &VariantDef,
        value: &VariantValue,
    ) -> Result<(), StrataError> {
        let bad = |value: String| StrataError::InvalidVariantValue {
            package: package.to_string(),
            variant: name.to_string(),
            value,
        };
        match (def, value) {
            (VariantDef::Bool { .. }, VariantValue::Bool(_)) => Ok(()),
            (VariantDef::Single { values, .. }, VariantValue::One(v)) => {
                if values.contains(v) {
                    Ok(())
                } else {
                    Err(bad(v.clone()))
                }
            }
            (VariantDef::Multi { values, .. }, VariantValue::Many(MultiValue::Explicit(set))) => {
                for v in set {
                    if !values.contains(v) && v != "none" {
                        return Err(bad(v.clone()));
                    }
                }
                Ok(())
            }
            (VariantDef::Multi { values, .. }, VariantValue::Many(MultiValue::Auto)) => {
                if values.contains("auto") {
                    Ok(())
                } else {
                    Err(bad("auto".to_string()))
                }
            }
            _ => Err(bad(format!("{value:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesa_like_schema() -> VariantSchema {
        let mut variants = BTreeMap::new();
        variants.insert("llvm".to_string(), VariantDef::Bool { default: true });
        variants.insert("egl".to_string(), VariantDef::Bool { default: false });
        variants.insert(
            "swr".to_string(),
            VariantDef::Multi {
                values: ["auto", "none", "avx", "avx2", "knl", "skx"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                default: MultiValue::Auto,
                auto: None,
            },
        );
        VariantSchema::new(variants)
    }

    #[test]
    fn defaults_cover_every_variant() {
        let schema = mesa_like_schema();
        let config = schema.defaults();
        assert_eq!(config.is_on("llvm"), Some(true));
        assert_eq!(config.is_on("egl"), Some(false));
        assert!(matches!(
            config.get("swr"),
            Some(VariantValue::Many(MultiValue::Auto))
        ));
    }

    #[test]
    fn validate_merges_overrides() {
        let schema = mesa_like_schema();
        let mut partial = Configuration::new();
        partial.set("egl", VariantValue::Bool(true));
        let config = schema.validate("mesa", &partial).unwrap();
        assert_eq!(config.is_on("egl"), Some(true));
        // untouched variants keep their defaults
        assert_eq!(config.is_on("llvm"), Some(true));
    }

    #[test]
    fn validate_rejects_unknown_variant() {
        let schema = mesa_like_schema();
        let mut partial = Configuration::new();
        partial.set("vulkan", VariantValue::Bool(true));
        let err = schema.validate("mesa", &partial).unwrap_err();
        assert!(matches!(err, StrataError::InvalidVariantValue { .. }));
    }

    #[test]
    fn validate_rejects_value_outside_closed_set() {
        let schema = mesa_like_schema();
        let mut partial = Configuration::new();
        partial.set("swr", VariantValue::Many(MultiValue::explicit(["sse2"])));
        assert!(schema.validate("mesa", &partial).is_err());
    }

    #[test]
    fn validate_is_idempotent() {
        let schema = mesa_like_schema();
        let mut partial = Configuration::new();
        partial.set("egl", VariantValue::Bool(true));
        partial.set("swr", VariantValue::Many(MultiValue::explicit(["avx", "avx2"])));
        let once = schema.validate("mesa", &partial).unwrap();
        let twice = schema.validate("mesa", &once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn membership_test() {
        let mut config = Configuration::new();
        config.set("swr", VariantValue::Many(MultiValue::explicit(["avx"])));
        assert!(config.has_value("swr", "avx"));
        assert!(!config.has_value("swr", "avx2"));
    }

    #[test]
    fn display_is_sorted_and_stable() {
        let mut config = Configuration::new();
        config.set("llvm", VariantValue::Bool(true));
        config.set("egl", VariantValue::Bool(false));
        config.set("swr", VariantValue::Many(MultiValue::explicit(["avx2", "avx"])));
        assert_eq!(config.to_string(), "~egl +llvm swr=avx,avx2");
    }
}
