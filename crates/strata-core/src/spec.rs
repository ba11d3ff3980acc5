//! Abstract package specs: `name@range +flag ~flag key=a,b`.
//!
//! A spec is the constraint form shared by dependency edges
//! (`llvm@6:`), provides declarations (`gl@4.5`), and resolve requests
//! typed on the command line (`mesa+egl~glx`). It names a package (or
//! capability), optionally pins a version range, and optionally narrows
//! variant settings.

use std::fmt;

use serde::{Deserialize, Serialize};

use strata_util::errors::StrataError;

use crate::variant::{Configuration, MultiValue, VariantDef, VariantSchema, VariantValue};
use crate::version::VersionRange;

/// One variant setting carried by a spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    On(String),
    Off(String),
    Values { name: String, values: Vec<String> },
}

/// A parsed package constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Spec {
    original: String,
    pub name: String,
    pub range: Option<VersionRange>,
    pub settings: Vec<Setting>,
}

impl Spec {
    pub fn parse(input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err("empty spec".to_string());
        }

        let mut range = None;
        let mut settings = Vec::new();
        let mut chunks = trimmed.split_whitespace();

        let head = chunks.next().unwrap_or_default();
        let (name, tail) = take_ident(head);
        if name.is_empty() {
            return Err(format!("spec '{trimmed}' has no package name"));
        }
        parse_chain(tail, &mut range, &mut settings)?;
        for chunk in chunks {
            parse_chain(chunk, &mut range, &mut settings)?;
        }

        Ok(Self {
            original: trimmed.to_string(),
            name: name.to_string(),
            range,
            settings,
        })
    }

    /// A bare spec naming a package with no constraints.
    pub fn bare(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            original: name.clone(),
            name,
            range: None,
            settings: Vec::new(),
        }
    }

    /// Translate the spec's variant settings into a partial configuration
    /// against a concrete schema. Fails with `InvalidVariantValue` when a
    /// setting does not fit the declared variant kind.
    pub fn partial_config(&self, schema: &VariantSchema) -> Result<Configuration, StrataError> {
        let mut partial = Configuration::new();
        for setting in &self.settings {
            match setting {
                Setting::On(name) => partial.set(name.clone(), VariantValue::Bool(true)),
                Setting::Off(name) => partial.set(name.clone(), VariantValue::Bool(false)),
                Setting::Values { name, values } => {
                    let value = match schema.get(name) {
                        Some(VariantDef::Single { .. }) => {
                            if values.len() != 1 {
                                return Err(StrataError::InvalidVariantValue {
                                    package: self.name.clone(),
                                    variant: name.clone(),
                                    value: values.join(","),
                                });
                            }
                            VariantValue::One(values[0].clone())
                        }
                        _ => {
                            if values.len() == 1 && values[0] == "auto" {
                                VariantValue::Many(MultiValue::Auto)
                            } else if values.len() == 1 && values[0] == "none" {
                                VariantValue::Many(MultiValue::explicit(Vec::<String>::new()))
                            } else {
                                VariantValue::Many(MultiValue::explicit(values.clone()))
                            }
                        }
                    };
                    partial.set(name.clone(), value);
                }
            }
        }
        Ok(partial)
    }
}

impl PartialEq for Spec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.range.as_ref().map(VersionRange::as_str)
                == other.range.as_ref().map(VersionRange::as_str)
            && self.settings == other.settings
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for Spec {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Spec::parse(&s)
    }
}

impl From<Spec> for String {
    fn from(s: Spec) -> String {
        s.original
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input.find(|c| !is_ident_char(c)).unwrap_or(input.len());
    input.split_at(end)
}

/// Parse a sigil chain like `@6:+shared_libs~egl swr=avx,avx2`.
fn parse_chain(
    mut tail: &str,
    range: &mut Option<VersionRange>,
    settings: &mut Vec<Setting>,
) -> Result<(), String> {
    while !tail.is_empty() {
        if let Some(after) = tail.strip_prefix('@') {
            let end = after.find(['+', '~']).unwrap_or(after.len());
            let (r, next) = after.split_at(end);
            if range.is_some() {
                return Err("spec has more than one version range".to_string());
            }
            *range = Some(VersionRange::parse(r)?);
            tail = next;
        } else if let Some(after) = tail.strip_prefix('+') {
            let (name, next) = take_ident(after);
            if name.is_empty() {
                return Err("malformed '+' setting in spec".to_string());
            }
            settings.push(Setting::On(name.to_string()));
            tail = next;
        } else if let Some(after) = tail.strip_prefix('~') {
            let (name, next) = take_ident(after);
            if name.is_empty() {
                return Err("malformed '~' setting in spec".to_string());
            }
            settings.push(Setting::Off(name.to_string()));
            tail = next;
        } else {
            let (name, rest) = take_ident(tail);
            let values_part = rest
                .strip_prefix('=')
                .ok_or_else(|| format!("unexpected '{tail}' in spec"))?;
            let end = values_part.find(['+', '~', '@']).unwrap_or(values_part.len());
            let (values, next) = values_part.split_at(end);
            if name.is_empty() || values.is_empty() {
                return Err(format!("malformed setting '{tail}' in spec"));
            }
            settings.push(Setting::Values {
                name: name.to_string(),
                values: values.split(',').map(|v| v.trim().to_string()).collect(),
            });
            tail = next;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn bare_name() {
        let spec = Spec::parse("zlib").unwrap();
        assert_eq!(spec.name, "zlib");
        assert!(spec.range.is_none());
        assert!(spec.settings.is_empty());
    }

    #[test]
    fn name_with_range() {
        let spec = Spec::parse("llvm@6:").unwrap();
        assert_eq!(spec.name, "llvm");
        assert_eq!(spec.range.unwrap().as_str(), "6:");
    }

    #[test]
    fn name_with_flags() {
        let spec = Spec::parse("mesa+egl~glx").unwrap();
        assert_eq!(spec.name, "mesa");
        assert_eq!(
            spec.settings,
            vec![Setting::On("egl".to_string()), Setting::Off("glx".to_string())]
        );
    }

    #[test]
    fn spaced_chunks() {
        let spec = Spec::parse("mesa @21.0.3 +llvm swr=avx,avx2").unwrap();
        assert_eq!(spec.name, "mesa");
        assert_eq!(spec.range.unwrap().as_str(), "21.0.3");
        assert_eq!(
            spec.settings,
            vec![
                Setting::On("llvm".to_string()),
                Setting::Values {
                    name: "swr".to_string(),
                    values: vec!["avx".to_string(), "avx2".to_string()],
                },
            ]
        );
    }

    #[test]
    fn capability_spec() {
        let spec = Spec::parse("gl@4.5").unwrap();
        assert_eq!(spec.name, "gl");
        assert_eq!(spec.range.unwrap().as_str(), "4.5");
    }

    #[test]
    fn rejects_empty_and_double_range() {
        assert!(Spec::parse("").is_err());
        assert!(Spec::parse("@6:").is_err());
        assert!(Spec::parse("llvm@6:@7:").is_err());
    }

    #[test]
    fn partial_config_against_schema() {
        let mut variants = BTreeMap::new();
        variants.insert("egl".to_string(), VariantDef::Bool { default: false });
        variants.insert(
            "swr".to_string(),
            VariantDef::Multi {
                values: ["auto", "none", "avx", "avx2"].iter().map(|s| s.to_string()).collect(),
                default: MultiValue::Auto,
                auto: None,
            },
        );
        let schema = VariantSchema::new(variants);

        let spec = Spec::parse("mesa+egl swr=avx").unwrap();
        let partial = spec.partial_config(&schema).unwrap();
        assert_eq!(partial.is_on("egl"), Some(true));
        assert!(partial.has_value("swr", "avx"));
    }

    #[test]
    fn partial_config_none_clears_multi() {
        let mut variants = BTreeMap::new();
        variants.insert(
            "swr".to_string(),
            VariantDef::Multi {
                values: ["auto", "none", "avx"].iter().map(|s| s.to_string()).collect(),
                default: MultiValue::Auto,
                auto: None,
            },
        );
        let schema = VariantSchema::new(variants);
        let spec = Spec::parse("mesa swr=none").unwrap();
        let partial = spec.partial_config(&schema).unwrap();
        assert_eq!(
            partial.get("swr"),
            Some(&VariantValue::Many(MultiValue::explicit(Vec::<String>::new())))
        );
    }
}
