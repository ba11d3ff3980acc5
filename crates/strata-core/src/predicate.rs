//! Activation predicates: the boolean expressions that gate dependency
//! edges, conflict rules, provides declarations, patches, and projection
//! rules.
//!
//! The textual form mirrors the recipe corpus: a predicate is a
//! whitespace-separated conjunction of terms, and the empty predicate is
//! vacuously true. A "none of {a,b,c}" rule is therefore written
//! `~a ~b ~c` and fires only when all three variants are off.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::version::VersionRange;

/// One conjunct of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// `+name` — boolean variant is on.
    VariantOn(String),
    /// `~name` — boolean variant is off.
    VariantOff(String),
    /// `name=value` — single-enum equality or multi-enum membership.
    VariantEq { name: String, value: String },
    /// `@range` — the package's own resolved version lies in the range.
    VersionIn(VersionRange),
    /// `%name` / `%name@range` — active compiler identity match.
    Compiler {
        name: String,
        range: Option<VersionRange>,
    },
    /// `platform=family` — target platform family match.
    Platform(String),
    /// `^dep`, `^dep@range`, `^dep+flag`, `^dep~flag` — constraints on a
    /// resolved dependency's version or configuration.
    Dependency { package: String, terms: Vec<DepTerm> },
}

/// A constraint attached to a `^dep` term.
#[derive(Debug, Clone, PartialEq)]
pub enum DepTerm {
    On(String),
    Off(String),
    VersionIn(VersionRange),
}

/// A conjunction of [`Term`]s. Empty means unconditional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Predicate {
    original: String,
    terms: Vec<Term>,
}

impl Predicate {
    /// The always-true predicate.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, String> {
        let mut terms = Vec::new();
        for token in input.split_whitespace() {
            terms.push(parse_term(token)?);
        }
        Ok(Self {
            original: input.trim().to_string(),
            terms,
        })
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Variant names this predicate reads, for cross-validation against
    /// the declaring package's schema.
    pub fn referenced_variants(&self) -> Vec<&str> {
        self.terms
            .iter()
            .filter_map(|t| match t {
                Term::VariantOn(n) | Term::VariantOff(n) => Some(n.as_str()),
                Term::VariantEq { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.terms == other.terms
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for Predicate {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Predicate::parse(&s)
    }
}

impl From<Predicate> for String {
    fn from(p: Predicate) -> String {
        p.original
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input.find(|c| !is_ident_char(c)).unwrap_or(input.len());
    input.split_at(end)
}

fn parse_term(token: &str) -> Result<Term, String> {
    if let Some(name) = token.strip_prefix('+') {
        return parse_flag(name).map(Term::VariantOn);
    }
    if let Some(name) = token.strip_prefix('~') {
        return parse_flag(name).map(Term::VariantOff);
    }
    if let Some(range) = token.strip_prefix('@') {
        return Ok(Term::VersionIn(VersionRange::parse(range)?));
    }
    if let Some(rest) = token.strip_prefix('%') {
        let (name, tail) = take_ident(rest);
        if name.is_empty() {
            return Err(format!("compiler term '{token}' has no name"));
        }
        let range = match tail.strip_prefix('@') {
            Some(r) => Some(VersionRange::parse(r)?),
            None if tail.is_empty() => None,
            None => return Err(format!("unexpected trailing '{tail}' in '{token}'")),
        };
        return Ok(Term::Compiler {
            name: name.to_string(),
            range,
        });
    }
    if let Some(rest) = token.strip_prefix('^') {
        return parse_dep_term(rest, token);
    }
    if let Some((name, value)) = token.split_once('=') {
        if name.is_empty() || value.is_empty() {
            return Err(format!("malformed term '{token}'"));
        }
        if name == "platform" {
            return Ok(Term::Platform(value.to_string()));
        }
        return Ok(Term::VariantEq {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
    Err(format!("unrecognized predicate term '{token}'"))
}

fn parse_flag(name: &str) -> Result<String, String> {
    if name.is_empty() || !name.chars().all(is_ident_char) {
        return Err(format!("malformed variant flag '{name}'"));
    }
    Ok(name.to_string())
}

fn parse_dep_term(rest: &str, token: &str) -> Result<Term, String> {
    let (package, mut tail) = take_ident(rest);
    if package.is_empty() {
        return Err(format!("dependency term '{token}' has no package name"));
    }
    let mut terms = Vec::new();
    while !tail.is_empty() {
        if let Some(after) = tail.strip_prefix('@') {
            // a range runs until the next flag sigil
            let end = after.find(['+', '~']).unwrap_or(after.len());
            let (range, next) = after.split_at(end);
            terms.push(DepTerm::VersionIn(VersionRange::parse(range)?));
            tail = next;
        } else if let Some(after) = tail.strip_prefix('+') {
            let (name, next) = take_ident(after);
            terms.push(DepTerm::On(parse_flag(name)?));
            tail = next;
        } else if let Some(after) = tail.strip_prefix('~') {
            let (name, next) = take_ident(after);
            terms.push(DepTerm::Off(parse_flag(name)?));
            tail = next;
        } else {
            return Err(format!("unexpected '{tail}' in dependency term '{token}'"));
        }
    }
    Ok(Term::Dependency {
        package: package.to_string(),
        terms,
    })
}
