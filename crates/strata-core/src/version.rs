//! Release version parsing, comparison, and range matching.
//!
//! Versions follow the conventions of scientific-software release tags
//! rather than semver:
//! - Segments are split on `.`, `-` and `_`
//! - Numeric segments compare as numbers, text segments lexically
//! - Floating development references (`master`, `main`, `develop`, `head`,
//!   `trunk`) sort above every numeric release
//! - Range bounds use prefix semantics: `:20.3` admits `20.3.4`

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Names that denote a floating development reference rather than a release.
const FLOATING_NAMES: &[&str] = &["master", "main", "develop", "head", "trunk"];

/// A parsed version with comparable segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Text(String),
}

impl Version {
    pub fn parse(version: &str) -> Self {
        Self {
            original: version.to_string(),
            segments: parse_segments(version),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// Whether this is a floating development reference (git branch or tag)
    /// rather than a numbered release.
    pub fn is_floating(&self) -> bool {
        FLOATING_NAMES.contains(&self.original.to_lowercase().as_str())
    }

    /// Whether `prefix` is a segment-wise prefix of this version.
    /// `20.3.4` is within the prefix `20.3` but not within `20.3.4.1`.
    pub fn starts_with(&self, prefix: &Version) -> bool {
        if prefix.segments.len() > self.segments.len() {
            return false;
        }
        self.segments[..prefix.segments.len()] == prefix.segments[..]
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_floating(), other.is_floating()) {
            (true, true) => return self.original.cmp(&other.original),
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }
        let max_len = self.segments.len().max(other.segments.len());
        for i in 0..max_len {
            let ord = compare_segments(self.segments.get(i), other.segments.get(i));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for Version {
    type Error = std::convert::Infallible;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Ok(Version::parse(&s))
    }
}

impl From<Version> for String {
    fn from(v: Version) -> String {
        v.original
    }
}

fn compare_segments(a: Option<&Segment>, b: Option<&Segment>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(s), None) => compare_segment_to_empty(s),
        (None, Some(s)) => compare_segment_to_empty(s).reverse(),
        (Some(a), Some(b)) => compare_two_segments(a, b),
    }
}

fn compare_segment_to_empty(seg: &Segment) -> Ordering {
    match seg {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare_two_segments(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Text(a), Segment::Text(b)) => a.cmp(b),
        (Segment::Numeric(_), Segment::Text(_)) => Ordering::Greater,
        (Segment::Text(_), Segment::Numeric(_)) => Ordering::Less,
    }
}

fn is_version_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')
}

fn parse_segments(version: &str) -> Vec<Segment> {
    version
        .split(['.', '-', '_'])
        .filter(|t| !t.is_empty())
        .map(|t| match t.parse::<u64>() {
            Ok(n) => Segment::Numeric(n),
            Err(_) => Segment::Text(t.to_string()),
        })
        .collect()
}

/// A version range constraint in recipe syntax.
///
/// Supported forms: `6:` (at least), `:20.3` (at most), `21.0.0:21.0.3`
/// (both bounds), `:` (any), and a bare `21.2` (exact-or-prefix match).
/// All bounds are inclusive with prefix semantics, so `:20.3` admits
/// `20.3.4`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionRange {
    original: String,
    lower: Option<Version>,
    upper: Option<Version>,
    exact: Option<Version>,
}

impl VersionRange {
    /// Parse a range expression. Fails on empty input and on bounds that
    /// are not plain version text (a second `:` or a stray sigil).
    pub fn parse(spec: &str) -> Result<Self, String> {
        let s = spec.trim();
        if s.is_empty() {
            return Err("empty version range".to_string());
        }
        let bound = |text: &str| -> Result<Option<Version>, String> {
            if text.is_empty() {
                return Ok(None);
            }
            if !text.chars().all(is_version_char) {
                return Err(format!("malformed version range '{s}'"));
            }
            Ok(Some(Version::parse(text)))
        };
        if let Some((lower, upper)) = s.split_once(':') {
            Ok(Self {
                original: s.to_string(),
                lower: bound(lower)?,
                upper: bound(upper)?,
                exact: None,
            })
        } else {
            Ok(Self {
                original: s.to_string(),
                lower: None,
                upper: None,
                exact: bound(s)?,
            })
        }
    }

    /// A range matching any version.
    pub fn any() -> Self {
        Self {
            original: ":".to_string(),
            lower: None,
            upper: None,
            exact: None,
        }
    }

    /// Check whether a version satisfies this range.
    pub fn satisfies(&self, version: &Version) -> bool {
        if let Some(ref exact) = self.exact {
            return version.starts_with(exact) || version == exact;
        }
        if let Some(ref lower) = self.lower {
            if version < lower && !version.starts_with(lower) {
                return false;
            }
        }
        if let Some(ref upper) = self.upper {
            if version > upper && !version.starts_with(upper) {
                return false;
            }
        }
        true
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    /// The single version of an exact range (`gl@4.5`), `None` for a
    /// bounded or unbounded range.
    pub fn as_exact(&self) -> Option<&Version> {
        self.exact.as_ref()
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl TryFrom<String> for VersionRange {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        VersionRange::parse(&s)
    }
}

impl From<VersionRange> for String {
    fn from(r: VersionRange) -> String {
        r.original
    }
}
