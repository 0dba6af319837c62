//! Version comparison with unbounded sentinels.
//!
//! Ordinary versions are dotted/dashed sequences of non-negative integers
//! (`1.2.3`, `2.0-1`). Two sentinels extend the order: `Earliest` sorts below
//! every ordinary version and `Latest` sorts above every ordinary version.
//! Manifests spell the sentinels `_` (no lower bound) and `^`/`latest`
//! (no upper bound); all spellings are translated here at the parse boundary.

use crate::error::WeaveResult;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

/// Canonical spelling of the "no lower bound" sentinel
pub const EARLIEST_TOKEN: &str = "_";

/// Canonical spelling of the "no upper bound" sentinel
pub const LATEST_TOKEN: &str = "latest";

/// Alternate spelling of the "no upper bound" sentinel used by manifests
pub const LATEST_ALIAS: &str = "^";

/// A package version, or one of the two unbounded sentinels
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Version {
    /// Less than every ordinary version, equal only to itself
    Earliest,
    /// Ordinary version, kept with its original spelling for display
    Release { raw: String, parts: Vec<u64> },
    /// Greater than every ordinary version, equal only to itself
    Latest,
}

/// Version parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("Invalid version '{input}': component '{token}' is not a non-negative integer")]
    Malformed { input: String, token: String },
}

impl Version {
    /// Parse a version string, translating sentinel spellings
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let input = input.trim();

        match input {
            EARLIEST_TOKEN => return Ok(Version::Earliest),
            LATEST_TOKEN | LATEST_ALIAS => return Ok(Version::Latest),
            _ => {},
        }

        let parts = input
            .split(['.', '-'])
            .map(|token| parse_component(input, token))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Version::Release {
            raw: input.to_string(),
            parts,
        })
    }

    /// Build an ordinary version from numeric components
    pub fn from_parts(parts: &[u64]) -> Self {
        let raw = parts
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".");
        Version::Release {
            raw,
            parts: parts.to_vec(),
        }
    }

    /// Numeric components of an ordinary version (empty for sentinels)
    pub fn components(&self) -> &[u64] {
        match self {
            Version::Release { parts, .. } => parts,
            _ => &[],
        }
    }

    /// Whether this is one of the two unbounded sentinels
    pub fn is_sentinel(&self) -> bool {
        !matches!(self, Version::Release { .. })
    }

    /// Whether this is the "no upper bound" sentinel
    pub fn is_latest(&self) -> bool {
        matches!(self, Version::Latest)
    }

    /// Whether this is the "no lower bound" sentinel
    pub fn is_earliest(&self) -> bool {
        matches!(self, Version::Earliest)
    }

    /// Rank used to order sentinels against ordinary versions
    fn rank(&self) -> u8 {
        match self {
            Version::Earliest => 0,
            Version::Release { .. } => 1,
            Version::Latest => 2,
        }
    }
}

fn parse_component(input: &str, token: &str) -> Result<u64, VersionError> {
    let malformed = || VersionError::Malformed {
        input: input.to_string(),
        token: token.to_string(),
    };

    // u64::from_str accepts a leading '+', which is not a version digit
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    token.parse().map_err(|_| malformed())
}

/// Compare two version strings.
///
/// Fails with a malformed-version error when either side contains a
/// component that is not a non-negative integer.
pub fn compare_versions(a: &str, b: &str) -> WeaveResult<Ordering> {
    let a = Version::parse(a)?;
    let b = Version::parse(b)?;
    Ok(a.cmp(&b))
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::Earliest => f.write_str(EARLIEST_TOKEN),
            Version::Release { raw, .. } => f.write_str(raw),
            Version::Latest => f.write_str(LATEST_TOKEN),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Version::Release { parts: a, .. }, Version::Release { parts: b, .. }) => {
                // Component-wise; a strict prefix sorts first
                a.cmp(b)
            },
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        self.components().hash(state);
    }
}

/// Inclusive range of acceptable versions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    pub min: Version,
    pub max: Version,
}

impl VersionRange {
    /// Create a range from its bounds
    pub fn new(min: Version, max: Version) -> Self {
        Self { min, max }
    }

    /// Range matching exactly one version
    pub fn exact(version: Version) -> Self {
        Self {
            min: version.clone(),
            max: version,
        }
    }

    /// Range with no restriction on either side
    pub fn any() -> Self {
        Self {
            min: Version::Earliest,
            max: Version::Latest,
        }
    }

    /// Parse both bounds from strings
    pub fn parse(min: &str, max: &str) -> Result<Self, VersionError> {
        Ok(Self::new(Version::parse(min)?, Version::parse(max)?))
    }

    /// Check if a version lies within the bounds
    pub fn contains(&self, version: &Version) -> bool {
        &self.min <= version && version <= &self.max
    }

    /// A range whose lower bound exceeds its upper bound admits nothing
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// Intersect with another range, `None` when they are disjoint
    pub fn intersect(&self, other: &VersionRange) -> Option<VersionRange> {
        let min = std::cmp::max(&self.min, &other.min).clone();
        let max = std::cmp::min(&self.max, &other.max).clone();
        let range = VersionRange { min, max };
        (!range.is_empty()).then_some(range)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn version_strategy() -> impl Strategy<Value = Version> {
        prop_oneof![
            1 => Just(Version::Earliest),
            1 => Just(Version::Latest),
            8 => prop::collection::vec(0u64..5, 1..5).prop_map(|parts| Version::from_parts(&parts)),
        ]
    }

    // Comparator antisymmetry
    proptest! {
        #[test]
        fn version_comparison_antisymmetry(a in version_strategy(), b in version_strategy()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
        }
    }

    // Comparator transitivity
    proptest! {
        #[test]
        fn version_comparison_transitivity(
            a in version_strategy(),
            b in version_strategy(),
            c in version_strategy(),
        ) {
            if a <= b && b <= c {
                prop_assert!(a <= c, "Transitivity violated: {} <= {} <= {} but {} > {}", a, b, c, a, c);
            }
            if a >= b && b >= c {
                prop_assert!(a >= c, "Transitivity violated: {} >= {} >= {} but {} < {}", a, b, c, a, c);
            }
        }
    }

    // String-level comparator agrees with the parsed order
    proptest! {
        #[test]
        fn string_comparison_round_trip(a in version_strategy(), b in version_strategy()) {
            let ordering = compare_versions(&a.to_string(), &b.to_string()).unwrap();
            prop_assert_eq!(ordering, a.cmp(&b));
        }
    }
}
