//! Range consolidation
//!
//! Folds the rules a package has received from its dependents into a single
//! acceptable range. The fold is a queue reduction: the first two ranges are
//! intersected and the result goes to the back of the queue, until one range
//! is left. Each intermediate range remembers which owner imposed its lower
//! and its upper bound so that a conflict can name both sides.

use std::collections::VecDeque;
use weave_core::error::WeaveError;
use weave_core::{Version, VersionRange};

/// One owner's constraint on a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub owner: String,
    pub range: VersionRange,
}

impl Rule {
    pub fn new(owner: impl Into<String>, range: VersionRange) -> Self {
        Self {
            owner: owner.into(),
            range,
        }
    }
}

/// Conflict error when two rules cannot both be satisfied
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{lower_owner} requires at least {lower_bound}, but {upper_owner} allows at most {upper_bound}")]
pub struct ConflictError {
    /// Owner imposing the offending lower bound
    pub lower_owner: String,
    pub lower_bound: Version,
    /// Owner imposing the offending upper bound
    pub upper_owner: String,
    pub upper_bound: Version,
}

impl ConflictError {
    /// Attach the package the conflicting rules were placed on
    pub fn into_error(self, package: &str) -> WeaveError {
        WeaveError::UnsatisfiableConstraints {
            package: package.to_string(),
            lower_owner: self.lower_owner,
            lower_bound: self.lower_bound.to_string(),
            upper_owner: self.upper_owner,
            upper_bound: self.upper_bound.to_string(),
        }
    }
}

/// Intermediate range with bound provenance
#[derive(Debug)]
struct Attributed {
    range: VersionRange,
    lower_owner: String,
    upper_owner: String,
}

impl Attributed {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            range: rule.range.clone(),
            lower_owner: rule.owner.clone(),
            upper_owner: rule.owner.clone(),
        }
    }

    /// Intersect two ranges; on ties the left side keeps the credit
    fn merge(self, other: Attributed) -> Result<Attributed, ConflictError> {
        let (min, lower_owner) = if other.range.min > self.range.min {
            (other.range.min, other.lower_owner)
        } else {
            (self.range.min, self.lower_owner)
        };
        let (max, upper_owner) = if other.range.max < self.range.max {
            (other.range.max, other.upper_owner)
        } else {
            (self.range.max, self.upper_owner)
        };

        if min > max {
            return Err(ConflictError {
                lower_owner,
                lower_bound: min,
                upper_owner,
                upper_bound: max,
            });
        }

        Ok(Attributed {
            range: VersionRange::new(min, max),
            lower_owner,
            upper_owner,
        })
    }
}

/// Intersect every rule into one range.
///
/// A single rule comes back unchanged with its owner stripped, and an empty
/// slice yields the unbounded range. Stops at the first disjoint pair.
pub fn consolidate(rules: &[Rule]) -> Result<VersionRange, ConflictError> {
    let mut queue: VecDeque<Attributed> = rules.iter().map(Attributed::from_rule).collect();

    loop {
        let Some(first) = queue.pop_front() else {
            return Ok(VersionRange::any());
        };
        let Some(second) = queue.pop_front() else {
            return Ok(first.range);
        };
        queue.push_back(first.merge(second)?);
    }
}
