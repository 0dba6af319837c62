//! Flattening a settled actor graph into a package list

use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::debug;
use weave_core::error::{WeaveError, WeaveResult};
use weave_core::ConcretePackage;

use crate::actor::ActorHandle;
use crate::tracker::Tracker;

/// Walk the graph depth-first from `roots` and list every reachable package
/// once.
///
/// The graph must be quiescent. A package seen again at the same concrete
/// version is not walked twice, so dependency cycles terminate.
pub async fn flatten(tracker: &Tracker, roots: &[ActorHandle]) -> WeaveResult<Vec<ConcretePackage>> {
    let mut visited = HashSet::new();
    let mut visits = Vec::new();
    let mut stack: Vec<ActorHandle> = roots.iter().rev().cloned().collect();

    while let Some(handle) = stack.pop() {
        let version = handle.resolved().ok_or_else(|| WeaveError::UnresolvedPackage {
            name: handle.name().to_string(),
        })?;
        let manifest = tracker.manifest(handle.name(), &version).await?;

        let package = if version.is_latest() {
            manifest.target.clone()
        } else {
            ConcretePackage::new(handle.name(), version)
        };
        if !visited.insert(package.clone()) {
            continue;
        }
        visits.push(package);

        for requirement in manifest.requires.iter().rev() {
            let child = tracker.lookup(&requirement.name).ok_or_else(|| {
                WeaveError::UnresolvedPackage {
                    name: requirement.name.clone(),
                }
            })?;
            stack.push(child);
        }
    }

    debug!("Flattened {} visits", visits.len());
    dedup_packages(visits)
}

/// Keep the first entry per name; a later entry with another version is a
/// flattening conflict
pub fn dedup_packages(packages: Vec<ConcretePackage>) -> WeaveResult<Vec<ConcretePackage>> {
    let mut unique: IndexMap<String, ConcretePackage> = IndexMap::with_capacity(packages.len());

    for package in packages {
        match unique.get(&package.name) {
            Some(first) if first.version != package.version => {
                return Err(WeaveError::FlatteningConflict {
                    name: package.name.clone(),
                    first: first.version.to_string(),
                    second: package.version.to_string(),
                });
            },
            Some(_) => {},
            None => {
                unique.insert(package.name.clone(), package);
            },
        }
    }

    Ok(unique.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::Version;

    fn pkg(name: &str, version: &str) -> ConcretePackage {
        ConcretePackage::new(name, Version::parse(version).unwrap())
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let packages = vec![
            pkg("mypackage", "1.0"),
            pkg("library1", "1.0"),
            pkg("child1", "1.0"),
            pkg("library1", "1.0"),
            pkg("library2", "1.0"),
        ];

        let unique = dedup_packages(packages).unwrap();
        let names: Vec<_> = unique.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["mypackage", "library1", "child1", "library2"]);
    }

    #[test]
    fn test_dedup_reports_disagreement() {
        let packages = vec![
            pkg("library1", "1.0"),
            pkg("library2", "1.0"),
            pkg("library1", "2.0"),
        ];

        let err = dedup_packages(packages).unwrap_err();
        match err {
            WeaveError::FlatteningConflict {
                name,
                first,
                second,
            } => {
                assert_eq!(name, "library1");
                assert_eq!(first, "1.0");
                assert_eq!(second, "2.0");
            },
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_dedup_empty() {
        assert!(dedup_packages(Vec::new()).unwrap().is_empty());
    }
}
