//! Package actors
//!
//! Every package name taking part in a resolution is owned by one actor task.
//! The actor holds the rules its dependents placed on it, picks a version from
//! their intersection and keeps its own dependencies' rules in step with the
//! manifest of that version. Actors never touch each other's state; they talk
//! through [`RuleUpdate`] messages routed by the [`Tracker`].

use indexmap::IndexMap;
use tokio::sync::{mpsc, watch};
use tracing::{debug, debug_span, Instrument};
use weave_core::error::{WeaveError, WeaveResult};
use weave_core::{LooseRequirement, Version, VersionRange};

use crate::cascade::Cascade;
use crate::range::{consolidate, ConflictError, Rule};
use crate::tracker::Tracker;

/// A change to the rule one owner places on a package
#[derive(Debug)]
pub struct RuleUpdate {
    pub owner: String,
    /// New range, or `None` to withdraw the owner's rule
    pub range: Option<VersionRange>,
    pub cascade: Cascade,
}

impl RuleUpdate {
    /// Place or replace the owner's rule
    pub fn set(owner: impl Into<String>, range: VersionRange, cascade: Cascade) -> Self {
        Self {
            owner: owner.into(),
            range: Some(range),
            cascade,
        }
    }

    /// Withdraw the owner's rule
    pub fn withdraw(owner: impl Into<String>, cascade: Cascade) -> Self {
        Self {
            owner: owner.into(),
            range: None,
            cascade,
        }
    }
}

/// Address of a running package actor
#[derive(Debug, Clone)]
pub struct ActorHandle {
    name: String,
    mailbox: mpsc::Sender<RuleUpdate>,
    status: watch::Receiver<Option<Version>>,
}

impl ActorHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Version the actor currently settles on, `None` before the first
    /// resolution or after every dependent withdrew
    pub fn resolved(&self) -> Option<Version> {
        self.status.borrow().clone()
    }

    /// Queue an update, waiting while the mailbox is full.
    ///
    /// If the actor has stopped, the failure is recorded on the update's
    /// cascade.
    pub async fn deliver(&self, update: RuleUpdate) {
        if let Err(mpsc::error::SendError(update)) = self.mailbox.send(update).await {
            update.cascade.fail(WeaveError::ActorUnavailable {
                name: self.name.clone(),
            });
        }
    }
}

/// Edit an actor sends to one of its dependencies after changing version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementEdit {
    /// Dependency dropped by the new version
    Remove { name: String },
    /// Dependency added by the new version, or required with a new range
    Upsert { name: String, range: VersionRange },
}

/// Compare the requirements of two manifests by dependency name.
///
/// Removals come first, then upserts in the order of the new list.
/// Requirements with identical bounds on both sides produce no edit.
pub fn diff_requirements(
    old: &[LooseRequirement],
    new: &[LooseRequirement],
) -> Vec<RequirementEdit> {
    let mut edits: Vec<RequirementEdit> = old
        .iter()
        .filter(|o| !new.iter().any(|n| n.name == o.name))
        .map(|o| RequirementEdit::Remove {
            name: o.name.clone(),
        })
        .collect();

    for requirement in new {
        let unchanged = old.iter().any(|o| {
            o.name == requirement.name
                && o.min_version == requirement.min_version
                && o.max_version == requirement.max_version
        });
        if !unchanged {
            edits.push(RequirementEdit::Upsert {
                name: requirement.name.clone(),
                range: requirement.range(),
            });
        }
    }

    edits
}

/// State owned by one actor task
#[derive(Debug)]
pub(crate) struct PackageActor {
    name: String,
    resolved: Option<Version>,
    /// Concrete version behind a `latest` resolution
    latest_release: Option<Version>,
    /// Active rules by owner, in arrival order
    rules: IndexMap<String, VersionRange>,
    status: watch::Sender<Option<Version>>,
    tracker: Tracker,
    mailbox: mpsc::Receiver<RuleUpdate>,
}

impl PackageActor {
    /// Create an actor with no rules together with its handle
    pub(crate) fn new(name: &str, tracker: Tracker, capacity: usize) -> (ActorHandle, Self) {
        let (sender, mailbox) = mpsc::channel(capacity.max(1));
        let (status, receiver) = watch::channel(None);

        let handle = ActorHandle {
            name: name.to_string(),
            mailbox: sender,
            status: receiver,
        };
        let actor = Self {
            name: name.to_string(),
            resolved: None,
            latest_release: None,
            rules: IndexMap::new(),
            status,
            tracker,
            mailbox,
        };
        (handle, actor)
    }

    /// Process updates one at a time until every handle is dropped
    pub(crate) async fn run(mut self) {
        let span = debug_span!("actor", package = %self.name);
        async move {
            debug!("Actor started");
            while let Some(update) = self.mailbox.recv().await {
                self.apply_update(update).await;
            }
            debug!("Actor stopped");
        }
        .instrument(span)
        .await
    }

    async fn apply_update(&mut self, update: RuleUpdate) {
        let RuleUpdate {
            owner,
            range,
            cascade,
        } = update;
        debug!(owner = %owner, range = ?range.as_ref().map(|r| r.to_string()), "Applying update");

        let snapshot = self.rules.clone();
        self.rules.shift_remove(&owner);
        if let Some(range) = range {
            self.rules.insert(owner, range);
        }

        if self.rules.is_empty() {
            self.release(&cascade).await;
            return;
        }

        let range = match self.consolidated() {
            Ok(range) => range,
            Err(conflict) => {
                self.rules = snapshot;
                cascade.fail(conflict.into_error(&self.name));
                return;
            },
        };

        let outcome = if self.resolved.as_ref() != Some(&range.max) {
            self.reresolve(&range, &cascade).await
        } else {
            match &self.latest_release {
                Some(release) => self.check_release(&range, release),
                None => Ok(()),
            }
        };

        if let Err(e) = outcome {
            self.rules = snapshot;
            cascade.fail(e);
        }
    }

    fn consolidated(&self) -> Result<VersionRange, ConflictError> {
        let rules: Vec<Rule> = self
            .rules
            .iter()
            .map(|(owner, range)| Rule::new(owner.clone(), range.clone()))
            .collect();
        let range = consolidate(&rules)?;

        // A lone rule is returned as-is, inverted bounds included
        if range.is_empty() {
            let owner = rules.first().map(|r| r.owner.clone()).unwrap_or_default();
            return Err(ConflictError {
                lower_owner: owner.clone(),
                lower_bound: range.min,
                upper_owner: owner,
                upper_bound: range.max,
            });
        }
        Ok(range)
    }

    /// Move to the top of `range` and bring the dependencies' rules in line
    /// with it.
    ///
    /// Errors leave the actor untouched; nothing has been sent yet.
    async fn reresolve(&mut self, range: &VersionRange, cascade: &Cascade) -> WeaveResult<()> {
        let target = range.max.clone();
        let old_requires = match &self.resolved {
            Some(current) => self.tracker.manifest(&self.name, current).await?.requires,
            None => Vec::new(),
        };
        let new_manifest = self.tracker.manifest(&self.name, &target).await?;

        let latest_release = if target.is_latest() {
            let release = new_manifest.target.version.clone();
            self.check_release(range, &release)?;
            Some(release)
        } else {
            None
        };

        let edits = diff_requirements(&old_requires, &new_manifest.requires);
        debug!(
            from = ?self.resolved.as_ref().map(|v| v.to_string()),
            to = %target,
            edits = edits.len(),
            "Re-resolved"
        );

        // Published before the dependencies react
        self.latest_release = latest_release;
        self.set_resolved(Some(target));

        for edit in edits {
            match edit {
                RequirementEdit::Remove { name } => self.withdraw_from(&name, cascade).await,
                RequirementEdit::Upsert { name, range } => {
                    let update = RuleUpdate::set(self.name.clone(), range, cascade.clone());
                    self.tracker.upsert(&name, update).await;
                },
            }
        }
        Ok(())
    }

    /// The release standing in for `latest` must still honor the lower
    /// bound of the merged range. A `[latest, latest]` range accepts
    /// whichever release is newest.
    fn check_release(&self, range: &VersionRange, release: &Version) -> WeaveResult<()> {
        if range.min.is_latest() || &range.min <= release {
            return Ok(());
        }
        let lower_owner = self
            .rules
            .iter()
            .find(|(_, rule)| rule.min == range.min)
            .map(|(owner, _)| owner.clone())
            .unwrap_or_default();

        Err(WeaveError::UnsatisfiableConstraints {
            package: self.name.clone(),
            lower_owner,
            lower_bound: range.min.to_string(),
            upper_owner: "latest release".to_string(),
            upper_bound: release.to_string(),
        })
    }

    /// No dependents remain: withdraw from our own dependencies and forget
    /// the resolved version
    async fn release(&mut self, cascade: &Cascade) {
        let Some(current) = self.resolved.clone() else {
            return;
        };
        debug!(version = %current, "Released by every dependent");
        self.latest_release = None;
        self.set_resolved(None);

        match self.tracker.manifest(&self.name, &current).await {
            Ok(manifest) => {
                for requirement in &manifest.requires {
                    self.withdraw_from(&requirement.name, cascade).await;
                }
            },
            Err(e) => cascade.fail(e),
        }
    }

    async fn withdraw_from(&self, name: &str, cascade: &Cascade) {
        match self.tracker.lookup(name) {
            Some(handle) => {
                handle
                    .deliver(RuleUpdate::withdraw(self.name.clone(), cascade.clone()))
                    .await
            },
            None => debug!("No actor for {} to withdraw from", name),
        }
    }

    fn set_resolved(&mut self, version: Option<Version>) {
        self.resolved = version.clone();
        self.status.send_replace(version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn req(name: &str, min: &str, max: &str) -> LooseRequirement {
        LooseRequirement::new(name, v(min), v(max))
    }

    #[test]
    fn test_diff_from_nothing_upserts_everything() {
        let new = vec![req("library1", "1.0", "1.0"), req("library2", "1.0", "2.0")];
        let edits = diff_requirements(&[], &new);

        assert_eq!(
            edits,
            vec![
                RequirementEdit::Upsert {
                    name: "library1".to_string(),
                    range: VersionRange::parse("1.0", "1.0").unwrap(),
                },
                RequirementEdit::Upsert {
                    name: "library2".to_string(),
                    range: VersionRange::parse("1.0", "2.0").unwrap(),
                },
            ]
        );
    }

    #[test]
    fn test_diff_skips_unchanged() {
        let old = vec![req("library1", "1.0", "2.0")];
        let new = vec![req("library1", "1.0", "2.0")];
        assert!(diff_requirements(&old, &new).is_empty());
    }

    #[test]
    fn test_diff_removals_precede_upserts() {
        let old = vec![
            req("prunee", "1.0", "1.0"),
            req("shared", "1.0", "2.0"),
            req("stable", "_", "latest"),
        ];
        let new = vec![
            req("added", "3.0", "3.0"),
            req("stable", "_", "^"),
            req("shared", "1.5", "2.0"),
        ];

        let edits = diff_requirements(&old, &new);
        assert_eq!(edits.len(), 3);
        assert_eq!(
            edits[0],
            RequirementEdit::Remove {
                name: "prunee".to_string()
            }
        );
        assert!(matches!(&edits[1], RequirementEdit::Upsert { name, .. } if name == "added"));
        assert!(matches!(&edits[2], RequirementEdit::Upsert { name, range } if name == "shared" && range.min == v("1.5")));
    }

    #[test]
    fn test_diff_to_nothing_removes_everything() {
        let old = vec![req("a", "1", "1"), req("b", "1", "1")];
        let edits = diff_requirements(&old, &[]);
        assert_eq!(
            edits,
            vec![
                RequirementEdit::Remove {
                    name: "a".to_string()
                },
                RequirementEdit::Remove {
                    name: "b".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_rule_update_constructors() {
        let (cascade, _waiter) = crate::cascade::cascade();
        let set = RuleUpdate::set("owner", VersionRange::any(), cascade.clone());
        assert_eq!(set.range, Some(VersionRange::any()));

        let withdraw = RuleUpdate::withdraw("owner", cascade);
        assert_eq!(withdraw.owner, "owner");
        assert!(withdraw.range.is_none());
    }
}
