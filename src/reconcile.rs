//! Repair tools for adjacency lists.
//!
//! Reads never write. Two explicit operations clean up what reads only skip:
//! - [`LinkedEntity::purge_dead_links`] drops entries whose target is gone or
//!   that no longer parse
//! - [`LinkedEntity::reconcile`] finds links whose mirror is missing or
//!   disagrees, and optionally recreates missing mirrors
//!
//! Both are safe to re-run: on a clean list they change nothing.

use serde::Serialize;
use tracing::{info, warn};

use crate::codec;
use crate::direction::Direction;
use crate::entity::EntityRef;
use crate::error::LinkResult;
use crate::link::Link;
use crate::linked::LinkedEntity;

/// Whether [`LinkedEntity::reconcile`] may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcileMode {
    /// Only report findings.
    #[default]
    ReportOnly,
    /// Recreate missing mirrors.
    Repair,
}

/// A link whose mirror is not what it should be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MirrorFinding {
    /// The target holds no link back to the root.
    MissingMirror {
        /// The root's link.
        link: Link,
    },
    /// The target links back with a direction other than the inverse.
    DirectionDisagreement {
        /// The root's link.
        link: Link,
        /// The target's link back to the root.
        mirror: Link,
    },
}

impl MirrorFinding {
    /// The root-side link the finding is about.
    #[must_use]
    pub const fn link(&self) -> &Link {
        match self {
            Self::MissingMirror { link } | Self::DirectionDisagreement { link, .. } => link,
        }
    }
}

/// Outcome of [`LinkedEntity::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// The reconciled root.
    pub root: EntityRef,
    /// Live links examined.
    pub checked: usize,
    /// Links whose mirror matched.
    pub consistent: usize,
    /// Links whose mirror did not match.
    pub findings: Vec<MirrorFinding>,
    /// Mirrors written in [`ReconcileMode::Repair`].
    pub repaired: Vec<Link>,
}

impl ReconcileReport {
    /// Returns true when every link had a matching mirror.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Outcome of [`LinkedEntity::purge_dead_links`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PurgeReport {
    /// Entries dropped because their target no longer exists.
    pub dead: usize,
    /// Entries dropped because they did not parse.
    pub corrupt: usize,
    /// Entries kept.
    pub kept: usize,
}

impl PurgeReport {
    /// Total entries dropped.
    #[must_use]
    pub const fn removed(&self) -> usize {
        self.dead + self.corrupt
    }
}

impl LinkedEntity {
    /// Rewrites the root's list without dead or corrupt entries.
    ///
    /// The list is only written when something was dropped.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn purge_dead_links(&self) -> LinkResult<PurgeReport> {
        let key = self.key();
        let adjacency = self.adjacency();
        let raw = adjacency.read_list(&key)?;

        let mut report = PurgeReport::default();
        let mut kept = Vec::with_capacity(raw.len());
        for entry in raw {
            match codec::parse(&entry) {
                Ok(link) => {
                    if self.directory.exists(&link.target)? {
                        kept.push(entry);
                    } else {
                        report.dead += 1;
                    }
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "links.purge.corrupt_entry");
                    report.corrupt += 1;
                }
            }
        }
        report.kept = kept.len();

        if report.removed() > 0 {
            adjacency.replace(&key, kept)?;
            info!(
                root = %self.root(),
                dead = report.dead,
                corrupt = report.corrupt,
                kept = report.kept,
                "links.purge.done"
            );
        }
        Ok(report)
    }

    /// Checks every live link of the root against its mirror.
    ///
    /// In [`ReconcileMode::Repair`], a missing mirror is recreated with the
    /// inverse direction. Disagreeing mirrors are only reported.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn reconcile(&self, mode: ReconcileMode) -> LinkResult<ReconcileReport> {
        let root = self.root();
        let links = self.links()?;
        let mut report = ReconcileReport {
            root,
            checked: links.len(),
            consistent: 0,
            findings: Vec::new(),
            repaired: Vec::new(),
        };

        for link in links {
            let mirror_side = self.rooted_at(link.target);
            match mirror_side.get_by_target(&root)? {
                Some(mirror) if mirror.direction == link.direction.inverse() => {
                    report.consistent += 1;
                }
                Some(mirror) => {
                    warn!(
                        root = %root,
                        target_entity = %link.target,
                        local = %link.direction,
                        mirror = %mirror.direction,
                        "links.reconcile.direction_disagreement"
                    );
                    report
                        .findings
                        .push(MirrorFinding::DirectionDisagreement { link, mirror });
                }
                None => {
                    if mode == ReconcileMode::Repair {
                        let repaired = mirror_side.write_mirror(root, link.direction.inverse())?;
                        report.repaired.push(repaired);
                    }
                    report.findings.push(MirrorFinding::MissingMirror { link });
                }
            }
        }

        if !report.findings.is_empty() {
            info!(
                root = %root,
                checked = report.checked,
                findings = report.findings.len(),
                repaired = report.repaired.len(),
                "links.reconcile.done"
            );
        }
        Ok(report)
    }

    /// Inserts a link to `target` without the create-path direction checks.
    ///
    /// `BIDIRECTIONAL` is only reachable this way, which is why repair needs it.
    fn write_mirror(&self, target: EntityRef, direction: Direction) -> LinkResult<Link> {
        let link = Link::new(target, direction);
        self.adjacency().insert(&self.key(), &codec::encode(&link))?;
        Ok(link)
    }
}
