//! The linked-entity manager.
//!
//! A [`LinkedEntity`] is rooted at one entity and keeps both endpoints of
//! every link it touches in sync. Two-sided operations mutate the root's list
//! first and the target's list second. There is no transaction spanning the
//! two keys, so a failure in between leaves a one-sided link behind; reads
//! surface that as a missing mirror and [`LinkedEntity::reconcile`] can
//! repair it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::adjacency::AdjacencyStore;
use crate::codec;
use crate::direction::{plan_create, plan_remove, CreatePlan, Direction, RemovePlan};
use crate::entity::EntityRef;
use crate::error::{LinkError, LinkResult, ValidationError};
use crate::link::{Link, LinkId, LinkSet};
use crate::storage::{EntityDirectory, SettingsStore};

/// Factory for per-root managers sharing one pair of collaborators.
#[derive(Clone)]
pub struct LinkGraph {
    settings: Arc<dyn SettingsStore>,
    directory: Arc<dyn EntityDirectory>,
}

impl LinkGraph {
    /// Creates a graph over the given collaborators.
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsStore>, directory: Arc<dyn EntityDirectory>) -> Self {
        Self {
            settings,
            directory,
        }
    }

    /// A manager rooted at `root`.
    #[must_use]
    pub fn linked(&self, root: EntityRef) -> LinkedEntity {
        LinkedEntity::new(root, self.settings.clone(), self.directory.clone())
    }

    /// The settings store.
    #[must_use]
    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    /// The entity directory.
    #[must_use]
    pub fn directory(&self) -> &dyn EntityDirectory {
        self.directory.as_ref()
    }
}

impl fmt::Debug for LinkGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGraph").finish_non_exhaustive()
    }
}

/// All links to and from one root entity.
#[derive(Clone)]
pub struct LinkedEntity {
    root: EntityRef,
    pub(crate) settings: Arc<dyn SettingsStore>,
    pub(crate) directory: Arc<dyn EntityDirectory>,
}

impl fmt::Debug for LinkedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedEntity")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl LinkedEntity {
    /// Creates a manager rooted at `root`.
    #[must_use]
    pub fn new(
        root: EntityRef,
        settings: Arc<dyn SettingsStore>,
        directory: Arc<dyn EntityDirectory>,
    ) -> Self {
        Self {
            root,
            settings,
            directory,
        }
    }

    /// The root entity.
    #[must_use]
    pub const fn root(&self) -> EntityRef {
        self.root
    }

    /// A manager over the same collaborators rooted at `other`.
    #[must_use]
    pub fn rooted_at(&self, other: EntityRef) -> Self {
        Self::new(other, self.settings.clone(), self.directory.clone())
    }

    pub(crate) fn adjacency(&self) -> AdjacencyStore<'_> {
        AdjacencyStore::new(self.settings.as_ref())
    }

    pub(crate) fn key(&self) -> String {
        self.root.storage_key()
    }

    /// Live links of the root, in storage order.
    ///
    /// Entries whose target no longer exists are skipped. Malformed entries
    /// are logged and skipped. Neither is deleted from storage; see
    /// [`LinkedEntity::purge_dead_links`].
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn links(&self) -> LinkResult<Vec<Link>> {
        let key = self.key();
        let raw = self.adjacency().read_list(&key)?;
        let mut links = Vec::with_capacity(raw.len());
        for entry in &raw {
            match codec::decode(entry, self.directory.as_ref()) {
                Ok(Some(link)) => links.push(link),
                Ok(None) => {}
                Err(LinkError::Codec(err)) => {
                    warn!(key = %key, error = %err, "links.read.corrupt_entry");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(links)
    }

    /// The root's live links packaged for a host.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn snapshot(&self) -> LinkResult<LinkSet> {
        Ok(LinkSet {
            root: self.root,
            links: self.links()?,
        })
    }

    /// Finds a live link by id.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn get_by_id(&self, id: LinkId) -> LinkResult<Option<Link>> {
        Ok(self.links()?.into_iter().find(|link| link.id == id))
    }

    /// Finds the live link pointing at `target`.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn get_by_target(&self, target: &EntityRef) -> LinkResult<Option<Link>> {
        Ok(self
            .links()?
            .into_iter()
            .find(|link| link.target == *target))
    }

    /// The stored record for `target`, live or not. Corrupt entries are skipped.
    fn stored_by_target(&self, target: &EntityRef) -> LinkResult<Option<Link>> {
        let key = self.key();
        for entry in self.adjacency().read_list(&key)? {
            match codec::parse(&entry) {
                Ok(link) if link.target == *target => return Ok(Some(link)),
                Ok(_) => {}
                Err(err) => {
                    warn!(key = %key, error = %err, "links.read.corrupt_entry");
                }
            }
        }
        Ok(None)
    }

    /// Links the root to `target` and mirrors the link on `target`.
    ///
    /// The mirror is best effort: once the root's side is written, a failure
    /// on the target's side is logged and not returned.
    ///
    /// # Errors
    /// - [`ValidationError::SelfLink`] if `target` is the root
    /// - [`ValidationError::UnknownEntity`] if `target` does not exist
    /// - [`ValidationError::InvalidDirection`] for `BIDIRECTIONAL`
    /// - [`ValidationError::DuplicateLink`] if a link to `target` already exists
    /// - store or directory failures on the root's side
    pub fn create_link(&self, target: EntityRef, direction: Direction) -> LinkResult<Link> {
        if target == self.root {
            return Err(ValidationError::SelfLink { entity: self.root }.into());
        }
        if !self.directory.exists(&target)? {
            return Err(ValidationError::UnknownEntity { entity: target }.into());
        }

        let Some(link) = self.create_link_simple(target, direction)? else {
            return Err(ValidationError::DuplicateLink {
                root: self.root,
                target,
            }
            .into());
        };

        let mirror = self.rooted_at(target);
        match mirror.create_link_simple(self.root, direction.inverse()) {
            Ok(Some(created)) => {
                debug!(root = %self.root, target_entity = %target, mirror_id = %created.id, "links.mirror.created");
            }
            Ok(None) => {
                debug!(root = %self.root, target_entity = %target, "links.mirror.already_present");
            }
            Err(err) => {
                warn!(root = %self.root, target_entity = %target, error = %err, "links.mirror.create_failed");
            }
        }

        Ok(link)
    }

    /// Single-sided create.
    ///
    /// Returns the new link, or `None` when a link to `target` already exists
    /// and nothing logically changed. A stored record counts even when its
    /// target is currently missing. An existing `BIDIRECTIONAL` link is
    /// rewritten as `BIDIRECTIONAL`; an existing single-direction link is left
    /// as it is, even when `direction` is its opposite.
    ///
    /// # Errors
    /// - [`ValidationError::InvalidDirection`] for `BIDIRECTIONAL`
    /// - [`ValidationError::SelfLink`] if `target` is the root
    /// - store or directory failures
    pub fn create_link_simple(
        &self,
        target: EntityRef,
        direction: Direction,
    ) -> LinkResult<Option<Link>> {
        if direction == Direction::Bidirectional {
            return Err(ValidationError::InvalidDirection { direction }.into());
        }
        if target == self.root {
            return Err(ValidationError::SelfLink { entity: self.root }.into());
        }

        let existing = self.stored_by_target(&target)?;
        match plan_create(existing.as_ref().map(|l| l.direction), direction)? {
            CreatePlan::Insert => {
                let link = Link::new(target, direction);
                self.adjacency().insert(&self.key(), &codec::encode(&link))?;
                debug!(root = %self.root, target_entity = %target, %direction, link_id = %link.id, "links.create");
                Ok(Some(link))
            }
            CreatePlan::Reaffirm => {
                if let Some(mut link) = existing {
                    self.update_link_simple(&mut link, Direction::Bidirectional)?;
                }
                Ok(None)
            }
            CreatePlan::Unchanged => Ok(None),
        }
    }

    /// Removes `direction` from the link `id`, on both endpoints.
    ///
    /// Removing the stored direction, or `BIDIRECTIONAL`, deletes the link on
    /// both sides. Removing one half of a `BIDIRECTIONAL` link splits it: the
    /// root keeps the opposite half and the mirror keeps the requested one.
    /// A missing mirror is tolerated. Returns the link as it was found.
    ///
    /// # Errors
    /// - [`ValidationError::NotFound`] if `id` is not a live link of the root
    /// - [`ValidationError::DirectionMismatch`] if `direction` is not held by the link
    /// - store or directory failures
    pub fn remove_link(&self, id: LinkId, direction: Direction) -> LinkResult<Link> {
        let link = self
            .get_by_id(id)?
            .ok_or(ValidationError::NotFound { id })?;
        let plan = plan_remove(link.direction, direction)?;

        let mirror_side = self.rooted_at(link.target);
        let mirror = mirror_side.get_by_target(&self.root)?;
        if mirror.is_none() {
            warn!(root = %self.root, target_entity = %link.target, link_id = %id, "links.remove.mirror_missing");
        }

        match plan {
            RemovePlan::RemoveBoth => {
                self.remove_link_simple(id)?;
                if let Some(m) = mirror {
                    mirror_side.remove_link_simple(m.id)?;
                }
            }
            RemovePlan::Split {
                local,
                mirror: mirror_direction,
            } => {
                let mut local_link = link.clone();
                self.update_link_simple(&mut local_link, local)?;
                if let Some(mut m) = mirror {
                    mirror_side.update_link_simple(&mut m, mirror_direction)?;
                }
            }
        }

        Ok(link)
    }

    /// Single-sided delete by id. Returns the removed link, if any.
    ///
    /// # Errors
    /// Store or directory failures.
    pub fn remove_link_simple(&self, id: LinkId) -> LinkResult<Option<Link>> {
        let Some(link) = self.get_by_id(id)? else {
            return Ok(None);
        };
        self.adjacency().remove(&self.key(), &codec::encode(&link))?;
        debug!(root = %self.root, link_id = %id, "links.remove");
        Ok(Some(link))
    }

    /// Single-sided direction change of `link`, in place and in storage.
    ///
    /// # Errors
    /// Store failures.
    pub fn update_link_simple(&self, link: &mut Link, direction: Direction) -> LinkResult<()> {
        let old_entry = codec::encode(link);
        link.direction = direction;
        self.adjacency()
            .update(&self.key(), &old_entry, &codec::encode(link))?;
        debug!(root = %self.root, link_id = %link.id, %direction, "links.update");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::{InMemoryStores, SettingValue};

    const A: EntityRef = EntityRef::new(1, 1);
    const B: EntityRef = EntityRef::new(1, 2);
    const C: EntityRef = EntityRef::new(2, 1);

    fn setup() -> (InMemoryStores, LinkGraph) {
        let stores = InMemoryStores::new();
        for e in [A, B, C] {
            stores.directory.register(e).unwrap();
        }
        let graph = stores.graph();
        (stores, graph)
    }

    fn raw(stores: &InMemoryStores, e: EntityRef) -> Vec<String> {
        stores
            .settings
            .get(&e.storage_key())
            .unwrap()
            .and_then(SettingValue::into_list)
            .unwrap_or_default()
    }

    #[test]
    fn create_link_simple_inserts_once() {
        let (stores, graph) = setup();
        let a = graph.linked(A);

        let link = a.create_link_simple(B, Direction::To).unwrap().unwrap();
        assert_eq!(link.target, B);
        assert_eq!(link.direction, Direction::To);
        assert_eq!(raw(&stores, A), vec![codec::encode(&link)]);

        // Same and opposite direction are both "no change".
        assert!(a.create_link_simple(B, Direction::To).unwrap().is_none());
        assert!(a.create_link_simple(B, Direction::From).unwrap().is_none());
        assert_eq!(a.links().unwrap(), vec![link]);
        // Single-sided: B untouched.
        assert!(raw(&stores, B).is_empty());
    }

    #[test]
    fn create_link_simple_rejects_bidirectional_and_self() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        assert!(matches!(
            a.create_link_simple(B, Direction::Bidirectional),
            Err(LinkError::Validation(ValidationError::InvalidDirection { .. }))
        ));
        assert!(matches!(
            a.create_link_simple(A, Direction::To),
            Err(LinkError::Validation(ValidationError::SelfLink { .. }))
        ));
    }

    #[test]
    fn create_link_simple_reaffirms_bidirectional() {
        let (stores, graph) = setup();
        let a = graph.linked(A);
        let bidi = Link::new(B, Direction::Bidirectional);
        a.adjacency().insert(&A.storage_key(), &codec::encode(&bidi)).unwrap();

        assert!(a.create_link_simple(B, Direction::To).unwrap().is_none());
        assert_eq!(a.links().unwrap(), vec![bidi.clone()]);
        assert_eq!(raw(&stores, A), vec![codec::encode(&bidi)]);
    }

    #[test]
    fn get_by_id_and_target() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        let ab = a.create_link(B, Direction::To).unwrap();
        let ac = a.create_link(C, Direction::From).unwrap();

        assert_eq!(a.get_by_id(ab.id).unwrap(), Some(ab.clone()));
        assert_eq!(a.get_by_target(&C).unwrap(), Some(ac));
        assert_eq!(a.get_by_id(LinkId::new()).unwrap(), None);
        assert_eq!(a.get_by_target(&EntityRef::new(9, 9)).unwrap(), None);
    }

    #[test]
    fn update_link_simple_rewrites_entry() {
        let (stores, graph) = setup();
        let a = graph.linked(A);
        let mut link = a.create_link_simple(B, Direction::To).unwrap().unwrap();

        a.update_link_simple(&mut link, Direction::Bidirectional).unwrap();
        assert_eq!(link.direction, Direction::Bidirectional);
        assert_eq!(raw(&stores, A), vec![codec::encode(&link)]);
        assert_eq!(a.get_by_id(link.id).unwrap().unwrap().direction, Direction::Bidirectional);
    }

    #[test]
    fn remove_link_simple_is_idempotent() {
        let (stores, graph) = setup();
        let a = graph.linked(A);
        let link = a.create_link(B, Direction::To).unwrap();

        assert_eq!(a.remove_link_simple(link.id).unwrap(), Some(link.clone()));
        assert_eq!(a.remove_link_simple(link.id).unwrap(), None);
        assert!(raw(&stores, A).is_empty());
        // Mirror untouched by the single-sided call.
        assert!(graph.linked(B).get_by_target(&A).unwrap().is_some());
    }

    #[test]
    fn remove_link_not_found() {
        let (_stores, graph) = setup();
        let err = graph
            .linked(A)
            .remove_link(LinkId::new(), Direction::To)
            .unwrap_err();
        assert!(matches!(
            err,
            LinkError::Validation(ValidationError::NotFound { .. })
        ));
    }

    #[test]
    fn remove_bidirectional_request_on_single_link_removes_both() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        let link = a.create_link(B, Direction::From).unwrap();

        let removed = a.remove_link(link.id, Direction::Bidirectional).unwrap();
        assert_eq!(removed, link);
        assert!(a.links().unwrap().is_empty());
        assert!(graph.linked(B).links().unwrap().is_empty());
    }

    #[test]
    fn remove_link_tolerates_missing_mirror() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        let link = a.create_link_simple(B, Direction::To).unwrap().unwrap();

        a.remove_link(link.id, Direction::To).unwrap();
        assert!(a.links().unwrap().is_empty());
    }

    #[test]
    fn split_with_missing_mirror_updates_local_side() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        let bidi = Link::new(B, Direction::Bidirectional);
        a.adjacency().insert(&A.storage_key(), &codec::encode(&bidi)).unwrap();

        let removed = a.remove_link(bidi.id, Direction::From).unwrap();
        assert_eq!(removed.direction, Direction::Bidirectional);
        assert_eq!(a.get_by_id(bidi.id).unwrap().unwrap().direction, Direction::To);
        assert!(graph.linked(B).links().unwrap().is_empty());
    }

    #[test]
    fn snapshot_wraps_links() {
        let (_stores, graph) = setup();
        let a = graph.linked(A);
        let link = a.create_link(B, Direction::To).unwrap();
        let set = a.snapshot().unwrap();
        assert_eq!(set.root, A);
        assert_eq!(set.links, vec![link]);
    }

    #[test]
    fn create_link_simple_counts_records_to_missing_targets() {
        let (stores, graph) = setup();
        let a = graph.linked(A);
        let link = a.create_link_simple(B, Direction::To).unwrap().unwrap();
        stores.directory.delete(&B).unwrap();

        assert!(a.create_link_simple(B, Direction::To).unwrap().is_none());
        assert!(a.create_link_simple(B, Direction::From).unwrap().is_none());
        assert_eq!(raw(&stores, A), vec![codec::encode(&link)]);

        stores.directory.register(B).unwrap();
        assert_eq!(a.links().unwrap(), vec![link]);
    }

    #[test]
    fn create_link_rejects_missing_target() {
        let (stores, graph) = setup();
        let ghost = EntityRef::new(9, 9);
        let a = graph.linked(A);

        for d in [Direction::To, Direction::To, Direction::From] {
            let err = a.create_link(ghost, d).unwrap_err();
            assert!(matches!(
                err,
                LinkError::Validation(ValidationError::UnknownEntity { entity }) if entity == ghost
            ));
        }
        assert!(raw(&stores, A).is_empty());
        assert!(raw(&stores, ghost).is_empty());
    }
}
