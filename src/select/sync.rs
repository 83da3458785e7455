//! Live views: keep a caller-owned collection equal to the matches of a
//! selector under a root as the graph mutates.
//!
//! ```text
//! sync_with(root, view)
//!   → subscribe to root's change stream
//!   → seed view with select_from_root(root)
//!   → per event (on the mutating thread, in delivery order):
//!        detached subtrees  → remove
//!        attached subtrees  → add matches
//!        owning object      → re-test, add or remove
//! ```
//!
//! The view lock is held for the whole of each event. Do not hold it while
//! mutating objects under the root: delivery happens on the mutating thread
//! and would wait on it.

use std::collections::HashSet as StdHashSet;
use std::hash::BuildHasher;
use std::sync::Arc;

use parking_lot::Mutex;

use super::object_selector::ObjectSelector;
use super::predicate::ObjectPredicate;
use crate::config::{PropertyChangePolicy, SyncConfig};
use crate::model::{ChangeEvent, ChangeKind, ObjectRef, Subscription, Value};
use crate::Result;

/// A collection a live view can maintain. Set semantics: inserting a
/// present object and removing an absent one are no-ops.
pub trait SyncTarget {
    fn insert_object(&mut self, object: ObjectRef);
    fn remove_object(&mut self, object: &ObjectRef);
}

impl SyncTarget for Vec<ObjectRef> {
    fn insert_object(&mut self, object: ObjectRef) {
        if !self.contains(&object) {
            self.push(object);
        }
    }

    fn remove_object(&mut self, object: &ObjectRef) {
        self.retain(|o| o != object);
    }
}

impl<S: BuildHasher> SyncTarget for StdHashSet<ObjectRef, S> {
    fn insert_object(&mut self, object: ObjectRef) {
        self.insert(object);
    }

    fn remove_object(&mut self, object: &ObjectRef) {
        self.remove(object);
    }
}

impl<S: BuildHasher> SyncTarget for hashbrown::HashSet<ObjectRef, S> {
    fn insert_object(&mut self, object: ObjectRef) {
        self.insert(object);
    }

    fn remove_object(&mut self, object: &ObjectRef) {
        self.remove(object);
    }
}

/// Collection shared between the caller and a live view.
pub type SyncedCollection<C> = Arc<Mutex<C>>;

/// Wrap a collection for use with `sync_with`.
pub fn synced<C: SyncTarget>(collection: C) -> SyncedCollection<C> {
    Arc::new(Mutex::new(collection))
}

impl ObjectSelector {
    /// Keep `target` equal to the matches under `root` until the returned
    /// subscription is cancelled. Existing entries of `target` are kept;
    /// the current matches are unioned in.
    ///
    /// The selector is frozen at this call. If subscribing fails, `target`
    /// is left untouched.
    ///
    /// The view holds one of `root`'s listener slots (`listener_limit`,
    /// default `DEFAULT_LISTENER_LIMIT`) until `cancel()` is called.
    /// Dropping the returned handle does not release the slot: a root whose
    /// handles are dropped uncancelled eventually rejects every new view
    /// with `Error::Subscription`.
    pub fn sync_with<C>(&self, root: &ObjectRef, target: &SyncedCollection<C>) -> Result<Subscription>
    where
        C: SyncTarget + Send + 'static,
    {
        self.sync_with_config(root, target, &SyncConfig::default())
    }

    pub fn sync_with_config<C>(
        &self,
        root: &ObjectRef,
        target: &SyncedCollection<C>,
        config: &SyncConfig,
    ) -> Result<Subscription>
    where
        C: SyncTarget + Send + 'static,
    {
        let live = LiveSync {
            predicate: self.as_predicate(),
            target: Arc::clone(target),
            policy: config.policy,
        };
        let predicate = live.predicate.clone();

        // Events raised while seeding wait on this lock and apply afterwards.
        let mut view = target.lock();
        let subscription = root.subscribe(move |event| live.apply(event))?;

        let mut seeded = 0usize;
        if config.seed {
            for obj in root.content() {
                if predicate.test(&obj) {
                    view.insert_object(obj);
                    seeded += 1;
                }
            }
        }
        drop(view);

        tracing::debug!(
            root = %root.id(),
            listener = subscription.id(),
            seeded,
            policy = ?config.policy,
            "live view attached"
        );
        Ok(subscription)
    }
}

struct LiveSync<C> {
    predicate: ObjectPredicate,
    target: SyncedCollection<C>,
    policy: PropertyChangePolicy,
}

impl<C: SyncTarget> LiveSync<C> {
    fn apply(&self, event: &ChangeEvent) {
        let mut view = self.target.lock();
        match self.policy {
            PropertyChangePolicy::Recompute => self.recompute(&mut *view, event),
            PropertyChangePolicy::NewReferenceOnly => self.new_reference_only(&mut *view, event),
        }
        tracing::trace!(
            object = %event.object.id(),
            property = %event.property,
            "live view updated"
        );
    }

    fn recompute(&self, view: &mut C, event: &ChangeEvent) {
        for detached in event.detached_objects() {
            for obj in detached.content() {
                view.remove_object(&obj);
            }
        }
        for attached in event.attached_objects() {
            for obj in attached.content() {
                if self.predicate.test(&obj) {
                    view.insert_object(obj);
                }
            }
        }
        if self.predicate.test(&event.object) {
            view.insert_object(event.object.clone());
        } else {
            view.remove_object(&event.object);
        }
    }

    fn new_reference_only(&self, view: &mut C, event: &ChangeEvent) {
        match &event.kind {
            ChangeKind::Property { new, .. } => {
                if let Value::Object(obj) = new {
                    if self.predicate.test(obj) {
                        view.insert_object(obj.clone());
                    }
                }
            }
            ChangeKind::List { added, removed } => {
                for obj in removed.iter().filter_map(Value::as_object) {
                    if self.predicate.test(obj) {
                        view.remove_object(obj);
                    }
                }
                for obj in added.iter().filter_map(Value::as_object) {
                    if self.predicate.test(obj) {
                        view.insert_object(obj.clone());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_target_is_set_like() {
        let a = ObjectRef::builder("Node").build().unwrap();
        let mut v: Vec<ObjectRef> = Vec::new();
        v.insert_object(a.clone());
        v.insert_object(a.clone());
        assert_eq!(v.len(), 1);
        v.remove_object(&a);
        v.remove_object(&a);
        assert!(v.is_empty());
    }

    #[test]
    fn test_hash_set_targets() {
        let a = ObjectRef::builder("Node").build().unwrap();
        let mut std_set: StdHashSet<ObjectRef> = StdHashSet::new();
        std_set.insert_object(a.clone());
        std_set.insert_object(a.clone());
        assert_eq!(std_set.len(), 1);

        let mut hb_set: hashbrown::HashSet<ObjectRef> = hashbrown::HashSet::new();
        hb_set.insert_object(a.clone());
        hb_set.remove_object(&a);
        assert!(hb_set.is_empty());
    }
}
