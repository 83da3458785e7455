//! Change stream: events emitted by object mutations and the listener
//! registrations that receive them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use super::{ObjectRef, Value};
use crate::{Error, Result};

/// What changed on a property.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// The whole value was reassigned.
    Property { old: Value, new: Value },
    /// Elements were added to and/or removed from a list-valued property.
    List { added: Vec<Value>, removed: Vec<Value> },
}

/// A single change delivered by the change stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// The object that owns the changed property.
    pub object: ObjectRef,
    /// Name of the changed property.
    pub property: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    /// Objects that left the containment tree with this change.
    ///
    /// For a reassignment, object references held by the old value but not
    /// by the new one. For a list edit, the removed object elements.
    pub fn detached_objects(&self) -> Vec<ObjectRef> {
        match &self.kind {
            ChangeKind::Property { old, new } => {
                let kept = new.objects();
                old.objects().into_iter().filter(|o| !kept.contains(o)).collect()
            }
            ChangeKind::List { removed, .. } => {
                removed.iter().filter_map(|v| v.as_object().cloned()).collect()
            }
        }
    }

    /// Objects that entered the containment tree with this change.
    pub fn attached_objects(&self) -> Vec<ObjectRef> {
        match &self.kind {
            ChangeKind::Property { old, new } => {
                let before = old.objects();
                new.objects().into_iter().filter(|o| !before.contains(o)).collect()
            }
            ChangeKind::List { added, .. } => {
                added.iter().filter_map(|v| v.as_object().cloned()).collect()
            }
        }
    }
}

/// Callback invoked for every delivered change event.
pub type ChangeListener = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

/// Identifier of a listener within one object's registry.
pub type ListenerId = u64;

struct Registration {
    id: ListenerId,
    active: Arc<AtomicBool>,
    listener: ChangeListener,
}

/// Listeners attached to one object, in registration order.
pub(crate) struct ListenerRegistry {
    entries: Vec<Registration>,
    next_id: ListenerId,
    limit: usize,
}

impl ListenerRegistry {
    pub(crate) fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
            limit,
        }
    }

    fn register(&mut self, listener: ChangeListener) -> Result<(ListenerId, Arc<AtomicBool>)> {
        if self.entries.len() >= self.limit {
            return Err(Error::Subscription(format!(
                "listener limit of {} reached",
                self.limit
            )));
        }
        let id = self.next_id;
        self.next_id += 1;
        let active = Arc::new(AtomicBool::new(true));
        self.entries.push(Registration {
            id,
            active: Arc::clone(&active),
            listener,
        });
        Ok((id, active))
    }

    fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|r| r.id != id);
        self.entries.len() != before
    }

    /// Active listeners, cloned out so the registry lock is not held while
    /// callbacks run.
    pub(crate) fn snapshot(&self) -> Vec<(Arc<AtomicBool>, ChangeListener)> {
        self.entries
            .iter()
            .map(|r| (Arc::clone(&r.active), Arc::clone(&r.listener)))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Register a listener on a registry and wrap it in a cancellable handle.
pub(crate) fn subscribe(
    registry: &Arc<RwLock<ListenerRegistry>>,
    listener: ChangeListener,
) -> Result<Subscription> {
    let (id, active) = registry.write().register(listener)?;
    Ok(Subscription {
        registry: Arc::downgrade(registry),
        id,
        active,
    })
}

/// Deliver an event to a snapshot of listeners, skipping any cancelled
/// since the snapshot was taken.
pub(crate) fn dispatch(listeners: &[(Arc<AtomicBool>, ChangeListener)], event: &ChangeEvent) {
    for (active, listener) in listeners {
        if active.load(Ordering::Acquire) {
            listener(event);
        }
    }
}

/// Handle to an active change-stream registration.
///
/// Events dispatched after `cancel()` returns never reach the listener, even
/// when the dispatching thread snapshotted the registry earlier. Dropping the
/// handle does NOT cancel: the listener keeps its slot in the object's
/// registry, and counts against the listener limit, until `cancel()`.
#[must_use = "a dropped Subscription cannot be cancelled"]
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<RwLock<ListenerRegistry>>,
    id: ListenerId,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Stop all further deliveries. Idempotent.
    pub fn cancel(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.write().unregister(self.id);
        }
        tracing::debug!(listener = self.id, "subscription cancelled");
    }
}
