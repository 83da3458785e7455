//! Objects in the graph: identity, reflected properties, containment, and
//! the change stream.
//!
//! ## Containment
//!
//! Every `Value::Object` held by a property (directly or as a list element)
//! is contained by the object that holds it. An object has at most one
//! container, and containment never forms a cycle.
//!
//! ## Limitations
//!
//! - **Single-writer only**: each mutation takes the owning object's lock,
//!   but multi-object invariants (one container per object) are checked
//!   before the write. Concurrent writers attaching the same object to two
//!   containers race.
//! - **Synchronous delivery**: change events run on the mutating thread,
//!   after the object's locks are released.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use hashbrown::HashSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::change::{self, ChangeEvent, ChangeKind, ListenerRegistry, Subscription};
use super::{Property, PropertyType, Value};
use crate::{Error, Result};

/// Listener slots per object unless the builder says otherwise.
pub const DEFAULT_LISTENER_LIMIT: usize = 1024;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque, process-unique object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ObjectRef
// ============================================================================

/// Shared handle to an object. Cloning the handle does not clone the object;
/// equality and hashing are by identity.
#[derive(Clone)]
pub struct ObjectRef {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    id: ObjectId,
    type_name: String,
    state: RwLock<ObjectState>,
    listeners: Arc<RwLock<ListenerRegistry>>,
}

struct ObjectState {
    slots: Vec<Slot>,
    parent: Weak<ObjectInner>,
}

struct Slot {
    name: String,
    declared_type: PropertyType,
    value: Value,
}

impl ObjectState {
    fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.name == name)
    }

    fn slot_mut(&mut self, name: &str) -> Result<&mut Slot> {
        self.slots
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| Error::NotFound(format!("Property '{name}'")))
    }
}

impl ObjectRef {
    /// Start declaring a new object of the given type.
    pub fn builder(type_name: impl Into<String>) -> ObjectBuilder {
        ObjectBuilder::new(type_name)
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    pub fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    // ========================================================================
    // Reflection
    // ========================================================================

    /// Snapshot of all properties in declaration order.
    pub fn properties(&self) -> Vec<Property> {
        self.inner
            .state
            .read()
            .slots
            .iter()
            .map(|s| Property::new(s.name.clone(), s.declared_type.clone(), s.value.clone()))
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<Property> {
        let state = self.inner.state.read();
        state
            .slot(name)
            .map(|s| Property::new(s.name.clone(), s.declared_type.clone(), s.value.clone()))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.inner.state.read().slot(name).map(|s| s.value.clone())
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    pub fn parent(&self) -> Option<ObjectRef> {
        let parent = self.inner.state.read().parent.clone();
        parent.upgrade().map(|inner| ObjectRef { inner })
    }

    /// Directly contained objects, in property order.
    pub fn children(&self) -> Vec<ObjectRef> {
        self.inner
            .state
            .read()
            .slots
            .iter()
            .flat_map(|s| s.value.objects())
            .collect()
    }

    /// The flattened containment tree rooted here, pre-order, including
    /// this object.
    pub fn content(&self) -> Vec<ObjectRef> {
        let mut out = Vec::new();
        let mut stack = vec![self.clone()];
        while let Some(obj) = stack.pop() {
            let children = obj.children();
            out.push(obj);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Ids of this object and all its containers up to the root.
    fn lineage(&self) -> HashSet<ObjectId> {
        let mut ids = HashSet::new();
        let mut current = Some(self.clone());
        while let Some(obj) = current {
            ids.insert(obj.id());
            current = obj.parent();
        }
        ids
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Reassign a property. Returns the previous value.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<Value> {
        let value = value.into();

        let old = {
            let state = self.inner.state.read();
            let slot = state
                .slot(name)
                .ok_or_else(|| Error::NotFound(format!("Property '{name}'")))?;
            check_type(&slot.declared_type, &value)?;
            slot.value.clone()
        };
        check_distinct(&value.objects())?;
        let previous = old.objects();
        let incoming: Vec<ObjectRef> = value
            .objects()
            .into_iter()
            .filter(|o| !previous.contains(o))
            .collect();
        self.check_attachable(&incoming)?;

        let old = {
            let mut state = self.inner.state.write();
            let slot = state.slot_mut(name)?;
            std::mem::replace(&mut slot.value, value.clone())
        };

        let event = ChangeEvent {
            object: self.clone(),
            property: name.to_string(),
            kind: ChangeKind::Property { old: old.clone(), new: value },
        };
        self.relink(&event);
        self.emit(&event);
        Ok(old)
    }

    /// Append one element to a list-valued property.
    pub fn push(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.extend(name, [value.into()])
    }

    /// Append elements to a list-valued property as a single change.
    /// Appending nothing is a no-op and emits no event.
    pub fn extend<I, V>(&self, name: &str, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let added: Vec<Value> = values.into_iter().map(Into::into).collect();
        if added.is_empty() {
            return Ok(());
        }

        {
            let state = self.inner.state.read();
            let slot = state
                .slot(name)
                .ok_or_else(|| Error::NotFound(format!("Property '{name}'")))?;
            let elem = list_element_type(name, &slot.declared_type)?;
            for v in &added {
                if v.is_null() || !elem.accepts(v) {
                    return Err(Error::TypeError {
                        expected: elem.to_string(),
                        got: v.type_name().into(),
                    });
                }
            }
        }
        let incoming: Vec<ObjectRef> = added.iter().filter_map(|v| v.as_object().cloned()).collect();
        self.check_attachable(&incoming)?;

        {
            let mut state = self.inner.state.write();
            let slot = state.slot_mut(name)?;
            match &mut slot.value {
                Value::List(items) => items.extend(added.iter().cloned()),
                other => *other = Value::List(added.clone()),
            }
        }

        let event = ChangeEvent {
            object: self.clone(),
            property: name.to_string(),
            kind: ChangeKind::List { added, removed: Vec::new() },
        };
        self.relink(&event);
        self.emit(&event);
        Ok(())
    }

    /// Remove the first element equal to `value` from a list-valued property.
    /// Returns whether an element was removed; nothing is emitted otherwise.
    pub fn remove_value(&self, name: &str, value: &Value) -> Result<bool> {
        let removed = {
            let mut state = self.inner.state.write();
            let slot = state.slot_mut(name)?;
            list_element_type(name, &slot.declared_type)?;
            match &mut slot.value {
                Value::List(items) => match items.iter().position(|v| v == value) {
                    Some(idx) => items.remove(idx),
                    None => return Ok(false),
                },
                _ => return Ok(false),
            }
        };

        let event = ChangeEvent {
            object: self.clone(),
            property: name.to_string(),
            kind: ChangeKind::List { added: Vec::new(), removed: vec![removed] },
        };
        self.relink(&event);
        self.emit(&event);
        Ok(true)
    }

    /// Incoming objects must be free (no container), distinct, and must not
    /// be this object or one of its containers.
    fn check_attachable(&self, incoming: &[ObjectRef]) -> Result<()> {
        if incoming.is_empty() {
            return Ok(());
        }
        check_distinct(incoming)?;
        let lineage = self.lineage();
        for obj in incoming {
            if lineage.contains(&obj.id()) {
                return Err(Error::ConstraintViolation(format!(
                    "containing {}#{} in {}#{} would form a cycle",
                    obj.type_name(),
                    obj.id(),
                    self.type_name(),
                    self.id()
                )));
            }
            if let Some(container) = obj.parent() {
                return Err(Error::ConstraintViolation(format!(
                    "{}#{} is already contained by {}#{}",
                    obj.type_name(),
                    obj.id(),
                    container.type_name(),
                    container.id()
                )));
            }
        }
        Ok(())
    }

    /// Update container links after a committed change.
    fn relink(&self, event: &ChangeEvent) {
        for obj in event.detached_objects() {
            obj.inner.state.write().parent = Weak::new();
        }
        for obj in event.attached_objects() {
            obj.inner.state.write().parent = Arc::downgrade(&self.inner);
        }
    }

    // ========================================================================
    // Change stream
    // ========================================================================

    /// Register a listener for changes anywhere in the containment tree
    /// rooted at this object.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription>
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        change::subscribe(&self.inner.listeners, Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Deliver to the owner's listeners, then each container's, outward.
    fn emit(&self, event: &ChangeEvent) {
        tracing::trace!(object = %self.id(), property = %event.property, "change emitted");
        let mut current = Some(self.clone());
        while let Some(obj) = current {
            let listeners = obj.inner.listeners.read().snapshot();
            change::dispatch(&listeners, event);
            current = obj.parent();
        }
    }
}

fn check_type(declared: &PropertyType, value: &Value) -> Result<()> {
    if declared.accepts(value) {
        Ok(())
    } else {
        Err(Error::TypeError {
            expected: declared.to_string(),
            got: value.type_name().into(),
        })
    }
}

/// An object may appear at most once in a single property value.
fn check_distinct(objects: &[ObjectRef]) -> Result<()> {
    let mut seen = HashSet::new();
    for obj in objects {
        if !seen.insert(obj.id()) {
            return Err(Error::ConstraintViolation(format!(
                "{}#{} appears twice in one assignment",
                obj.type_name(),
                obj.id()
            )));
        }
    }
    Ok(())
}

fn list_element_type<'a>(name: &str, declared: &'a PropertyType) -> Result<&'a PropertyType> {
    declared.element_type().ok_or_else(|| {
        Error::ConstraintViolation(format!("Property '{name}' is not a list ({declared})"))
    })
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.read();
        let mut s = f.debug_struct(&self.inner.type_name);
        s.field("id", &self.inner.id.0);
        for slot in &state.slots {
            s.field(&slot.name, &format_args!("{}", slot.value));
        }
        s.finish()
    }
}

// ============================================================================
// ObjectBuilder
// ============================================================================

/// Declares an object's type, properties and initial values.
pub struct ObjectBuilder {
    type_name: String,
    slots: Vec<Slot>,
    listener_limit: usize,
}

impl ObjectBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            slots: Vec::new(),
            listener_limit: DEFAULT_LISTENER_LIMIT,
        }
    }

    /// Declare a property. Redeclaring a name replaces the earlier declaration
    /// in place.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        declared_type: PropertyType,
        value: impl Into<Value>,
    ) -> Self {
        let slot = Slot {
            name: name.into(),
            declared_type,
            value: value.into(),
        };
        match self.slots.iter_mut().find(|s| s.name == slot.name) {
            Some(existing) => *existing = slot,
            None => self.slots.push(slot),
        }
        self
    }

    pub fn with_string(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_property(name, PropertyType::String, value.into())
    }

    pub fn with_float(self, name: impl Into<String>, value: f64) -> Self {
        self.with_property(name, PropertyType::Float, value)
    }

    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with_property(name, PropertyType::Int, value)
    }

    pub fn with_bool(self, name: impl Into<String>, value: bool) -> Self {
        self.with_property(name, PropertyType::Bool, value)
    }

    pub fn with_list<V: Into<Value>>(
        self,
        name: impl Into<String>,
        element: PropertyType,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let items: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.with_property(name, PropertyType::list_of(element), Value::List(items))
    }

    /// Declare an (initially empty) list of contained objects.
    pub fn with_children(self, name: impl Into<String>) -> Self {
        self.with_list(name, PropertyType::Object, Vec::<Value>::new())
    }

    /// Declare a single-object property, initially unset.
    pub fn with_object(self, name: impl Into<String>) -> Self {
        self.with_property(name, PropertyType::Object, Value::Null)
    }

    pub fn listener_limit(mut self, limit: usize) -> Self {
        self.listener_limit = limit;
        self
    }

    /// Validate declared types and containment, then create the object.
    pub fn build(self) -> Result<ObjectRef> {
        for slot in &self.slots {
            check_type(&slot.declared_type, &slot.value)?;
        }

        let held: Vec<ObjectRef> = self.slots.iter().flat_map(|s| s.value.objects()).collect();
        check_distinct(&held)?;
        for obj in &held {
            if let Some(container) = obj.parent() {
                return Err(Error::ConstraintViolation(format!(
                    "{}#{} is already contained by {}#{}",
                    obj.type_name(),
                    obj.id(),
                    container.type_name(),
                    container.id()
                )));
            }
        }

        let id = ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed));
        let inner = Arc::new(ObjectInner {
            id,
            type_name: self.type_name,
            state: RwLock::new(ObjectState {
                slots: self.slots,
                parent: Weak::new(),
            }),
            listeners: Arc::new(RwLock::new(ListenerRegistry::new(self.listener_limit))),
        });
        let obj = ObjectRef { inner };
        for child in obj.children() {
            child.inner.state.write().parent = Arc::downgrade(&obj.inner);
        }
        Ok(obj)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn node(name: &str, pressure: f64) -> ObjectRef {
        ObjectRef::builder("Node")
            .with_string("name", name)
            .with_float("pressure", pressure)
            .with_list("tags", PropertyType::String, Vec::<&str>::new())
            .build()
            .unwrap()
    }

    fn group() -> ObjectRef {
        ObjectRef::builder("Group")
            .with_string("name", "root")
            .with_children("nodes")
            .build()
            .unwrap()
    }

    #[test]
    fn test_properties_in_declaration_order() {
        let n = node("valve-01", 89.0);
        let names: Vec<String> = n.properties().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["name", "pressure", "tags"]);
        assert_eq!(n.get("pressure"), Some(Value::Float(89.0)));
        assert_eq!(n.type_name(), "Node");
    }

    #[test]
    fn test_set_rejects_wrong_type_and_unknown_property() {
        let n = node("valve-01", 89.0);
        assert!(matches!(n.set("pressure", 90), Err(Error::TypeError { .. })));
        assert!(matches!(n.set("missing", 1.0), Err(Error::NotFound(_))));
        assert_eq!(n.set("pressure", 90.0).unwrap(), Value::Float(89.0));
    }

    #[test]
    fn test_content_is_preorder_and_includes_root() {
        let root = group();
        let a = node("a", 1.0);
        let b = node("b", 2.0);
        root.push("nodes", &a).unwrap();
        root.push("nodes", &b).unwrap();

        let ids: Vec<ObjectId> = root.content().iter().map(ObjectRef::id).collect();
        assert_eq!(ids, vec![root.id(), a.id(), b.id()]);
        assert_eq!(a.parent(), Some(root.clone()));
    }

    #[test]
    fn test_single_container_and_no_cycles() {
        let root = group();
        let other = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();

        assert!(matches!(other.push("nodes", &a), Err(Error::ConstraintViolation(_))));

        let inner = group();
        root.push("nodes", &inner).unwrap();
        assert!(matches!(inner.push("nodes", &root), Err(Error::ConstraintViolation(_))));
        assert!(matches!(root.push("nodes", &root), Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_set_rejects_repeated_object_even_if_already_held() {
        let root = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();

        let result = root.set("nodes", vec![a.clone(), a.clone()]);
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
        assert_eq!(root.children(), vec![a.clone()]);

        // still singly contained: removal detaches it completely
        assert!(root.remove_value("nodes", &Value::from(&a)).unwrap());
        assert!(root.children().is_empty());
        assert_eq!(a.parent(), None);

        assert!(matches!(root.extend("nodes", [&a, &a]), Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_set_keeps_already_held_object() {
        let root = group();
        let a = node("a", 1.0);
        let b = node("b", 2.0);
        root.push("nodes", &a).unwrap();

        root.set("nodes", vec![b.clone(), a.clone()]).unwrap();
        assert_eq!(root.children(), vec![b.clone(), a.clone()]);
        assert_eq!(a.parent(), Some(root.clone()));
        assert_eq!(b.parent(), Some(root.clone()));
    }

    #[test]
    fn test_remove_value_detaches() {
        let root = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();
        assert!(root.remove_value("nodes", &Value::from(&a)).unwrap());
        assert_eq!(a.parent(), None);
        assert!(!root.remove_value("nodes", &Value::from(&a)).unwrap());

        // detached objects can be contained again
        let other = group();
        other.push("nodes", &a).unwrap();
    }

    #[test]
    fn test_list_ops_on_scalar_property_rejected() {
        let n = node("a", 1.0);
        assert!(matches!(n.push("name", "x"), Err(Error::ConstraintViolation(_))));
        assert!(matches!(n.push("tags", 1), Err(Error::TypeError { .. })));
    }

    #[test]
    fn test_events_bubble_to_containers() {
        let root = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = root
            .subscribe(move |ev| sink.lock().push((ev.object.id(), ev.property.clone())))
            .unwrap();

        a.set("pressure", 5.0).unwrap();
        a.push("tags", "hot").unwrap();
        root.set("name", "renamed").unwrap();

        assert_eq!(
            *seen.lock(),
            vec![
                (a.id(), "pressure".to_string()),
                (a.id(), "tags".to_string()),
                (root.id(), "name".to_string()),
            ]
        );
    }

    #[test]
    fn test_detached_objects_stop_bubbling() {
        let root = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();

        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let _sub = root.subscribe(move |_| *sink.lock() += 1).unwrap();

        root.remove_value("nodes", &Value::from(&a)).unwrap();
        a.set("pressure", 2.0).unwrap();
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_builder_rejects_contained_child() {
        let root = group();
        let a = node("a", 1.0);
        root.push("nodes", &a).unwrap();
        let result = ObjectRef::builder("Group")
            .with_list("nodes", PropertyType::Object, vec![a.clone()])
            .build();
        assert!(matches!(result, Err(Error::ConstraintViolation(_))));
    }

    #[test]
    fn test_listener_limit() {
        let root = ObjectRef::builder("Group").listener_limit(0).build().unwrap();
        assert!(matches!(root.subscribe(|_| {}), Err(Error::Subscription(_))));
    }
}
