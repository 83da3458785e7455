//! `ObjectSelector`: type filter plus existential property requirements.

use std::borrow::Borrow;
use std::fmt;

use hashbrown::HashSet;
use smallvec::SmallVec;

use super::predicate::{ObjectPredicate, PropertyPredicate};
use crate::model::{ObjectRef, Property};

/// Selects objects by type name and property requirements.
///
/// An object matches when its type name equals the filter (if one is set)
/// and, for **every** requirement, **at least one** of its properties
/// satisfies that requirement. Different requirements may be satisfied by
/// different properties.
#[derive(Clone, Default)]
pub struct ObjectSelector {
    type_name: Option<String>,
    requirements: SmallVec<[PropertyPredicate; 4]>,
}

impl ObjectSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the type filter, replacing any earlier one.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Add a property requirement: a `PropSelector` (by value or reference)
    /// or a `PropertyPredicate`.
    pub fn with_property(mut self, requirement: impl Into<PropertyPredicate>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    pub fn with_property_matching<F>(self, f: F) -> Self
    where
        F: Fn(&Property) -> bool + Send + Sync + 'static,
    {
        self.with_property(PropertyPredicate::new(f))
    }

    /// Freeze the current configuration. Later builder calls do not affect
    /// the returned predicate.
    pub fn as_predicate(&self) -> ObjectPredicate {
        let type_name = self.type_name.clone();
        let requirements = self.requirements.to_vec();
        ObjectPredicate::new(move |obj| object_matches(type_name.as_deref(), &requirements, obj))
    }

    pub fn test(&self, object: &ObjectRef) -> bool {
        object_matches(self.type_name.as_deref(), &self.requirements, object)
    }

    /// Matching objects of a snapshot, deduplicated by identity, in
    /// first-seen order.
    pub fn select_from<I>(&self, objects: I) -> Vec<ObjectRef>
    where
        I: IntoIterator,
        I::Item: Borrow<ObjectRef>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for obj in objects {
            let obj: &ObjectRef = obj.borrow();
            if seen.contains(&obj.id()) || !self.test(obj) {
                continue;
            }
            seen.insert(obj.id());
            out.push(obj.clone());
        }
        out
    }

    /// Matching objects of the containment tree rooted at `root` (root
    /// included), as of now.
    pub fn select_from_root(&self, root: &ObjectRef) -> Vec<ObjectRef> {
        self.select_from(root.content())
    }

    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }
}

fn object_matches(type_name: Option<&str>, requirements: &[PropertyPredicate], obj: &ObjectRef) -> bool {
    if let Some(expected) = type_name {
        if obj.type_name() != expected {
            return false;
        }
    }
    if requirements.is_empty() {
        return true;
    }
    let properties = obj.properties();
    requirements
        .iter()
        .all(|req| properties.iter().any(|p| req.test(p)))
}

impl fmt::Debug for ObjectSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSelector")
            .field("type_name", &self.type_name)
            .field("requirements", &self.requirements.len())
            .finish()
    }
}
