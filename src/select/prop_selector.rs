//! `PropSelector`: an ordered, chainable accumulator of property predicates.
//!
//! One accumulator serves every typed variant: the kind parameter only
//! decides which extra builder methods exist (see `typed.rs`). Evaluation is
//! always the in-order conjunction of the registered predicates.

use std::fmt;
use std::marker::PhantomData;

use hashbrown::HashSet;
use smallvec::SmallVec;

use super::predicate::PropertyPredicate;
use crate::model::{FromValue, ObjectRef, Property, PropertyType, Value};

/// Marker for the kind of property a selector is specialised for.
pub trait SelectorKind: Send + Sync + 'static {
    const NAME: &'static str;
}

/// Untyped selector: only the common builders.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyKind;
/// String builders: prefix, suffix, substring, pattern.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringKind;
/// `f64` comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatKind;
/// `i64` comparisons.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntKind;
/// Membership and element quantifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListKind;

impl SelectorKind for AnyKind { const NAME: &'static str = "any"; }
impl SelectorKind for StringKind { const NAME: &'static str = "string"; }
impl SelectorKind for FloatKind { const NAME: &'static str = "float"; }
impl SelectorKind for IntKind { const NAME: &'static str = "int"; }
impl SelectorKind for ListKind { const NAME: &'static str = "list"; }

pub type StringPropSelector = PropSelector<StringKind>;
pub type FloatPropSelector = PropSelector<FloatKind>;
pub type IntPropSelector = PropSelector<IntKind>;
pub type ListPropSelector = PropSelector<ListKind>;

/// Accumulates property predicates; `as_predicate()` freezes their
/// conjunction. The builder stays usable afterwards, and later additions
/// do not affect predicates already taken.
pub struct PropSelector<K: SelectorKind = AnyKind> {
    predicates: SmallVec<[PropertyPredicate; 4]>,
    _kind: PhantomData<K>,
}

impl<K: SelectorKind> PropSelector<K> {
    pub fn new() -> Self {
        Self {
            predicates: SmallVec::new(),
            _kind: PhantomData,
        }
    }

    /// Append a raw predicate.
    pub fn with_predicate(mut self, predicate: PropertyPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Append a closure over the whole property.
    pub fn with_property_matching<F>(self, f: F) -> Self
    where
        F: Fn(&Property) -> bool + Send + Sync + 'static,
    {
        self.with_predicate(PropertyPredicate::new(f))
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.with_property_matching(move |p| p.name == name)
    }

    pub fn with_type(self, declared_type: PropertyType) -> Self {
        self.with_property_matching(move |p| p.declared_type == declared_type)
    }

    /// Value equality: strict runtime typing, identity for object references.
    pub fn with_value_that_is_equal_to(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.with_property_matching(move |p| p.value == value)
    }

    /// Caller-supplied test over the value converted to `T`. A value that
    /// does not convert to `T` does not match.
    pub fn with_value_that_matches<T, F>(self, f: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with_property_matching(move |p| T::from_value(&p.value).is_ok_and(|v| f(&v)))
    }

    /// Freeze the current conjunction.
    pub fn as_predicate(&self) -> PropertyPredicate {
        PropertyPredicate::all(self.predicates.to_vec())
    }

    pub fn test(&self, property: &Property) -> bool {
        self.predicates.iter().all(|pred| pred.test(property))
    }

    /// Matching properties of a snapshot, without duplicates, in
    /// first-seen order.
    pub fn select_from<'a, I>(&self, properties: I) -> Vec<Property>
    where
        I: IntoIterator<Item = &'a Property>,
    {
        let mut out: Vec<Property> = Vec::new();
        for p in properties {
            if self.test(p) && !out.contains(p) {
                out.push(p.clone());
            }
        }
        out
    }

    /// Matching properties of one object, in declaration order.
    pub fn select_from_object(&self, object: &ObjectRef) -> Vec<Property> {
        let mut seen = HashSet::new();
        object
            .properties()
            .into_iter()
            .filter(|p| self.test(p) && seen.insert(p.name.clone()))
            .collect()
    }
}

impl<K: SelectorKind> Default for PropSelector<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: SelectorKind> Clone for PropSelector<K> {
    fn clone(&self) -> Self {
        Self {
            predicates: self.predicates.clone(),
            _kind: PhantomData,
        }
    }
}

impl<K: SelectorKind> fmt::Debug for PropSelector<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropSelector")
            .field("kind", &K::NAME)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

impl<K: SelectorKind> From<PropSelector<K>> for PropertyPredicate {
    fn from(selector: PropSelector<K>) -> Self {
        selector.as_predicate()
    }
}

impl<K: SelectorKind> From<&PropSelector<K>> for PropertyPredicate {
    fn from(selector: &PropSelector<K>) -> Self {
        selector.as_predicate()
    }
}
