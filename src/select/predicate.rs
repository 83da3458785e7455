//! Frozen boolean tests over properties and objects.

use std::fmt;
use std::sync::Arc;

use crate::model::{ObjectRef, Property};

/// A pure test over one property. Cheap to clone; never errors.
#[derive(Clone)]
pub struct PropertyPredicate(Arc<dyn Fn(&Property) -> bool + Send + Sync>);

impl PropertyPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Property) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn test(&self, property: &Property) -> bool {
        (self.0)(property)
    }

    /// Conjunction in the given order, short-circuiting on the first `false`.
    /// An empty conjunction accepts everything.
    pub fn all(predicates: Vec<PropertyPredicate>) -> Self {
        Self::new(move |p| predicates.iter().all(|pred| pred.test(p)))
    }
}

impl fmt::Debug for PropertyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PropertyPredicate(..)")
    }
}

/// A pure test over one object. Cheap to clone; never errors.
#[derive(Clone)]
pub struct ObjectPredicate(Arc<dyn Fn(&ObjectRef) -> bool + Send + Sync>);

impl ObjectPredicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ObjectRef) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn test(&self, object: &ObjectRef) -> bool {
        (self.0)(object)
    }
}

impl fmt::Debug for ObjectPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ObjectPredicate(..)")
    }
}
