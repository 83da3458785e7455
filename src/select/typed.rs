//! Type-specific builders layered on `PropSelector`.
//!
//! Every predicate here checks the value's runtime type first; a value of
//! the wrong type is a non-match, never an error.

use std::cmp::Ordering;

use regex::Regex;

use super::predicate::PropertyPredicate;
use super::prop_selector::{
    FloatKind, IntKind, ListKind, PropSelector, SelectorKind, StringKind,
};
use crate::model::{FromValue, Property, PropertyType, Value};
use crate::{Error, Result};

// ============================================================================
// Strings
// ============================================================================

impl PropSelector<StringKind> {
    fn with_str_test<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.with_property_matching(move |p| p.value.as_str().is_some_and(&f))
    }

    pub fn with_value_that_starts_with(self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.with_str_test(move |s| s.starts_with(prefix.as_str()))
    }

    pub fn with_value_that_ends_with(self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.with_str_test(move |s| s.ends_with(suffix.as_str()))
    }

    pub fn with_value_that_contains(self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.with_str_test(move |s| s.contains(needle.as_str()))
    }

    /// Whole-string regular expression match. The pattern is compiled here,
    /// so a malformed pattern fails the builder instead of every evaluation.
    pub fn with_value_that_matches_pattern(self, pattern: &str) -> Result<Self> {
        let anchored = Regex::new(&format!("^(?:{pattern})$")).map_err(|source| {
            Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        Ok(self.with_str_test(move |s| anchored.is_match(s)))
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// Selector kinds that compare a scalar of one exact runtime type.
pub trait NumericKind: SelectorKind {
    type Scalar: FromValue + PartialOrd + Copy + Send + Sync + 'static;
}

impl NumericKind for FloatKind { type Scalar = f64; }
impl NumericKind for IntKind { type Scalar = i64; }

impl<K: NumericKind> PropSelector<K> {
    fn with_comparison(self, bound: K::Scalar, accept: fn(Ordering) -> bool) -> Self {
        self.with_property_matching(move |p| {
            K::Scalar::from_value(&p.value)
                .ok()
                .and_then(|v| v.partial_cmp(&bound))
                .is_some_and(accept)
        })
    }

    pub fn with_value_that_is_greater_than(self, bound: K::Scalar) -> Self {
        self.with_comparison(bound, Ordering::is_gt)
    }

    pub fn with_value_that_is_greater_than_or_equal_to(self, bound: K::Scalar) -> Self {
        self.with_comparison(bound, Ordering::is_ge)
    }

    pub fn with_value_that_is_less_than(self, bound: K::Scalar) -> Self {
        self.with_comparison(bound, Ordering::is_lt)
    }

    pub fn with_value_that_is_less_than_or_equal_to(self, bound: K::Scalar) -> Self {
        self.with_comparison(bound, Ordering::is_le)
    }
}

// ============================================================================
// Lists
// ============================================================================

/// A list element presented as a property, so element-level selectors can
/// run against it: it keeps the list's name and takes the declared element
/// type.
fn element_property(list: &Property, element: &Value) -> Property {
    Property {
        name: list.name.clone(),
        declared_type: list
            .declared_type
            .element_type()
            .cloned()
            .unwrap_or(PropertyType::Any),
        value: element.clone(),
    }
}

impl PropSelector<ListKind> {
    fn with_list_test<F>(self, f: F) -> Self
    where
        F: Fn(&Property, &[Value]) -> bool + Send + Sync + 'static,
    {
        self.with_property_matching(move |p| p.value.as_list().is_some_and(|items| f(p, items)))
    }

    /// The list holds every given element (superset test).
    pub fn which_contains<I, V>(self, elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let wanted: Vec<Value> = elements.into_iter().map(Into::into).collect();
        self.with_list_test(move |_, items| wanted.iter().all(|w| items.contains(w)))
    }

    /// The list holds the given elements and has exactly as many entries,
    /// in any order.
    pub fn which_only_contains<I, V>(self, elements: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let wanted: Vec<Value> = elements.into_iter().map(Into::into).collect();
        self.with_list_test(move |_, items| {
            items.len() == wanted.len() && wanted.iter().all(|w| items.contains(w))
        })
    }

    /// Every element converts to `T` and passes `f`. An element that does
    /// not convert fails the whole predicate. Empty lists pass.
    pub fn with_all_elements_complying_to<T, F>(self, f: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with_list_test(move |_, items| {
            items.iter().all(|item| match T::from_value(item) {
                Ok(v) => f(&v),
                Err(_) => false,
            })
        })
    }

    /// Some element converts to `T` and passes `f`. Elements that do not
    /// convert are skipped.
    pub fn with_at_least_one_element_complying_to<T, F>(self, f: F) -> Self
    where
        T: FromValue + 'static,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.with_list_test(move |_, items| {
            items.iter().any(|item| match T::from_value(item) {
                Ok(v) => f(&v),
                Err(_) => false,
            })
        })
    }

    /// Every element, seen as a property, satisfies `selector`.
    pub fn with_all_elements_complying_to_selector<E: SelectorKind>(
        self,
        selector: &PropSelector<E>,
    ) -> Self {
        let pred: PropertyPredicate = selector.as_predicate();
        self.with_list_test(move |list, items| {
            items.iter().all(|item| pred.test(&element_property(list, item)))
        })
    }

    /// Some element, seen as a property, satisfies `selector`.
    pub fn with_at_least_one_element_complying_to_selector<E: SelectorKind>(
        self,
        selector: &PropSelector<E>,
    ) -> Self {
        let pred: PropertyPredicate = selector.as_predicate();
        self.with_list_test(move |list, items| {
            items.iter().any(|item| pred.test(&element_property(list, item)))
        })
    }
}
