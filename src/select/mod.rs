//! # Selectors
//!
//! Composable queries over the object graph.
//!
//! ```text
//! PropSelector<K>  ──as_predicate()──►  PropertyPredicate
//!        │                                     │
//!        └──────────── with_property ──────────┤
//!                                              ▼
//!                                       ObjectSelector ──► select_from / select_from_root
//!                                              │
//!                                              └────────► sync_with (live view)
//! ```

pub mod predicate;
pub mod prop_selector;
pub mod typed;
pub mod object_selector;
pub mod sync;

pub use predicate::{ObjectPredicate, PropertyPredicate};
pub use prop_selector::{
    AnyKind, FloatKind, FloatPropSelector, IntKind, IntPropSelector, ListKind,
    ListPropSelector, PropSelector, SelectorKind, StringKind, StringPropSelector,
};
pub use typed::NumericKind;
pub use object_selector::ObjectSelector;
pub use sync::{synced, SyncTarget, SyncedCollection};

pub fn select_object() -> ObjectSelector {
    ObjectSelector::new()
}

pub fn select_prop() -> PropSelector {
    PropSelector::new()
}

pub fn select_string_prop() -> StringPropSelector {
    PropSelector::new()
}

pub fn select_float_prop() -> FloatPropSelector {
    PropSelector::new()
}

pub fn select_int_prop() -> IntPropSelector {
    PropSelector::new()
}

pub fn select_list_prop() -> ListPropSelector {
    PropSelector::new()
}
