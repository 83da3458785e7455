//! # model-select: Typed Selectors and Live Views over Object Graphs
//!
//! Declare a composable, typed query over the objects of a mutable,
//! tree-shaped object graph, then either evaluate it once or keep a live
//! collection of the matching objects up to date as the graph changes.
//!
//! ## Design Principles
//!
//! 1. **Predicates never fail**: a value of the wrong runtime type is a
//!    non-match, not an error
//! 2. **One accumulator**: every typed property selector is the same
//!    `PropSelector<K>`; the kind only adds builder methods
//! 3. **Frozen at use**: `as_predicate()` and `sync_with()` capture the
//!    selector as it is at that call
//! 4. **Incremental views**: live views react to single change events
//!    without rescanning the graph
//!
//! ## Quick Start
//!
//! ```rust
//! use model_select::{ObjectRef, PropertyType, select_object, select_float_prop,
//!     select_string_prop, select_list_prop, synced};
//!
//! # fn example() -> model_select::Result<()> {
//! let root = ObjectRef::builder("Group").with_children("nodes").build()?;
//!
//! let valves = select_object()
//!     .with_property(select_string_prop().with_name("name").with_value_that_starts_with("valve"))
//!     .with_property(select_float_prop().with_name("pressure").with_value_that_is_greater_than(100.0))
//!     .with_property(select_list_prop().with_name("tags").which_contains(["print-head"]));
//!
//! let view = synced(Vec::<ObjectRef>::new());
//! let subscription = valves.sync_with(&root, &view)?;
//!
//! let node = ObjectRef::builder("Node")
//!     .with_string("name", "valve-02")
//!     .with_float("pressure", 189.0)
//!     .with_list("tags", PropertyType::String, ["print-head"])
//!     .build()?;
//! root.push("nodes", &node)?;
//!
//! assert_eq!(*view.lock(), vec![node]);
//! subscription.cancel();
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod select;
pub mod config;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use model::{
    Value, FromValue, Property, PropertyType,
    ObjectId, ObjectRef, ObjectBuilder,
    ChangeEvent, ChangeKind, Subscription,
};

// ============================================================================
// Re-exports: Selectors
// ============================================================================

pub use select::{
    ObjectSelector, PropSelector, PropertyPredicate, ObjectPredicate,
    StringPropSelector, FloatPropSelector, IntPropSelector, ListPropSelector,
    SyncTarget, SyncedCollection, synced,
    select_object, select_prop, select_string_prop,
    select_float_prop, select_int_prop, select_list_prop,
};

// ============================================================================
// Re-exports: Configuration
// ============================================================================

pub use config::{SyncConfig, PropertyChangePolicy};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
