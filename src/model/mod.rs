//! # Object Graph Model
//!
//! The mutable, tree-shaped object graph that selectors run against.
//! Objects carry a type name and an ordered set of typed properties; any
//! object held by a property value is contained by the holder.
//!
//! Design rule: selectors only see this module through reflection
//! (`properties()`, `type_name()`), traversal (`content()`) and the change
//! stream (`subscribe()`).

pub mod value;
pub mod property;
pub mod object;
pub mod change;

pub use value::{Value, FromValue};
pub use property::{Property, PropertyType};
pub use object::{ObjectId, ObjectRef, ObjectBuilder, DEFAULT_LISTENER_LIMIT};
pub use change::{ChangeEvent, ChangeKind, Subscription};
