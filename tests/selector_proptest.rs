//! Property-based tests for selectors and live views.
//!
//! These tests check that composed selectors agree with their parts and
//! that a live view converges to a fresh selection after any sequence of
//! graph edits.

use model_select::{
    ObjectRef, PropertyType, Value, select_float_prop, select_list_prop, select_object,
    select_prop, select_string_prop, synced,
};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["valve-01", "valve-02", "tank", "pump"];
const TAGS: [&str; 3] = ["print-head", "hot", "coolant"];

fn node(name: &str, pressure: f64, tags: &[&str]) -> ObjectRef {
    ObjectRef::builder("Node")
        .with_string("name", name)
        .with_float("pressure", pressure)
        .with_list("tags", PropertyType::String, tags.iter().copied())
        .build()
        .unwrap()
}

/// Strategy for a node description: (name index, pressure, tag mask).
fn node_strategy() -> impl Strategy<Value = (usize, f64, u8)> {
    (0..NAMES.len(), 0.0f64..300.0, 0u8..8)
}

fn tags_of(mask: u8) -> Vec<&'static str> {
    TAGS.iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, t)| *t)
        .collect()
}

fn build((name, pressure, mask): (usize, f64, u8)) -> ObjectRef {
    node(NAMES[name], pressure, &tags_of(mask))
}

/// One graph edit applied to the root `Group` and its children.
#[derive(Debug, Clone)]
enum Edit {
    Add((usize, f64, u8)),
    Remove(usize),
    SetPressure(usize, f64),
    SetName(usize, usize),
    AddTag(usize, usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        node_strategy().prop_map(Edit::Add),
        any::<usize>().prop_map(Edit::Remove),
        (any::<usize>(), 0.0f64..300.0).prop_map(|(i, p)| Edit::SetPressure(i, p)),
        (any::<usize>(), 0..NAMES.len()).prop_map(|(i, n)| Edit::SetName(i, n)),
        (any::<usize>(), 0..TAGS.len()).prop_map(|(i, t)| Edit::AddTag(i, t)),
    ]
}

fn apply(root: &ObjectRef, edit: &Edit) {
    let children = root.children();
    let pick = |i: usize| children.get(i % children.len().max(1)).cloned();
    match edit {
        Edit::Add(desc) => root.push("nodes", build(*desc)).unwrap(),
        Edit::Remove(i) => {
            if let Some(child) = pick(*i) {
                root.remove_value("nodes", &Value::from(&child)).unwrap();
            }
        }
        Edit::SetPressure(i, p) => {
            if let Some(child) = pick(*i) {
                child.set("pressure", *p).unwrap();
            }
        }
        Edit::SetName(i, n) => {
            if let Some(child) = pick(*i) {
                child.set("name", NAMES[*n]).unwrap();
            }
        }
        Edit::AddTag(i, t) => {
            if let Some(child) = pick(*i) {
                child.push("tags", TAGS[*t]).unwrap();
            }
        }
    }
}

fn ids(objects: &[ObjectRef]) -> Vec<u64> {
    let mut out: Vec<u64> = objects.iter().map(|o| o.id().0).collect();
    out.sort_unstable();
    out
}

proptest! {
    /// Property: a property selector is the conjunction of its parts.
    #[test]
    fn prop_selector_is_conjunction(desc in node_strategy(), prefix in 0..NAMES.len(), bound in 0.0f64..300.0) {
        let obj = build(desc);
        let by_name = select_string_prop().with_name("name").with_value_that_starts_with(&NAMES[prefix][..3]);
        let by_pressure = select_float_prop().with_value_that_is_greater_than(bound);

        let combined = select_prop()
            .with_predicate(by_name.as_predicate())
            .with_predicate(by_pressure.as_predicate());

        for property in obj.properties() {
            prop_assert_eq!(
                combined.test(&property),
                by_name.test(&property) && by_pressure.test(&property)
            );
        }
    }

    /// Property: an object selector holds iff every requirement holds on some property.
    #[test]
    fn object_selector_is_conjunction_of_requirements(desc in node_strategy(), bound in 0.0f64..300.0, tag in 0..TAGS.len()) {
        let obj = build(desc);
        let pressure = select_float_prop().with_name("pressure").with_value_that_is_greater_than(bound);
        let tags = select_list_prop().with_name("tags").which_contains([TAGS[tag]]);

        let both = select_object().with_property(&pressure).with_property(&tags);
        let expected = select_object().with_property(&pressure).test(&obj)
            && select_object().with_property(&tags).test(&obj);
        prop_assert_eq!(both.test(&obj), expected);
    }

    /// Property: identically built selectors select the same objects.
    #[test]
    fn identical_selectors_agree(descs in prop::collection::vec(node_strategy(), 0..20), bound in 0.0f64..300.0) {
        let objects: Vec<ObjectRef> = descs.into_iter().map(build).collect();
        let make = || select_object()
            .with_property(select_float_prop().with_name("pressure").with_value_that_is_less_than(bound));
        prop_assert_eq!(make().select_from(&objects), make().select_from(&objects));
    }

    /// Property: after any edit sequence the live view equals a fresh selection.
    #[test]
    fn live_view_converges(
        initial in prop::collection::vec(node_strategy(), 0..8),
        edits in prop::collection::vec(edit_strategy(), 0..40),
        bound in 0.0f64..300.0,
    ) {
        let root = ObjectRef::builder("Group")
            .with_string("name", "plant")
            .with_children("nodes")
            .build()
            .unwrap();
        root.extend("nodes", initial.into_iter().map(build)).unwrap();

        let selector = select_object()
            .with_property(select_string_prop().with_name("name").with_value_that_starts_with("valve"))
            .with_property(select_float_prop().with_name("pressure").with_value_that_is_greater_than(bound))
            .with_property(select_list_prop().with_name("tags").which_contains(["print-head"]));

        let view = synced(Vec::<ObjectRef>::new());
        let sub = selector.sync_with(&root, &view).unwrap();

        for edit in &edits {
            apply(&root, edit);
            let current = view.lock().clone();
            prop_assert_eq!(ids(&current), ids(&selector.select_from_root(&root)));
        }
        sub.cancel();
    }
}
