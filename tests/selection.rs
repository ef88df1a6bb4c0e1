//! Selection model invariants under arbitrary operation sequences

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use xsdedit::model::{NodeId, NodeKind, SchemaData, XsdTree};
use xsdedit::selection::{SelectionChange, SelectionModel};

#[derive(Debug, Clone)]
enum Op {
    Select(Option<usize>),
    Add(Option<usize>),
    Remove(Option<usize>),
    Toggle(Option<usize>),
    Multiple(Vec<usize>),
    Clear,
}

fn op() -> impl Strategy<Value = Op> {
    let node = prop::option::of(0..5usize);
    prop_oneof![
        node.clone().prop_map(Op::Select),
        node.clone().prop_map(Op::Add),
        node.clone().prop_map(Op::Remove),
        node.prop_map(Op::Toggle),
        prop::collection::vec(0..5usize, 0..6).prop_map(Op::Multiple),
        Just(Op::Clear),
    ]
}

fn nodes() -> Vec<NodeId> {
    let mut tree = XsdTree::new(SchemaData::new_document(None));
    (0..5).map(|_| tree.create_node(NodeKind::SimpleType, None)).collect()
}

proptest! {
    #[test]
    fn prop_primary_is_member_and_events_match_changes(ops in prop::collection::vec(op(), 1..40)) {
        let ids = nodes();
        let pick = |i: Option<usize>| i.map(|i| ids[i]);
        let events: Rc<RefCell<Vec<SelectionChange>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        let mut model = SelectionModel::new();
        model.add_listener(move |e| sink.borrow_mut().push(e.clone()));

        for op in ops {
            let before: Vec<NodeId> = model.selected_nodes().iter().copied().collect();
            let primary_before = model.primary();
            let fired_before = events.borrow().len();

            match op {
                Op::Select(i) => model.select(pick(i)),
                Op::Add(i) => model.add_to_selection(pick(i)),
                Op::Remove(i) => model.remove_from_selection(pick(i)),
                Op::Toggle(i) => model.toggle_selection(pick(i)),
                Op::Multiple(list) => model.select_multiple(list.into_iter().map(|i| ids[i])),
                Op::Clear => model.clear_selection(),
            }

            prop_assert_eq!(model.primary().is_none(), model.is_empty());
            if let Some(primary) = model.primary() {
                prop_assert!(model.is_selected(primary));
            }

            let mut after: Vec<NodeId> = model.selected_nodes().iter().copied().collect();
            let mut sorted_before = before.clone();
            sorted_before.sort_by_key(|n| n.as_u64());
            after.sort_by_key(|n| n.as_u64());
            let changed = sorted_before != after || primary_before != model.primary();

            let fired = events.borrow().len() - fired_before;
            prop_assert_eq!(fired, usize::from(changed));
            if changed {
                let last = events.borrow().last().cloned().unwrap();
                prop_assert_eq!(last.old_primary, primary_before);
                prop_assert_eq!(last.new_primary, model.primary());
                prop_assert_eq!(last.old.len(), before.len());
                prop_assert_eq!(&last.new, model.selected_nodes());
            }
        }
    }
}

#[test]
fn test_primary_falls_back_after_removal() {
    let ids = nodes();
    let mut model = SelectionModel::new();
    model.select_multiple(ids.iter().copied());
    assert_eq!(model.primary(), Some(ids[0]));

    model.remove_from_selection(Some(ids[0]));
    assert_eq!(model.primary(), Some(ids[1]));
    model.select_multiple(vec![ids[3], ids[1]]);
    assert_eq!(model.primary(), Some(ids[1]));
}
