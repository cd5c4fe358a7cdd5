//! Dependency graph integration tests
//!
//! Document-permission scenarios plus property tests over randomly
//! generated acyclic graphs.

use cretoai_permgraph::{DependencyGraph, DependencyGraphBuilder, PermissionError};
use proptest::prelude::*;
use proptest::sample::Index;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::thread;

fn document_graph() -> DependencyGraph {
    let raw: HashMap<&str, Vec<&str>> = HashMap::from([
        ("view", vec![]),
        ("edit", vec!["view"]),
        ("alter_tags", vec!["edit"]),
        ("create", vec!["view"]),
        ("delete", vec!["edit"]),
    ]);
    DependencyGraph::new(raw).unwrap()
}

const NONE: [&str; 0] = [];

// ============================================================================
// DOCUMENT PERMISSION SCENARIOS
// ============================================================================

#[test]
fn test_grant_edit_with_view() {
    assert!(document_graph().can_grant(&["view"], "edit").unwrap());
}

#[test]
fn test_grant_edit_without_view() {
    assert!(!document_graph().can_grant(&NONE, "edit").unwrap());
}

#[test]
fn test_grant_alter_tags_missing_edit() {
    assert!(!document_graph().can_grant(&["view"], "alter_tags").unwrap());
}

#[test]
fn test_deny_view_while_edit_held() {
    assert!(!document_graph().can_deny(&["view", "edit"], "view").unwrap());
}

#[test]
fn test_deny_view_alone() {
    assert!(document_graph().can_deny(&["view"], "view").unwrap());
}

#[test]
fn test_validate_edit_without_view() {
    let result = document_graph().validate(&["edit"]);
    assert!(matches!(
        result,
        Err(PermissionError::InvalidBasePermissions { ref permission, ref missing })
            if permission == "edit" && missing == "view"
    ));
}

#[test]
fn test_hash_map_input_is_deterministic() {
    // HashMap iteration order varies between instances; the graph must not
    let orders: BTreeSet<Vec<String>> = (0..16)
        .map(|_| document_graph().topological_order().to_vec())
        .collect();

    assert_eq!(orders.len(), 1);
}

#[test]
fn test_concurrent_decisions_share_one_graph() {
    let graph = Arc::new(document_graph());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let graph = Arc::clone(&graph);
            thread::spawn(move || {
                let held: &[&str] = if i % 2 == 0 { &["view"] } else { &["view", "edit"] };
                (
                    graph.can_grant(held, "alter_tags").unwrap(),
                    graph.topological_order().to_vec(),
                )
            })
        })
        .collect();

    let expected = graph.topological_order().to_vec();
    for (i, handle) in handles.into_iter().enumerate() {
        let (can_grant, order) = handle.join().unwrap();
        assert_eq!(can_grant, i % 2 == 1);
        assert_eq!(order, expected);
    }
}

#[test]
fn test_errors_repeat_identically() {
    let raw = [("a", vec!["c"]), ("b", vec!["a"]), ("c", vec!["b"])];

    let first = DependencyGraph::new(raw.clone()).unwrap_err().to_string();
    let second = DependencyGraph::new(raw).unwrap_err().to_string();
    assert_eq!(first, second);
    assert_eq!(first, "Circular dependency detected at 'a': a -> c -> b -> a");
}

#[test]
fn test_unknown_target_on_valid_base() {
    let graph = document_graph();

    let err = graph.can_grant(&["view"], "publish").unwrap_err();
    assert_eq!(err.to_string(), "Unknown permission 'publish'");
}

#[test]
fn test_builder_matches_mapping() {
    let built = DependencyGraphBuilder::new()
        .permission("delete", ["edit"])
        .permission("create", ["view"])
        .permission("alter_tags", ["edit"])
        .permission("edit", ["view", "view"])
        .permission("view", Vec::<String>::new())
        .build()
        .unwrap();

    assert_eq!(built, document_graph());
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

/// Name permission `i`; reversed so lexicographic order fights dependency order
fn name(i: usize) -> String {
    format!("perm{:03}", 999 - i)
}

/// Acyclic graph where permission `i` may only require permissions `j < i`
fn acyclic_graph() -> impl Strategy<Value = Vec<(String, Vec<String>)>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..24).prop_map(
        |edges| {
            edges
                .iter()
                .enumerate()
                .map(|(i, picks)| {
                    let prereqs = if i == 0 {
                        Vec::new()
                    } else {
                        picks.iter().map(|pick| name(pick.index(i))).collect()
                    };
                    (name(i), prereqs)
                })
                .collect()
        },
    )
}

/// Close a subset under the prerequisite relation
fn closure(graph: &DependencyGraph, seeds: &[String]) -> Vec<String> {
    let mut held: BTreeSet<String> = BTreeSet::new();
    let mut stack: Vec<String> = seeds.to_vec();

    while let Some(permission) = stack.pop() {
        if held.insert(permission.clone()) {
            stack.extend(graph.prerequisites(&permission).unwrap().iter().cloned());
        }
    }

    held.into_iter().collect()
}

fn pick_subset(raw: &[(String, Vec<String>)], picks: &[Index]) -> Vec<String> {
    picks
        .iter()
        .map(|pick| raw[pick.index(raw.len())].0.clone())
        .collect()
}

proptest! {
    #[test]
    fn test_order_respects_every_edge(raw in acyclic_graph()) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let order = graph.topological_order();

        prop_assert_eq!(order.len(), raw.len());
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(i, p)| (p.as_str(), i))
            .collect();

        for (permission, prereqs) in &raw {
            for prereq in prereqs {
                prop_assert!(position[prereq.as_str()] < position[permission.as_str()]);
            }
        }
    }

    #[test]
    fn test_back_edge_creates_cycle(raw in acyclic_graph(), pick in any::<Index>()) {
        // Point the lowest permission at any permission that reaches it
        let mut raw = raw;
        let n = raw.len();
        let target = pick.index(n);
        raw[0].1.push(name(target));

        let graph = DependencyGraph::new(raw.clone());
        let reaches_root = {
            let mut acyclic = raw.clone();
            acyclic[0].1.clear();
            let base = DependencyGraph::new(acyclic).unwrap();
            closure(&base, &[name(target)]).contains(&name(0))
        };

        if reaches_root {
            let is_cycle = matches!(graph, Err(PermissionError::Cycle { .. }));
            prop_assert!(is_cycle);
        } else {
            prop_assert!(graph.is_ok());
        }
    }

    #[test]
    fn test_filter_is_idempotent(
        raw in acyclic_graph(),
        picks in prop::collection::vec(any::<Index>(), 0..16),
    ) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let subset = pick_subset(&raw, &picks);

        let once = graph.filter(&subset);
        let twice = graph.filter(&once);
        prop_assert_eq!(&once, &twice);

        let expected: BTreeSet<&String> = subset.iter().collect();
        let actual: BTreeSet<&String> = once.iter().collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(once.len(), subset.iter().collect::<BTreeSet<_>>().len());
    }

    #[test]
    fn test_validate_is_a_projection(
        raw in acyclic_graph(),
        picks in prop::collection::vec(any::<Index>(), 0..16),
    ) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let mut held = closure(&graph, &pick_subset(&raw, &picks));
        held.extend(held.clone());

        let validated = graph.validate(&held).unwrap();
        prop_assert_eq!(graph.validate(&validated).unwrap(), validated);
    }

    #[test]
    fn test_grant_without_prerequisites_always_allowed(
        raw in acyclic_graph(),
        picks in prop::collection::vec(any::<Index>(), 0..16),
        target in any::<Index>(),
    ) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let held = closure(&graph, &pick_subset(&raw, &picks));
        let target = &raw[target.index(raw.len())].0;

        let allowed = graph.can_grant(&held, target).unwrap();
        let prereqs = graph.prerequisites(target).unwrap();
        if prereqs.is_empty() {
            prop_assert!(allowed);
        }
        prop_assert_eq!(allowed, prereqs.iter().all(|p| held.contains(p)));
    }

    #[test]
    fn test_deny_blocked_exactly_by_held_dependents(
        raw in acyclic_graph(),
        picks in prop::collection::vec(any::<Index>(), 0..16),
        target in any::<Index>(),
    ) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let held = closure(&graph, &pick_subset(&raw, &picks));
        let target = &raw[target.index(raw.len())].0;

        let blocked = held
            .iter()
            .any(|p| graph.prerequisites(p).unwrap().contains(target));
        prop_assert_eq!(graph.can_deny(&held, target).unwrap(), !blocked);
    }

    #[test]
    fn test_duplicates_do_not_change_decisions(
        raw in acyclic_graph(),
        picks in prop::collection::vec(any::<Index>(), 0..16),
        target in any::<Index>(),
    ) {
        let graph = DependencyGraph::new(raw.clone()).unwrap();
        let held = closure(&graph, &pick_subset(&raw, &picks));
        let mut doubled = held.clone();
        doubled.extend(held.iter().rev().cloned());
        let target = &raw[target.index(raw.len())].0;

        prop_assert_eq!(
            graph.check_grant(&held, target).unwrap(),
            graph.check_grant(&doubled, target).unwrap()
        );
        prop_assert_eq!(
            graph.check_deny(&held, target).unwrap(),
            graph.check_deny(&doubled, target).unwrap()
        );
    }
}
