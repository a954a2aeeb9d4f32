//! # Property-Based Tests
//!
//! Invariants of the graph engine and roadmap builder under random input.

use pathwise_core::{
    BinaryQuestionTree, Course, DirectedGraph, NodeId, build_roadmap, order_courses,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeMap;

fn graph_with_nodes(count: i64) -> DirectedGraph {
    let mut graph = DirectedGraph::new();
    for id in 0..count {
        graph.add_node(NodeId(id), format!("n{id}"));
    }
    graph
}

fn position_map(order: &[NodeId]) -> BTreeMap<NodeId, usize> {
    order.iter().enumerate().map(|(i, &id)| (id, i)).collect()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Any sequence of guarded insertions leaves a graph with a complete order.
    #[test]
    fn accepted_edges_never_form_a_cycle(
        edges in vec((0i64..12, 0i64..12), 0..80)
    ) {
        let mut graph = graph_with_nodes(12);
        for (from, to) in edges {
            let _ = graph.try_add_edge_acyclic(NodeId(from), NodeId(to));
        }

        let topo = graph.try_topological_order();
        prop_assert!(topo.complete);
        prop_assert_eq!(topo.order.len(), graph.node_count());
    }

    /// Every edge points forward in the topological order.
    #[test]
    fn topological_order_respects_edges(
        edges in vec((0i64..15, 0i64..15), 0..100)
    ) {
        let mut graph = graph_with_nodes(15);
        for (from, to) in edges {
            let _ = graph.try_add_edge_acyclic(NodeId(from), NodeId(to));
        }

        let topo = graph.try_topological_order();
        let position = position_map(&topo.order);
        let pairs: Vec<(NodeId, NodeId)> = graph.edges().collect();
        for (from, to) in pairs {
            prop_assert!(position[&from] < position[&to]);
        }
    }

    /// Re-inserting an accepted edge succeeds and adds nothing.
    #[test]
    fn edge_insertion_is_idempotent(
        edges in vec((0i64..10, 0i64..10), 1..40)
    ) {
        let mut graph = graph_with_nodes(10);
        let mut accepted = Vec::new();
        for (from, to) in edges {
            if graph.try_add_edge_acyclic(NodeId(from), NodeId(to)) {
                accepted.push((NodeId(from), NodeId(to)));
            }
        }

        let count = graph.edge_count();
        for (from, to) in accepted {
            prop_assert!(graph.try_add_edge_acyclic(from, to));
        }
        prop_assert_eq!(graph.edge_count(), count);
    }

    /// Self-loops are rejected whether or not the node exists.
    #[test]
    fn self_loops_always_rejected(id in -1000i64..1000, present in any::<bool>()) {
        let mut graph = DirectedGraph::new();
        if present {
            graph.add_node(NodeId(id), "self");
        }

        prop_assert!(!graph.try_add_edge_acyclic(NodeId(id), NodeId(id)));
        prop_assert_eq!(graph.edge_count(), 0);
    }

    /// An edge is accepted exactly when its reverse path does not exist.
    #[test]
    fn rejection_matches_reverse_reachability(
        edges in vec((0i64..8, 0i64..8), 0..30),
        from in 0i64..8,
        to in 0i64..8
    ) {
        prop_assume!(from != to);
        let mut graph = graph_with_nodes(8);
        for (a, b) in edges {
            let _ = graph.try_add_edge_acyclic(NodeId(a), NodeId(b));
        }

        let closes_cycle = graph.is_reachable(NodeId(to), NodeId(from));
        prop_assert_eq!(graph.try_add_edge_acyclic(NodeId(from), NodeId(to)), !closes_cycle);
    }

    /// The roadmap of an ordered list of distinct courses is that list.
    #[test]
    fn roadmap_matches_sorted_order(
        rows in vec((0u8..4, -5i32..5), 0..30)
    ) {
        let levels = ["Beginner", "Intermediate", "Advanced", "Expert"];
        let courses: Vec<Course> = rows
            .into_iter()
            .enumerate()
            .map(|(i, (level, sequence_order))| Course {
                course_id: i as i64,
                skill_id: 1,
                title: format!("Course {i}"),
                level: levels[level as usize].to_string(),
                sequence_order,
                total_videos: 0,
            })
            .collect();

        let ordered = order_courses(courses);
        let ids: Vec<i64> = ordered.iter().map(|course| course.course_id).collect();
        prop_assert_eq!(build_roadmap(&ordered), ids);
    }

    /// Children of any index follow the 2k+1 / 2k+2 rule.
    #[test]
    fn tree_navigation_rule(k in 0usize..1_000_000) {
        prop_assert_eq!(BinaryQuestionTree::next_index(k, false), 2 * k + 1);
        prop_assert_eq!(BinaryQuestionTree::next_index(k, true), 2 * k + 2);
    }
}
