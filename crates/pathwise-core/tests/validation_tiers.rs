//! # Validation Tier Tests (T0-T3)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Graph Integrity
//! - T1: Deterministic Ordering
//! - T2: Adaptive Questioning
//! - T3: Service Composition

use pathwise_core::{
    AssessmentPolicy, BinaryQuestionTree, Concept, Course, DirectedGraph, NodeId, NodeKind,
    PathCourseRow, PathwiseError, Prerequisite, PrerequisitePlan, ProgressGraph, ProgressInput,
    Question, SkillLevel, SkillSnapshot, UserRow, build_roadmap, order_courses, plan_prerequisite,
    skill_graph_view,
};
use std::collections::BTreeMap;

fn question(tree_index: usize) -> Question {
    Question {
        question_id: tree_index as i64 + 1,
        skill_id: 1,
        tree_index,
        text: format!("Q{tree_index}"),
        choice_a: "yes".to_string(),
        choice_b: "no".to_string(),
        choice_c: "maybe".to_string(),
        correct_answer: "B".to_string(),
        difficulty: String::new(),
    }
}

fn course(course_id: i64, level: &str, sequence_order: i32) -> Course {
    Course {
        course_id,
        skill_id: 1,
        title: format!("Course {course_id}"),
        level: level.to_string(),
        sequence_order,
        total_videos: 10,
    }
}

// =============================================================================
// TIER T0: GRAPH INTEGRITY
// =============================================================================

mod t0_graph_integrity {
    use super::*;

    /// T0.1: A closing edge is rejected and the graph is left untouched.
    #[test]
    fn closing_edge_rejected() {
        let mut graph = DirectedGraph::new();
        for id in 1..=3 {
            graph.add_node(NodeId(id), format!("c{id}"));
        }

        assert!(graph.try_add_edge_acyclic(NodeId(1), NodeId(2)));
        assert!(graph.try_add_edge_acyclic(NodeId(2), NodeId(3)));
        assert!(!graph.try_add_edge_acyclic(NodeId(3), NodeId(1)));
        assert_eq!(graph.edge_count(), 2);

        let topo = graph.try_topological_order();
        assert!(topo.complete);
        assert_eq!(topo.order, vec![NodeId(1), NodeId(2), NodeId(3)]);
    }

    /// T0.2: Self-loops are rejected even when the node is absent.
    #[test]
    fn self_loop_on_absent_node_rejected() {
        let mut graph = DirectedGraph::new();
        assert!(!graph.try_add_edge_acyclic(NodeId(5), NodeId(5)));
        assert!(graph.is_empty());
    }

    /// T0.3: A verbatim-loaded cycle is detected by the order check.
    #[test]
    fn stored_cycle_detected() {
        let mut graph = DirectedGraph::from_stored(
            (1..=3).map(|id| (NodeId(id), format!("c{id}"))),
            [
                (NodeId(1), NodeId(2)),
                (NodeId(2), NodeId(3)),
                (NodeId(3), NodeId(1)),
            ],
        );

        let topo = graph.try_topological_order();
        assert!(!topo.complete);
        assert!(topo.order.is_empty());
    }

    /// T0.4: Repeated reachability queries stay correct.
    #[test]
    fn repeated_reachability_is_stable() {
        let mut graph = DirectedGraph::new();
        for id in 0..50 {
            graph.add_node(NodeId(id), "n");
        }
        for id in 0..49 {
            assert!(graph.try_add_edge_acyclic(NodeId(id), NodeId(id + 1)));
        }

        for _ in 0..1000 {
            assert!(graph.is_reachable(NodeId(0), NodeId(49)));
            assert!(!graph.is_reachable(NodeId(49), NodeId(0)));
        }
    }
}

// =============================================================================
// TIER T1: DETERMINISTIC ORDERING
// =============================================================================

mod t1_deterministic_ordering {
    use super::*;

    /// T1.1: Level, then sequence, then id.
    #[test]
    fn roadmap_from_mixed_levels() {
        let ordered = order_courses(vec![
            course(5, "Advanced", 1),
            course(2, "Beginner", 2),
            course(9, "Beginner", 1),
        ]);
        assert_eq!(build_roadmap(&ordered), vec![9, 2, 5]);
    }

    /// T1.2: Input order does not change the result.
    #[test]
    fn ordering_ignores_input_order() {
        let rows = vec![
            course(1, "intermediate", 3),
            course(2, "Beginner", 3),
            course(3, "advanced", 0),
            course(4, "Beginner", 3),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        assert_eq!(
            build_roadmap(&order_courses(rows)),
            build_roadmap(&order_courses(reversed))
        );
    }

    /// T1.3: Kahn ties resolve by append order, not by id.
    #[test]
    fn topological_ties_follow_append_order() {
        let mut graph = DirectedGraph::new();
        for id in [30, 10, 20] {
            graph.add_node(NodeId(id), "n");
        }

        let topo = graph.try_topological_order();
        assert_eq!(topo.order, vec![NodeId(30), NodeId(10), NodeId(20)]);
    }
}

// =============================================================================
// TIER T2: ADAPTIVE QUESTIONING
// =============================================================================

mod t2_adaptive_questioning {
    use super::*;

    fn tree() -> BinaryQuestionTree {
        BinaryQuestionTree::complete((0..31).map(question).collect()).expect("bank")
    }

    /// T2.1: Navigation binds correct answers to the higher child.
    #[test]
    fn navigation_rule() {
        assert_eq!(BinaryQuestionTree::next_index(0, true), 2);
        assert_eq!(BinaryQuestionTree::next_index(0, false), 1);
        assert_eq!(BinaryQuestionTree::next_index(7, true), 16);
    }

    /// T2.2: A 30-row bank is a malformed input set.
    #[test]
    fn incomplete_bank_rejected() {
        let result = BinaryQuestionTree::complete((0..30).map(question).collect());
        let error = result.err().expect("malformed");
        assert!(error.is_corruption());
        assert_eq!(
            error,
            PathwiseError::MalformedQuestionSet {
                expected: 31,
                found: 30
            }
        );
    }

    /// T2.3: Five answers reach depth four and produce a level.
    #[test]
    fn five_answers_produce_level() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["b", "b", "a", "b", "c"])
            .expect("run");

        assert_eq!(run.visited, vec![0, 2, 6, 13, 28]);
        assert_eq!(run.correct_count, 3);
        assert_eq!(run.level, Some(SkillLevel::Intermediate));
    }
}

// =============================================================================
// TIER T3: SERVICE COMPOSITION
// =============================================================================

mod t3_service_composition {
    use super::*;

    fn snapshot(prerequisites: Vec<Prerequisite>) -> SkillSnapshot {
        SkillSnapshot {
            skill_id: 7,
            skill_name: "Algorithms".to_string(),
            concepts: (1..=3)
                .map(|id| Concept {
                    concept_id: id,
                    skill_id: 7,
                    name: format!("Concept {id}"),
                    description: None,
                })
                .collect(),
            prerequisites,
        }
    }

    fn row(prerequisite_id: i64, concept_id: i64) -> Prerequisite {
        Prerequisite {
            skill_id: 7,
            concept_id,
            prerequisite_id,
        }
    }

    /// T3.1: Rejection and corruption stay different kinds.
    #[test]
    fn rejection_and_corruption_are_distinct() {
        let healthy = snapshot(vec![row(1, 2), row(2, 3)]);
        let request = pathwise_core::NewPrerequisite {
            skill_id: 7,
            concept_id: 1,
            prerequisite_id: 3,
        };
        assert_eq!(
            plan_prerequisite(&healthy, &request),
            Err(PathwiseError::CycleRejected { from: 3, to: 1 })
        );

        let corrupt = snapshot(vec![row(1, 2), row(2, 3), row(3, 1)]);
        assert_eq!(
            skill_graph_view(&corrupt).err(),
            Some(PathwiseError::StoredCycle { skill_id: 7 })
        );
    }

    /// T3.2: An accepted plan leaves a view with a full order.
    #[test]
    fn accepted_plan_keeps_view_valid() {
        let mut stored = snapshot(vec![row(1, 2)]);
        let request = pathwise_core::NewPrerequisite {
            skill_id: 7,
            concept_id: 3,
            prerequisite_id: 2,
        };

        let plan = plan_prerequisite(&stored, &request).expect("plan");
        let PrerequisitePlan::Insert(inserted) = plan else {
            unreachable!("edge is new");
        };
        stored.prerequisites.push(inserted);

        let view = skill_graph_view(&stored).expect("view");
        assert_eq!(view.topological_order, vec![1, 2, 3]);
    }

    /// T3.3: Progress summary over two skills.
    #[test]
    fn progress_summary_over_two_skills() {
        let path_row = |skill_id: i64, course_id: i64, done: bool| PathCourseRow {
            skill_id,
            skill_name: format!("Skill {skill_id}"),
            course_id,
            course_title: format!("Course {course_id}"),
            total_videos: 3,
            is_completed: done,
            completion_percentage: if done { 100 } else { 0 },
        };
        let input = ProgressInput {
            user: UserRow {
                user_id: 1,
                display_name: None,
            },
            path_courses: vec![path_row(1, 10, true), path_row(2, 20, true), path_row(2, 21, false)],
            assessed_skills: Vec::new(),
            completed_skill_ids: Vec::new(),
            watched_by_course: BTreeMap::from([(10, 3), (20, 3), (21, 1)]),
        };

        let graph = ProgressGraph::build(&input);
        assert_eq!(graph.summary.courses_completed, 2);
        assert_eq!(graph.summary.videos_watched, 7);
        assert_eq!(graph.summary.skills_learned, 1);

        let course = graph
            .nodes
            .iter()
            .find(|node| node.kind == NodeKind::Course(21))
            .expect("course node");
        assert_eq!(course.level, 2);
    }
}
