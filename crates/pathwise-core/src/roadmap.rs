//! # Roadmap Builder
//!
//! Deterministic course ordering and roadmap linearisation.
//!
//! `order_courses` is the single source of truth for the default course
//! order, used both for display and for building a learning path.
//! `build_roadmap` turns an ordered list into a graph (a simple path) and
//! reads it back by breadth-first traversal from its first source, so a
//! non-linear roadmap can later be fed through the same call.

use crate::graph::DirectedGraph;
use crate::{NodeId, SkillLevel};
use serde::{Deserialize, Serialize};

/// A course row as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_id: i64,
    #[serde(default)]
    pub skill_id: i64,
    #[serde(default)]
    pub title: String,
    /// Free-form level label ("Beginner", "intermediate ", ...).
    pub level: String,
    pub sequence_order: i32,
    #[serde(default)]
    pub total_videos: u32,
}

/// Sort rank of a course level: beginner 0, intermediate 1, advanced 2,
/// anything else 99. Trimmed and case-insensitive.
#[must_use]
pub fn level_rank(level: &str) -> u8 {
    SkillLevel::rank_of(level)
}

/// Stable sort by `(level rank, sequence order, course id)`.
#[must_use]
pub fn order_courses(mut courses: Vec<Course>) -> Vec<Course> {
    courses.sort_by_key(|course| {
        (
            level_rank(&course.level),
            course.sequence_order,
            course.course_id,
        )
    });
    courses
}

/// Course ids of an already-ordered list, read back through a path graph.
///
/// Empty input yields an empty roadmap.
#[must_use]
pub fn build_roadmap(ordered: &[Course]) -> Vec<i64> {
    let mut graph = DirectedGraph::new();

    for (i, course) in ordered.iter().enumerate() {
        graph.add_node(NodeId(course.course_id), course.title.as_str());
        if i > 0 {
            let previous = NodeId(ordered[i - 1].course_id);
            // A repeated course id would close a loop; the guard drops that link.
            graph.try_add_edge_acyclic(previous, NodeId(course.course_id));
        }
    }

    let Some(start) = graph.first_source() else {
        return Vec::new();
    };

    graph.bfs_order(start).into_iter().map(NodeId::value).collect()
}

// =============================================================================
// TESTS
// =============================================================================
