//! # pathwise-core
//!
//! The deterministic graph and tree engine for Pathwise.
//!
//! This crate implements the algorithmic core of a course and assessment
//! platform. Everything around it (HTTP endpoints, persistence, sessions)
//! is an external collaborator that loads rows, calls into this crate and
//! stores the derived results.
//!
//! ## What lives here
//!
//! - `graph` → acyclic directed graph: guarded edge insertion, reachability,
//!   Kahn topological order, BFS order and levels
//! - `tree` → fixed-depth complete binary tree for adaptive questioning
//! - `roadmap` → deterministic course ordering and roadmap linearisation
//! - `progress` → heterogeneous user/skill/course progress graph
//! - `dependency` → concept-prerequisite validation and per-skill serialised writes
//! - `assessment` → five-question walk over the question tree and scoring
//! - `tracker` → course and skill completion percentages
//!
//! ## Architectural Constraints
//!
//! - NO async, NO I/O: all operations are bounded in-memory computations
//! - NO `HashMap`: `BTreeMap`/`BTreeSet` keep every output deterministic
//! - NO floats: percentages use integer arithmetic
//! - Graph instances never outlive the call that built them

// =============================================================================
// MODULES
// =============================================================================

pub mod assessment;
pub mod dependency;
pub mod graph;
pub mod primitives;
pub mod progress;
pub mod roadmap;
pub mod tracker;
pub mod tree;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{NodeId, PathwiseError, SkillLevel};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use assessment::{AssessmentPolicy, AssessmentRun, AssessmentState, AssessmentStep};
pub use dependency::{
    Concept, ConceptDependencyService, ConceptEdge, InMemoryStore, NewConcept, NewPrerequisite,
    Prerequisite, PrerequisitePlan, PrerequisiteStore, SkillGraph, SkillLocks, SkillSnapshot,
    build_skill_graph, plan_prerequisite, skill_graph_view, validate_new_concept,
};
pub use graph::{DirectedGraph, Edge, GraphNode, TopologicalOrder};
pub use progress::{
    Metric, NodeKind, PathCourseRow, ProgressEdge, ProgressGraph, ProgressInput, ProgressNode,
    ProgressSummary, SkillRow, UserRow,
};
pub use roadmap::{Course, build_roadmap, level_rank, order_courses};
pub use tracker::{
    CourseProgress, active_course, course_completion_percent, path_completed,
    skill_completion_percent,
};
pub use tree::{BinaryQuestionTree, Question};
