//! # Core Type Definitions
//!
//! This module contains the types shared across the Pathwise engine:
//! - Graph identifiers (`NodeId`)
//! - Skill levels (`SkillLevel`)
//! - Error types (`PathwiseError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` for deterministic ordering in `BTreeMap`/`BTreeSet`

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::primitives::{BEGINNER_MAX_CORRECT, INTERMEDIATE_MAX_CORRECT, UNKNOWN_LEVEL_RANK};

// =============================================================================
// GRAPH IDENTIFIERS
// =============================================================================

/// Caller-supplied identifier of a node in a `DirectedGraph`.
///
/// Unique within one graph instance. The engine never invents ids for
/// caller graphs; the progress assembler allocates its own dense ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl NodeId {
    /// Get the raw id value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for NodeId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SKILL LEVEL
// =============================================================================

/// Proficiency level shared by courses and assessment results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Parse a level label, trimmed and case-insensitive.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Sort rank of the level: Beginner 0, Intermediate 1, Advanced 2.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Beginner => 0,
            Self::Intermediate => 1,
            Self::Advanced => 2,
        }
    }

    /// Rank of a raw level label; unknown labels rank last.
    #[must_use]
    pub fn rank_of(label: &str) -> u8 {
        Self::parse(label).map_or(UNKNOWN_LEVEL_RANK, Self::rank)
    }

    /// Level earned by a number of correct answers.
    #[must_use]
    pub const fn from_correct_count(correct: usize) -> Self {
        if correct <= BEGINNER_MAX_CORRECT {
            Self::Beginner
        } else if correct <= INTERMEDIATE_MAX_CORRECT {
            Self::Intermediate
        } else {
            Self::Advanced
        }
    }

    /// Display name of the level.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl std::fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Pathwise engine and its service layer.
///
/// The graph engine itself never fails: it signals rejection with `bool`
/// and incomplete orders. These variants are what the service layer turns
/// those signals into. Rejected mutations, stored corruption and malformed
/// question banks are distinct kinds and must stay distinct.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathwiseError {
    /// A concept was asked to be its own prerequisite.
    #[error("Concept {0} cannot be its own prerequisite")]
    SelfReference(i64),

    /// Adding the edge would close a cycle in the prerequisite graph.
    #[error("Prerequisite {from} -> {to} would create a cycle")]
    CycleRejected { from: i64, to: i64 },

    /// The stored edges of a skill already contain a cycle.
    #[error("Circular dependency detected in stored data for skill {skill_id}")]
    StoredCycle { skill_id: i64 },

    /// A stored edge of a skill names a concept the skill does not own.
    #[error(
        "Stored prerequisite {prerequisite_id} -> {concept_id} of skill {skill_id} references an unknown concept"
    )]
    DanglingPrerequisite {
        skill_id: i64,
        concept_id: i64,
        prerequisite_id: i64,
    },

    /// A question bank does not hold exactly the expected number of rows.
    #[error("Question bank must have exactly {expected} questions (found {found})")]
    MalformedQuestionSet { expected: usize, found: usize },

    /// A question bank's tree indices are not `0..n` in order.
    #[error("Question bank must have tree indices in order: expected {position}, found {found}")]
    QuestionIndexMismatch { position: usize, found: usize },

    /// A question bank holds rows of more than one skill.
    #[error("Question bank must belong to one skill: expected {expected}, found {found}")]
    MixedSkillBank { expected: i64, found: i64 },

    /// The requested concept does not exist.
    #[error("Concept not found: {0}")]
    ConceptNotFound(i64),

    /// The requested skill does not exist.
    #[error("Skill not found: {0}")]
    SkillNotFound(i64),

    /// The requested question does not exist in the tree.
    #[error("Question with tree index {0} not found")]
    QuestionNotFound(usize),

    /// Concepts of an edge belong to a different skill than requested.
    #[error("Concepts must belong to skill {skill_id}")]
    SkillMismatch { skill_id: i64 },

    /// A concept with the same name already exists for the skill.
    #[error("Concept '{name}' already exists for skill {skill_id}")]
    DuplicateConcept { skill_id: i64, name: String },

    /// A request field is missing or out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl PathwiseError {
    /// Whether the error reflects invalid persisted state rather than a bad request.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::StoredCycle { .. }
                | Self::DanglingPrerequisite { .. }
                | Self::MalformedQuestionSet { .. }
                | Self::QuestionIndexMismatch { .. }
                | Self::MixedSkillBank { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parse_is_trimmed_and_case_insensitive() {
        assert_eq!(SkillLevel::parse("  BEGINNER "), Some(SkillLevel::Beginner));
        assert_eq!(SkillLevel::parse("Intermediate"), Some(SkillLevel::Intermediate));
        assert_eq!(SkillLevel::parse("advanced\n"), Some(SkillLevel::Advanced));
        assert_eq!(SkillLevel::parse("expert"), None);
    }

    #[test]
    fn unknown_level_ranks_last() {
        assert_eq!(SkillLevel::rank_of("beginner"), 0);
        assert_eq!(SkillLevel::rank_of("Advanced"), 2);
        assert_eq!(SkillLevel::rank_of(""), 99);
    }

    #[test]
    fn level_from_correct_count_boundaries() {
        assert_eq!(SkillLevel::from_correct_count(0), SkillLevel::Beginner);
        assert_eq!(SkillLevel::from_correct_count(2), SkillLevel::Beginner);
        assert_eq!(SkillLevel::from_correct_count(3), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_correct_count(4), SkillLevel::Intermediate);
        assert_eq!(SkillLevel::from_correct_count(5), SkillLevel::Advanced);
    }

    #[test]
    fn corruption_kinds_are_distinct_from_rejections() {
        assert!(PathwiseError::StoredCycle { skill_id: 1 }.is_corruption());
        assert!(!PathwiseError::CycleRejected { from: 1, to: 2 }.is_corruption());
        assert!(!PathwiseError::SelfReference(3).is_corruption());
        assert!(
            PathwiseError::DanglingPrerequisite {
                skill_id: 1,
                concept_id: 2,
                prerequisite_id: 50
            }
            .is_corruption()
        );
        assert!(
            PathwiseError::MixedSkillBank {
                expected: 1,
                found: 2
            }
            .is_corruption()
        );
    }
}
