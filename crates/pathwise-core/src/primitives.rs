//! # Engine Primitives
//!
//! Fixed constants compiled into the engine.
//!
//! The engine starts every request with zero data but fixed rules. These
//! values shape the question tree, the assessment walk and course ordering,
//! and are immutable at runtime.

/// Depth of the complete binary question tree.
///
/// A tree of depth 5 has `2^5 - 1 = 31` nodes and every root-to-leaf walk
/// visits exactly five questions.
pub const QUESTION_TREE_DEPTH: u32 = 5;

/// Number of questions a skill's bank must hold (tree indices `0..=30`).
pub const QUESTIONS_PER_SKILL: usize = (1 << QUESTION_TREE_DEPTH) - 1;

/// Number of answered questions after which an assessment stops.
pub const QUESTIONS_PER_ASSESSMENT: usize = 5;

/// Highest correct-answer count still scored as `Beginner`.
pub const BEGINNER_MAX_CORRECT: usize = 2;

/// Highest correct-answer count still scored as `Intermediate`.
pub const INTERMEDIATE_MAX_CORRECT: usize = 4;

/// Rank given to a course level string that is not a known level.
///
/// Unknown levels sort after every known level.
pub const UNKNOWN_LEVEL_RANK: u8 = 99;

/// First visit token handed out by a fresh graph.
///
/// Node marks start at 0, so a fresh token never collides with an
/// untouched node.
pub const INITIAL_VISIT_TOKEN: u32 = 1;

/// Percentage at which a course counts as completed.
pub const COMPLETION_PERCENT: u8 = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_bank_is_complete_tree() {
        assert_eq!(QUESTIONS_PER_SKILL, 31);
    }

    #[test]
    fn assessment_walk_matches_tree_depth() {
        assert_eq!(QUESTIONS_PER_ASSESSMENT, QUESTION_TREE_DEPTH as usize);
    }
}
