//! # Adaptive Assessment
//!
//! Walks a `BinaryQuestionTree` one answer at a time and scores the result.
//!
//! An assessment starts at the root, moves to the higher child after a
//! correct answer and the lower child after a wrong one, and stops after
//! `questions_to_ask` answers or when the tree has no next question. The
//! walk state travels with the caller between answers; nothing is stored
//! here.

use crate::primitives::QUESTIONS_PER_ASSESSMENT;
use crate::tree::{BinaryQuestionTree, Question};
use crate::{PathwiseError, SkillLevel};
use serde::{Deserialize, Serialize};

/// Counters carried between two answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssessmentState {
    /// Tree index of the question being answered.
    pub current_index: usize,
    pub correct_count: usize,
    pub total_count: usize,
}

/// Outcome of one answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssessmentStep {
    /// The walk continues with `question`.
    Next {
        question: Question,
        state: AssessmentState,
    },
    /// The walk is over.
    Completed {
        level: SkillLevel,
        correct_count: usize,
        total_count: usize,
    },
}

/// Result of replaying a list of answers from the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentRun {
    /// Tree indices of the questions answered, in order.
    pub visited: Vec<usize>,
    pub correct_count: usize,
    pub total_count: usize,
    /// `None` while the walk still expects answers.
    pub level: Option<SkillLevel>,
}

/// Rules of an assessment walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPolicy {
    /// Answers after which the walk stops.
    pub questions_to_ask: usize,
}

impl Default for AssessmentPolicy {
    fn default() -> Self {
        Self {
            questions_to_ask: QUESTIONS_PER_ASSESSMENT,
        }
    }
}

impl AssessmentPolicy {
    /// Create a policy with a custom stop count.
    #[must_use]
    pub const fn new(questions_to_ask: usize) -> Self {
        Self { questions_to_ask }
    }

    /// First question of a walk.
    pub fn start<'a>(&self, tree: &'a BinaryQuestionTree) -> Result<&'a Question, PathwiseError> {
        tree.root().ok_or(PathwiseError::QuestionNotFound(0))
    }

    /// Record an answer to the question at `state.current_index`.
    pub fn answer(
        &self,
        tree: &BinaryQuestionTree,
        state: &AssessmentState,
        selected: &str,
    ) -> Result<AssessmentStep, PathwiseError> {
        let current = tree
            .get(state.current_index)
            .ok_or(PathwiseError::QuestionNotFound(state.current_index))?;

        let correct = current.is_correct(selected);
        let correct_count = state.correct_count.saturating_add(usize::from(correct));
        let total_count = state.total_count.saturating_add(1);

        if total_count >= self.questions_to_ask {
            return Ok(Self::completed(correct_count, total_count));
        }

        match tree.next(state.current_index, correct) {
            Some(next) => Ok(AssessmentStep::Next {
                question: next.clone(),
                state: AssessmentState {
                    current_index: next.tree_index,
                    correct_count,
                    total_count,
                },
            }),
            None => Ok(Self::completed(correct_count, total_count)),
        }
    }

    /// Replay `answers` from the root until they run out or the walk ends.
    pub fn run<S: AsRef<str>>(
        &self,
        tree: &BinaryQuestionTree,
        answers: &[S],
    ) -> Result<AssessmentRun, PathwiseError> {
        let root = self.start(tree)?;
        let mut state = AssessmentState {
            current_index: root.tree_index,
            ..AssessmentState::default()
        };
        let mut visited = Vec::new();

        for selected in answers {
            visited.push(state.current_index);
            match self.answer(tree, &state, selected.as_ref())? {
                AssessmentStep::Next { state: next, .. } => state = next,
                AssessmentStep::Completed {
                    level,
                    correct_count,
                    total_count,
                } => {
                    return Ok(AssessmentRun {
                        visited,
                        correct_count,
                        total_count,
                        level: Some(level),
                    });
                }
            }
        }

        Ok(AssessmentRun {
            visited,
            correct_count: state.correct_count,
            total_count: state.total_count,
            level: None,
        })
    }

    fn completed(correct_count: usize, total_count: usize) -> AssessmentStep {
        let level = SkillLevel::from_correct_count(correct_count);
        tracing::debug!(correct_count, total_count, %level, "assessment completed");
        AssessmentStep::Completed {
            level,
            correct_count,
            total_count,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::{full_bank, question};

    fn tree() -> BinaryQuestionTree {
        BinaryQuestionTree::complete(full_bank()).expect("bank")
    }

    #[test]
    fn correct_answer_moves_to_higher_child() {
        let policy = AssessmentPolicy::default();
        let step = policy
            .answer(&tree(), &AssessmentState::default(), "a")
            .expect("answer");

        match step {
            AssessmentStep::Next { question, state } => {
                assert_eq!(question.tree_index, 2);
                assert_eq!(state.correct_count, 1);
                assert_eq!(state.total_count, 1);
            }
            AssessmentStep::Completed { .. } => unreachable!("walk should continue"),
        }
    }

    #[test]
    fn all_correct_walk_scores_advanced() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["A", "A", "A", "A", "A"])
            .expect("run");

        assert_eq!(run.visited, vec![0, 2, 6, 14, 30]);
        assert_eq!(run.correct_count, 5);
        assert_eq!(run.level, Some(SkillLevel::Advanced));
    }

    #[test]
    fn all_wrong_walk_scores_beginner() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["B", "C", "B", "C", "B"])
            .expect("run");

        assert_eq!(run.visited, vec![0, 1, 3, 7, 15]);
        assert_eq!(run.correct_count, 0);
        assert_eq!(run.level, Some(SkillLevel::Beginner));
    }

    #[test]
    fn mixed_walk_scores_intermediate() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["A", "B", "A", "A", "B"])
            .expect("run");

        assert_eq!(run.visited, vec![0, 2, 5, 12, 26]);
        assert_eq!(run.correct_count, 3);
        assert_eq!(run.level, Some(SkillLevel::Intermediate));
    }

    #[test]
    fn extra_answers_are_ignored_after_completion() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["A", "A", "A", "A", "A", "A", "A"])
            .expect("run");
        assert_eq!(run.total_count, 5);
        assert_eq!(run.visited.len(), 5);
    }

    #[test]
    fn partial_run_has_no_level() {
        let run = AssessmentPolicy::default()
            .run(&tree(), &["A", "B"])
            .expect("run");
        assert_eq!(run.total_count, 2);
        assert_eq!(run.level, None);
    }

    #[test]
    fn walk_ends_at_leaf_of_shallow_tree() {
        let shallow = BinaryQuestionTree::from_questions((0..3).map(question));
        let run = AssessmentPolicy::default()
            .run(&shallow, &["A", "A", "A"])
            .expect("run");

        assert_eq!(run.visited, vec![0, 2]);
        assert_eq!(run.level, Some(SkillLevel::Beginner));
    }

    #[test]
    fn unknown_current_index_is_not_found() {
        let state = AssessmentState {
            current_index: 99,
            ..AssessmentState::default()
        };
        let result = AssessmentPolicy::default().answer(&tree(), &state, "A");
        assert_eq!(result, Err(PathwiseError::QuestionNotFound(99)));
    }

    #[test]
    fn empty_tree_cannot_start() {
        let empty = BinaryQuestionTree::default();
        assert_eq!(
            AssessmentPolicy::default().start(&empty).err(),
            Some(PathwiseError::QuestionNotFound(0))
        );
    }
}
