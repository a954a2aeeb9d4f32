//! # Question Tree
//!
//! A complete binary tree of assessment questions addressed by index.
//!
//! There are no child pointers: the children of index `k` are `2k + 1`
//! (reached after a wrong answer) and `2k + 2` (reached after a correct
//! answer). Navigation is a pure function of the current index and the
//! correctness of the last answer.

use crate::PathwiseError;
use crate::primitives::QUESTIONS_PER_SKILL;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One question of a skill's bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: i64,
    pub skill_id: i64,
    /// Position in the complete binary tree.
    pub tree_index: usize,
    pub text: String,
    pub choice_a: String,
    pub choice_b: String,
    pub choice_c: String,
    /// The correct choice label.
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: String,
}

impl Question {
    /// Whether `selected` matches the correct answer, ignoring case.
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        self.correct_answer.eq_ignore_ascii_case(selected)
    }
}

/// Read-only, index-addressed view over a question bank.
#[derive(Debug, Clone, Default)]
pub struct BinaryQuestionTree {
    by_index: BTreeMap<usize, Question>,
}

impl BinaryQuestionTree {
    /// Build an unchecked view. Later rows win on duplicate indices.
    #[must_use]
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        Self {
            by_index: questions
                .into_iter()
                .map(|question| (question.tree_index, question))
                .collect(),
        }
    }

    /// Build the tree for a skill, enforcing a complete 31-node bank.
    ///
    /// Rows are ordered by tree index first; the bank must then hold
    /// exactly `QUESTIONS_PER_SKILL` rows of one skill, with index `i` at
    /// position `i`.
    /// Index arithmetic silently walks off a malformed bank, so this is
    /// checked before any navigation happens.
    pub fn complete(mut questions: Vec<Question>) -> Result<Self, PathwiseError> {
        questions.sort_by_key(|question| question.tree_index);

        if questions.len() != QUESTIONS_PER_SKILL {
            return Err(PathwiseError::MalformedQuestionSet {
                expected: QUESTIONS_PER_SKILL,
                found: questions.len(),
            });
        }

        let skill_id = questions.first().map_or(0, |question| question.skill_id);
        for (position, question) in questions.iter().enumerate() {
            if question.skill_id != skill_id {
                return Err(PathwiseError::MixedSkillBank {
                    expected: skill_id,
                    found: question.skill_id,
                });
            }
            if question.tree_index != position {
                return Err(PathwiseError::QuestionIndexMismatch {
                    position,
                    found: question.tree_index,
                });
            }
        }

        Ok(Self::from_questions(questions))
    }

    /// The question at index 0.
    #[must_use]
    pub fn root(&self) -> Option<&Question> {
        self.get(0)
    }

    /// Direct lookup by tree index.
    #[must_use]
    pub fn get(&self, tree_index: usize) -> Option<&Question> {
        self.by_index.get(&tree_index)
    }

    /// Index reached from `current` after an answer.
    ///
    /// A correct answer moves to the higher child (`2k + 2`), a wrong one
    /// to the lower child (`2k + 1`). Scoring downstream relies on this
    /// exact mapping.
    #[must_use]
    pub const fn next_index(current: usize, was_correct: bool) -> usize {
        if was_correct {
            current.saturating_mul(2).saturating_add(2)
        } else {
            current.saturating_mul(2).saturating_add(1)
        }
    }

    /// The question reached from `current` after an answer.
    #[must_use]
    pub fn next(&self, current: usize, was_correct: bool) -> Option<&Question> {
        self.get(Self::next_index(current, was_correct))
    }

    /// Number of questions in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    /// Whether the view holds no questions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
