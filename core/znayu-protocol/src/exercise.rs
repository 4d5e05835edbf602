use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::ids::{ChapterId, ExerciseId, LexemeId, RuleId, SectionId};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ExerciseType {
    MultipleChoice,
    Matching,
    FillInBlank,
    ListenType,
}

/// Type-specific payload. Each variant carries exactly the fields its exercise type needs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ExerciseKind {
    MultipleChoice {
        prompt: String,
        options: Vec<String>,
        correct_answer: String,
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        audio: Option<String>,
    },
    Matching {
        left_items: Vec<String>,
        right_items: Vec<String>,
        correct_pairs: BTreeMap<String, String>,
    },
    FillInBlank {
        sentence_part1: String,
        sentence_part2: String,
        correct_answer: String,
    },
    ListenType {
        /// Recorded audio; the presentation layer synthesizes speech from `correct_answer` when absent.
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        audio: Option<String>,
        correct_answer: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct Exercise {
    pub id: ExerciseId,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub chapter_id: Option<ChapterId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub section_id: Option<SectionId>,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: ExerciseKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lexeme_ids: Vec<LexemeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub grammar_rule_ids: Vec<RuleId>,
}

impl Exercise {
    pub fn new(id: ExerciseId, kind: ExerciseKind) -> Self {
        Self {
            id,
            chapter_id: None,
            section_id: None,
            kind,
            lexeme_ids: Vec::new(),
            grammar_rule_ids: Vec::new(),
        }
    }

    pub fn with_lexemes(mut self, ids: impl IntoIterator<Item = LexemeId>) -> Self {
        self.lexeme_ids = ids.into_iter().collect();
        self
    }

    pub fn with_rules(mut self, ids: impl IntoIterator<Item = RuleId>) -> Self {
        self.grammar_rule_ids = ids.into_iter().collect();
        self
    }

    pub fn exercise_type(&self) -> ExerciseType {
        match self.kind {
            ExerciseKind::MultipleChoice { .. } => ExerciseType::MultipleChoice,
            ExerciseKind::Matching { .. } => ExerciseType::Matching,
            ExerciseKind::FillInBlank { .. } => ExerciseType::FillInBlank,
            ExerciseKind::ListenType { .. } => ExerciseType::ListenType,
        }
    }

    /// The answer expected from the learner. Matching exercises have none.
    pub fn correct_answer(&self) -> Option<&str> {
        match &self.kind {
            ExerciseKind::MultipleChoice { correct_answer, .. }
            | ExerciseKind::FillInBlank { correct_answer, .. }
            | ExerciseKind::ListenType { correct_answer, .. } => Some(correct_answer),
            ExerciseKind::Matching { .. } => None,
        }
    }

    /// Checks the structural guarantees of the exercise type.
    pub fn is_well_formed(&self) -> bool {
        match &self.kind {
            ExerciseKind::MultipleChoice { options, correct_answer, .. } => {
                let mut distinct = options.clone();
                distinct.sort();
                distinct.dedup();
                options.len() == 4
                    && distinct.len() == 4
                    && options.iter().filter(|o| *o == correct_answer).count() == 1
            }
            ExerciseKind::Matching { left_items, right_items, correct_pairs } => {
                let mut distinct_right = right_items.clone();
                distinct_right.sort();
                distinct_right.dedup();
                !left_items.is_empty()
                    && left_items.len() == distinct_right.len()
                    && left_items.len() == right_items.len()
                    && left_items.iter().all(|left| {
                        correct_pairs.get(left).is_some_and(|right| right_items.contains(right))
                    })
            }
            ExerciseKind::FillInBlank { correct_answer, .. }
            | ExerciseKind::ListenType { correct_answer, .. } => !correct_answer.trim().is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ConceptType {
    Vocab,
    Grammar,
    Spelling,
    Listening,
}

/// A wrong answer kept for spaced review.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
pub struct MissedQuestion {
    pub exercise_id: ExerciseId,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub chapter_id: Option<ChapterId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub section_id: Option<SectionId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub concept_type: Option<ConceptType>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub grammar_rule_id: Option<RuleId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lexeme_ids: Vec<LexemeId>,
    pub original_exercise: Exercise,
    pub timestamp: DateTime<Utc>,
}

impl MissedQuestion {
    /// Captures an exercise the learner got wrong.
    pub fn from_exercise(exercise: &Exercise, timestamp: DateTime<Utc>) -> Self {
        let grammar_rule_id = exercise.grammar_rule_ids.first().copied();
        let concept_type = match exercise.exercise_type() {
            ExerciseType::ListenType => ConceptType::Listening,
            ExerciseType::FillInBlank if grammar_rule_id.is_some() => ConceptType::Grammar,
            ExerciseType::FillInBlank => ConceptType::Spelling,
            ExerciseType::MultipleChoice | ExerciseType::Matching => ConceptType::Vocab,
        };
        Self {
            exercise_id: exercise.id,
            chapter_id: exercise.chapter_id,
            section_id: exercise.section_id,
            concept_type: Some(concept_type),
            grammar_rule_id,
            lexeme_ids: exercise.lexeme_ids.clone(),
            original_exercise: exercise.clone(),
            timestamp,
        }
    }

    pub fn now(exercise: &Exercise) -> Self {
        Self::from_exercise(exercise, Utc::now())
    }
}
