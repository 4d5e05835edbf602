use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use znayu_morph::{decline, genitive_plural};
use znayu_protocol::{
    Case, Curriculum, Exercise, ExerciseId, ExerciseKind, Lexeme, LexemeId, MissedQuestion,
    PartOfSpeech,
};

use crate::config::GeneratorConfig;
use crate::generator::{distinct_by_word_and_gloss, matching_exercise, multiple_choice_prompt, MIN_MATCHING};
use crate::templates::{templates_for, SentenceTemplate};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("answer '{0}' does not match any known lexeme")]
    UnresolvableAnswer(String),
    #[error("no distractors left for '{0}' outside the original options")]
    NoFreshDistractors(String),
    #[error("only {0} lexemes available to rebuild the exercise")]
    NotEnoughLexemes(usize),
    #[error("no template other than '{0}'")]
    NoAlternativeTemplate(String),
}

/// Rebuilds missed exercises so the learner sees the concept again in a different form.
pub struct ReviewGenerator<'a, R: Rng = ChaCha8Rng> {
    curriculum: &'a Curriculum,
    config: GeneratorConfig,
    rng: R,
}

impl<'a> ReviewGenerator<'a, ChaCha8Rng> {
    pub fn new(curriculum: &'a Curriculum, config: GeneratorConfig) -> Self {
        Self::with_rng(curriculum, config, ChaCha8Rng::from_entropy())
    }
}

impl<'a, R: Rng> ReviewGenerator<'a, R> {
    pub fn with_rng(curriculum: &'a Curriculum, config: GeneratorConfig, rng: R) -> Self {
        Self { curriculum, config, rng }
    }

    /// A fresh variant of the missed exercise, or the original when none can be built.
    pub fn regenerate(&mut self, missed: &MissedQuestion) -> Exercise {
        match self.try_regenerate(missed) {
            Ok(exercise) => exercise,
            Err(e) => {
                warn!("reusing exercise {} for review: {}", missed.exercise_id, e);
                missed.original_exercise.clone()
            }
        }
    }

    pub fn try_regenerate(&mut self, missed: &MissedQuestion) -> Result<Exercise, ReviewError> {
        let original = &missed.original_exercise;
        let id = original.id.offset(self.config.review_id_offset);
        let mut exercise = match &original.kind {
            ExerciseKind::MultipleChoice { options, correct_answer, .. } => {
                self.multiple_choice(missed, options, correct_answer, id)?
            }
            ExerciseKind::Matching { left_items, .. } => self.matching(missed, left_items, id)?,
            ExerciseKind::FillInBlank { sentence_part1, correct_answer, .. } => {
                self.fill_in_blank(missed, sentence_part1, correct_answer, id)?
            }
            ExerciseKind::ListenType { .. } => Exercise { id, ..original.clone() },
        };
        exercise.chapter_id = original.chapter_id;
        exercise.section_id = original.section_id;
        debug!("review {} regenerated as {}", original.id, exercise.id);
        Ok(exercise)
    }

    /// Lexemes of the missed question's chapter, empty when it has none.
    fn chapter_pool(&self, missed: &MissedQuestion) -> Vec<&'a Lexeme> {
        let curriculum = self.curriculum;
        missed
            .chapter_id
            .or(missed.original_exercise.chapter_id)
            .and_then(|id| curriculum.chapter_by_id(id))
            .map(|chapter| curriculum.lexemes_by_ids(&chapter.scope_lexeme_ids()))
            .unwrap_or_default()
    }

    /// Every lexeme, those the exercise was built from first.
    fn known_lexemes(&self, missed: &MissedQuestion) -> Vec<&'a Lexeme> {
        let curriculum = self.curriculum;
        let mut ids: Vec<LexemeId> = missed.lexeme_ids.clone();
        for id in &missed.original_exercise.lexeme_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        let mut known = curriculum.lexemes_by_ids(&ids);
        known.extend(curriculum.lexemes.iter().filter(|l| !ids.contains(&l.id)));
        known
    }

    fn multiple_choice(
        &mut self,
        missed: &MissedQuestion,
        options: &[String],
        correct_answer: &str,
        id: ExerciseId,
    ) -> Result<Exercise, ReviewError> {
        let correct = self
            .known_lexemes(missed)
            .into_iter()
            .find(|l| l.gloss == correct_answer)
            .ok_or_else(|| ReviewError::UnresolvableAnswer(correct_answer.to_string()))?;
        let mut originals: Vec<&String> = options.iter().filter(|o| *o != correct_answer).collect();
        let is_fresh =
            |l: &&Lexeme| l.id != correct.id && l.gloss != correct_answer && !originals.contains(&&l.gloss);

        let mut chapter: Vec<&Lexeme> = self.chapter_pool(missed).into_iter().filter(is_fresh).collect();
        chapter.shuffle(&mut self.rng);
        let mut fresh = distinct_glosses(chapter);
        if fresh.len() < 3 {
            let mut global: Vec<&Lexeme> = self.curriculum.lexemes.iter().filter(is_fresh).collect();
            global.shuffle(&mut self.rng);
            for gloss in distinct_glosses(global) {
                if !fresh.contains(&gloss) {
                    fresh.push(gloss);
                }
            }
        }
        if fresh.is_empty() {
            return Err(ReviewError::NoFreshDistractors(correct_answer.to_string()));
        }

        fresh.truncate(3);
        originals.shuffle(&mut self.rng);
        for original in originals {
            if fresh.len() == 3 {
                break;
            }
            if !fresh.contains(original) {
                fresh.push(original.clone());
            }
        }
        if fresh.len() < 3 {
            return Err(ReviewError::NotEnoughLexemes(fresh.len() + 1));
        }

        let mut options = fresh;
        options.push(correct.gloss.clone());
        options.shuffle(&mut self.rng);
        let kind = ExerciseKind::MultipleChoice {
            prompt: multiple_choice_prompt(&correct.word),
            options,
            correct_answer: correct.gloss.clone(),
            audio: correct.audio.clone(),
        };
        Ok(Exercise::new(id, kind).with_lexemes([correct.id]))
    }

    fn matching(&mut self, missed: &MissedQuestion, left_items: &[String], id: ExerciseId) -> Result<Exercise, ReviewError> {
        let size = self.config.matching_size;
        let known = self.known_lexemes(missed);
        let mut originals: Vec<&Lexeme> = left_items
            .iter()
            .filter_map(|word| known.iter().copied().find(|l| &l.word == word))
            .collect();

        let chapter = self.chapter_pool(missed);
        let pool = if chapter.len() >= size {
            chapter
        } else {
            self.curriculum.lexemes.iter().collect()
        };
        let mut fresh: Vec<&Lexeme> = pool.into_iter().filter(|l| !left_items.contains(&l.word)).collect();
        fresh.shuffle(&mut self.rng);
        originals.shuffle(&mut self.rng);

        let picked = distinct_by_word_and_gloss(fresh.into_iter().chain(originals), size);
        if picked.len() < MIN_MATCHING.min(size).max(1) {
            return Err(ReviewError::NotEnoughLexemes(picked.len()));
        }
        Ok(matching_exercise(id, &picked, &mut self.rng))
    }

    fn fill_in_blank(
        &mut self,
        missed: &MissedQuestion,
        original_part1: &str,
        answer: &str,
        id: ExerciseId,
    ) -> Result<Exercise, ReviewError> {
        let noun = self
            .resolve_noun(missed, answer)
            .ok_or_else(|| ReviewError::UnresolvableAnswer(answer.to_string()))?;
        let rule = missed
            .grammar_rule_id
            .or_else(|| missed.original_exercise.grammar_rule_ids.first().copied())
            .and_then(|id| self.curriculum.grammar_rule(id));
        let case = rule.map_or(Case::Accusative, |r| r.cases().preferred_case());

        let template = self.pick_template(case, original_part1)?;
        let correct_answer = if template.plural {
            genitive_plural(&noun.word, noun.gender)
        } else {
            decline(&noun.word, case, noun.gender)
        };
        let kind = ExerciseKind::FillInBlank {
            sentence_part1: template.part1.to_string(),
            sentence_part2: template.render_hint(&noun.gloss),
            correct_answer,
        };
        Ok(Exercise::new(id, kind)
            .with_lexemes([noun.id])
            .with_rules(rule.map(|r| r.id)))
    }

    /// A frame for `case` other than the one shown before.
    fn pick_template(&mut self, case: Case, original_part1: &str) -> Result<&'static SentenceTemplate, ReviewError> {
        let fresh: Vec<&'static SentenceTemplate> =
            templates_for(case).iter().filter(|t| t.part1 != original_part1).collect();
        fresh
            .choose(&mut self.rng)
            .copied()
            .ok_or_else(|| ReviewError::NoAlternativeTemplate(original_part1.to_string()))
    }

    /// The noun whose generated forms include the stored answer, with or without a
    /// leading adjective.
    fn resolve_noun(&self, missed: &MissedQuestion, answer: &str) -> Option<&'a Lexeme> {
        let answer = answer.trim().to_lowercase();
        if answer.is_empty() {
            return None;
        }
        self.known_lexemes(missed)
            .into_iter()
            .filter(|l| l.is(PartOfSpeech::Noun))
            .find(|noun| {
                surface_forms(noun)
                    .iter()
                    .any(|form| answer == *form || answer.ends_with(&format!(" {}", form)))
            })
    }
}

fn surface_forms(noun: &Lexeme) -> Vec<String> {
    let mut forms: Vec<String> = Case::ALL
        .iter()
        .map(|case| decline(&noun.word, *case, noun.gender).to_lowercase())
        .collect();
    forms.push(genitive_plural(&noun.word, noun.gender).to_lowercase());
    forms
}

fn distinct_glosses<'l>(lexemes: impl IntoIterator<Item = &'l Lexeme>) -> Vec<String> {
    let mut glosses: Vec<String> = Vec::new();
    for lexeme in lexemes {
        if !glosses.contains(&lexeme.gloss) {
            glosses.push(lexeme.gloss.clone());
        }
    }
    glosses
}
