use std::collections::BTreeMap;

use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use znayu_morph::{decline, genitive_plural};
use znayu_protocol::{
    Case, CaseSet, Chapter, Curriculum, Exercise, ExerciseId, ExerciseKind, ExerciseType, GrammarRule,
    Lexeme, PackId, PartOfSpeech, Pronoun, RuleId, Section, SectionId, SectionType,
};
use znayu_solver::{PatternStore, Resolver, ThemeContext};

use crate::cache::{CacheKey, SentenceCache};
use crate::config::{chance, GeneratorConfig, Mode};
use crate::gloss;
use crate::sentence::{build_sentence, graded_sentence, Difficulty, SentenceOptions};
use crate::templates::{split_genitive, templates_for, SentenceTemplate, NOUN_OPENERS, VERB_OPENERS};

/// Fewest pairs worth showing as a matching exercise.
pub(crate) const MIN_MATCHING: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("no lexemes in scope")]
    EmptyScope,
    #[error("section {0} teaches letters, not vocabulary")]
    LetterLearning(SectionId),
    #[error("unknown chapter {0}")]
    UnknownChapter(u32),
    #[error("unknown section {0}")]
    UnknownSection(SectionId),
}

/// Where the vocabulary for a batch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSelector {
    Section(SectionId),
    Chapter(u32),
    /// Everything learned up to and including this chapter number, plus active packs.
    Learned(u32),
}

/// Exercise types cycled through for a section kind. `None` is a batch without a section.
pub fn exercise_sequence(kind: Option<SectionType>, genitive: bool) -> &'static [ExerciseType] {
    use ExerciseType::{FillInBlank as Fib, ListenType as Listen, Matching, MultipleChoice as Mc};
    match (kind, genitive) {
        (Some(SectionType::LetterLearning), _) => &[],
        (Some(SectionType::Grammar), true) => &[Fib, Fib, Fib, Matching],
        (Some(SectionType::Grammar), false) => &[Fib, Mc, Fib],
        (Some(SectionType::Vocabulary), _) => &[Matching, Mc, Mc],
        (Some(SectionType::Spelling), _) => &[Listen, Fib, Listen],
        (Some(SectionType::Listening), _) => &[Listen, Mc, Listen],
        (Some(SectionType::MixedReview), true) => &[Fib, Mc, Fib, Matching, Fib],
        (None, true) => &[Fib, Fib, Matching, Mc],
        (Some(SectionType::MixedReview) | None, false) => &[Mc, Matching, Fib, Listen],
    }
}

/// Resolved vocabulary and grammar for one batch.
struct Scope<'c> {
    chapter: Option<&'c Chapter>,
    section: Option<&'c Section>,
    chapter_number: u32,
    lexemes: Vec<&'c Lexeme>,
    rules: Vec<&'c GrammarRule>,
    /// Everything learned so far; distractors and adjectives come from here.
    learned: Vec<&'c Lexeme>,
}

impl<'c> Scope<'c> {
    fn resolve(
        curriculum: &'c Curriculum,
        selector: ScopeSelector,
        active_packs: &[PackId],
    ) -> Result<Self, GenerationError> {
        let (chapter, section, lexemes, rules) = match selector {
            ScopeSelector::Section(id) => {
                let (chapter, section) = curriculum.find_section(id).ok_or(GenerationError::UnknownSection(id))?;
                if section.kind == SectionType::LetterLearning {
                    return Err(GenerationError::LetterLearning(id));
                }
                // A section without vocabulary of its own practises the whole chapter.
                let (lexeme_ids, rule_ids) = if section.lexeme_ids.is_empty() {
                    (chapter.scope_lexeme_ids(), chapter.scope_rule_ids())
                } else {
                    (section.lexeme_ids.clone(), section.rule_ids.clone())
                };
                (
                    Some(chapter),
                    Some(section),
                    curriculum.lexemes_by_ids(&lexeme_ids),
                    curriculum.rules_by_ids(&rule_ids),
                )
            }
            ScopeSelector::Chapter(number) => {
                let chapter = curriculum
                    .chapter_by_number(number)
                    .ok_or(GenerationError::UnknownChapter(number))?;
                (
                    Some(chapter),
                    None,
                    curriculum.lexemes_by_ids(&chapter.scope_lexeme_ids()),
                    curriculum.rules_by_ids(&chapter.scope_rule_ids()),
                )
            }
            ScopeSelector::Learned(number) => (
                None,
                None,
                curriculum.learned_lexemes(number, active_packs),
                curriculum.unlocked_rules(number),
            ),
        };
        if lexemes.is_empty() {
            return Err(GenerationError::EmptyScope);
        }

        let chapter_number = match (chapter, selector) {
            (Some(chapter), _) => chapter.number,
            (None, ScopeSelector::Learned(number) | ScopeSelector::Chapter(number)) => number,
            (None, ScopeSelector::Section(_)) => 0,
        };
        let mut learned = curriculum.learned_lexemes(chapter_number, active_packs);
        for lexeme in &lexemes {
            if !learned.iter().any(|l| l.id == lexeme.id) {
                learned.push(*lexeme);
            }
        }

        Ok(Self { chapter, section, chapter_number, lexemes, rules, learned })
    }

    fn cases(&self) -> CaseSet {
        self.rules.iter().fold(CaseSet::empty(), |acc, r| acc | r.cases())
    }

    fn has_genitive(&self) -> bool {
        self.cases().contains(CaseSet::GENITIVE)
    }

    fn of(&self, pos: PartOfSpeech) -> Vec<&'c Lexeme> {
        self.lexemes.iter().copied().filter(|l| l.is(pos)).collect()
    }

    fn adjectives(&self) -> Vec<&'c Lexeme> {
        self.learned.iter().copied().filter(|l| l.is(PartOfSpeech::Adjective)).collect()
    }

    fn rule_ids_for(&self, case: Case) -> Vec<RuleId> {
        let flag = CaseSet::from(case);
        self.rules
            .iter()
            .filter(|r| !flag.is_empty() && r.cases().contains(flag))
            .map(|r| r.id)
            .collect()
    }

    /// First id of the batch. Chapter and section ids are folded in so batches from
    /// different scopes do not collide.
    fn id_base(&self) -> u32 {
        let chapter = match self.chapter {
            Some(c) => c.id.0.wrapping_mul(1000),
            None => self.chapter_number.wrapping_mul(100),
        };
        chapter.wrapping_add(self.section.map_or(0, |s| s.id.0))
    }
}

/// Multiple choice cannot present prepositions and adverbs cleanly.
fn distractor_eligible(lexeme: &Lexeme) -> bool {
    !matches!(lexeme.pos, PartOfSpeech::Preposition | PartOfSpeech::Adverb)
}

/// Keeps lexemes in order, skipping any whose word or gloss was already taken.
pub(crate) fn distinct_by_word_and_gloss<'l>(
    candidates: impl IntoIterator<Item = &'l Lexeme>,
    limit: usize,
) -> Vec<&'l Lexeme> {
    let mut picked: Vec<&Lexeme> = Vec::new();
    for lexeme in candidates {
        if picked.len() == limit {
            break;
        }
        if !picked.iter().any(|p| p.word == lexeme.word || p.gloss == lexeme.gloss) {
            picked.push(lexeme);
        }
    }
    picked
}

/// Words on the left, translations shuffled on the right.
pub(crate) fn matching_exercise<R: Rng + ?Sized>(id: ExerciseId, lexemes: &[&Lexeme], rng: &mut R) -> Exercise {
    let left_items: Vec<String> = lexemes.iter().map(|l| l.word.clone()).collect();
    let mut right_items: Vec<String> = lexemes.iter().map(|l| l.gloss.clone()).collect();
    right_items.shuffle(rng);
    let correct_pairs: BTreeMap<String, String> =
        lexemes.iter().map(|l| (l.word.clone(), l.gloss.clone())).collect();
    Exercise::new(id, ExerciseKind::Matching { left_items, right_items, correct_pairs })
        .with_lexemes(lexemes.iter().map(|l| l.id))
}

pub(crate) fn multiple_choice_prompt(word: &str) -> String {
    format!("What does \"{}\" mean?", word)
}

/// Builds exercise batches for a curriculum scope.
///
/// Owns its random source and sentence cache; the pattern store is shared with
/// whoever else persists compatibility evidence.
pub struct ExerciseGenerator<'a, S: PatternStore + ?Sized, R: Rng = ChaCha8Rng> {
    curriculum: &'a Curriculum,
    store: &'a S,
    config: GeneratorConfig,
    rng: R,
    cache: SentenceCache,
}

impl<'a, S: PatternStore + ?Sized> ExerciseGenerator<'a, S, ChaCha8Rng> {
    pub fn new(curriculum: &'a Curriculum, store: &'a S, config: GeneratorConfig) -> Self {
        Self::with_rng(curriculum, store, config, ChaCha8Rng::from_entropy())
    }
}

impl<'a, S: PatternStore + ?Sized, R: Rng> ExerciseGenerator<'a, S, R> {
    pub fn with_rng(curriculum: &'a Curriculum, store: &'a S, config: GeneratorConfig, rng: R) -> Self {
        Self {
            curriculum,
            store,
            config,
            rng,
            cache: SentenceCache::new(),
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn cache(&self) -> &SentenceCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut SentenceCache {
        &mut self.cache
    }

    /// Generates a shuffled batch, or an empty list when the scope yields nothing.
    pub async fn generate(&mut self, selector: ScopeSelector, mode: Mode, active_packs: &[PackId]) -> Vec<Exercise> {
        match self.try_generate(selector, mode, active_packs).await {
            Ok(batch) => batch,
            Err(GenerationError::LetterLearning(id)) => {
                debug!("section {} is letter learning, nothing to generate", id);
                Vec::new()
            }
            Err(e) => {
                warn!("no exercises for {:?}: {}", selector, e);
                Vec::new()
            }
        }
    }

    pub async fn try_generate(
        &mut self,
        selector: ScopeSelector,
        mode: Mode,
        active_packs: &[PackId],
    ) -> Result<Vec<Exercise>, GenerationError> {
        let curriculum = self.curriculum;
        let scope = Scope::resolve(curriculum, selector, active_packs)?;
        let store = self.store;
        let context = ThemeContext::unlocked_at(curriculum, active_packs, scope.chapter_number);
        let resolver = Resolver::new(&context, store);

        let sequence = exercise_sequence(scope.section.map(|s| s.kind), scope.has_genitive());
        if sequence.is_empty() {
            return Ok(Vec::new());
        }
        let count = self.config.count_range(mode).sample(&mut self.rng);
        let base = scope.id_base();
        debug!(
            "generating {} exercises from {} lexemes and {} rules",
            count,
            scope.lexemes.len(),
            scope.rules.len()
        );

        let mut batch = Vec::with_capacity(count);
        for i in 0..count {
            let wanted = sequence[i % sequence.len()];
            let id = ExerciseId(base.wrapping_add(i as u32));
            let Some(mut exercise) = self.build(wanted, &scope, &resolver, id).await else {
                warn!("could not build exercise {} ({:?})", id, wanted);
                continue;
            };
            exercise.chapter_id = scope.chapter.map(|c| c.id);
            exercise.section_id = scope.section.map(|s| s.id);
            debug!("exercise {}: {:?} for slot {:?}", id, exercise.exercise_type(), wanted);
            batch.push(exercise);
        }

        batch.shuffle(&mut self.rng);
        Ok(batch)
    }

    /// One exercise of the wanted type, or a fill-in-blank when the scope cannot support it.
    async fn build(
        &mut self,
        wanted: ExerciseType,
        scope: &Scope<'a>,
        resolver: &Resolver<'_, S>,
        id: ExerciseId,
    ) -> Option<Exercise> {
        let built = match wanted {
            // Multiple choice cannot check inflected recall.
            ExerciseType::MultipleChoice if scope.has_genitive() => None,
            ExerciseType::MultipleChoice => self.multiple_choice(scope, id),
            ExerciseType::Matching => self.matching(scope, id),
            ExerciseType::ListenType => self.listen_type(scope, id),
            ExerciseType::FillInBlank => None,
        };
        match built {
            Some(exercise) => Some(exercise),
            None => self.fill_in_blank(scope, resolver, id).await,
        }
    }

    fn multiple_choice(&mut self, scope: &Scope<'a>, id: ExerciseId) -> Option<Exercise> {
        let eligible: Vec<&Lexeme> = scope.lexemes.iter().copied().filter(|l| distractor_eligible(l)).collect();
        let pool = if eligible.is_empty() { scope.lexemes.clone() } else { eligible };
        let correct = *pool.choose(&mut self.rng)?;

        let mut in_scope: Vec<&Lexeme> = pool.iter().copied().filter(|l| l.id != correct.id).collect();
        in_scope.shuffle(&mut self.rng);
        let mut learned: Vec<&Lexeme> = scope
            .learned
            .iter()
            .copied()
            .filter(|l| l.id != correct.id && distractor_eligible(l))
            .collect();
        learned.shuffle(&mut self.rng);

        let mut options = vec![correct.gloss.clone()];
        for candidate in in_scope.into_iter().chain(learned) {
            if options.len() == 4 {
                break;
            }
            if !options.contains(&candidate.gloss) {
                options.push(candidate.gloss.clone());
            }
        }
        if options.len() < 4 {
            debug!("only {} distinct glosses for multiple choice", options.len());
            return None;
        }
        options.shuffle(&mut self.rng);

        let kind = ExerciseKind::MultipleChoice {
            prompt: multiple_choice_prompt(&correct.word),
            options,
            correct_answer: correct.gloss.clone(),
            audio: correct.audio.clone(),
        };
        Some(Exercise::new(id, kind).with_lexemes([correct.id]))
    }

    fn matching(&mut self, scope: &Scope<'a>, id: ExerciseId) -> Option<Exercise> {
        let mut pool = scope.lexemes.clone();
        pool.shuffle(&mut self.rng);
        let picked = distinct_by_word_and_gloss(pool, self.config.matching_size);
        if picked.len() < MIN_MATCHING.min(self.config.matching_size).max(1) {
            debug!("only {} distinct lexemes for matching", picked.len());
            return None;
        }
        Some(matching_exercise(id, &picked, &mut self.rng))
    }

    fn listen_type(&mut self, scope: &Scope<'a>, id: ExerciseId) -> Option<Exercise> {
        let lexeme = *scope.lexemes.choose(&mut self.rng)?;
        let kind = ExerciseKind::ListenType {
            audio: lexeme.audio.clone(),
            correct_answer: lexeme.word.clone(),
        };
        Some(Exercise::new(id, kind).with_lexemes([lexeme.id]))
    }

    async fn fill_in_blank(&mut self, scope: &Scope<'a>, resolver: &Resolver<'_, S>, id: ExerciseId) -> Option<Exercise> {
        let cases = scope.cases();
        let verbs = scope.of(PartOfSpeech::Verb);
        let nouns = scope.of(PartOfSpeech::Noun);
        let pair = self.pick_pair(resolver, &verbs, &nouns).await;

        if cases.contains(CaseSet::GENITIVE) {
            let noun = match pair {
                Some((_, noun)) => Some(noun),
                None => nouns.choose(&mut self.rng).copied(),
            };
            if let Some(noun) = noun {
                return Some(self.genitive_blank(scope, noun, id));
            }
        } else if let Some((verb, noun)) = pair {
            return Some(self.sentence_blank(scope, verb, noun, cases.preferred_case(), id));
        }
        self.generic_blank(scope, id)
    }

    /// A compatible pair when the resolver finds one, else any pair.
    async fn pick_pair<'l>(
        &mut self,
        resolver: &Resolver<'_, S>,
        verbs: &[&'l Lexeme],
        nouns: &[&'l Lexeme],
    ) -> Option<(&'l Lexeme, &'l Lexeme)> {
        if verbs.is_empty() || nouns.is_empty() {
            return None;
        }
        if let Some(pair) = resolver.find_compatible_pair(verbs, nouns, &mut self.rng).await {
            return Some(pair);
        }
        warn!(
            "no compatible pair among {} verbs and {} nouns, pairing at random",
            verbs.len(),
            nouns.len()
        );
        Some((*verbs.choose(&mut self.rng)?, *nouns.choose(&mut self.rng)?))
    }

    fn genitive_blank(&mut self, scope: &Scope<'a>, noun: &Lexeme, id: ExerciseId) -> Exercise {
        let template = self.pick_genitive_template();
        let answer = if template.plural {
            genitive_plural(&noun.word, noun.gender)
        } else {
            decline(&noun.word, Case::Genitive, noun.gender)
        };
        let kind = ExerciseKind::FillInBlank {
            sentence_part1: template.part1.to_string(),
            sentence_part2: template.render_hint(&noun.gloss),
            correct_answer: answer,
        };
        Exercise::new(id, kind)
            .with_lexemes([noun.id])
            .with_rules(scope.rule_ids_for(Case::Genitive))
    }

    /// Possession with a fixed chance, otherwise any other genitive frame.
    fn pick_genitive_template(&mut self) -> &'static SentenceTemplate {
        let (possession, others) = split_genitive();
        if chance(&mut self.rng, self.config.possession_chance) {
            return possession;
        }
        others.choose(&mut self.rng).copied().unwrap_or(possession)
    }

    fn sentence_blank(&mut self, scope: &Scope<'a>, verb: &Lexeme, noun: &Lexeme, case: Case, id: ExerciseId) -> Exercise {
        let adjectives = scope.adjectives();
        let options = SentenceOptions {
            case: Some(case),
            pronoun: Pronoun::Ya,
            include_adjective: !adjectives.is_empty() && chance(&mut self.rng, self.config.adjective_chance),
            alternate_phrasing: chance(&mut self.rng, self.config.alternate_phrasing_chance),
        };
        let sentence = build_sentence(verb, noun, &adjectives, &scope.rules, &options, &mut self.rng);

        let mut lexeme_ids = vec![verb.id, noun.id];
        lexeme_ids.extend(sentence.adjective.map(|a| a.id));
        let kind = ExerciseKind::FillInBlank {
            sentence_part1: sentence.lead,
            sentence_part2: sentence.hint,
            correct_answer: sentence.answer,
        };
        Exercise::new(id, kind)
            .with_lexemes(lexeme_ids)
            .with_rules(scope.rule_ids_for(case))
    }

    /// Single-lexeme cloze for scopes without a usable verb/noun pair.
    fn generic_blank(&mut self, scope: &Scope<'a>, id: ExerciseId) -> Option<Exercise> {
        let lexeme = *scope.lexemes.choose(&mut self.rng)?;
        let cases = scope.cases();
        let mut rules = Vec::new();

        let (part1, part2, answer) = if lexeme.is(PartOfSpeech::Noun)
            && cases.intersects(CaseSet::ACCUSATIVE | CaseSet::PREPOSITIONAL)
        {
            let case = cases.preferred_case();
            let template = *templates_for(case).choose(&mut self.rng)?;
            rules = scope.rule_ids_for(case);
            (
                template.part1.to_string(),
                template.render_hint(&lexeme.gloss),
                decline(&lexeme.word, case, lexeme.gender),
            )
        } else if lexeme.is(PartOfSpeech::Noun) {
            let opener = *NOUN_OPENERS.choose(&mut self.rng)?;
            let noun = gloss::clean(&lexeme.gloss);
            (
                opener.to_string(),
                format!("(This is {} {})", gloss::indefinite_article(&noun), noun),
                lexeme.word.clone(),
            )
        } else if lexeme.is(PartOfSpeech::Verb) {
            let opener = *VERB_OPENERS.choose(&mut self.rng)?;
            (
                opener.to_string(),
                format!("(means \"to {}\")", gloss::verb_phrase(&lexeme.gloss)),
                lexeme.word.clone(),
            )
        } else {
            (String::new(), format!("means \"{}\"", lexeme.gloss), lexeme.word.clone())
        };

        let kind = ExerciseKind::FillInBlank {
            sentence_part1: part1,
            sentence_part2: part2,
            correct_answer: answer,
        };
        Some(Exercise::new(id, kind).with_lexemes([lexeme.id]).with_rules(rules))
    }

    /// Up to `count` distinct graded sentences built from compatible pairs among
    /// `lexemes`. Results are memoized per lexeme set and difficulty.
    pub async fn sample_sentences(
        &mut self,
        lexemes: &[&Lexeme],
        count: usize,
        difficulty: Difficulty,
        active_packs: &[PackId],
    ) -> Vec<String> {
        let key = CacheKey::new(lexemes.iter().map(|l| l.id), difficulty).with_packs(active_packs.iter().copied());
        if let Some(hit) = self.cache.get(&key, count) {
            debug!("sentence cache hit for {:?}", key);
            return hit.to_vec();
        }

        let verbs: Vec<&Lexeme> = lexemes.iter().copied().filter(|l| l.is(PartOfSpeech::Verb)).collect();
        let nouns: Vec<&Lexeme> = lexemes.iter().copied().filter(|l| l.is(PartOfSpeech::Noun)).collect();
        let store = self.store;
        let context = ThemeContext::for_curriculum(self.curriculum, active_packs);
        let resolver = Resolver::new(&context, store);

        let mut sentences: Vec<String> = Vec::new();
        let mut attempts = 0;
        while sentences.len() < count && attempts < count * 3 {
            attempts += 1;
            let Some((verb, noun)) = self.pick_pair(&resolver, &verbs, &nouns).await else {
                break;
            };
            let places: Vec<&Lexeme> = nouns.iter().copied().filter(|n| n.id != noun.id).collect();
            let place = places.choose(&mut self.rng).copied();
            if let Some(sentence) = graded_sentence(verb, noun, place, difficulty, &mut self.rng) {
                if !sentences.contains(&sentence) {
                    sentences.push(sentence);
                }
            }
        }

        self.cache.insert(key, count, sentences.clone());
        sentences
    }

    /// Other verbs from `verbs` that combine with `noun`.
    pub async fn alternative_verbs<'l>(
        &self,
        original: &Lexeme,
        noun: &Lexeme,
        verbs: &[&'l Lexeme],
        active_packs: &[PackId],
    ) -> Vec<&'l Lexeme> {
        let context = ThemeContext::for_curriculum(self.curriculum, active_packs);
        let resolver = Resolver::new(&context, self.store);
        let others: Vec<&Lexeme> = verbs.iter().copied().filter(|v| v.id != original.id).collect();
        resolver.compatible_verbs(noun, &others).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::HashSet;
    use znayu_protocol::{ChapterId, Gender, LexemeId};
    use znayu_solver::InMemoryPatternStore;

    fn lexeme(id: u32, word: &str, gloss: &str, pos: PartOfSpeech, theme: Option<&str>) -> Lexeme {
        Lexeme {
            id: LexemeId(id),
            word: word.into(),
            gloss: gloss.into(),
            pos,
            gender: None,
            theme: theme.map(Into::into),
            compatible_themes: vec![],
            compatible_noun_ids: vec![],
            compatible_verb_ids: vec![],
            audio: None,
        }
    }

    fn noun(id: u32, word: &str, gloss: &str, gender: Gender, theme: &str) -> Lexeme {
        Lexeme {
            gender: Some(gender),
            ..lexeme(id, word, gloss, PartOfSpeech::Noun, Some(theme))
        }
    }

    fn rule(id: u32, name: &str) -> GrammarRule {
        GrammarRule {
            id: RuleId(id),
            name: name.into(),
            summary: String::new(),
            explanation: String::new(),
            unlocks_in: 1,
            examples: vec![],
        }
    }

    /// One chapter with one grammar section over the given lexemes and rules.
    fn single_section(lexemes: Vec<Lexeme>, rules: Vec<GrammarRule>) -> Curriculum {
        let section = Section {
            id: SectionId(11),
            name: "Drill".into(),
            kind: SectionType::Grammar,
            lexeme_ids: lexemes.iter().map(|l| l.id).collect(),
            rule_ids: rules.iter().map(|r| r.id).collect(),
            letters: vec![],
            order: 1,
        };
        let chapter = Chapter {
            id: ChapterId(1),
            number: 1,
            title: "Drill".into(),
            title_native: None,
            lexeme_ids: vec![],
            rule_ids: vec![],
            sections: vec![section],
        };
        Curriculum {
            version: 1,
            lexemes,
            grammar_rules: rules,
            chapters: vec![chapter],
            ..Default::default()
        }
    }

    fn read_and_book() -> Vec<Lexeme> {
        let mut read = lexeme(18, "читать", "to read", PartOfSpeech::Verb, Some("hobbies"));
        read.compatible_themes = vec!["readable".into()];
        vec![read, noun(19, "книга", "book", Gender::Feminine, "readable")]
    }

    fn answers(batch: &[Exercise]) -> Vec<&str> {
        batch
            .iter()
            .filter(|e| e.exercise_type() == ExerciseType::FillInBlank)
            .filter_map(|e| e.correct_answer())
            .collect()
    }

    #[test]
    fn test_batch_sizes_and_validity_across_bundled_scopes() {
        let curriculum = Curriculum::bundled().unwrap();
        let store = InMemoryPatternStore::new();
        let selectors = [
            ScopeSelector::Chapter(1),
            ScopeSelector::Chapter(2),
            ScopeSelector::Chapter(3),
            ScopeSelector::Chapter(18),
            ScopeSelector::Section(SectionId(101)),
            ScopeSelector::Section(SectionId(103)),
            ScopeSelector::Section(SectionId(303)),
            ScopeSelector::Section(SectionId(1802)),
            ScopeSelector::Section(SectionId(1803)),
            ScopeSelector::Section(SectionId(1804)),
            ScopeSelector::Learned(18),
        ];
        for seed in 0..8 {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            let mut generator = ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), rng);
            for selector in selectors {
                for (mode, range) in [(Mode::Quick, 5..=7), (Mode::Deep, 10..=12)] {
                    let batch = block_on(generator.generate(selector, mode, &[PackId(1), PackId(2)]));
                    assert!(range.contains(&batch.len()), "{:?} {:?}: {}", selector, mode, batch.len());
                    for exercise in &batch {
                        assert!(exercise.is_well_formed(), "{:?}", exercise);
                    }
                    let ids: HashSet<_> = batch.iter().map(|e| e.id).collect();
                    assert_eq!(ids.len(), batch.len());
                }
            }
        }
    }

    #[test]
    fn test_chapter_one_quick_batch() {
        let curriculum = Curriculum::bundled().unwrap();
        let store = InMemoryPatternStore::new();
        let mut generator =
            ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(42));
        let batch = block_on(generator.generate(ScopeSelector::Chapter(1), Mode::Quick, &[]));
        assert!((5..=7).contains(&batch.len()));
        assert!(batch.iter().all(|e| e.chapter_id == Some(ChapterId(1)) && e.section_id.is_none()));
    }

    #[test]
    fn test_possession_scope_drills_genitive_of_city() {
        let curriculum = single_section(
            vec![noun(1800, "город", "city", Gender::Masculine, "location")],
            vec![rule(18, "Genitive Case: Possession")],
        );
        let store = InMemoryPatternStore::new();
        for seed in 0..10 {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            let mut generator = ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), rng);
            let batch = block_on(generator.generate(ScopeSelector::Section(SectionId(11)), Mode::Quick, &[]));
            assert!(!batch.is_empty());
            for exercise in &batch {
                let ExerciseKind::FillInBlank { sentence_part1, correct_answer, .. } = &exercise.kind else {
                    continue;
                };
                assert_eq!(exercise.grammar_rule_ids, vec![RuleId(18)]);
                let plural = ["У меня пять", "В Москве много"].contains(&sentence_part1.as_str());
                let expected = if plural { "городов" } else { "города" };
                assert_eq!(correct_answer, expected, "{}", sentence_part1);
            }
        }
    }

    #[test]
    fn test_possession_share_is_independent_of_genitive_rule() {
        for rule_name in ["Genitive Case: Possession", "Genitive Case: Absence/Negation", "Genitive Case"] {
            let curriculum = single_section(
                vec![noun(1800, "город", "city", Gender::Masculine, "location")],
                vec![rule(18, rule_name)],
            );
            let store = InMemoryPatternStore::new();
            let (mut possession, mut total) = (0, 0);
            for seed in 0..40 {
                let rng = ChaCha8Rng::seed_from_u64(seed);
                let mut generator = ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), rng);
                let batch = block_on(generator.generate(ScopeSelector::Section(SectionId(11)), Mode::Deep, &[]));
                for exercise in &batch {
                    if let ExerciseKind::FillInBlank { sentence_part1, .. } = &exercise.kind {
                        total += 1;
                        if sentence_part1 == "Это машина" {
                            possession += 1;
                        }
                    }
                }
            }
            let share = possession as f64 / total as f64;
            assert!(total >= 200, "{}: {}", rule_name, total);
            assert!((0.2..0.4).contains(&share), "{}: {}/{}", rule_name, possession, total);
        }
    }

    #[test]
    fn test_book_is_inflected_for_the_case_in_scope() {
        for (rule_name, expected) in [
            ("Accusative Case: Feminine Direct Object", "книгу"),
            ("Genitive Case: Absence/Negation", "книги"),
            ("Prepositional Case: Location", "книге"),
        ] {
            let plural_genitive = genitive_plural("книга", Some(Gender::Feminine));
            let curriculum = single_section(read_and_book(), vec![rule(1, rule_name)]);
            let store = InMemoryPatternStore::new();
            let rng = ChaCha8Rng::seed_from_u64(9);
            let mut generator = ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), rng);
            let batch = block_on(generator.generate(ScopeSelector::Section(SectionId(11)), Mode::Deep, &[]));
            let found = answers(&batch);
            assert!(!found.is_empty(), "{}", rule_name);
            assert!(found.contains(&expected), "{}: {:?}", rule_name, found);
            assert!(
                found.iter().all(|a| *a == expected || (expected == "книги" && *a == plural_genitive.as_str())),
                "{}: {:?}",
                rule_name,
                found
            );
        }
    }

    #[test]
    fn test_compatible_pair_is_recorded() {
        let curriculum = single_section(read_and_book(), vec![rule(1, "Accusative Case")]);
        let store = InMemoryPatternStore::new();
        let mut generator =
            ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(1));
        block_on(generator.generate(ScopeSelector::Section(SectionId(11)), Mode::Quick, &[]));
        assert_eq!(block_on(store.get(LexemeId(18), LexemeId(19))).unwrap(), Some(true));
    }

    #[test]
    fn test_genitive_scope_never_emits_multiple_choice() {
        let curriculum = Curriculum::bundled().unwrap();
        let store = InMemoryPatternStore::new();
        for seed in 0..10 {
            let rng = ChaCha8Rng::seed_from_u64(seed);
            let mut generator = ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), rng);
            let batch = block_on(generator.generate(ScopeSelector::Section(SectionId(1803)), Mode::Deep, &[]));
            assert!(batch.iter().all(|e| e.exercise_type() != ExerciseType::MultipleChoice));
        }
    }

    #[test]
    fn test_soft_failures() {
        let curriculum = Curriculum::bundled().unwrap();
        let store = InMemoryPatternStore::new();
        let mut generator =
            ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(0));

        let letters = ScopeSelector::Section(SectionId(1001));
        assert_eq!(
            block_on(generator.try_generate(letters, Mode::Quick, &[])),
            Err(GenerationError::LetterLearning(SectionId(1001)))
        );
        assert!(block_on(generator.generate(letters, Mode::Quick, &[])).is_empty());
        assert_eq!(
            block_on(generator.try_generate(ScopeSelector::Chapter(99), Mode::Quick, &[])),
            Err(GenerationError::UnknownChapter(99))
        );
        assert!(block_on(generator.generate(ScopeSelector::Section(SectionId(4242)), Mode::Deep, &[])).is_empty());

        let empty = single_section(vec![], vec![]);
        let mut generator =
            ExerciseGenerator::with_rng(&empty, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(0));
        assert_eq!(
            block_on(generator.try_generate(ScopeSelector::Chapter(1), Mode::Quick, &[])),
            Err(GenerationError::EmptyScope)
        );
    }

    #[test]
    fn test_policy_table() {
        assert!(exercise_sequence(Some(SectionType::LetterLearning), false).is_empty());
        let grammar = exercise_sequence(Some(SectionType::Grammar), true);
        assert_eq!(grammar.iter().filter(|t| **t == ExerciseType::FillInBlank).count(), 3);
        assert!(exercise_sequence(Some(SectionType::Vocabulary), false)
            .iter()
            .all(|t| matches!(t, ExerciseType::Matching | ExerciseType::MultipleChoice)));
        assert_eq!(exercise_sequence(None, false).len(), 4);
    }

    #[test]
    fn test_sentence_sampling_is_memoized() {
        let curriculum = single_section(read_and_book(), vec![]);
        let store = InMemoryPatternStore::new();
        let mut generator =
            ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(5));
        let lexemes: Vec<&Lexeme> = curriculum.lexemes.iter().collect();

        let first = block_on(generator.sample_sentences(&lexemes, 3, Difficulty::Easy, &[]));
        assert_eq!(first, vec!["Я читаю книгу".to_string()]);
        let again = block_on(generator.sample_sentences(&lexemes, 3, Difficulty::Easy, &[]));
        assert_eq!(first, again);
        assert_eq!(generator.cache().len(), 1);
        assert_eq!(block_on(generator.sample_sentences(&lexemes, 1, Difficulty::Easy, &[])), first);

        // A larger request or other packs sample afresh and replace or add entries.
        block_on(generator.sample_sentences(&lexemes, 5, Difficulty::Easy, &[]));
        assert_eq!(generator.cache().len(), 1);
        block_on(generator.sample_sentences(&lexemes, 3, Difficulty::Easy, &[PackId(1)]));
        assert_eq!(generator.cache().len(), 2);

        // Hard sentences need a second noun for the location.
        assert!(block_on(generator.sample_sentences(&lexemes, 3, Difficulty::Hard, &[])).is_empty());
        assert_eq!(generator.cache().len(), 3);
        generator.cache_mut().invalidate(LexemeId(19));
        assert!(generator.cache().is_empty());
    }

    #[test]
    fn test_alternative_verbs_exclude_the_original() {
        let mut lexemes = read_and_book();
        let mut watch = lexeme(20, "смотреть", "to watch", PartOfSpeech::Verb, Some("hobbies"));
        watch.compatible_themes = vec!["readable".into()];
        let live = lexeme(8, "жить", "to live", PartOfSpeech::Verb, Some("location"));
        lexemes.extend([watch, live]);
        let curriculum = single_section(lexemes, vec![]);
        let store = InMemoryPatternStore::new();
        let generator =
            ExerciseGenerator::with_rng(&curriculum, &store, GeneratorConfig::default(), ChaCha8Rng::seed_from_u64(5));

        let book = &curriculum.lexemes[1];
        let verbs: Vec<&Lexeme> = curriculum.lexemes.iter().filter(|l| l.is(PartOfSpeech::Verb)).collect();
        let alternatives = block_on(generator.alternative_verbs(&curriculum.lexemes[0], book, &verbs, &[]));
        let ids: Vec<LexemeId> = alternatives.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![LexemeId(20)]);
    }
}
