use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use znayu_morph::{conjugate, decline, decline_adjective, infer_gender};
use znayu_protocol::{Case, CaseSet, GrammarRule, Lexeme, Pronoun};

use crate::gloss;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceOptions {
    /// Overrides the case inferred from the rules in scope.
    pub case: Option<Case>,
    pub pronoun: Pronoun,
    pub include_adjective: bool,
    /// "the" instead of "a" in the hint.
    pub alternate_phrasing: bool,
}

impl Default for SentenceOptions {
    fn default() -> Self {
        Self {
            case: None,
            pronoun: Pronoun::Ya,
            include_adjective: false,
            alternate_phrasing: false,
        }
    }
}

/// A subject-verb-object sentence split at the point the learner fills in.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence<'l> {
    /// Subject and conjugated verb, plus `в` for the prepositional.
    pub lead: String,
    /// Optional adjective and the noun, both inflected.
    pub answer: String,
    pub hint: String,
    pub case: Case,
    pub adjective: Option<&'l Lexeme>,
}

impl Sentence<'_> {
    pub fn target(&self) -> String {
        format!("{} {}", self.lead, self.answer)
    }
}

pub fn rule_cases(rules: &[&GrammarRule]) -> CaseSet {
    rules.iter().fold(CaseSet::empty(), |acc, r| acc | r.cases())
}

/// Prepositional only when a prepositional rule is in scope and no accusative one is.
pub fn infer_case(rules: &[&GrammarRule]) -> Case {
    let cases = rule_cases(rules);
    if cases.contains(CaseSet::PREPOSITIONAL) && !cases.contains(CaseSet::ACCUSATIVE) {
        Case::Prepositional
    } else {
        Case::Accusative
    }
}

pub fn build_sentence<'l, R: Rng + ?Sized>(
    verb: &Lexeme,
    noun: &Lexeme,
    adjectives: &[&'l Lexeme],
    rules: &[&GrammarRule],
    options: &SentenceOptions,
    rng: &mut R,
) -> Sentence<'l> {
    let case = options.case.unwrap_or_else(|| infer_case(rules));
    let adjective = if options.include_adjective {
        adjectives.choose(rng).copied()
    } else {
        None
    };

    let noun_form = decline(&noun.word, case, noun.gender);
    let answer = match adjective {
        Some(adj) => {
            let gender = noun.gender.unwrap_or_else(|| infer_gender(&noun.word));
            format!("{} {}", decline_adjective(&adj.word, case, gender), noun_form)
        }
        None => noun_form,
    };

    let subject = gloss::capitalize(options.pronoun.word());
    let verb_form = conjugate(&verb.word, options.pronoun);
    let lead = match case {
        Case::Prepositional => format!("{} {} в", subject, verb_form),
        _ => format!("{} {}", subject, verb_form),
    };

    let described = match adjective {
        Some(adj) => format!("{} {}", gloss::clean(&adj.gloss), gloss::clean(&noun.gloss)),
        None => gloss::clean(&noun.gloss),
    };
    let object = match (case, options.alternate_phrasing) {
        (Case::Prepositional, false) => format!("in {}", described),
        (Case::Prepositional, true) => format!("in the {}", described),
        (_, true) => format!("the {}", described),
        (_, false) => format!("{} {}", gloss::indefinite_article(&described), described),
    };
    let hint = format!(
        "({} {} {})",
        options.pronoun.gloss(),
        gloss::agree(&gloss::verb_phrase(&verb.gloss), options.pronoun),
        object
    );

    Sentence { lead, answer, hint, case, adjective }
}

const VARIATION_PRONOUNS: [Pronoun; 5] = [Pronoun::Ya, Pronoun::Ty, Pronoun::On, Pronoun::Ona, Pronoun::My];

/// `count` renderings of one pair: the subject cycles through five pronouns,
/// the case alternates accusative/prepositional, every other sentence takes an
/// adjective and every third uses the alternate phrasing.
pub fn variations<'l, R: Rng + ?Sized>(
    verb: &Lexeme,
    noun: &Lexeme,
    adjectives: &[&'l Lexeme],
    rules: &[&GrammarRule],
    count: usize,
    rng: &mut R,
) -> Vec<Sentence<'l>> {
    (0..count)
        .map(|i| {
            let options = SentenceOptions {
                case: Some(if i % 2 == 0 { Case::Accusative } else { Case::Prepositional }),
                pronoun: VARIATION_PRONOUNS[i % VARIATION_PRONOUNS.len()],
                include_adjective: i % 2 == 0 && !adjectives.is_empty(),
                alternate_phrasing: i % 3 == 0,
            };
            build_sentence(verb, noun, adjectives, rules, &options, rng)
        })
        .collect()
}

/// Graded practice sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    /// `Я <verb> <noun>`.
    Easy,
    /// A random subject pronoun.
    Medium,
    /// Adds a prepositional location: `<Pron> <verb> <noun> в <place>`.
    Hard,
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{}'", other)),
        }
    }
}

const MEDIUM_PRONOUNS: [Pronoun; 5] = VARIATION_PRONOUNS;

/// One sentence at `difficulty`. Hard sentences need a second noun.
pub fn graded_sentence<R: Rng + ?Sized>(
    verb: &Lexeme,
    noun: &Lexeme,
    place: Option<&Lexeme>,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<String> {
    let pronoun = match difficulty {
        Difficulty::Easy => Pronoun::Ya,
        Difficulty::Medium | Difficulty::Hard => *MEDIUM_PRONOUNS.choose(rng)?,
    };
    let core = format!(
        "{} {} {}",
        gloss::capitalize(pronoun.word()),
        conjugate(&verb.word, pronoun),
        decline(&noun.word, Case::Accusative, noun.gender)
    );
    match difficulty {
        Difficulty::Hard => {
            let place = place?;
            Some(format!("{} в {}", core, decline(&place.word, Case::Prepositional, place.gender)))
        }
        _ => Some(core),
    }
}
