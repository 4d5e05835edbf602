use znayu_protocol::Case;

use crate::gloss;

/// A fixed cloze frame. The learner completes `part1` with the noun in `case`;
/// `hint` is English with `___` standing for the noun.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceTemplate {
    pub part1: &'static str,
    pub hint: &'static str,
    pub case: Case,
    /// The answer is a genitive plural.
    pub plural: bool,
    /// `Это машина ___`, drawn with its own chance.
    pub possession: bool,
}

impl SentenceTemplate {
    const fn new(part1: &'static str, hint: &'static str, case: Case) -> Self {
        Self { part1, hint, case, plural: false, possession: false }
    }

    const fn genitive(part1: &'static str, hint: &'static str) -> Self {
        Self::new(part1, hint, Case::Genitive)
    }

    const fn genitive_plural(part1: &'static str, hint: &'static str) -> Self {
        Self { plural: true, ..Self::genitive(part1, hint) }
    }

    const fn possession(part1: &'static str, hint: &'static str) -> Self {
        Self { possession: true, ..Self::genitive(part1, hint) }
    }

    /// Fills the hint with a cleaned noun gloss, pluralized for plural frames.
    /// `a ___` becomes `an ___` before a vowel.
    pub fn render_hint(&self, noun_gloss: &str) -> String {
        let noun = gloss::clean(noun_gloss);
        let noun = if self.plural || self.hint.contains("___s") {
            gloss::plural(&noun)
        } else {
            noun
        };
        let article = gloss::indefinite_article(&noun);
        self.hint
            .replace("a ___s", &noun)
            .replace("___s", &noun)
            .replace("a ___", &format!("{} {}", article, noun))
            .replace("___", &noun)
    }
}

pub static GENITIVE_TEMPLATES: [SentenceTemplate; 10] = [
    SentenceTemplate::genitive("У меня нет", "(I don't have a ___)"),
    SentenceTemplate::genitive("В городе нет", "(There is no ___ in the city)"),
    SentenceTemplate::genitive("У меня два", "(I have two ___s)"),
    SentenceTemplate::genitive("У меня три", "(I have three ___s)"),
    SentenceTemplate::genitive("У меня четыре", "(I have four ___s)"),
    SentenceTemplate::genitive_plural("У меня пять", "(I have five ___)"),
    SentenceTemplate::genitive_plural("В Москве много", "(There are many ___ in Moscow)"),
    SentenceTemplate::genitive("Недалеко от", "(Not far from the ___)"),
    SentenceTemplate::genitive("Около", "(Near the ___)"),
    SentenceTemplate::possession("Это машина", "(This is the ___'s car)"),
];

pub static ACCUSATIVE_TEMPLATES: [SentenceTemplate; 4] = [
    SentenceTemplate::new("Я читаю", "(I read a ___)", Case::Accusative),
    SentenceTemplate::new("Я смотрю", "(I watch a ___)", Case::Accusative),
    SentenceTemplate::new("Я люблю", "(I love the ___)", Case::Accusative),
    SentenceTemplate::new("Он слушает", "(He listens to the ___)", Case::Accusative),
];

pub static PREPOSITIONAL_TEMPLATES: [SentenceTemplate; 3] = [
    SentenceTemplate::new("Я живу в", "(I live in the ___)", Case::Prepositional),
    SentenceTemplate::new("Мы в", "(We are in the ___)", Case::Prepositional),
    SentenceTemplate::new("Он работает в", "(He works in the ___)", Case::Prepositional),
];

/// Openers for a bare infinitive cloze.
pub static VERB_OPENERS: [&str; 3] = ["Я хочу", "Мы любим", "Они могут"];

/// Openers for a bare noun cloze.
pub static NOUN_OPENERS: [&str; 2] = ["Это", "Вот"];

/// Every frame that drills `case`. Cases without frames fall back to the accusative set.
pub fn templates_for(case: Case) -> &'static [SentenceTemplate] {
    match case {
        Case::Genitive => &GENITIVE_TEMPLATES,
        Case::Prepositional => &PREPOSITIONAL_TEMPLATES,
        _ => &ACCUSATIVE_TEMPLATES,
    }
}

/// The possession frame and the remaining genitive frames.
pub fn split_genitive() -> (&'static SentenceTemplate, Vec<&'static SentenceTemplate>) {
    let others = GENITIVE_TEMPLATES.iter().filter(|t| !t.possession).collect();
    let possession = GENITIVE_TEMPLATES.iter().find(|t| t.possession).unwrap_or(&GENITIVE_TEMPLATES[9]);
    (possession, others)
}
