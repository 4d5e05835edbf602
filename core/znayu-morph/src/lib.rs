#![no_std]

#[macro_use]
extern crate alloc;

#[cfg(test)]
extern crate std;

use alloc::string::{String, ToString};

use znayu_protocol::{Case, Gender, Pronoun, WordForm};

mod tables;

use tables::{noun_endings, Stem, FIRST_CONJUGATION, GENITIVE_PLURAL_EXCEPTIONS, SECOND_CONJUGATION};

const VELARS: &str = "гкх";
const HUSHERS: &str = "жшчщ";

/// Inflects `word` into `form`. Total: unknown patterns come back unmodified.
pub fn inflect(word: &str, form: WordForm, gender: Option<Gender>) -> String {
    match form {
        WordForm::Case(case) => decline(word, case, gender),
        WordForm::GenitivePlural => genitive_plural(word, gender),
        WordForm::Present(pronoun) => conjugate(word, pronoun),
    }
}

/// Gender guessed from the final letter: `а`/`я` feminine, `о`/`е` neuter, otherwise masculine.
pub fn infer_gender(word: &str) -> Gender {
    match last_char(word.trim()) {
        Some('а' | 'я') => Gender::Feminine,
        Some('о' | 'е') => Gender::Neuter,
        _ => Gender::Masculine,
    }
}

/// Singular noun declension.
pub fn decline(word: &str, case: Case, gender: Option<Gender>) -> String {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return word.to_string();
    }
    let gender = gender.unwrap_or_else(|| infer_gender(trimmed));
    apply_suffix_table(trimmed, noun_endings(gender, case))
        .filter(|form| !form.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Genitive plural, as required after `пять`, `много`, `несколько`.
pub fn genitive_plural(word: &str, gender: Option<Gender>) -> String {
    let trimmed = word.trim();
    if trimmed.is_empty() {
        return word.to_string();
    }
    let lower = trimmed.to_lowercase();
    if let Some((_, form)) = GENITIVE_PLURAL_EXCEPTIONS.iter().find(|(base, _)| *base == lower) {
        return form.to_string();
    }

    let form = match gender.unwrap_or_else(|| infer_gender(trimmed)) {
        Gender::Masculine => apply_suffix_table(trimmed, &[("й", "ев"), ("ь", "ей")]).or_else(|| {
            match last_char(trimmed) {
                Some(c) if HUSHERS.contains(c) => Some(format!("{}ей", trimmed)),
                _ => Some(format!("{}ов", trimmed)),
            }
        }),
        Gender::Feminine => match strip_suffix_ci(trimmed, "а") {
            // Velar stems take -ов here, a known simplification.
            Some(stem) if last_char(stem).is_some_and(|c| VELARS.contains(c)) => Some(format!("{}ов", stem)),
            Some(stem) => Some(stem.to_string()),
            None => apply_suffix_table(trimmed, &[("я", "й"), ("ь", "ей")]),
        },
        Gender::Neuter => apply_suffix_table(trimmed, &[("о", ""), ("е", "ей")]),
    };
    form.filter(|f| !f.is_empty())
        .unwrap_or_else(|| trimmed.to_string())
}

/// Present-tense form for `pronoun`: `-ить` verbs take the second conjugation,
/// everything else the first.
pub fn conjugate(infinitive: &str, pronoun: Pronoun) -> String {
    let verb = infinitive.trim();
    if verb.is_empty() {
        return infinitive.to_string();
    }
    let slot = person_slot(pronoun);
    if let Some(stem) = strip_suffix_ci(verb, "ить") {
        return format!("{}{}", stem, SECOND_CONJUGATION[slot]);
    }
    let stem = ["ть", "ти", "чь"]
        .iter()
        .find_map(|ending| strip_suffix_ci(verb, ending))
        .unwrap_or(verb);
    format!("{}{}", stem, FIRST_CONJUGATION[slot])
}

/// Agrees an adjective given in its masculine nominative form (`-ый`, `-ий`, `-ой`).
pub fn decline_adjective(adjective: &str, case: Case, gender: Gender) -> String {
    let trimmed = adjective.trim();
    let Some((stem, stem_class)) = adjective_stem(trimmed) else {
        return trimmed.to_string();
    };
    match tables::adjective_ending(stem_class, case, gender) {
        Some(ending) => format!("{}{}", stem, ending),
        None => trimmed.to_string(),
    }
}

fn adjective_stem(adjective: &str) -> Option<(&str, Stem)> {
    if let Some(stem) = strip_suffix_ci(adjective, "ый") {
        return Some((stem, Stem::Hard));
    }
    if let Some(stem) = strip_suffix_ci(adjective, "ой") {
        return match last_char(stem) {
            Some(c) if VELARS.contains(c) || HUSHERS.contains(c) => Some((stem, Stem::Velar)),
            Some(_) => Some((stem, Stem::Hard)),
            None => None,
        };
    }
    let stem = strip_suffix_ci(adjective, "ий")?;
    let class = match last_char(stem)? {
        c if VELARS.contains(c) => Stem::Velar,
        c if HUSHERS.contains(c) => Stem::Hushing,
        _ => Stem::Soft,
    };
    Some((stem, class))
}

fn person_slot(pronoun: Pronoun) -> usize {
    match pronoun {
        Pronoun::Ya => 0,
        Pronoun::Ty => 1,
        Pronoun::On | Pronoun::Ona | Pronoun::Ono => 2,
        Pronoun::My => 3,
        Pronoun::Vy => 4,
        Pronoun::Oni => 5,
    }
}

/// Applies the first matching `(suffix, replacement)` pair.
fn apply_suffix_table(word: &str, table: &[(&str, &str)]) -> Option<String> {
    for (suffix, replacement) in table {
        let Some(stem) = strip_suffix_ci(word, suffix) else {
            continue;
        };
        // и for ы after velars and hushers: книга -> книги.
        if let Some(rest) = replacement.strip_prefix('ы') {
            if last_char(stem).is_some_and(|c| VELARS.contains(c) || HUSHERS.contains(c)) {
                return Some(format!("{}и{}", stem, rest));
            }
        }
        return Some(format!("{}{}", stem, replacement));
    }
    None
}

fn strip_suffix_ci<'a>(word: &'a str, suffix: &str) -> Option<&'a str> {
    let count = suffix.chars().count();
    if count == 0 {
        return Some(word);
    }
    let (idx, _) = word.char_indices().rev().nth(count - 1)?;
    let tail = &word[idx..];
    tail.chars()
        .flat_map(char::to_lowercase)
        .eq(suffix.chars())
        .then(|| &word[..idx])
}

fn last_char(word: &str) -> Option<char> {
    word.chars().next_back().and_then(|c| c.to_lowercase().next())
}
