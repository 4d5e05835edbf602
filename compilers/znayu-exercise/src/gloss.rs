//! Turning dictionary glosses ("to love/like", "student (m.)") into hint English.

use znayu_protocol::Pronoun;

/// First alternative of a gloss with parentheticals removed: `"house/home"` -> `"house"`.
pub fn clean(gloss: &str) -> String {
    let mut out = String::with_capacity(gloss.len());
    let mut depth = 0usize;
    for c in gloss.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    let first = out.split('/').next().unwrap_or_default();
    first.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Verb gloss without the infinitive marker: `"to go (on foot)"` -> `"go"`.
pub fn verb_phrase(gloss: &str) -> String {
    let cleaned = clean(gloss);
    match cleaned.strip_prefix("to ") {
        Some(rest) => rest.trim().to_string(),
        None => cleaned,
    }
}

/// Present simple agreement for the first word of `phrase`.
pub fn agree(phrase: &str, pronoun: Pronoun) -> String {
    let (head, tail) = match phrase.split_once(' ') {
        Some((head, tail)) => (head, Some(tail)),
        None => (phrase, None),
    };
    let third_singular = matches!(pronoun, Pronoun::On | Pronoun::Ona | Pronoun::Ono);
    let head = match head {
        "be" => match pronoun {
            Pronoun::Ya => "am".to_string(),
            _ if third_singular => "is".to_string(),
            _ => "are".to_string(),
        },
        "have" if third_singular => "has".to_string(),
        _ if third_singular => third_person(head),
        _ => head.to_string(),
    };
    match tail {
        Some(tail) => format!("{} {}", head, tail),
        None => head,
    }
}

fn third_person(verb: &str) -> String {
    if ["s", "sh", "ch", "x", "z", "o"].iter().any(|end| verb.ends_with(end)) {
        return format!("{}es", verb);
    }
    if let Some(stem) = verb.strip_suffix('y') {
        if !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    format!("{}s", verb)
}

pub fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}

/// Naive English plural of the last word.
pub fn plural(noun: &str) -> String {
    if noun.is_empty() {
        return String::new();
    }
    if let Some(stem) = noun.strip_suffix('y') {
        if !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{}ies", stem);
        }
    }
    if ["s", "sh", "ch", "x", "z"].iter().any(|end| noun.ends_with(end)) {
        return format!("{}es", noun);
    }
    format!("{}s", noun)
}

/// Uppercases the first character (`я` -> `Я`).
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_glosses() {
        assert_eq!(clean("house/home"), "house");
        assert_eq!(clean("student (m.)"), "student");
        assert_eq!(clean("avenue/prospect"), "avenue");
        assert_eq!(verb_phrase("to go (on foot)"), "go");
        assert_eq!(verb_phrase("to visit/be (frequentative)"), "visit");
        assert_eq!(verb_phrase("to be called"), "be called");
    }

    #[test]
    fn test_agreement() {
        assert_eq!(agree("read", Pronoun::Ya), "read");
        assert_eq!(agree("read", Pronoun::On), "reads");
        assert_eq!(agree("watch", Pronoun::Ona), "watches");
        assert_eq!(agree("go", Pronoun::On), "goes");
        assert_eq!(agree("study", Pronoun::On), "studies");
        assert_eq!(agree("be called", Pronoun::Ya), "am called");
        assert_eq!(agree("be located", Pronoun::Ono), "is located");
        assert_eq!(agree("be located", Pronoun::My), "are located");
    }

    #[test]
    fn test_articles_and_plurals() {
        assert_eq!(indefinite_article("apple"), "an");
        assert_eq!(indefinite_article("book"), "a");
        assert_eq!(plural("city"), "cities");
        assert_eq!(plural("museum"), "museums");
        assert_eq!(plural("church"), "churches");
        assert_eq!(capitalize("я"), "Я");
        assert_eq!(capitalize(""), "");
    }
}
