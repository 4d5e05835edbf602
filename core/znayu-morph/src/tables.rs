use znayu_protocol::{Case, Gender};

pub(crate) const GENITIVE_PLURAL_EXCEPTIONS: [(&str, &str); 13] = [
    ("человек", "человек"),
    ("друг", "друзей"),
    ("брат", "братьев"),
    ("сын", "сыновей"),
    ("студент", "студентов"),
    ("учитель", "учителей"),
    ("музей", "музеев"),
    ("театр", "театров"),
    ("магазин", "магазинов"),
    ("банк", "банков"),
    ("парк", "парков"),
    ("город", "городов"),
    ("центр", "центров"),
];

// я, ты, он/она/оно, мы, вы, они
pub(crate) const FIRST_CONJUGATION: [&str; 6] = ["ю", "ешь", "ет", "ем", "ете", "ют"];
pub(crate) const SECOND_CONJUGATION: [&str; 6] = ["ю", "ишь", "ит", "им", "ите", "ят"];

/// Ordered `(suffix, replacement)` pairs for one singular case. The empty suffix
/// appends to whatever is left.
pub(crate) fn noun_endings(gender: Gender, case: Case) -> &'static [(&'static str, &'static str)] {
    match (gender, case) {
        (_, Case::Nominative) => &[],
        (Gender::Feminine, Case::Accusative) => &[("а", "у"), ("я", "ю")],
        (Gender::Feminine, Case::Genitive) => &[("а", "ы"), ("я", "и"), ("ь", "и")],
        (Gender::Feminine, Case::Dative) => &[("а", "е"), ("я", "е"), ("ь", "и")],
        (Gender::Feminine, Case::Instrumental) => &[("а", "ой"), ("я", "ей"), ("ь", "ью")],
        (Gender::Feminine, Case::Prepositional) => &[("ия", "ии"), ("а", "е"), ("я", "е"), ("ь", "и")],
        (Gender::Masculine | Gender::Neuter, Case::Accusative) => &[],
        (Gender::Neuter, Case::Genitive) => &[("о", "а"), ("е", "я")],
        (Gender::Masculine, Case::Genitive) => &[("й", "я"), ("ь", "я"), ("", "а")],
        (_, Case::Dative) => &[("й", "ю"), ("ь", "ю"), ("", "у")],
        (_, Case::Instrumental) => &[("й", "ем"), ("ь", "ем"), ("", "ом")],
        (_, Case::Prepositional) => &[("й", "е"), ("ь", "и"), ("", "е")],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stem {
    /// новый, родной
    Hard,
    /// синий
    Soft,
    /// тихий, исторический, большой
    Velar,
    /// хороший
    Hushing,
}

/// `None` means the form equals the dictionary form (masculine nominative and inanimate accusative).
pub(crate) fn adjective_ending(stem: Stem, case: Case, gender: Gender) -> Option<&'static str> {
    let soft = stem == Stem::Soft;
    let front = matches!(stem, Stem::Soft | Stem::Hushing);
    let i_vowel = stem != Stem::Hard;
    let ending = match (gender, case) {
        (Gender::Masculine, Case::Nominative | Case::Accusative) => return None,
        (Gender::Feminine, Case::Nominative) => if soft { "яя" } else { "ая" },
        (Gender::Feminine, Case::Accusative) => if soft { "юю" } else { "ую" },
        (Gender::Feminine, _) => if front { "ей" } else { "ой" },
        (Gender::Neuter, Case::Nominative | Case::Accusative) => if front { "ее" } else { "ое" },
        (_, Case::Genitive) => if front { "его" } else { "ого" },
        (_, Case::Dative) => if front { "ему" } else { "ому" },
        (_, Case::Instrumental) => if i_vowel { "им" } else { "ым" },
        (_, Case::Prepositional) => if front { "ем" } else { "ом" },
    };
    Some(ending)
}
