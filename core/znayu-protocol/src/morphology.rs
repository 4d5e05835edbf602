use rkyv::{Archive, Deserialize, Serialize};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use bitflags::bitflags;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Case {
    Nominative,
    Genitive,
    Dative,
    Accusative,
    Instrumental,
    Prepositional,
}

impl Case {
    pub const ALL: [Case; 6] = [
        Case::Nominative,
        Case::Genitive,
        Case::Dative,
        Case::Accusative,
        Case::Instrumental,
        Case::Prepositional,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Case::Nominative => "nominative",
            Case::Genitive => "genitive",
            Case::Dative => "dative",
            Case::Accusative => "accusative",
            Case::Instrumental => "instrumental",
            Case::Prepositional => "prepositional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[archive(check_bytes)]
#[repr(u8)]
pub enum Gender {
    Masculine = 0,
    Feminine = 1,
    Neuter = 2,
}

/// Subject pronouns used to pick a present-tense ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pronoun {
    Ya,
    Ty,
    On,
    Ona,
    Ono,
    My,
    Vy,
    Oni,
}

impl Pronoun {
    pub const ALL: [Pronoun; 8] = [
        Pronoun::Ya,
        Pronoun::Ty,
        Pronoun::On,
        Pronoun::Ona,
        Pronoun::Ono,
        Pronoun::My,
        Pronoun::Vy,
        Pronoun::Oni,
    ];

    /// Russian surface form, lowercase.
    pub fn word(self) -> &'static str {
        match self {
            Pronoun::Ya => "я",
            Pronoun::Ty => "ты",
            Pronoun::On => "он",
            Pronoun::Ona => "она",
            Pronoun::Ono => "оно",
            Pronoun::My => "мы",
            Pronoun::Vy => "вы",
            Pronoun::Oni => "они",
        }
    }

    /// English subject used in learner hints.
    pub fn gloss(self) -> &'static str {
        match self {
            Pronoun::Ya => "I",
            Pronoun::Ty | Pronoun::Vy => "You",
            Pronoun::On => "He",
            Pronoun::Ona => "She",
            Pronoun::Ono => "It",
            Pronoun::My => "We",
            Pronoun::Oni => "They",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[archive(check_bytes)]
#[repr(u8)]
pub enum PartOfSpeech {
    Noun = 0,
    Verb = 1,
    Adjective = 2,
    Phrase = 3,
    Adverb = 4,
    Preposition = 5,
    Pronoun = 6,
}

/// Grammatical target of an inflection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordForm {
    Case(Case),
    GenitivePlural,
    Present(Pronoun),
}

impl From<Case> for WordForm {
    fn from(case: Case) -> Self {
        WordForm::Case(case)
    }
}

bitflags! {
    /// Noun cases drilled by a set of grammar rules.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct CaseSet: u8 {
        const GENITIVE = 1;
        const DATIVE = 2;
        const ACCUSATIVE = 4;
        const INSTRUMENTAL = 8;
        const PREPOSITIONAL = 16;
    }
}

impl CaseSet {
    /// Case named in a grammar rule title, matched case-insensitively.
    pub fn from_rule_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        let mut set = CaseSet::empty();
        for (keyword, flag) in [
            ("genitive", CaseSet::GENITIVE),
            ("dative", CaseSet::DATIVE),
            ("accusative", CaseSet::ACCUSATIVE),
            ("instrumental", CaseSet::INSTRUMENTAL),
            ("prepositional", CaseSet::PREPOSITIONAL),
        ] {
            if lower.contains(keyword) {
                set |= flag;
            }
        }
        set
    }

    /// Case a fill-in-blank exercise should drill: genitive, then prepositional, then accusative.
    pub fn preferred_case(self) -> Case {
        if self.contains(CaseSet::GENITIVE) {
            Case::Genitive
        } else if self.contains(CaseSet::PREPOSITIONAL) {
            Case::Prepositional
        } else {
            Case::Accusative
        }
    }
}

impl From<Case> for CaseSet {
    fn from(case: Case) -> Self {
        match case {
            Case::Nominative => CaseSet::empty(),
            Case::Genitive => CaseSet::GENITIVE,
            Case::Dative => CaseSet::DATIVE,
            Case::Accusative => CaseSet::ACCUSATIVE,
            Case::Instrumental => CaseSet::INSTRUMENTAL,
            Case::Prepositional => CaseSet::PREPOSITIONAL,
        }
    }
}
