use rkyv::{Archive, Deserialize, Serialize};
use crate::ids::{ChapterId, LexemeId, PackId, RuleId, SectionId};
use crate::morphology::{CaseSet, Gender, PartOfSpeech};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Lexeme {
    pub id: LexemeId,
    /// Nominative singular for nouns, infinitive for verbs.
    pub word: String,
    pub gloss: String,
    pub pos: PartOfSpeech,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub gender: Option<Gender>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub theme: Option<String>,
    /// Verbs only: noun themes this verb combines with.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub compatible_themes: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub compatible_noun_ids: Vec<LexemeId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub compatible_verb_ids: Vec<LexemeId>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub audio: Option<String>,
}

impl Lexeme {
    pub fn is(&self, pos: PartOfSpeech) -> bool {
        self.pos == pos
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct GrammarRule {
    pub id: RuleId,
    pub name: String,
    pub summary: String,
    pub explanation: String,
    /// Chapter number that unlocks the rule.
    pub unlocks_in: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub examples: Vec<String>,
}

impl GrammarRule {
    pub fn cases(&self) -> CaseSet {
        CaseSet::from_rule_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[archive(check_bytes)]
#[repr(u8)]
pub enum SectionType {
    Grammar = 0,
    Vocabulary = 1,
    Spelling = 2,
    Listening = 3,
    MixedReview = 4,
    LetterLearning = 5,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub kind: SectionType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lexeme_ids: Vec<LexemeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rule_ids: Vec<RuleId>,
    /// LETTER_LEARNING sections only.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub letters: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Chapter {
    pub id: ChapterId,
    pub number: u32,
    pub title: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub title_native: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub lexeme_ids: Vec<LexemeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rule_ids: Vec<RuleId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sections: Vec<Section>,
}

impl Chapter {
    /// Chapter-wide lexeme scope. Falls back to the union of the sections when the chapter lists none.
    pub fn scope_lexeme_ids(&self) -> Vec<LexemeId> {
        if !self.lexeme_ids.is_empty() {
            return self.lexeme_ids.clone();
        }
        union(self.sections.iter().map(|s| s.lexeme_ids.as_slice()))
    }

    pub fn scope_rule_ids(&self) -> Vec<RuleId> {
        if !self.rule_ids.is_empty() {
            return self.rule_ids.clone();
        }
        union(self.sections.iter().map(|s| s.rule_ids.as_slice()))
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

fn union<'a, T: Copy + PartialEq + 'a>(lists: impl Iterator<Item = &'a [T]>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in lists.flatten() {
        if !out.contains(item) {
            out.push(*item);
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct VocabPack {
    pub id: PackId,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub description: Option<String>,
    pub lexeme_ids: Vec<LexemeId>,
    /// Chapter number that must be reached before the pack contributes vocabulary.
    pub prerequisite_chapter: u32,
    /// Theme inherited by member lexemes that carry none of their own.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub theme: Option<String>,
}

/// Two themes declared mutually compatible (e.g. `location` and `building`).
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct ThemeLink {
    pub a: String,
    pub b: String,
}
