use std::collections::BTreeSet;

use rkyv::{Archive, Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{ChapterId, LexemeId, PackId, RuleId, SectionId};
use crate::model::{Chapter, GrammarRule, Lexeme, Section, ThemeLink, VocabPack};

#[cfg(feature = "serde")]
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[cfg(feature = "serde")]
    #[error("malformed curriculum json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt curriculum archive: {0}")]
    Archive(String),
    #[error("lexeme {0} is referenced but not defined")]
    DanglingLexeme(LexemeId),
    #[error("grammar rule {0} is referenced but not defined")]
    DanglingRule(RuleId),
}

/// The complete read-only content set: vocabulary, grammar rules, chapters and packs.
#[derive(Debug, Clone, PartialEq, Default, Archive, Serialize, Deserialize)]
#[cfg_attr(feature = "serde", derive(SerdeDeserialize, SerdeSerialize))]
#[archive(check_bytes)]
pub struct Curriculum {
    pub version: u32,
    pub lexemes: Vec<Lexeme>,
    pub grammar_rules: Vec<GrammarRule>,
    pub chapters: Vec<Chapter>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub packs: Vec<VocabPack>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub theme_links: Vec<ThemeLink>,
}

#[cfg(feature = "serde")]
const BUNDLED: &str = include_str!("../data/curriculum.json");

impl Curriculum {
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, CurriculumError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The curriculum shipped with the crate.
    #[cfg(feature = "serde")]
    pub fn bundled() -> Result<Self, CurriculumError> {
        Self::from_json(BUNDLED)
    }

    /// Loads a curriculum compiled to an rkyv archive. The bytes are validated before use.
    pub fn from_archive(bytes: &[u8]) -> Result<Self, CurriculumError> {
        let mut aligned = rkyv::AlignedVec::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        rkyv::from_bytes::<Curriculum>(&aligned)
            .map_err(|e| CurriculumError::Archive(format!("{:?}", e)))
    }

    pub fn to_archive(&self) -> Result<Vec<u8>, CurriculumError> {
        rkyv::to_bytes::<_, 4096>(self)
            .map(|bytes| bytes.into_vec())
            .map_err(|e| CurriculumError::Archive(format!("{:?}", e)))
    }

    /// Reports the first id referenced by a chapter, section or pack that has no definition.
    pub fn validate(&self) -> Result<(), CurriculumError> {
        let lexemes: BTreeSet<LexemeId> = self.lexemes.iter().map(|l| l.id).collect();
        let rules: BTreeSet<RuleId> = self.grammar_rules.iter().map(|r| r.id).collect();

        let referenced_lexemes = self
            .chapters
            .iter()
            .flat_map(|c| {
                c.lexeme_ids
                    .iter()
                    .chain(c.sections.iter().flat_map(|s| s.lexeme_ids.iter()))
            })
            .chain(self.packs.iter().flat_map(|p| p.lexeme_ids.iter()));
        for id in referenced_lexemes {
            if !lexemes.contains(id) {
                return Err(CurriculumError::DanglingLexeme(*id));
            }
        }

        let referenced_rules = self.chapters.iter().flat_map(|c| {
            c.rule_ids
                .iter()
                .chain(c.sections.iter().flat_map(|s| s.rule_ids.iter()))
        });
        for id in referenced_rules {
            if !rules.contains(id) {
                return Err(CurriculumError::DanglingRule(*id));
            }
        }
        Ok(())
    }

    pub fn lexeme(&self, id: LexemeId) -> Option<&Lexeme> {
        self.lexemes.iter().find(|l| l.id == id)
    }

    /// Resolves ids in order, silently skipping unknown ones.
    pub fn lexemes_by_ids(&self, ids: &[LexemeId]) -> Vec<&Lexeme> {
        ids.iter().filter_map(|id| self.lexeme(*id)).collect()
    }

    pub fn grammar_rule(&self, id: RuleId) -> Option<&GrammarRule> {
        self.grammar_rules.iter().find(|r| r.id == id)
    }

    pub fn rules_by_ids(&self, ids: &[RuleId]) -> Vec<&GrammarRule> {
        ids.iter().filter_map(|id| self.grammar_rule(*id)).collect()
    }

    pub fn chapter_by_number(&self, number: u32) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.number == number)
    }

    pub fn chapter_by_id(&self, id: ChapterId) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Finds a section anywhere in the curriculum together with its chapter.
    pub fn find_section(&self, id: SectionId) -> Option<(&Chapter, &Section)> {
        self.chapters
            .iter()
            .find_map(|c| c.section(id).map(|s| (c, s)))
    }

    pub fn pack(&self, id: PackId) -> Option<&VocabPack> {
        self.packs.iter().find(|p| p.id == id)
    }

    /// Every lexeme a learner who completed chapters `1..=chapter` has met,
    /// plus the members of active packs whose prerequisite is satisfied.
    pub fn learned_lexemes(&self, chapter: u32, active_packs: &[PackId]) -> Vec<&Lexeme> {
        let mut ids: Vec<LexemeId> = Vec::new();
        let mut push = |id: &LexemeId| {
            if !ids.contains(id) {
                ids.push(*id);
            }
        };
        for c in self.chapters.iter().filter(|c| c.number <= chapter) {
            c.scope_lexeme_ids().iter().for_each(&mut push);
        }
        for pack in self.active_packs(active_packs, chapter) {
            pack.lexeme_ids.iter().for_each(&mut push);
        }
        self.lexemes_by_ids(&ids)
    }

    /// Rules unlocked at or before the given chapter number.
    pub fn unlocked_rules(&self, chapter: u32) -> Vec<&GrammarRule> {
        self.grammar_rules
            .iter()
            .filter(|r| r.unlocks_in <= chapter)
            .collect()
    }

    /// Packs among `active` that the learner has unlocked by reaching `chapter`.
    pub fn active_packs(&self, active: &[PackId], chapter: u32) -> Vec<&VocabPack> {
        active
            .iter()
            .filter_map(|id| self.pack(*id))
            .filter(|p| p.prerequisite_chapter <= chapter)
            .collect()
    }
}
