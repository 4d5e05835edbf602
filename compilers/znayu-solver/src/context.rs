use std::collections::HashMap;

use znayu_protocol::{Curriculum, Lexeme, LexemeId, PackId, ThemeLink, VocabPack};

use crate::graph::ThemeGraph;

/// Theme knowledge for one generation call: the compatibility graph plus the
/// themes inherited from the learner's active packs.
#[derive(Debug, Clone, Default)]
pub struct ThemeContext {
    graph: ThemeGraph,
    pack_themes: HashMap<LexemeId, String>,
}

impl ThemeContext {
    pub fn new(links: &[ThemeLink]) -> Self {
        Self {
            graph: ThemeGraph::from_links(links),
            pack_themes: HashMap::new(),
        }
    }

    pub fn for_curriculum(curriculum: &Curriculum, active_packs: &[PackId]) -> Self {
        let packs = active_packs.iter().filter_map(|id| curriculum.pack(*id));
        Self::new(&curriculum.theme_links).with_packs(packs)
    }

    /// Like [`ThemeContext::for_curriculum`], keeping only packs unlocked by `chapter`.
    pub fn unlocked_at(curriculum: &Curriculum, active_packs: &[PackId], chapter: u32) -> Self {
        Self::new(&curriculum.theme_links).with_packs(curriculum.active_packs(active_packs, chapter))
    }

    /// Registers pack membership. The first pack listing a lexeme decides its inherited theme.
    pub fn with_packs<'a>(mut self, packs: impl IntoIterator<Item = &'a VocabPack>) -> Self {
        for pack in packs {
            let Some(theme) = &pack.theme else { continue };
            for id in &pack.lexeme_ids {
                self.pack_themes.entry(*id).or_insert_with(|| theme.clone());
            }
        }
        self
    }

    pub fn graph(&self) -> &ThemeGraph {
        &self.graph
    }

    /// The lexeme's own tag, else the theme of an active pack it belongs to.
    pub fn effective_theme<'a>(&'a self, lexeme: &'a Lexeme) -> Option<&'a str> {
        lexeme
            .theme
            .as_deref()
            .or_else(|| self.pack_themes.get(&lexeme.id).map(String::as_str))
    }
}

const THEME_KEYWORDS: [(&str, &[&str], &[&str]); 8] = [
    ("food", &["food", "eat", "drink", "restaurant", "café", "menu", "bill"], &["еда", "ресторан"]),
    ("transit", &["train", "bus", "car", "travel", "ticket", "passenger", "station"], &["поезд", "автобус"]),
    ("education", &["student", "university", "school", "teacher", "study"], &["студент", "университет"]),
    ("family", &["dad", "mom", "father", "mother", "brother", "sister", "family"], &["папа", "мама"]),
    ("hobbies", &["read", "watch", "listen", "book", "movie", "music"], &["читать", "смотреть"]),
    ("readable", &["book", "magazine", "newspaper", "article"], &["книга"]),
    ("edible", &["apple", "bread", "food", "meal"], &["яблоко", "хлеб"]),
    ("location", &["university", "house", "home", "restaurant", "café"], &["университет", "дом"]),
];

/// Keyword guess at a theme for an untagged lexeme, from its gloss and surface form.
/// Categories are tried in a fixed order, so `book` lands in `hobbies` before `readable`.
pub fn suggest_theme(lexeme: &Lexeme) -> Option<&'static str> {
    let gloss = lexeme.gloss.to_lowercase();
    let word = lexeme.word.to_lowercase();
    THEME_KEYWORDS
        .iter()
        .find(|(_, glosses, words)| {
            glosses.iter().any(|k| gloss.contains(k)) || words.iter().any(|k| word.contains(k))
        })
        .map(|(theme, _, _)| *theme)
}
