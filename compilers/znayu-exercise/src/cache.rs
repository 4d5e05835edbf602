use std::collections::HashMap;

use znayu_protocol::{LexemeId, PackId};

use crate::sentence::Difficulty;

/// Lexeme set, difficulty and active packs. Ids are sorted and deduplicated so
/// the order a caller lists them in does not matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lexeme_ids: Vec<LexemeId>,
    difficulty: Difficulty,
    packs: Vec<PackId>,
}

impl CacheKey {
    pub fn new(ids: impl IntoIterator<Item = LexemeId>, difficulty: Difficulty) -> Self {
        Self {
            lexeme_ids: sorted(ids),
            difficulty,
            packs: Vec::new(),
        }
    }

    /// Packs change which pairs are compatible, so they are part of the key.
    pub fn with_packs(mut self, packs: impl IntoIterator<Item = PackId>) -> Self {
        self.packs = sorted(packs);
        self
    }

    pub fn mentions(&self, id: LexemeId) -> bool {
        self.lexeme_ids.binary_search(&id).is_ok()
    }
}

fn sorted<T: Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort_unstable();
    items.dedup();
    items
}

#[derive(Debug)]
struct Entry {
    /// How many sentences the sampling run asked for.
    requested: usize,
    sentences: Vec<String>,
}

/// Memoized graded sentences, owned by a generator and alive only for its lifetime.
#[derive(Debug, Default)]
pub struct SentenceCache {
    entries: HashMap<CacheKey, Entry>,
}

impl SentenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Up to `count` sentences, if a run that asked for at least `count` was stored.
    /// A smaller run is a miss even when it came back short.
    pub fn get(&self, key: &CacheKey, count: usize) -> Option<&[String]> {
        let entry = self.entries.get(key).filter(|e| e.requested >= count)?;
        Some(&entry.sentences[..count.min(entry.sentences.len())])
    }

    pub fn insert(&mut self, key: CacheKey, requested: usize, sentences: Vec<String>) {
        self.entries.insert(key, Entry { requested, sentences });
    }

    /// Drops every entry built from `id`, e.g. after its lexeme was edited.
    pub fn invalidate(&mut self, id: LexemeId) {
        self.entries.retain(|key, _| !key.mentions(id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
