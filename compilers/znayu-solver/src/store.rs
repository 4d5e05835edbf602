use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use znayu_protocol::LexemeId;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("pattern store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("pattern store is corrupt: {0}")]
    Corrupt(String),
    #[error("pattern store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted `(verb, noun) -> compatible` facts. Writes for the same pair are last-write-wins.
#[async_trait]
pub trait PatternStore: Send + Sync {
    async fn get(&self, verb: LexemeId, noun: LexemeId) -> Result<Option<bool>, StoreError>;

    async fn set(&self, verb: LexemeId, noun: LexemeId, compatible: bool) -> Result<(), StoreError>;

    async fn set_batch(&self, patterns: &[(LexemeId, LexemeId, bool)]) -> Result<(), StoreError> {
        for (verb, noun, compatible) in patterns {
            self.set(*verb, *noun, *compatible).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError>;
}

/// `"verbId:nounId"`, the key format used when patterns are written out.
pub fn pattern_key(verb: LexemeId, noun: LexemeId) -> String {
    format!("{}:{}", verb, noun)
}

pub fn parse_pattern_key(key: &str) -> Option<(LexemeId, LexemeId)> {
    let (verb, noun) = key.split_once(':')?;
    Some((LexemeId(verb.trim().parse().ok()?), LexemeId(noun.trim().parse().ok()?)))
}

#[derive(Debug, Default)]
pub struct InMemoryPatternStore {
    patterns: DashMap<(LexemeId, LexemeId), bool>,
}

impl InMemoryPatternStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Snapshot keyed by [`pattern_key`].
    pub fn to_keyed(&self) -> Vec<(String, bool)> {
        let mut out: Vec<(String, bool)> = self
            .patterns
            .iter()
            .map(|entry| {
                let (verb, noun) = *entry.key();
                (pattern_key(verb, noun), *entry.value())
            })
            .collect();
        out.sort();
        out
    }

    /// Loads entries keyed by [`pattern_key`]; malformed keys are skipped.
    pub fn from_keyed<'a>(entries: impl IntoIterator<Item = (&'a str, bool)>) -> Self {
        let store = Self::new();
        for (key, compatible) in entries {
            match parse_pattern_key(key) {
                Some(pair) => {
                    store.patterns.insert(pair, compatible);
                }
                None => log::warn!("skipping malformed pattern key {:?}", key),
            }
        }
        store
    }
}

#[async_trait]
impl PatternStore for InMemoryPatternStore {
    async fn get(&self, verb: LexemeId, noun: LexemeId) -> Result<Option<bool>, StoreError> {
        Ok(self.patterns.get(&(verb, noun)).map(|v| *v))
    }

    async fn set(&self, verb: LexemeId, noun: LexemeId, compatible: bool) -> Result<(), StoreError> {
        self.patterns.insert((verb, noun), compatible);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.patterns.clear();
        Ok(())
    }
}
