use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use log::debug;
use znayu_protocol::LexemeId;
use znayu_solver::{InMemoryPatternStore, PatternStore, StoreError};

/// Compatibility patterns persisted as a `{"verbId:nounId": bool}` JSON object.
/// The whole file is rewritten after every write.
pub struct JsonFileStore {
    path: PathBuf,
    patterns: InMemoryPatternStore,
}

impl JsonFileStore {
    /// Loads `path` if it exists, otherwise starts empty and creates it on first write.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let patterns = if path.exists() {
            let raw = fs::read_to_string(&path).with_context(|| format!("reading pattern store {:?}", path))?;
            let entries: BTreeMap<String, bool> =
                serde_json::from_str(&raw).with_context(|| format!("parsing pattern store {:?}", path))?;
            InMemoryPatternStore::from_keyed(entries.iter().map(|(k, v)| (k.as_str(), *v)))
        } else {
            InMemoryPatternStore::new()
        };
        debug!("opened pattern store {:?} with {} patterns", path, patterns.len());
        Ok(Self { path, patterns })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    async fn persist(&self) -> Result<(), StoreError> {
        let snapshot: BTreeMap<String, bool> = self.patterns.to_keyed().into_iter().collect();
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl PatternStore for JsonFileStore {
    async fn get(&self, verb: LexemeId, noun: LexemeId) -> Result<Option<bool>, StoreError> {
        self.patterns.get(verb, noun).await
    }

    async fn set(&self, verb: LexemeId, noun: LexemeId, compatible: bool) -> Result<(), StoreError> {
        self.patterns.set(verb, noun, compatible).await?;
        self.persist().await
    }

    async fn set_batch(&self, patterns: &[(LexemeId, LexemeId, bool)]) -> Result<(), StoreError> {
        self.patterns.set_batch(patterns).await?;
        self.persist().await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.patterns.clear().await?;
        self.persist().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_patterns_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        let store = JsonFileStore::open(&path).unwrap();
        store.set(LexemeId(18), LexemeId(19), true).await.unwrap();
        store
            .set_batch(&[(LexemeId(18), LexemeId(1800), false), (LexemeId(8), LexemeId(1800), true)])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"18:19\": true"));

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.get(LexemeId(18), LexemeId(1800)).await.unwrap(), Some(false));

        reopened.clear().await.unwrap();
        assert_eq!(JsonFileStore::open(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
