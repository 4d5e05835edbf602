pub mod context;
pub mod graph;
pub mod solver;
pub mod store;

pub use context::{suggest_theme, ThemeContext};
pub use graph::ThemeGraph;
pub use solver::{Resolver, Verdict};
pub use store::{pattern_key, InMemoryPatternStore, PatternStore, StoreError};

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use futures::executor::block_on;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use znayu_protocol::{Lexeme, LexemeId, PartOfSpeech, ThemeLink};

    fn lexeme(id: u32, word: &str, pos: PartOfSpeech, theme: Option<&str>, compatible: &[&str]) -> Lexeme {
        Lexeme {
            id: LexemeId(id),
            word: word.into(),
            gloss: word.into(),
            pos,
            gender: None,
            theme: theme.map(Into::into),
            compatible_themes: compatible.iter().map(|t| t.to_string()).collect(),
            compatible_noun_ids: vec![],
            compatible_verb_ids: vec![],
            audio: None,
        }
    }

    fn verb(id: u32, theme: Option<&str>, compatible: &[&str]) -> Lexeme {
        lexeme(id, "глагол", PartOfSpeech::Verb, theme, compatible)
    }

    fn noun(id: u32, theme: Option<&str>) -> Lexeme {
        lexeme(id, "сущ", PartOfSpeech::Noun, theme, &[])
    }

    fn context() -> ThemeContext {
        ThemeContext::new(&[ThemeLink { a: "location".into(), b: "building".into() }])
    }

    #[test]
    fn test_resolution_order() {
        let ctx = context();
        let store = InMemoryPatternStore::new();
        let resolver = Resolver::new(&ctx, &store);

        let mut read = verb(18, Some("hobbies"), &["readable"]);
        let book = noun(19, Some("readable"));
        let museum = noun(1810, Some("building"));
        let live = verb(8, Some("location"), &[]);
        let untagged_verb = verb(50, None, &[]);
        let untagged_noun = noun(51, None);

        block_on(async {
            assert_eq!(resolver.verdict(&read, &book).await, Verdict::ThemeMatch);
            assert_eq!(resolver.verdict(&live, &museum).await, Verdict::ThemeMatch);
            assert_eq!(resolver.verdict(&read, &museum).await, Verdict::Reject);
            assert_eq!(resolver.verdict(&untagged_verb, &book).await, Verdict::PartialTagPreference);
            assert_eq!(resolver.verdict(&untagged_verb, &untagged_noun).await, Verdict::Reject);

            read.compatible_noun_ids.push(museum.id);
            assert_eq!(resolver.verdict(&read, &museum).await, Verdict::ExplicitLink);

            store.set(untagged_verb.id, untagged_noun.id, true).await.unwrap();
            assert_eq!(
                resolver.verdict(&untagged_verb, &untagged_noun).await,
                Verdict::PersistedPattern(true)
            );
        });
    }

    #[test]
    fn test_stored_pattern_does_not_override_theme_match() {
        let ctx = context();
        let store = InMemoryPatternStore::new();
        let resolver = Resolver::new(&ctx, &store);
        let live = verb(8, Some("location"), &[]);
        let city = noun(1800, Some("location"));
        block_on(async {
            store.set(live.id, city.id, false).await.unwrap();
            assert!(resolver.is_compatible(&live, &city).await);
        });
    }

    #[test]
    fn test_found_pair_is_persisted_and_compatible() {
        let ctx = context();
        let store = InMemoryPatternStore::new();
        let resolver = Resolver::new(&ctx, &store);
        let verbs = [verb(18, Some("hobbies"), &["readable"]), verb(8, Some("location"), &[])];
        let nouns = [noun(19, Some("readable")), noun(1800, Some("location")), noun(27, Some("hobbies"))];
        let verb_refs: Vec<&Lexeme> = verbs.iter().collect();
        let noun_refs: Vec<&Lexeme> = nouns.iter().collect();

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            block_on(async {
                let (v, n) = resolver
                    .find_compatible_pair(&verb_refs, &noun_refs, &mut rng)
                    .await
                    .expect("a compatible pair exists");
                assert_eq!(store.get(v.id, n.id).await.unwrap(), Some(true));
                assert!(resolver.is_compatible(v, n).await);
            });
        }
    }

    #[test]
    fn test_no_pair_records_negative_evidence() {
        let ctx = context();
        let store = InMemoryPatternStore::new();
        let resolver = Resolver::new(&ctx, &store);
        let verbs = [verb(1, None, &[])];
        let nouns = [noun(2, None), noun(3, None)];
        let verb_refs: Vec<&Lexeme> = verbs.iter().collect();
        let noun_refs: Vec<&Lexeme> = nouns.iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        block_on(async {
            assert!(resolver.find_compatible_pair(&verb_refs, &noun_refs, &mut rng).await.is_none());
            assert_eq!(store.get(LexemeId(1), LexemeId(2)).await.unwrap(), Some(false));
            assert!(resolver.find_compatible_pair(&[], &noun_refs, &mut rng).await.is_none());
        });
    }

    struct BrokenStore;

    #[async_trait]
    impl PatternStore for BrokenStore {
        async fn get(&self, _: LexemeId, _: LexemeId) -> Result<Option<bool>, StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn set(&self, _: LexemeId, _: LexemeId, _: bool) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".into()))
        }
        async fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[test]
    fn test_store_failures_degrade_to_missing_pattern() {
        let ctx = context();
        let resolver = Resolver::new(&ctx, &BrokenStore);
        let verbs = [verb(8, Some("location"), &[])];
        let nouns = [noun(1800, Some("location")), noun(2, None)];
        let verb_refs: Vec<&Lexeme> = verbs.iter().collect();
        let noun_refs: Vec<&Lexeme> = nouns.iter().collect();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        block_on(async {
            assert_eq!(resolver.verdict(&verbs[0], &nouns[1]).await, Verdict::PartialTagPreference);
            assert!(resolver.find_compatible_pair(&verb_refs, &noun_refs, &mut rng).await.is_some());
        });
    }
}
