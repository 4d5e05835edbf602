//! Exercise batches, sentence assembly and review regeneration over a curriculum.

pub mod cache;
pub mod config;
pub mod generator;
pub mod gloss;
pub mod review;
pub mod sentence;
pub mod templates;

pub use cache::{CacheKey, SentenceCache};
pub use config::{CountRange, GeneratorConfig, Mode};
pub use generator::{exercise_sequence, ExerciseGenerator, GenerationError, ScopeSelector};
pub use review::{ReviewError, ReviewGenerator};
pub use sentence::{build_sentence, variations, Difficulty, Sentence, SentenceOptions};
pub use templates::SentenceTemplate;
