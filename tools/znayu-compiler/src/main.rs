mod store;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::{info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use znayu_exercise::{
    variations, Difficulty, ExerciseGenerator, GeneratorConfig, Mode, ReviewGenerator, ScopeSelector,
};
use znayu_protocol::{Curriculum, Exercise, LexemeId, MissedQuestion, PackId, PartOfSpeech, SectionId};
use znayu_solver::{suggest_theme, InMemoryPatternStore, PatternStore};

use crate::store::JsonFileStore;

#[derive(Parser)]
#[command(author, version, about = "Compiles curricula and generates Russian practice exercises")]
struct Cli {
    /// Curriculum as JSON or a compiled rkyv archive. Defaults to the bundled one.
    #[arg(short, long, value_name = "FILE", global = true)]
    curriculum: Option<PathBuf>,

    /// Generator configuration JSON.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible output.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a curriculum JSON file to an rkyv archive.
    Compile {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Generate an exercise batch.
    Generate {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long, default_value = "quick")]
        mode: Mode,
        /// Active vocabulary pack ids, comma separated.
        #[arg(long, value_delimiter = ',')]
        packs: Vec<u32>,
        /// Compatibility pattern file, created on first write.
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
    /// Regenerate a missed question (a MissedQuestion or Exercise JSON file).
    Review {
        #[arg(value_name = "FILE")]
        missed: PathBuf,
    },
    /// Sample graded practice sentences from a chapter.
    Sentences {
        #[arg(long)]
        chapter: u32,
        #[arg(long, default_value = "easy")]
        difficulty: Difficulty,
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long, value_delimiter = ',')]
        packs: Vec<u32>,
        #[arg(long, value_name = "FILE")]
        store: Option<PathBuf>,
    },
    /// Render one verb/noun pair several ways.
    Variations {
        #[arg(long)]
        verb: u32,
        #[arg(long)]
        noun: u32,
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
    /// Suggest themes for lexemes that have none.
    Themes,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ScopeArgs {
    #[arg(long)]
    section: Option<u32>,
    #[arg(long)]
    chapter: Option<u32>,
    /// Everything learned up to this chapter number.
    #[arg(long)]
    learned: Option<u32>,
}

impl ScopeArgs {
    fn selector(&self) -> anyhow::Result<ScopeSelector> {
        match (self.section, self.chapter, self.learned) {
            (Some(id), _, _) => Ok(ScopeSelector::Section(SectionId(id))),
            (_, Some(number), _) => Ok(ScopeSelector::Chapter(number)),
            (_, _, Some(number)) => Ok(ScopeSelector::Learned(number)),
            _ => bail!("one of --section, --chapter or --learned is required"),
        }
    }
}

fn load_curriculum(path: Option<&Path>) -> anyhow::Result<Curriculum> {
    let curriculum = match path {
        None => Curriculum::bundled().context("loading bundled curriculum")?,
        Some(path) if path.extension().is_some_and(|e| e == "json") => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            Curriculum::from_json(&raw).with_context(|| format!("parsing {:?}", path))?
        }
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("reading {:?}", path))?;
            Curriculum::from_archive(&bytes).with_context(|| format!("decoding {:?}", path))?
        }
    };
    curriculum.validate().context("curriculum references undefined entries")?;
    info!(
        "curriculum v{}: {} lexemes, {} rules, {} chapters",
        curriculum.version,
        curriculum.lexemes.len(),
        curriculum.grammar_rules.len(),
        curriculum.chapters.len()
    );
    Ok(curriculum)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GeneratorConfig> {
    match path {
        None => Ok(GeneratorConfig::default()),
        Some(path) => {
            let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
            GeneratorConfig::from_json(&raw).with_context(|| format!("parsing {:?}", path))
        }
    }
}

fn open_store(path: Option<&Path>) -> anyhow::Result<Box<dyn PatternStore>> {
    Ok(match path {
        Some(path) => Box::new(JsonFileStore::open(path)?),
        None => Box::new(InMemoryPatternStore::new()),
    })
}

fn rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

fn pack_ids(ids: &[u32]) -> Vec<PackId> {
    ids.iter().copied().map(PackId).collect()
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn compile(input: &Path, output: &Path) -> anyhow::Result<()> {
    info!("reading curriculum JSON from {:?}", input);
    let raw = fs::read_to_string(input).with_context(|| format!("reading {:?}", input))?;
    let curriculum = Curriculum::from_json(&raw).with_context(|| format!("parsing {:?}", input))?;
    curriculum.validate()?;

    info!(
        "compiling curriculum v{} with {} lexemes",
        curriculum.version,
        curriculum.lexemes.len()
    );
    let bytes = curriculum.to_archive()?;
    fs::write(output, &bytes).with_context(|| format!("writing {:?}", output))?;
    println!("wrote {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

/// Parses a stored MissedQuestion, or wraps a bare exercise as one missed just now.
fn read_missed(path: &Path) -> anyhow::Result<MissedQuestion> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    if let Ok(missed) = serde_json::from_str::<MissedQuestion>(&raw) {
        return Ok(missed);
    }
    let exercise: Exercise =
        serde_json::from_str(&raw).with_context(|| format!("{:?} is neither a missed question nor an exercise", path))?;
    Ok(MissedQuestion::now(&exercise))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if let Command::Compile { input, output } = &cli.command {
        return compile(input, output);
    }

    let curriculum = load_curriculum(cli.curriculum.as_deref())?;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Compile { .. } => Ok(()),
        Command::Generate { scope, mode, packs, store, timeout_ms } => {
            let selector = scope.selector()?;
            let packs = pack_ids(&packs);
            let store = open_store(store.as_deref())?;
            let mut generator = ExerciseGenerator::with_rng(&curriculum, store.as_ref(), config, rng(cli.seed));
            let batch = match tokio::time::timeout(
                Duration::from_millis(timeout_ms),
                generator.generate(selector, mode, &packs),
            )
            .await
            {
                Ok(batch) => batch,
                Err(_) => {
                    warn!("generation for {:?} timed out after {}ms", selector, timeout_ms);
                    Vec::new()
                }
            };
            print_json(&batch)
        }
        Command::Review { missed } => {
            let missed = read_missed(&missed)?;
            let mut review = ReviewGenerator::with_rng(&curriculum, config, rng(cli.seed));
            print_json(&review.regenerate(&missed))
        }
        Command::Sentences { chapter, difficulty, count, packs, store } => {
            let Some(found) = curriculum.chapter_by_number(chapter) else {
                bail!("unknown chapter {}", chapter);
            };
            let lexemes = curriculum.lexemes_by_ids(&found.scope_lexeme_ids());
            let packs = pack_ids(&packs);
            let store = open_store(store.as_deref())?;
            let mut generator = ExerciseGenerator::with_rng(&curriculum, store.as_ref(), config, rng(cli.seed));
            let sentences = generator.sample_sentences(&lexemes, count, difficulty, &packs).await;
            print_json(&sentences)
        }
        Command::Variations { verb, noun, count } => {
            let (Some(verb), Some(noun)) = (curriculum.lexeme(LexemeId(verb)), curriculum.lexeme(LexemeId(noun))) else {
                bail!("unknown verb {} or noun {}", verb, noun);
            };
            let adjectives: Vec<_> = curriculum.lexemes.iter().filter(|l| l.is(PartOfSpeech::Adjective)).collect();
            let mut rng = rng(cli.seed);
            let rendered: Vec<_> = variations(verb, noun, &adjectives, &[], count, &mut rng)
                .into_iter()
                .map(|s| json!({ "sentence": s.target(), "hint": s.hint }))
                .collect();
            print_json(&rendered)
        }
        Command::Themes => {
            let suggestions: Vec<_> = curriculum
                .lexemes
                .iter()
                .filter(|l| l.theme.is_none())
                .filter_map(|l| suggest_theme(l).map(|theme| json!({ "id": l.id, "word": l.word, "theme": theme })))
                .collect();
            print_json(&suggestions)
        }
    }
}
