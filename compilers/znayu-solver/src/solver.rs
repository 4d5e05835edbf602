use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use znayu_protocol::{Lexeme, LexemeId};

use crate::context::ThemeContext;
use crate::store::PatternStore;

/// Outcome of the first resolution rule that fired for a verb/noun pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// One lexeme lists the other among its compatible ids.
    ExplicitLink,
    /// Both themes are known and the verb accepts the noun's theme, they are equal, or linked.
    ThemeMatch,
    /// A previously recorded fact.
    PersistedPattern(bool),
    /// Exactly one side is theme-tagged.
    PartialTagPreference,
    Reject,
}

impl Verdict {
    pub fn is_compatible(self) -> bool {
        match self {
            Verdict::ExplicitLink | Verdict::ThemeMatch | Verdict::PartialTagPreference => true,
            Verdict::PersistedPattern(stored) => stored,
            Verdict::Reject => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    ExplicitLink,
    ThemeMatch,
    PersistedPattern,
    PartialTagPreference,
}

/// Evaluated in order; the first rule returning a verdict wins, otherwise [`Verdict::Reject`].
const RESOLUTION_ORDER: [Rule; 4] = [
    Rule::ExplicitLink,
    Rule::ThemeMatch,
    Rule::PersistedPattern,
    Rule::PartialTagPreference,
];

pub struct Resolver<'a, S: PatternStore + ?Sized> {
    context: &'a ThemeContext,
    store: &'a S,
}

impl<'a, S: PatternStore + ?Sized> Resolver<'a, S> {
    pub fn new(context: &'a ThemeContext, store: &'a S) -> Self {
        Self { context, store }
    }

    pub fn context(&self) -> &ThemeContext {
        self.context
    }

    pub async fn verdict(&self, verb: &Lexeme, noun: &Lexeme) -> Verdict {
        for rule in RESOLUTION_ORDER {
            if let Some(verdict) = self.apply(rule, verb, noun).await {
                return verdict;
            }
        }
        Verdict::Reject
    }

    pub async fn is_compatible(&self, verb: &Lexeme, noun: &Lexeme) -> bool {
        self.verdict(verb, noun).await.is_compatible()
    }

    async fn apply(&self, rule: Rule, verb: &Lexeme, noun: &Lexeme) -> Option<Verdict> {
        let verb_theme = self.context.effective_theme(verb);
        let noun_theme = self.context.effective_theme(noun);
        match rule {
            Rule::ExplicitLink => (verb.compatible_noun_ids.contains(&noun.id)
                || noun.compatible_verb_ids.contains(&verb.id))
            .then_some(Verdict::ExplicitLink),
            Rule::ThemeMatch => {
                let (verb_theme, noun_theme) = (verb_theme?, noun_theme?);
                let accepted = verb.compatible_themes.iter().any(|t| t == noun_theme)
                    || self.context.graph().are_compatible(verb_theme, noun_theme);
                accepted.then_some(Verdict::ThemeMatch)
            }
            Rule::PersistedPattern => match self.store.get(verb.id, noun.id).await {
                Ok(stored) => stored.map(Verdict::PersistedPattern),
                Err(e) => {
                    warn!("pattern lookup for {}:{} failed: {}", verb.id, noun.id, e);
                    None
                }
            },
            Rule::PartialTagPreference => (verb_theme.is_some() != noun_theme.is_some())
                .then_some(Verdict::PartialTagPreference),
        }
    }

    /// Nouns from `nouns` that combine with `verb`, in input order.
    pub async fn compatible_nouns<'l>(&self, verb: &Lexeme, nouns: &[&'l Lexeme]) -> Vec<&'l Lexeme> {
        let mut out = Vec::new();
        for noun in nouns {
            if self.is_compatible(verb, noun).await {
                out.push(*noun);
            }
        }
        out
    }

    /// Verbs from `verbs` that combine with `noun`, in input order.
    pub async fn compatible_verbs<'l>(&self, noun: &Lexeme, verbs: &[&'l Lexeme]) -> Vec<&'l Lexeme> {
        let mut out = Vec::new();
        for verb in verbs {
            if self.is_compatible(verb, noun).await {
                out.push(*verb);
            }
        }
        out
    }

    /// Picks a random compatible pair. Both lists are shuffled first; the first verb
    /// with any compatible noun wins and one of its nouns is drawn uniformly.
    ///
    /// The chosen pair is recorded as positive evidence and every rejected pair seen
    /// along the way as negative evidence.
    pub async fn find_compatible_pair<'l, R: Rng + ?Sized>(
        &self,
        verbs: &[&'l Lexeme],
        nouns: &[&'l Lexeme],
        rng: &mut R,
    ) -> Option<(&'l Lexeme, &'l Lexeme)> {
        if verbs.is_empty() || nouns.is_empty() {
            return None;
        }
        let mut verbs = verbs.to_vec();
        let mut nouns = nouns.to_vec();
        verbs.shuffle(rng);
        nouns.shuffle(rng);

        let mut rejected: Vec<(LexemeId, LexemeId, bool)> = Vec::new();
        let mut found = None;
        for verb in &verbs {
            let mut compatible = Vec::new();
            for noun in &nouns {
                match self.verdict(verb, noun).await {
                    Verdict::Reject => rejected.push((verb.id, noun.id, false)),
                    v if v.is_compatible() => compatible.push(*noun),
                    _ => {}
                }
            }
            if let Some(noun) = compatible.choose(rng) {
                found = Some((*verb, *noun));
                break;
            }
        }

        if !rejected.is_empty() {
            if let Err(e) = self.store.set_batch(&rejected).await {
                warn!("could not record {} rejected pairs: {}", rejected.len(), e);
            }
        }
        match found {
            Some((verb, noun)) => {
                debug!("paired {} ({}) with {} ({})", verb.word, verb.id, noun.word, noun.id);
                if let Err(e) = self.store.set(verb.id, noun.id, true).await {
                    warn!("could not record pattern {}:{}: {}", verb.id, noun.id, e);
                }
            }
            None => debug!("no compatible pair among {} verbs and {} nouns", verbs.len(), nouns.len()),
        }
        found
    }
}
