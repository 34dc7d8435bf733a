//! Intent container - registration, filtering and best-match resolution

use crate::config::{ConfidenceLevel, Config};
use crate::context::ContextTables;
use crate::error::Result;
use crate::matcher::{score_intent, select_best};
use crate::pattern::Conversion;
use crate::registry::PatternRegistry;
use crate::types::IntentMatch;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

/// A catalogue of intents and entities that queries are matched against.
///
/// Registration and context changes take `&mut self`, queries take `&self`.
/// To query from several threads while mutating, wrap the container in a
/// `RwLock`.
#[derive(Debug)]
pub struct IntentContainer {
    config: Config,
    registry: PatternRegistry,
    contexts: ContextTables,
    pool: ThreadPool,
}

impl IntentContainer {
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|idx| format!("padacioso-{idx}"))
            .build()?;
        Ok(Self {
            config,
            registry: PatternRegistry::new(),
            contexts: ContextTables::new(),
            pool,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_fuzzy(&self) -> bool {
        self.config.fuzz
    }

    /// Add an intent from its templates. Fails if `name` is already registered.
    pub fn add_intent<S: AsRef<str>>(&mut self, name: &str, templates: &[S]) -> Result<()> {
        self.registry.add_intent(name, templates)
    }

    /// Remove an intent along with its context and keyword entries.
    pub fn remove_intent(&mut self, name: &str) {
        if self.registry.remove_intent(name) {
            self.contexts.clear_intent(name);
        }
    }

    /// Add an entity with example values. Fails if `name` is already registered.
    pub fn add_entity<S: AsRef<str>>(&mut self, name: &str, examples: &[S]) -> Result<()> {
        self.registry.add_entity(name, examples)
    }

    pub fn remove_entity(&mut self, name: &str) {
        self.registry.remove_entity(name);
    }

    /// Register a `{slot:type}` capture type for intents added afterwards.
    pub fn register_type(&mut self, name: &str, pattern: &str, conversion: Conversion) {
        self.registry.register_type(name, pattern, conversion);
    }

    /// Registered intent names, sorted.
    pub fn intent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .registry
            .intents()
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        names
    }

    pub fn variants(&self, intent: &str) -> Option<&[String]> {
        self.registry.variants(intent)
    }

    pub fn entity_examples(&self, entity: &str) -> Option<&[String]> {
        self.registry.entities().examples(entity)
    }

    pub fn set_context(&mut self, intent: &str, context: &str, value: Option<&str>) {
        self.contexts.set_context(intent, context, value);
    }

    pub fn unset_context(&mut self, intent: &str, context: &str) {
        self.contexts.unset_context(intent, context);
    }

    pub fn require_context(&mut self, intent: &str, context: &str) {
        self.contexts.require_context(intent, context);
    }

    pub fn unrequire_context(&mut self, intent: &str, context: &str) {
        self.contexts.unrequire_context(intent, context);
    }

    pub fn exclude_context(&mut self, intent: &str, context: &str) {
        self.contexts.exclude_context(intent, context);
    }

    pub fn unexclude_context(&mut self, intent: &str, context: &str) {
        self.contexts.unexclude_context(intent, context);
    }

    pub fn exclude_keywords<S: AsRef<str>>(&mut self, intent: &str, keywords: &[S]) {
        self.contexts.exclude_keywords(intent, keywords);
    }

    /// Every intent matching `query`, one result each, in no particular order.
    pub fn calc_intents(&self, query: &str) -> impl Iterator<Item = IntentMatch> {
        let skipped = self.contexts.filter(query);
        let candidates: Vec<(&str, &[String])> = self
            .registry
            .intents()
            .filter(|(name, _)| !skipped.contains(*name))
            .collect();

        let registry = &self.registry;
        let fuzz = self.config.fuzz;
        let results: Vec<IntentMatch> = self.pool.install(|| {
            candidates
                .par_iter()
                .filter_map(|(name, variants)| score_intent(query, name, variants, registry, fuzz))
                .collect()
        });
        results.into_iter()
    }

    /// Best intent for `query`; the result has no name if nothing matched.
    pub fn calc_intent(&self, query: &str) -> IntentMatch {
        select_best(self.calc_intents(query).collect())
    }

    /// Best named match across several utterances, paired with the utterance
    /// it came from.
    ///
    /// Utterances with `max_words` words or more are skipped. On equal
    /// confidence the earliest utterance wins.
    pub fn calc_best<S: AsRef<str>>(&self, utterances: &[S]) -> Option<(String, IntentMatch)> {
        let usable: Vec<&str> = utterances
            .iter()
            .map(AsRef::as_ref)
            .filter(|utterance| utterance.split_whitespace().count() < self.config.max_words)
            .collect();
        if usable.is_empty() {
            tracing::error!(
                "utterance exceeds max size of {} words, skipping match",
                self.config.max_words
            );
            return None;
        }

        usable
            .into_iter()
            .map(|utterance| (utterance, self.calc_intent(utterance)))
            .filter(|(_, m)| m.is_match())
            .fold(None::<(&str, IntentMatch)>, |best, (utterance, m)| match best {
                Some(current) if current.1.confidence >= m.confidence => Some(current),
                _ => Some((utterance, m)),
            })
            .map(|(utterance, m)| (utterance.to_string(), m))
    }

    /// Best match across `utterances` if its confidence exceeds the threshold
    /// configured for `level`.
    pub fn match_level<S: AsRef<str>>(
        &self,
        utterances: &[S],
        level: ConfidenceLevel,
    ) -> Option<(String, IntentMatch)> {
        let limit = self.config.threshold(level);
        tracing::debug!("Matching confidence > {}", limit);
        self.calc_best(utterances)
            .filter(|(_, best)| best.confidence > limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Entities;
    use proptest::prelude::*;
    use serde_json::json;

    fn container() -> IntentContainer {
        IntentContainer::new().unwrap()
    }

    fn fuzzy_container() -> IntentContainer {
        IntentContainer::with_config(Config::default().with_fuzz(true)).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_intents() {
        let mut container = container();
        container
            .add_intent("hello", &["hello", "hi", "how are you", "what's up"])
            .unwrap();
        container
            .add_intent("buy", &["buy {item}", "purchase {item}", "get {item}", "get {item} for me"])
            .unwrap();
        container.add_entity("item", &["milk", "cheese"]).unwrap();
        container
            .add_intent("drive", &["drive me to {place}", "take me to {place}", "navigate to {place}"])
            .unwrap();
        container
            .add_intent("eat", &["eat {fruit}", "eat some {fruit}", "munch on (some|) {fruit}"])
            .unwrap();

        assert_eq!(container.calc_intent("hello").name.as_deref(), Some("hello"));
        assert_eq!(container.calc_intent("bye").name, None);

        let m = container.calc_intent("buy milk");
        assert_eq!(m.name.as_deref(), Some("buy"));
        assert_eq!(m.entities, Entities::from([("item".to_string(), json!("milk"))]));
        assert_eq!(m.confidence, 1.0);

        let m = container.calc_intent("buy beer");
        assert_eq!(m.entities["item"], json!("beer"));
        assert!(approx(m.confidence, 0.9));

        let m = container.calc_intent("munch on bananas");
        assert_eq!(m.name.as_deref(), Some("eat"));
        assert_eq!(m.entities["fruit"], json!("bananas"));
        assert!(approx(m.confidence, 0.96));
    }

    #[test]
    fn test_case() {
        let mut container = container();
        container.add_intent("test", &["Testing cAPitalizAtion"]).unwrap();
        assert_eq!(container.calc_intent("Testing cAPitalizAtion").confidence, 1.0);
        assert!(approx(container.calc_intent("teStiNg CapitalIzation").confidence, 0.95));
    }

    #[test]
    fn test_multiple_entities() {
        let mut container = container();
        container.add_intent("test3", &["I see {thing} (in|on) {place}"]).unwrap();
        let m = container.calc_intent("I see a bin in there");
        assert_eq!(m.name.as_deref(), Some("test3"));
        assert_eq!(m.entities["thing"], json!("a bin"));
        assert_eq!(m.entities["place"], json!("there"));
        assert!(approx(m.confidence, 0.92));
    }

    #[test]
    fn test_entity_keys_lowercased() {
        let mut container = container();
        container.add_intent("greet", &["hello {Person}"]).unwrap();
        let m = container.calc_intent("hello Ada");
        assert_eq!(m.entities.get("person"), Some(&json!("Ada")));
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut container = container();
        container.add_intent("hello", &["hello"]).unwrap();
        container.add_entity("item", &["milk"]).unwrap();
        assert!(matches!(
            container.add_intent("hello", &["hi"]),
            Err(Error::DuplicateIntent(_))
        ));
        assert!(matches!(
            container.add_entity("ITEM", &["bread"]),
            Err(Error::DuplicateEntity(_))
        ));
    }

    #[test]
    fn test_remove_intent() {
        let mut container = container();
        container.add_intent("hello", &["hello (world|there)"]).unwrap();
        assert!(container.calc_intent("hello there").is_match());

        container.remove_intent("hello");
        container.remove_intent("hello");
        assert_eq!(container.calc_intent("hello there").name, None);
        assert_eq!(container.calc_intent("hello world").name, None);
        assert!(container.intent_names().is_empty());
    }

    #[test]
    fn test_remove_intent_clears_contexts() {
        let mut container = container();
        container.add_intent("yes", &["yes"]).unwrap();
        container.require_context("yes", "asked");
        assert_eq!(container.calc_intent("yes").name, None);

        container.remove_intent("yes");
        container.add_intent("yes", &["yes"]).unwrap();
        assert_eq!(container.calc_intent("yes").name.as_deref(), Some("yes"));
    }

    #[test]
    fn test_context_filtering() {
        let mut container = container();
        container.add_intent("confirm", &["yes"]).unwrap();
        container.add_intent("agree", &["yes"]).unwrap();
        container.require_context("confirm", "awaiting_confirmation");
        assert_eq!(container.calc_intent("yes").name.as_deref(), Some("agree"));

        container.set_context("confirm", "awaiting_confirmation", None);
        container.exclude_context("agree", "muted");
        container.set_context("agree", "muted", Some("true"));
        assert_eq!(container.calc_intent("yes").name.as_deref(), Some("confirm"));

        container.unexclude_context("agree", "muted");
        container.unset_context("confirm", "awaiting_confirmation");
        assert_eq!(container.calc_intent("yes").name.as_deref(), Some("agree"));
        container.unrequire_context("confirm", "awaiting_confirmation");
        assert_eq!(container.calc_intents("yes").count(), 2);
    }

    #[test]
    fn test_exclude_keywords() {
        let mut container = container();
        container.add_intent("weather", &["what is the weather *"]).unwrap();
        container.exclude_keywords("weather", &["tomorrow"]);
        assert!(container.calc_intent("what is the weather today").is_match());
        assert!(!container.calc_intent("what is the weather tomorrow").is_match());
    }

    #[test]
    fn test_ties_resolved_by_name() {
        let mut container = container();
        container.add_intent("zeta", &["stop"]).unwrap();
        container.add_intent("alpha", &["stop"]).unwrap();
        container.add_intent("mid", &["stop"]).unwrap();
        for _ in 0..10 {
            assert_eq!(container.calc_intent("stop").name.as_deref(), Some("alpha"));
        }
    }

    #[test]
    fn test_padatious_shorthand() {
        let mut container = container();
        container.add_intent("time", &[":0 what time is it"]).unwrap();
        let m = container.calc_intent("hey what time is it");
        assert_eq!(m.entities["word0"], json!("hey"));
        assert!(approx(m.confidence, 0.96));
    }

    #[test]
    fn test_typed_entities() {
        let mut container = container();
        container.add_intent("test_int", &["* number {number:int}"]).unwrap();
        container.add_entity("number", &["1", "2", "3", "4", "5"]).unwrap();
        container.add_intent("test_float", &["* float {number:float}"]).unwrap();

        let m = container.calc_intent("i want float 3");
        assert_eq!(m.name.as_deref(), Some("test_float"));
        assert_eq!(m.entities["number"], json!(3.0));
        assert!(approx(m.confidence, 0.75));

        let m = container.calc_intent("i want numBeR 3");
        assert_eq!(m.name.as_deref(), Some("test_int"));
        assert!(approx(m.confidence, 0.8));
    }

    #[test]
    fn test_fuzzy_near_miss() {
        let templates = ["this is a test", "test the intent", "execute test"];

        let mut strict = container();
        strict.add_intent("test", &templates).unwrap();
        assert_eq!(strict.calc_intent("this is a toast").name, None);

        let mut fuzzy = fuzzy_container();
        fuzzy.add_intent("test", &templates).unwrap();
        let exact = fuzzy.calc_intent("this is a test");
        let near = fuzzy.calc_intent("this is a toast");
        assert_eq!(near.name.as_deref(), Some("test"));
        assert!(near.confidence < exact.confidence);
        assert!(near.confidence <= 0.8);
    }

    #[test]
    fn test_fuzzy_capture() {
        let mut container = fuzzy_container();
        container
            .add_intent("test2", &["tell me about {thing}", "what is {thing}"])
            .unwrap();
        let m = container.calc_intent("tell me everything about Mycroft");
        assert_eq!(m.name.as_deref(), Some("test2"));
        assert_eq!(m.entities["thing"], json!("Mycroft"));
        assert!(m.confidence <= 0.8);
    }

    #[test]
    fn test_match_level() {
        let mut container = container();
        container.add_intent("buy", &["buy {item}"]).unwrap();
        container.add_entity("item", &["milk"]).unwrap();

        assert!(container.match_level(&["buy milk"], ConfidenceLevel::High).is_some());
        assert!(container.match_level(&["buy beer"], ConfidenceLevel::High).is_none());
        let (sent, m) = container
            .match_level(&["buy beer", "buy milk"], ConfidenceLevel::Medium)
            .unwrap();
        assert_eq!(sent, "buy milk");
        assert_eq!(m.entities["item"], json!("milk"));
    }

    #[test]
    fn test_calc_best_keeps_first_of_equal_matches() {
        let mut container = container();
        container.add_intent("buy", &["buy {item}"]).unwrap();
        container.add_entity("item", &["milk", "cheese"]).unwrap();

        let (sent, m) = container.calc_best(&["buy milk", "buy cheese"]).unwrap();
        assert_eq!(sent, "buy milk");
        assert_eq!(m.entities["item"], json!("milk"));
        assert_eq!(m.confidence, 1.0);

        let (sent, _) = container.calc_best(&["buy cheese", "buy milk"]).unwrap();
        assert_eq!(sent, "buy cheese");

        let (sent, m) = container.calc_best(&["buy beer", "buy cheese"]).unwrap();
        assert_eq!(sent, "buy cheese");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_calc_best_skips_long_utterances() {
        let mut container = IntentContainer::with_config(Config {
            max_words: 3,
            ..Config::default()
        })
        .unwrap();
        container.add_intent("say", &["say *"]).unwrap();
        assert!(container.calc_best(&["say one two three"]).is_none());
        assert_eq!(container.calc_best(&["say one"]).unwrap().0, "say one");
        assert!(container.calc_best::<&str>(&[]).is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let mut container = container();
        container.add_intent("hello", &["hello"]).unwrap();
        container.add_intent("bye", &["bye"]).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    assert_eq!(container.calc_intent("hello").name.as_deref(), Some("hello"));
                    assert_eq!(container.calc_intent("bye").name.as_deref(), Some("bye"));
                });
            }
        });
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn single_matching_intent_always_wins(
            fillers in proptest::collection::vec("[a-z]{3,8}( [a-z]{3,8}){0,3}", 0..40),
        ) {
            let mut container = container();
            for (idx, template) in fillers.iter().enumerate() {
                container.add_intent(&format!("filler_{idx}"), &[template]).unwrap();
            }
            container.add_intent("target", &["set timer for {minutes:int} minutes"]).unwrap();

            let m = container.calc_intent("set timer for 42 minutes");
            prop_assert_eq!(m.name.as_deref(), Some("target"));
            prop_assert_eq!(&m.entities["minutes"], &json!(42));
        }
    }
}
