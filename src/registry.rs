//! Pattern registry
//!
//! Holds the expanded variants of every intent, the entity example tables,
//! and a cased and an uncased compiled [`Matcher`] per variant.

use crate::entities::EntityTable;
use crate::error::{Error, Result};
use crate::expand::{expand, normalize_example};
use crate::pattern::{Conversion, Matcher, Types};
use ahash::{AHashMap, AHashSet};
use parking_lot::RwLock;
use std::sync::Arc;

type MatcherTable = RwLock<AHashMap<String, Arc<Matcher>>>;

/// Intent name -> variants (longest first), plus compiled matchers.
///
/// Mutation takes `&mut self`; lookups take `&self` and may repair a missing
/// matcher, which is why the matcher tables sit behind locks.
#[derive(Debug)]
pub struct PatternRegistry {
    types: Types,
    intents: AHashMap<String, Vec<String>>,
    entities: EntityTable,
    cased: MatcherTable,
    uncased: MatcherTable,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternRegistry {
    pub fn new() -> Self {
        Self {
            types: Types::with_word(),
            intents: AHashMap::new(),
            entities: EntityTable::new(),
            cased: RwLock::new(AHashMap::new()),
            uncased: RwLock::new(AHashMap::new()),
        }
    }

    pub fn types(&self) -> &Types {
        &self.types
    }

    /// Register a capture type for variants compiled from now on.
    pub fn register_type(&mut self, name: &str, pattern: &str, conversion: Conversion) {
        self.types.register(name, pattern, conversion);
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn add_intent<S: AsRef<str>>(&mut self, name: &str, templates: &[S]) -> Result<()> {
        if self.intents.contains_key(name) {
            return Err(Error::DuplicateIntent(name.to_string()));
        }

        let mut seen = AHashSet::new();
        let mut variants: Vec<String> = templates
            .iter()
            .flat_map(|template| expand(&normalize_example(template.as_ref())))
            .filter(|variant| seen.insert(variant.clone()))
            .collect();
        variants.sort_by_key(|variant| std::cmp::Reverse(variant.chars().count()));

        // Compile everything before touching the tables
        let mut compiled = Vec::with_capacity(variants.len());
        for variant in &variants {
            let cased = Matcher::compile(variant, true, &self.types)?;
            let uncased = Matcher::compile(variant, false, &self.types)?;
            compiled.push((variant.clone(), Arc::new(cased), Arc::new(uncased)));
        }

        {
            let mut cased_table = self.cased.write();
            let mut uncased_table = self.uncased.write();
            for (variant, cased, uncased) in compiled {
                cased_table.insert(variant.clone(), cased);
                uncased_table.insert(variant, uncased);
            }
        }

        tracing::debug!(intent = %name, variants = variants.len(), "Registered intent");
        self.intents.insert(name.to_string(), variants);
        Ok(())
    }

    /// Remove an intent and evict its matchers. Returns whether it existed.
    pub fn remove_intent(&mut self, name: &str) -> bool {
        let Some(variants) = self.intents.remove(name) else {
            return false;
        };

        let still_used: AHashSet<&String> = self.intents.values().flatten().collect();
        let mut cased_table = self.cased.write();
        let mut uncased_table = self.uncased.write();
        for variant in variants.iter().filter(|v| !still_used.contains(v)) {
            cased_table.remove(variant);
            uncased_table.remove(variant);
        }
        tracing::debug!(intent = %name, "Removed intent");
        true
    }

    pub fn add_entity<S: AsRef<str>>(&mut self, name: &str, examples: &[S]) -> Result<()> {
        self.entities.add(name, examples)
    }

    pub fn remove_entity(&mut self, name: &str) {
        self.entities.remove(name);
    }

    /// Variants of an intent, longest first.
    pub fn variants(&self, name: &str) -> Option<&[String]> {
        self.intents.get(name).map(Vec::as_slice)
    }

    pub fn intents(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.intents
            .iter()
            .map(|(name, variants)| (name.as_str(), variants.as_slice()))
    }

    /// Compiled matcher for a variant, recompiled on demand if missing.
    pub fn matcher(&self, variant: &str, case_sensitive: bool) -> Option<Arc<Matcher>> {
        let table = if case_sensitive { &self.cased } else { &self.uncased };
        if let Some(matcher) = table.read().get(variant) {
            return Some(Arc::clone(matcher));
        }

        tracing::warn!("{} not initialized", variant);
        match Matcher::compile(variant, case_sensitive, &self.types) {
            Ok(matcher) => {
                let mut table = table.write();
                let entry = table
                    .entry(variant.to_string())
                    .or_insert_with(|| Arc::new(matcher));
                Some(Arc::clone(entry))
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }

    #[cfg(test)]
    fn evict(&self, variant: &str) {
        self.cased.write().remove(variant);
        self.uncased.write().remove(variant);
    }

    #[cfg(test)]
    fn compiled_keys(&self) -> (AHashSet<String>, AHashSet<String>) {
        (
            self.cased.read().keys().cloned().collect(),
            self.uncased.read().keys().cloned().collect(),
        )
    }
}
