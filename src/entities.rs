//! Entity example tables
//!
//! Entities are never compiled into matchers. Their examples only tell the
//! scorer whether a captured value was seen before.

use crate::error::{Error, Result};
use crate::expand::expand;
use ahash::{AHashMap, AHashSet};
use serde_json::Value;

/// Penalty for a captured value that is not among the entity's examples.
pub const UNSEEN_EXAMPLE_PENALTY: f64 = 0.1;

/// Lowercased entity name -> expanded examples.
#[derive(Debug, Default, Clone)]
pub struct EntityTable {
    samples: AHashMap<String, Vec<String>>,
    lookup: AHashMap<String, AHashSet<String>>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity. Examples are expanded but not normalized.
    pub fn add<S: AsRef<str>>(&mut self, name: &str, examples: &[S]) -> Result<()> {
        let name = name.to_lowercase();
        if self.samples.contains_key(&name) {
            return Err(Error::DuplicateEntity(name));
        }
        let expanded: Vec<String> = examples
            .iter()
            .flat_map(|example| expand(example.as_ref()))
            .collect();
        tracing::debug!(entity = %name, examples = expanded.len(), "Registered entity");
        self.lookup
            .insert(name.clone(), expanded.iter().cloned().collect());
        self.samples.insert(name, expanded);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) {
        let name = name.to_lowercase();
        self.samples.remove(&name);
        self.lookup.remove(&name);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(&name.to_lowercase())
    }

    pub fn examples(&self, name: &str) -> Option<&[String]> {
        self.samples.get(&name.to_lowercase()).map(Vec::as_slice)
    }

    /// Penalty for one captured slot: `unknown` if no entity has the slot's
    /// name, [`UNSEEN_EXAMPLE_PENALTY`] if the value is not a known example.
    pub fn slot_penalty(&self, slot: &str, value: &Value, unknown: f64) -> f64 {
        match self.lookup.get(&slot.to_lowercase()) {
            None => unknown,
            Some(known) if !known.contains(&value_text(value)) => UNSEEN_EXAMPLE_PENALTY,
            Some(_) => 0.0,
        }
    }
}

/// Text form of a captured value as compared against examples.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
