//! Core data types for match results

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Captured slot values, keyed by slot name.
pub type Entities = HashMap<String, Value>;

/// Represents the outcome of matching a query against the intents.
///
/// `name` is `None` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub name: Option<String>,
    pub entities: Entities,
    #[serde(rename = "conf")]
    pub confidence: f64,
}

impl IntentMatch {
    pub fn new(name: String, entities: Entities, confidence: f64) -> Self {
        Self {
            name: Some(name),
            entities,
            confidence,
        }
    }

    /// A result carrying no intent.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_match(&self) -> bool {
        self.name.is_some()
    }

    /// Lowercase every slot name, leaving values untouched.
    pub fn lowercase_entities(&mut self) {
        self.entities = std::mem::take(&mut self.entities)
            .into_iter()
            .map(|(key, value)| (key.to_lowercase(), value))
            .collect();
    }
}
