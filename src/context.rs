//! Context and keyword filtering
//!
//! Decides, once per query, which intents must not be scored at all.

use ahash::{AHashMap, AHashSet};

/// Per-intent context and keyword-exclusion tables.
#[derive(Debug, Default, Clone)]
pub struct ContextTables {
    available: AHashMap<String, AHashMap<String, Option<String>>>,
    required: AHashMap<String, AHashSet<String>>,
    excluded: AHashMap<String, AHashSet<String>>,
    keywords: AHashMap<String, AHashSet<String>>,
}

impl ContextTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_context(&mut self, intent: &str, context: &str, value: Option<&str>) {
        self.available
            .entry(intent.to_string())
            .or_default()
            .insert(context.to_string(), value.map(str::to_string));
    }

    pub fn unset_context(&mut self, intent: &str, context: &str) {
        if let Some(contexts) = self.available.get_mut(intent) {
            contexts.remove(context);
        }
    }

    /// Value of an available context; `Some(None)` if set without a value.
    pub fn context(&self, intent: &str, context: &str) -> Option<Option<&str>> {
        self.available
            .get(intent)?
            .get(context)
            .map(|value| value.as_deref())
    }

    pub fn require_context(&mut self, intent: &str, context: &str) {
        insert(&mut self.required, intent, context);
    }

    pub fn unrequire_context(&mut self, intent: &str, context: &str) {
        remove(&mut self.required, intent, context);
    }

    pub fn exclude_context(&mut self, intent: &str, context: &str) {
        insert(&mut self.excluded, intent, context);
    }

    pub fn unexclude_context(&mut self, intent: &str, context: &str) {
        remove(&mut self.excluded, intent, context);
    }

    /// Skip `intent` for any query containing one of `keywords`.
    pub fn exclude_keywords<S: AsRef<str>>(&mut self, intent: &str, keywords: &[S]) {
        for keyword in keywords {
            insert(&mut self.keywords, intent, keyword.as_ref());
        }
    }

    /// Drop every entry held for `intent`.
    pub fn clear_intent(&mut self, intent: &str) {
        self.available.remove(intent);
        self.required.remove(intent);
        self.excluded.remove(intent);
        self.keywords.remove(intent);
    }

    /// Names of intents to skip for `query`.
    pub fn filter(&self, query: &str) -> AHashSet<String> {
        let mut skipped = AHashSet::new();

        for (intent, keywords) in &self.keywords {
            if keywords.iter().any(|keyword| query.contains(keyword.as_str())) {
                skipped.insert(intent.clone());
            }
        }

        for (intent, required) in &self.required {
            let satisfied = self
                .available
                .get(intent)
                .is_some_and(|available| required.iter().all(|c| available.contains_key(c)));
            if !satisfied {
                skipped.insert(intent.clone());
            }
        }

        for (intent, excluded) in &self.excluded {
            let Some(available) = self.available.get(intent) else {
                continue;
            };
            if excluded.iter().any(|c| available.contains_key(c)) {
                skipped.insert(intent.clone());
            }
        }

        skipped
    }
}

fn insert(table: &mut AHashMap<String, AHashSet<String>>, intent: &str, item: &str) {
    table
        .entry(intent.to_string())
        .or_default()
        .insert(item.to_string());
}

fn remove(table: &mut AHashMap<String, AHashSet<String>>, intent: &str, item: &str) {
    if let Some(items) = table.get_mut(intent) {
        items.remove(item);
        if items.is_empty() {
            table.remove(intent);
        }
    }
}
