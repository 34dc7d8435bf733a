//! Template matching primitive
//!
//! A variant such as `"* number {number:int}"` is compiled into an anchored
//! regex. `*` and `{}` are wildcards, `{name}` captures any run of text and
//! `{name:type}` captures text matching a registered [`CaptureType`].

use crate::error::{Error, Result};
use crate::types::Entities;
use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::{Number, Value};

/// Name of the capture type backing the `:0` shorthand.
pub const WORD_TYPE: &str = "word";
const WORD_PATTERN: &str = "[a-zA-Z0-9]+";

const WILDCARD: &str = ".*";
const UNTYPED_CAPTURE: &str = ".*?";

/// How a captured substring is turned into a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Text,
    Int,
    Float,
}

impl Conversion {
    fn convert(self, raw: &str) -> Value {
        match self {
            Conversion::Text => Value::String(raw.to_string()),
            Conversion::Int => raw
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(raw.to_string())),
            Conversion::Float => raw
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string())),
        }
    }
}

/// A named capture type usable as `{slot:type}`.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureType {
    pub pattern: String,
    pub conversion: Conversion,
}

impl CaptureType {
    pub fn new(pattern: impl Into<String>, conversion: Conversion) -> Self {
        Self {
            pattern: pattern.into(),
            conversion,
        }
    }
}

static BUILTIN_TYPES: Lazy<AHashMap<&'static str, CaptureType>> = Lazy::new(|| {
    let mut types = AHashMap::new();
    types.insert("int", CaptureType::new(r"[+-]?[0-9]+", Conversion::Int));
    types.insert(
        "float",
        CaptureType::new(r"[+-]?(?:[0-9]*\.)?[0-9]+", Conversion::Float),
    );
    types.insert("letters", CaptureType::new(r"[a-zA-Z]+", Conversion::Text));
    types.insert(
        "identifier",
        CaptureType::new(r"[a-zA-Z_][a-zA-Z0-9_]*", Conversion::Text),
    );
    types
});

/// Table of capture types known to a matcher.
#[derive(Debug, Clone)]
pub struct Types {
    table: AHashMap<String, CaptureType>,
}

impl Default for Types {
    fn default() -> Self {
        let table = BUILTIN_TYPES
            .iter()
            .map(|(name, kind)| (name.to_string(), kind.clone()))
            .collect();
        Self { table }
    }
}

impl Types {
    /// Built-in types plus `word`.
    pub fn with_word() -> Self {
        let mut types = Self::default();
        types.ensure_word();
        types
    }

    /// Register the `word` type unless already present.
    pub fn ensure_word(&mut self) {
        if !self.contains(WORD_TYPE) {
            tracing::debug!("Registering `{}` type", WORD_TYPE);
            self.register(WORD_TYPE, WORD_PATTERN, Conversion::Text);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CaptureType> {
        self.table.get(name)
    }

    /// Register (or replace) a capture type.
    pub fn register(&mut self, name: &str, pattern: &str, conversion: Conversion) {
        self.table
            .insert(name.to_string(), CaptureType::new(pattern, conversion));
    }
}

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    conversion: Conversion,
}

/// A compiled template, reusable across many inputs.
#[derive(Debug, Clone)]
pub struct Matcher {
    template: String,
    regex: Regex,
    slots: Vec<Slot>,
}

impl Matcher {
    pub fn compile(template: &str, case_sensitive: bool, types: &Types) -> Result<Self> {
        let (source, slots) = translate(template, types);
        let regex = RegexBuilder::new(&source)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|source| Error::Pattern {
                template: template.to_string(),
                source,
            })?;
        Ok(Self {
            template: template.to_string(),
            regex,
            slots,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Match the whole input. Returns the captured slots, or `None`.
    pub fn matches(&self, input: &str) -> Option<Entities> {
        let captures = self.regex.captures(input)?;
        let mut entities = Entities::new();
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(m) = captures.name(&group_name(idx)) {
                entities.insert(slot.name.clone(), slot.conversion.convert(m.as_str()));
            }
        }
        Some(entities)
    }
}

/// One-shot match without keeping the compiled template around.
pub fn match_template(
    template: &str,
    input: &str,
    case_sensitive: bool,
    types: &Types,
) -> Option<Entities> {
    match Matcher::compile(template, case_sensitive, types) {
        Ok(matcher) => matcher.matches(input),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

fn group_name(idx: usize) -> String {
    format!("s{idx}")
}

/// Translate a template into an anchored regex source and its slot list.
///
/// Slots get generated group names so any slot name is accepted.
fn translate(template: &str, types: &Types) -> (String, Vec<Slot>) {
    let mut source = String::from("^(?:");
    let mut slots = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        if c == '*' {
            source.push_str(&regex::escape(&std::mem::take(&mut literal)));
            source.push_str(WILDCARD);
            rest = &rest[1..];
            continue;
        }
        if c == '{' {
            if let Some(end) = rest.find('}') {
                source.push_str(&regex::escape(&std::mem::take(&mut literal)));
                source.push_str(&capture(&rest[1..end], types, &mut slots));
                rest = &rest[end + 1..];
                continue;
            }
        }
        literal.push(c);
        rest = &rest[c.len_utf8()..];
    }

    source.push_str(&regex::escape(&literal));
    source.push_str(")$");
    (source, slots)
}

fn capture(body: &str, types: &Types, slots: &mut Vec<Slot>) -> String {
    let body = body.trim();
    if body.is_empty() {
        return UNTYPED_CAPTURE.to_string();
    }

    let (name, kind) = match body.split_once(':') {
        Some((name, type_name)) => {
            let kind = types.get(type_name.trim());
            if kind.is_none() {
                tracing::warn!("Unknown capture type {:?}, capturing as text", type_name);
            }
            (name.trim(), kind)
        }
        None => (body, None),
    };

    let (pattern, conversion) = match kind {
        Some(kind) => (kind.pattern.as_str(), kind.conversion),
        None => (UNTYPED_CAPTURE, Conversion::Text),
    };
    let group = format!("(?P<{}>{})", group_name(slots.len()), pattern);
    slots.push(Slot {
        name: name.to_string(),
        conversion,
    });
    group
}
