//! Intent matcher - scores a query against the variants of one intent and
//! picks the best result across intents

use crate::entities::EntityTable;
use crate::pattern::match_template;
use crate::registry::PatternRegistry;
use crate::similarity::fuzzy_match;
use crate::types::{Entities, IntentMatch};

/// Penalty for variants containing a `*` wildcard.
pub const WILDCARD_PENALTY: f64 = 0.15;
/// Penalty for matching only when case is ignored.
pub const CASE_MISMATCH_PENALTY: f64 = 0.05;
/// Penalty for a captured slot with no registered entity (cased match).
pub const UNKNOWN_ENTITY_PENALTY: f64 = 0.04;
/// Same, for an uncased match.
pub const UNKNOWN_ENTITY_PENALTY_UNCASED: f64 = 0.05;
/// Starting penalty of a fuzzy match.
pub const FUZZY_BASE_PENALTY: f64 = 0.25;

const FUZZY_WILDCARD_PENALTY: f64 = 0.1;
const FUZZY_CAPTURE_PENALTY: f64 = 0.05;
const FUZZY_LENGTH_PENALTY: f64 = 0.01;

/// Match `query` against the variants of one intent, longest first.
///
/// For each variant the cased, uncased and (if `fuzz`) fuzzy tiers are tried
/// in order; the first tier that matches any variant decides the result.
pub fn score_intent(
    query: &str,
    intent: &str,
    variants: &[String],
    registry: &PatternRegistry,
    fuzz: bool,
) -> Option<IntentMatch> {
    let entities = registry.entities();

    for variant in variants {
        let base = if variant.contains('*') {
            WILDCARD_PENALTY
        } else {
            0.0
        };

        if let Some(captured) = registry
            .matcher(variant, true)
            .and_then(|matcher| matcher.matches(query))
        {
            let penalty = base + slot_penalties(entities, &captured, UNKNOWN_ENTITY_PENALTY);
            return Some(IntentMatch::new(intent.to_string(), captured, 1.0 - penalty));
        }

        if let Some(captured) = registry
            .matcher(variant, false)
            .and_then(|matcher| matcher.matches(query))
        {
            let penalty = base
                + CASE_MISMATCH_PENALTY
                + slot_penalties(entities, &captured, UNKNOWN_ENTITY_PENALTY_UNCASED);
            return Some(IntentMatch::new(intent.to_string(), captured, 1.0 - penalty));
        }

        if fuzz {
            for alternative in fuzzed(variant) {
                if let Some(captured) =
                    match_template(&alternative, query, false, registry.types())
                {
                    let confidence = fuzzy_confidence(query, &alternative);
                    return Some(IntentMatch::new(intent.to_string(), captured, confidence));
                }
            }
        }
    }

    None
}

fn slot_penalties(entities: &EntityTable, captured: &Entities, unknown: f64) -> f64 {
    captured
        .iter()
        .map(|(slot, value)| entities.slot_penalty(slot, value, unknown))
        .sum()
}

/// Loosened alternatives of a variant: each plain word replaced by `*` in
/// turn, plus the variant with a leading and a trailing `*`.
pub fn fuzzed(variant: &str) -> Vec<String> {
    let words: Vec<&str> = variant.split(' ').collect();
    let mut alternatives: Vec<String> = (0..words.len())
        .filter(|&idx| !words[idx].contains('{') && !words[idx].contains('}'))
        .map(|idx| {
            let mut loosened = words.clone();
            loosened[idx] = "*";
            loosened.join(" ")
        })
        .collect();
    alternatives.push(format!("* {variant}"));
    alternatives.push(format!("{variant} *"));
    alternatives
}

/// Confidence of a fuzzy match of `query` against the loosened `alternative`.
pub fn fuzzy_confidence(query: &str, alternative: &str) -> f64 {
    let mut penalty = FUZZY_BASE_PENALTY;
    if alternative.contains('*') {
        penalty += FUZZY_WILDCARD_PENALTY;
    }
    if alternative.contains('{') {
        penalty += FUZZY_CAPTURE_PENALTY;
    }
    let diff = alternative
        .chars()
        .count()
        .saturating_sub(query.chars().count());
    penalty += diff as f64 * FUZZY_LENGTH_PENALTY;

    let base_score = 1.0 - (1.0 - penalty).max(0.0);
    let similarity = fuzzy_match(alternative, query);
    (similarity + base_score) / 2.0
}

/// Pick the highest-confidence result.
///
/// Ties on exactly equal confidence go to the lexicographically smallest
/// intent name. Slot names of the winner are lowercased.
pub fn select_best(results: Vec<IntentMatch>) -> IntentMatch {
    let named: Vec<IntentMatch> = results.into_iter().filter(IntentMatch::is_match).collect();
    if named.is_empty() {
        tracing::info!("No match");
        return IntentMatch::none();
    }

    let best_conf = named
        .iter()
        .map(|m| m.confidence)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut ties: Vec<IntentMatch> = named
        .into_iter()
        .filter(|m| m.confidence == best_conf)
        .collect();

    if ties.len() > 1 {
        let names: Vec<&str> = ties.iter().filter_map(|m| m.name.as_deref()).collect();
        tracing::info!(?names, confidence = best_conf, "tied intents");
    }

    ties.sort_by(|a, b| a.name.cmp(&b.name));
    let mut best = ties.swap_remove(0);
    best.lowercase_entities();
    tracing::debug!(?best);
    best
}
