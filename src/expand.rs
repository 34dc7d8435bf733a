//! Template expansion
//!
//! Turns an author-written template such as `"will it (rain|pour) [today]"`
//! into every literal variant it describes. `(A|B)` is an alternation, `[A]`
//! is shorthand for `(A|)`, and a group with a single branch is kept
//! literally, parentheses included.

use ahash::AHashSet;
use std::str::Chars;

/// A parsed piece of a template.
#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Word(String),
    /// Alternation; every branch is a sequence of fragments.
    Group(Vec<Vec<Fragment>>),
}

/// Recursive-descent parser over the characters of one template.
struct Parser<'a> {
    chars: Chars<'a>,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            chars: template.chars(),
        }
    }

    /// Parse branches until the next `)` or the end of input. At the top
    /// level a stray `)` ends the parse and the rest is discarded.
    fn parse_branches(&mut self) -> Vec<Vec<Fragment>> {
        let mut branches: Vec<Vec<Fragment>> = vec![Vec::new()];
        let mut literal = String::new();

        while let Some(c) = self.chars.next() {
            match c {
                '(' => {
                    let current = current_branch(&mut branches);
                    flush(current, &mut literal);
                    let mut inner = self.parse_branches();
                    if inner.len() == 1 {
                        // Not an alternation: keep the parentheses as text
                        current.push(Fragment::Word("(".to_string()));
                        current.append(&mut inner[0]);
                        current.push(Fragment::Word(")".to_string()));
                    } else {
                        current.push(Fragment::Group(inner));
                    }
                }
                '|' => {
                    flush(current_branch(&mut branches), &mut literal);
                    branches.push(Vec::new());
                }
                ')' => break,
                _ => literal.push(c),
            }
        }

        flush(current_branch(&mut branches), &mut literal);
        branches
    }
}

fn current_branch(branches: &mut [Vec<Fragment>]) -> &mut Vec<Fragment> {
    let last = branches.len() - 1;
    &mut branches[last]
}

fn flush(branch: &mut Vec<Fragment>, literal: &mut String) {
    if !literal.is_empty() {
        branch.push(Fragment::Word(std::mem::take(literal)));
    }
}

/// Cartesian product of a fragment sequence: for each fragment left to
/// right, every partial sentence is extended with every expansion of it.
fn expand_sequence(fragments: &[Fragment]) -> Vec<String> {
    let mut sentences = vec![String::new()];
    for fragment in fragments {
        let pieces: Vec<String> = match fragment {
            Fragment::Word(word) => vec![word.clone()],
            Fragment::Group(branches) => branches
                .iter()
                .flat_map(|branch| expand_sequence(branch))
                .collect(),
        };
        sentences = sentences
            .iter()
            .flat_map(|sentence| pieces.iter().map(move |piece| format!("{sentence}{piece}")))
            .collect();
    }
    sentences
}

fn collapse_whitespace(sentence: &str) -> String {
    sentence.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Expand a template into its distinct literal variants.
///
/// Output order follows the expansion but carries no meaning; duplicates are
/// removed. Unbalanced parentheses never fail: an unclosed group ends at the
/// end of the template, and an unmatched `)` ends the template.
pub fn expand(template: &str) -> Vec<String> {
    let rewritten = template.replace('[', "(").replace(']', "|)");
    let branches = Parser::new(&rewritten).parse_branches();

    let mut seen = AHashSet::new();
    branches
        .iter()
        .flat_map(|branch| expand_sequence(branch))
        .map(|sentence| collapse_whitespace(&sentence))
        .filter(|sentence| seen.insert(sentence.clone()))
        .collect()
}

/// Normalize `{{entity}}` escapes to `{entity}`.
pub fn clean_braces(example: &str) -> String {
    example.replace("{{", "{").replace("}}", "}")
}

/// Rewrite standalone `:0` tokens into numbered `{wordN:word}` captures.
pub fn translate_padatious(example: &str) -> String {
    if !example.contains(":0") {
        return example.to_string();
    }
    let mut next = 0;
    example
        .split_whitespace()
        .map(|token| {
            if token == ":0" {
                let capture = format!("{{word{next}:word}}");
                next += 1;
                capture
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalization applied to intent templates before expansion.
pub fn normalize_example(example: &str) -> String {
    clean_braces(&translate_padatious(example))
}
