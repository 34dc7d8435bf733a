//! String similarity used by fuzzy scoring

/// Similarity ratio between two strings (0.0-1.0).
///
/// `2 * LCS / (len(a) + len(b))` over characters: symmetric, and 1.0 for
/// identical strings.
pub fn fuzzy_match(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let common = lcs_len(a, b);
    let total_len = a.chars().count() + b.chars().count();

    (2.0 * common as f64) / total_len as f64
}

/// Length of the longest common subsequence of two strings, in characters.
///
/// Single-row table over the shorter string; `diagonal` carries the cell
/// above-left that the row has already overwritten.
fn lcs_len(a: &str, b: &str) -> usize {
    let (outer, inner) = if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let inner: Vec<char> = inner.chars().collect();
    let mut row = vec![0usize; inner.len() + 1];

    for x in outer.chars() {
        let mut diagonal = 0;
        for (j, &y) in inner.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }

    row[inner.len()]
}
