//! Trigram similarity compatible with PostgreSQL's `pg_trgm`
//!
//! Lets the in-memory store rank fuzzy matches the same way the Postgres store
//! does, so tests written against one hold for the other.
//!
//! Text is lower-cased one character at a time and split into words on non-alphanumeric characters.
//! Every word is padded with two spaces in front and one behind, and the
//! distinct 3-character windows of all padded words form the trigram set.
//! Similarity is the Jaccard index of two trigram sets.
//!
//! ```
//! use taxadb::similarity::{similarity, trigrams};
//!
//! assert_eq!(trigrams("cat").len(), 4); // "  c", " ca", "cat", "at "
//! assert!((similarity("word", "two words") - 4.0 / 11.0).abs() < 1e-6);
//! ```

use std::collections::HashSet;

pub type Trigram = [char; 3];

/// Distinct trigrams of `text`
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();

    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = std::iter::repeat(' ')
            .take(2)
            .chain(word.chars().map(fold_case))
            .chain(std::iter::once(' '))
            .collect();

        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }

    set
}

/// Lower-case to exactly one char, like a per-character `towlower`
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Similarity of two strings in `[0, 1]`; 0 when either has no trigrams
pub fn similarity(a: &str, b: &str) -> f32 {
    let left = trigrams(a);
    let right = trigrams(b);

    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let shared = left.intersection(&right).count();
    let union = left.len() + right.len() - shared;

    shared as f32 / union as f32
}

/// The `%` operator: true when similarity reaches `threshold`
pub fn is_similar(a: &str, b: &str, threshold: f32) -> bool {
    similarity(a, b) >= threshold
}
