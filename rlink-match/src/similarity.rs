//! Token-order-insensitive string similarity on a 0-100 scale
//!
//! Both strings are pre-processed the same way before comparison:
//! Latin-1 supplement code points are dropped, every non-word character
//! becomes a space, text is lower-cased, and the whitespace-separated
//! tokens are sorted and re-joined. "silva jose" and "jose silva" therefore
//! score 100.
//!
//! Identical processed strings always score 100 (two empty strings
//! included); otherwise an empty side scores 0.

use rlink_common::config::ScorerKind;

/// Sort the word tokens of a string into a canonical order
pub fn sorted_tokens(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| !('\u{80}'..='\u{ff}').contains(c))
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    let lowered = cleaned.to_lowercase();
    let mut tokens: Vec<&str> = lowered.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Length of the longest common subsequence, in characters
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Indel similarity: 1 - (insertions + deletions) / (len_a + len_b)
pub fn indel_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Scale a 0.0-1.0 similarity to 0-100, rounding half to even
fn percent(similarity: f64) -> u8 {
    (similarity * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

/// Similarity of two free-text fields with the configured scorer
pub fn similarity(kind: ScorerKind, a: &str, b: &str) -> u8 {
    let a = sorted_tokens(a);
    let b = sorted_tokens(b);
    if a == b {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let raw = match kind {
        ScorerKind::TokenSort => indel_similarity(&a, &b),
        ScorerKind::TokenSortLevenshtein => strsim::normalized_levenshtein(&a, &b),
        ScorerKind::TokenSortJaroWinkler => strsim::jaro_winkler(&a, &b),
    };
    percent(raw)
}

/// Default scorer: sorted-token indel ratio
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    similarity(ScorerKind::TokenSort, a, b)
}
