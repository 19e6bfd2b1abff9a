//! Candidate name normalization and similarity
//!
//! Normalization: lowercase, drop punctuation, drop a trailing generational
//! suffix (Jr/Sr/II/III/IV, with or without a leading comma), drop
//! single-letter middle initials, collapse whitespace.
//!
//! Similarity is the longest-common-subsequence ratio
//! `2 * LCS(a, b) / (len(a) + len(b))` over characters: symmetric, in
//! `[0.0, 1.0]`, and `1.0` only for identical strings.

/// Default similarity needed to treat two names as the same person
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

const GENERATIONAL_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

/// Normalize a candidate name for comparison
pub fn normalize_name(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c == ',' { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let mut tokens: Vec<&str> = stripped.split_whitespace().collect();

    if tokens.len() > 1 {
        if let Some(last) = tokens.last() {
            if GENERATIONAL_SUFFIXES.contains(last) {
                tokens.pop();
            }
        }
    }

    // Single-letter middle initials (never the first or last token)
    if tokens.len() > 2 {
        let last = tokens.len() - 1;
        tokens = tokens
            .iter()
            .enumerate()
            .filter(|&(i, t)| i == 0 || i == last || t.chars().count() > 1)
            .map(|(_, t)| *t)
            .collect();
    }

    tokens.join(" ")
}

/// Length of the longest common subsequence of two char slices
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Two-row DP over the shorter string
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let mut prev = vec![0usize; inner.len() + 1];
    let mut curr = vec![0usize; inner.len() + 1];

    for &oc in outer {
        for (j, &ic) in inner.iter().enumerate() {
            curr[j + 1] = if oc == ic {
                prev[j] + 1
            } else {
                curr[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[inner.len()]
}

/// LCS similarity ratio of two strings
///
/// Two empty strings are identical and score 1.0.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    (2 * lcs_len(&a, &b)) as f64 / total as f64
}

/// Decides whether two names refer to the same person
#[derive(Debug, Clone, Copy)]
pub struct NameMatcher {
    threshold: f64,
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl NameMatcher {
    /// Threshold is clamped to `[0.0, 1.0]`
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Compare two already-normalized names
    ///
    /// Empty names never match, not even each other.
    pub fn matches_normalized(&self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        a == b || similarity(a, b) >= self.threshold
    }

    /// Normalize and compare two raw names
    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.matches_normalized(&normalize_name(a), &normalize_name(b))
    }
}
