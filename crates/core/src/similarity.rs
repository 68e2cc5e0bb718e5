//! Word-overlap similarity used to keep near-duplicate questions out of the bank.

use std::collections::HashSet;

/// Threshold at which two question texts count as the same question.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard index of the lower-cased word sets of `a` and `b`, in `0.0..=1.0`.
///
/// Two texts without any words score 0.0.
#[must_use]
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    let left = word_set(a);
    let right = word_set(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(&right).count();
    #[allow(clippy::cast_precision_loss)]
    let ratio = intersection as f64 / union as f64;
    ratio
}

#[must_use]
pub fn is_near_duplicate(a: &str, b: &str, threshold: f64) -> bool {
    jaccard_similarity(a, b) >= threshold
}
