//! Wildcard rule matching.
//!
//! A request yields one concrete value per schema dimension. Rules may
//! wildcard any subset of dimensions, so lookup walks every combination
//! from most to least specific and stops at the first rule present.

use std::collections::{HashMap, HashSet};

use crate::rules::WILDCARD;

/// Specificity weight of a set of wildcarded positions.
///
/// Position `i` of `n` weighs `2^(n - i)`, so wildcarding a position
/// outweighs wildcarding every position to its right combined.
fn wildcard_weight(positions: &[usize], n: usize) -> u64 {
    positions.iter().map(|&i| 1u64 << (n - i)).sum()
}

/// Every subset of `0..n` with exactly `size` members, least specific
/// (leftmost wildcards) last.
fn wildcard_subsets(n: usize, size: usize) -> Vec<Vec<usize>> {
    let mut subsets: Vec<Vec<usize>> = (1u64..(1u64 << n))
        .filter(|bits| bits.count_ones() as usize == size)
        .map(|bits| (0..n).filter(|i| (bits >> i) & 1 == 1).collect())
        .collect();
    subsets.sort_by_key(|subset| wildcard_weight(subset, n));
    subsets
}

/// Build the ordered list of candidate rule keys for one set of values.
///
/// The fully concrete key comes first and the fully wildcarded key last.
/// Values are lower-cased. Keys that collapse onto an earlier one (a value
/// that already is the wildcard) are emitted once.
pub fn prepare_rule_combinations(values: &[String], delimiter: &str) -> Vec<String> {
    let n = values.len();
    let concrete: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();

    let mut keys = Vec::with_capacity(1 << n);
    let mut seen = HashSet::with_capacity(1 << n);
    let mut push = |parts: &[String]| {
        let key = parts.join(delimiter);
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    };

    push(&concrete);
    for size in 1..=n {
        for subset in wildcard_subsets(n, size) {
            let mut parts = concrete.clone();
            for i in subset {
                parts[i] = WILDCARD.to_string();
            }
            push(&parts);
        }
    }

    keys
}

/// Find the most specific rule matching `desired`.
///
/// Returns the matched key, or `None` when not even the fully wildcarded
/// key is present (callers then fall back to the group default).
pub fn find_rule(
    rules: &HashMap<String, f64>,
    delimiter: &str,
    desired: &[String],
) -> Option<String> {
    prepare_rule_combinations(desired, delimiter)
        .into_iter()
        .find(|key| rules.contains_key(key))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
