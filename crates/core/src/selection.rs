//! Randomised decisions taken once per request: which model group to
//! apply and whether floor signalling is skipped.
//!
//! Randomness is injected as a `draw(n) -> [0, n)` function so the
//! decisions are deterministic under test. Production code passes
//! [`random_draw`].

use rand::Rng;

use crate::rules::ModelGroup;
use crate::validation::RATE_MAX;

/// Uniform draw in `[0, n)` from the thread-local RNG. Returns 0 for `n <= 0`.
pub fn random_draw(n: i32) -> i32 {
    if n <= 0 {
        return 0;
    }
    rand::rng().random_range(0..n)
}

/// Pick one model group by weight and reduce `groups` to it.
///
/// Mutates `groups` in place: missing weights are set to 1, the list is
/// stable-sorted by ascending weight, the winner is swapped to index 0
/// and the list truncated to that single group.
pub fn select_floor_model_group(groups: &mut Vec<ModelGroup>, mut draw: impl FnMut(i32) -> i32) {
    if groups.is_empty() {
        return;
    }

    let mut total = 0;
    for group in groups.iter_mut() {
        let weight = *group.model_weight.get_or_insert(1);
        total += weight;
    }

    groups.sort_by_key(ModelGroup::weight);

    let mut remaining = draw(total + 1);
    let winner = groups
        .iter()
        .position(|group| {
            remaining -= group.weight();
            remaining <= 0
        })
        .unwrap_or(0);

    groups.swap(0, winner);
    groups.truncate(1);
}

/// Decide whether floor signalling is skipped for this request.
///
/// The first non-zero rate among model group, data and root wins; a rate
/// of zero never skips.
pub fn should_skip_floors(
    model_group_rate: i32,
    data_rate: i32,
    root_rate: i32,
    mut draw: impl FnMut(i32) -> i32,
) -> bool {
    let rate = [model_group_rate, data_rate]
        .into_iter()
        .find(|rate| *rate > 0)
        .unwrap_or(root_rate);

    if rate == 0 {
        return false;
    }
    rate >= draw(RATE_MAX + 1)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(version: &str, weight: Option<i32>) -> ModelGroup {
        ModelGroup {
            model_version: version.into(),
            model_weight: weight,
            ..Default::default()
        }
    }

    // -- select_floor_model_group ---------------------------------------------

    #[test]
    fn single_group_is_kept() {
        let mut groups = vec![weighted("only", None)];
        select_floor_model_group(&mut groups, |_| 0);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].model_version, "only");
        assert_eq!(groups[0].model_weight, Some(1));
    }

    #[test]
    fn draw_walks_groups_in_ascending_weight() {
        // Sorted order: b(10), c(30), a(60); total 100, draw range [0, 101).
        let make = || {
            vec![
                weighted("a", Some(60)),
                weighted("b", Some(10)),
                weighted("c", Some(30)),
            ]
        };

        let pick = |n: i32| {
            let mut groups = make();
            select_floor_model_group(&mut groups, move |_| n);
            groups[0].model_version.clone()
        };

        assert_eq!(pick(0), "b");
        assert_eq!(pick(10), "b");
        assert_eq!(pick(11), "c");
        assert_eq!(pick(40), "c");
        assert_eq!(pick(41), "a");
        assert_eq!(pick(100), "a");
    }

    #[test]
    fn draw_receives_total_weight_plus_one() {
        let mut groups = vec![weighted("a", Some(50)), weighted("b", None)];
        let mut seen = 0;
        select_floor_model_group(&mut groups, |n| {
            seen = n;
            0
        });
        assert_eq!(seen, 52);
    }

    #[test]
    fn equal_weights_deterministic_for_fixed_draw() {
        let run = || {
            let mut groups = vec![weighted("first", Some(50)), weighted("second", Some(50))];
            select_floor_model_group(&mut groups, |_| 75);
            groups[0].model_version.clone()
        };
        let winner = run();
        assert_eq!(winner, "second");
        for _ in 0..10 {
            assert_eq!(run(), winner);
        }
    }

    #[test]
    fn empty_groups_untouched() {
        let mut groups: Vec<ModelGroup> = Vec::new();
        select_floor_model_group(&mut groups, |_| 0);
        assert!(groups.is_empty());
    }

    // -- should_skip_floors ---------------------------------------------------

    #[test]
    fn zero_rates_never_skip() {
        for n in [0, 50, 100] {
            assert!(!should_skip_floors(0, 0, 0, |_| n));
        }
    }

    #[test]
    fn full_rate_always_skips() {
        for n in 0..=100 {
            assert!(should_skip_floors(100, 0, 0, |_| n));
        }
    }

    #[test]
    fn model_group_rate_takes_priority() {
        // Group rate 10 is used even though data rate 90 would skip.
        assert!(!should_skip_floors(10, 90, 0, |_| 50));
        // Data rate used when group rate is zero.
        assert!(should_skip_floors(0, 90, 0, |_| 50));
        // Root rate used last.
        assert!(!should_skip_floors(0, 0, 20, |_| 50));
        assert!(should_skip_floors(0, 0, 60, |_| 50));
    }

    #[test]
    fn skip_draws_from_zero_to_hundred() {
        let mut seen = 0;
        should_skip_floors(5, 0, 0, |n| {
            seen = n;
            0
        });
        assert_eq!(seen, 101);
    }

    #[test]
    fn random_draw_stays_in_range() {
        for _ in 0..1000 {
            let n = random_draw(101);
            assert!((0..101).contains(&n));
        }
        assert_eq!(random_draw(0), 0);
    }
}
