//! Property tests for the running tick statistic.

use amp_latency::Stat;
use proptest::prelude::*;

proptest! {
    #[test]
    fn update_tracks_count_sum_min_max(values in prop::collection::vec(any::<u32>(), 0..256)) {
        let mut stat = Stat::new();
        for &v in &values {
            stat.update(u64::from(v));
        }

        prop_assert_eq!(stat.count, values.len() as u64);
        prop_assert_eq!(stat.sum, values.iter().map(|&v| u64::from(v)).sum::<u64>());
        match (values.iter().min(), values.iter().max()) {
            (Some(&min), Some(&max)) => {
                prop_assert_eq!(stat.min, u64::from(min));
                prop_assert_eq!(stat.max, u64::from(max));
                let mean = stat.mean().unwrap();
                prop_assert!(stat.min as f64 <= mean && mean <= stat.max as f64);
            }
            _ => {
                prop_assert!(stat.is_empty());
                prop_assert_eq!(stat.mean(), None);
            }
        }
    }

    #[test]
    fn collecting_matches_updating(values in prop::collection::vec(0u64..1_000_000, 0..64)) {
        let mut by_update = Stat::new();
        for &v in &values {
            by_update.update(v);
        }
        let collected: Stat = values.iter().copied().collect();
        prop_assert_eq!(collected, by_update);
    }

    #[test]
    fn mean_ns_scales_linearly(v in 1u64..1_000_000, ns_per_tick in 0.1f64..100.0) {
        let stat: Stat = [v].into_iter().collect();
        let ns = stat.mean_ns(ns_per_tick).unwrap();
        prop_assert!((ns - v as f64 * ns_per_tick).abs() < 1e-6 * ns.max(1.0));
    }
}

#[test]
fn single_value_is_min_max_and_mean() {
    let stat: Stat = [7].into_iter().collect();
    assert_eq!((stat.count, stat.sum, stat.min, stat.max), (1, 7, 7, 7));
    assert_eq!(stat.mean(), Some(7.0));
}

#[test]
fn empty_stat_never_divides() {
    let stat = Stat::default();
    assert_eq!(stat.count, 0);
    assert_eq!(stat.mean_ns(10.0), None);
}
