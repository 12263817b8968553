//! Running count/sum/min/max over tick samples.

use serde::{Deserialize, Serialize};

/// Running statistic of tick samples for one direction at one message size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    /// Number of samples folded in.
    pub count: u64,
    /// Sum of all samples.
    pub sum: u64,
    /// Smallest sample (`u64::MAX` while empty).
    pub min: u64,
    /// Largest sample (0 while empty).
    pub max: u64,
}

impl Stat {
    /// An empty statistic.
    pub const fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
        }
    }

    /// Fold one sample in.
    #[inline]
    pub fn update(&mut self, value: u64) {
        self.count += 1;
        self.sum = self.sum.wrapping_add(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Whether no sample has been folded in yet.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Mean in ticks, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }

    /// Mean converted to nanoseconds, `None` when empty.
    pub fn mean_ns(&self, ns_per_tick: f64) -> Option<f64> {
        self.mean().map(|ticks| ticks * ns_per_tick)
    }
}

impl Default for Stat {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<u64> for Stat {
    fn extend<I: IntoIterator<Item = u64>>(&mut self, iter: I) {
        for v in iter {
            self.update(v);
        }
    }
}

impl FromIterator<u64> for Stat {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        let mut stat = Stat::new();
        stat.extend(iter);
        stat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_mean() {
        let stat = Stat::new();
        assert!(stat.is_empty());
        assert_eq!(stat.mean(), None);
        assert_eq!(stat.min, u64::MAX);
        assert_eq!(stat.max, 0);
    }

    #[test]
    fn single_value() {
        let stat: Stat = [42].into_iter().collect();
        assert_eq!(stat.count, 1);
        assert_eq!((stat.min, stat.max, stat.sum), (42, 42, 42));
        assert_eq!(stat.mean(), Some(42.0));
    }

    #[test]
    fn mean_ns_scales_ticks() {
        let stat: Stat = [10, 20, 30].into_iter().collect();
        assert_eq!(stat.mean_ns(10.0), Some(200.0));
    }
}
