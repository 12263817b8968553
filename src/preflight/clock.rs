//! Timer liveness check.
//!
//! A TTC that is not clocked (or left disabled by earlier firmware) reads zero
//! forever, which would turn every latency sample into a zero.

use super::PreflightWarning;
use crate::measurement::{CounterId, HardwareClock};

/// Reads attempted before declaring a counter stalled.
pub const CLOCK_POLL_LIMIT: u32 = 100_000;

/// Reset `counter` and poll until it moves.
///
/// Leaves the counter running.
pub fn check_clock(clock: &HardwareClock, counter: CounterId) -> Option<PreflightWarning> {
    clock.reset(counter);
    for _ in 0..CLOCK_POLL_LIMIT {
        if clock.read(counter) != 0 {
            return None;
        }
        std::hint::spin_loop();
    }
    Some(PreflightWarning::ClockStalled {
        counter: counter.0,
        polls: CLOCK_POLL_LIMIT,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{IoRegion, MemRegion};
    use std::sync::Arc;

    #[test]
    fn frozen_register_is_stalled() {
        let region = Arc::new(MemRegion::new(0x40));
        let clock = HardwareClock::new(region);
        assert!(matches!(
            check_clock(&clock, CounterId(2)),
            Some(PreflightWarning::ClockStalled { counter: 2, .. })
        ));
    }

    #[test]
    fn nonzero_count_passes() {
        let region = Arc::new(MemRegion::new(0x40));
        region.write32(CounterId(2).count_value(), 5);
        let clock = HardwareClock::new(region);
        assert_eq!(check_clock(&clock, CounterId(2)), None);
    }
}
