//! Triple timer counter driven by the host's monotonic clock.

use std::time::Instant;

use parking_lot::Mutex;

use crate::constants::{NS_PER_SEC, TTC_CNT_CNTRL_DIS_MASK, TTC_CNT_CNTRL_RST_MASK};
use crate::hal::IoRegion;
use crate::measurement::CounterId;

const TTC_REGION_SIZE: usize = 0x100;

#[derive(Clone, Copy)]
enum Register {
    ClockControl,
    CountControl,
    CountValue,
}

struct Counter {
    running: bool,
    since: Instant,
    base: u64,
    clock_control: u32,
    count_control: u32,
}

impl Counter {
    fn new(now: Instant) -> Self {
        Self {
            running: true,
            since: now,
            base: 0,
            clock_control: 0,
            count_control: 0,
        }
    }

    fn ticks_at(&self, now: Instant, hz: u64) -> u64 {
        if !self.running {
            return self.base;
        }
        let elapsed = now.saturating_duration_since(self.since).as_nanos();
        self.base + (elapsed * u128::from(hz) / u128::from(NS_PER_SEC)) as u64
    }
}

/// Three free-running counters ticking at `clock_hz`.
///
/// A count-control write freezes the count first, then applies RST (zero)
/// and DIS (stay frozen). Writing without DIS restarts the counter.
pub struct TtcRegion {
    clock_hz: u64,
    counters: Mutex<[Counter; 3]>,
}

impl TtcRegion {
    /// A TTC whose counters advance at `clock_hz`. Zero never advances.
    pub fn new(clock_hz: u64) -> Self {
        let now = Instant::now();
        Self {
            clock_hz,
            counters: Mutex::new([Counter::new(now), Counter::new(now), Counter::new(now)]),
        }
    }

    fn decode(offset: usize) -> Option<(usize, Register)> {
        (1u8..=3).find_map(|n| {
            let id = CounterId(n);
            let reg = if offset == id.clock_control() {
                Register::ClockControl
            } else if offset == id.count_control() {
                Register::CountControl
            } else if offset == id.count_value() {
                Register::CountValue
            } else {
                return None;
            };
            Some((usize::from(n - 1), reg))
        })
    }
}

impl IoRegion for TtcRegion {
    fn size(&self) -> usize {
        TTC_REGION_SIZE
    }

    fn read32(&self, offset: usize) -> u32 {
        let Some((idx, reg)) = Self::decode(offset) else {
            return 0;
        };
        let counters = self.counters.lock();
        let c = &counters[idx];
        match reg {
            Register::ClockControl => c.clock_control,
            Register::CountControl => c.count_control,
            // The hardware register is 32 bits wide and wraps.
            Register::CountValue => c.ticks_at(Instant::now(), self.clock_hz) as u32,
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        let Some((idx, reg)) = Self::decode(offset) else {
            return;
        };
        let mut counters = self.counters.lock();
        let c = &mut counters[idx];
        match reg {
            Register::ClockControl => c.clock_control = value,
            Register::CountControl => {
                let now = Instant::now();
                let mut ticks = c.ticks_at(now, self.clock_hz);
                if value & TTC_CNT_CNTRL_RST_MASK != 0 {
                    ticks = 0;
                }
                c.base = ticks;
                c.since = now;
                c.running = value & TTC_CNT_CNTRL_DIS_MASK == 0;
                c.count_control = value & !TTC_CNT_CNTRL_RST_MASK;
            }
            Register::CountValue => {}
        }
    }

    fn block_read(&self, _offset: usize, _buf: &mut [u8]) -> usize {
        0
    }

    fn block_write(&self, _offset: usize, _buf: &[u8]) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_decode_to_counters() {
        assert!(matches!(TtcRegion::decode(0x0), Some((0, Register::ClockControl))));
        assert!(matches!(TtcRegion::decode(0x10), Some((1, Register::CountControl))));
        assert!(matches!(TtcRegion::decode(0x20), Some((2, Register::CountValue))));
        assert!(TtcRegion::decode(0x24).is_none());
    }

    #[test]
    fn clock_control_is_kept_per_counter() {
        let ttc = TtcRegion::new(1_000_000);
        ttc.write32(CounterId(2).clock_control(), 0x5);
        assert_eq!(ttc.read32(CounterId(2).clock_control()), 0x5);
        assert_eq!(ttc.read32(CounterId(1).clock_control()), 0);
        assert_eq!(ttc.read32(CounterId(3).clock_control()), 0);
    }

    #[test]
    fn disabled_counter_holds_value() {
        let ttc = TtcRegion::new(1_000_000_000);
        let id = CounterId(3);
        ttc.write32(id.count_control(), TTC_CNT_CNTRL_DIS_MASK);
        let a = ttc.read32(id.count_value());
        std::thread::sleep(std::time::Duration::from_millis(2));
        assert_eq!(ttc.read32(id.count_value()), a);
        assert_eq!(ttc.read32(id.count_control()), TTC_CNT_CNTRL_DIS_MASK);
    }

    #[test]
    fn zero_rate_never_advances() {
        let ttc = TtcRegion::new(0);
        let id = CounterId(2);
        ttc.write32(id.count_control(), TTC_CNT_CNTRL_RST_MASK);
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert_eq!(ttc.read32(id.count_value()), 0);
    }
}
