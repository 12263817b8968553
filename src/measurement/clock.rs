//! Access layer over the triple timer counter used as a stopwatch.
//!
//! Each counter has a clock-control, count-control and count-value register;
//! the blocks of counters 2 and 3 sit at `1 << id` bytes from counter 1.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{
    TTC_CLK_CNTRL_OFFSET, TTC_CNT_CNTRL_DIS_MASK, TTC_CNT_CNTRL_OFFSET, TTC_CNT_CNTRL_RST_MASK,
    TTC_CNT_VAL_OFFSET,
};
use crate::hal::IoRegion;

/// Identifier of one of the three TTC counters (1..=3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CounterId(pub u8);

impl CounterId {
    /// Byte offset of this counter's register block.
    pub const fn block_offset(self) -> usize {
        counter_offset(self.0)
    }

    /// Offset of the clock-control register.
    pub const fn clock_control(self) -> usize {
        TTC_CLK_CNTRL_OFFSET + self.block_offset()
    }

    /// Offset of the count-control register.
    pub const fn count_control(self) -> usize {
        TTC_CNT_CNTRL_OFFSET + self.block_offset()
    }

    /// Offset of the count-value register.
    pub const fn count_value(self) -> usize {
        TTC_CNT_VAL_OFFSET + self.block_offset()
    }
}

impl fmt::Display for CounterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ttc{}", self.0)
    }
}

/// Register block offset of counter `id`.
pub const fn counter_offset(id: u8) -> usize {
    if id == 1 {
        0
    } else {
        1 << id
    }
}

/// Reset, read and stop individual TTC counters.
///
/// Counts are free-running 32-bit values; wraparound is not handled since a
/// single round trip is far shorter than the counter period.
#[derive(Clone)]
pub struct HardwareClock {
    io: Arc<dyn IoRegion>,
}

impl fmt::Debug for HardwareClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareClock").finish_non_exhaustive()
    }
}

impl HardwareClock {
    /// Wrap the timer device's I/O region.
    pub fn new(io: Arc<dyn IoRegion>) -> Self {
        Self { io }
    }

    /// Zero the counter. It keeps counting from zero.
    #[inline]
    pub fn reset(&self, id: CounterId) {
        self.io.write32(id.count_control(), TTC_CNT_CNTRL_RST_MASK);
    }

    /// Current tick count of the counter.
    #[inline]
    pub fn read(&self, id: CounterId) -> u32 {
        self.io.read32(id.count_value())
    }

    /// Freeze the counter so its value stops drifting.
    #[inline]
    pub fn stop(&self, id: CounterId) {
        self.io.write32(id.count_control(), TTC_CNT_CNTRL_DIS_MASK);
    }
}
