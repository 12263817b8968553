//! Configuration for latency probes.

use std::env;

use serde::{Deserialize, Serialize};

use crate::constants::{
    FILL_BYTE, IPI_DEV_NAME, IPI_MASK, ITERATIONS, NS_PER_SEC, PKG_SIZE_MAX, PKG_SIZE_MIN,
    SHM_BUFF_OFFSET_RX, SHM_BUFF_OFFSET_TX, SHM_DEMO_CNTRL_OFFSET, SHM_DEV_NAME, SHM_WINDOW_SIZE,
    TTC_CLK_FREQ_HZ, TTC_CNT_APU_TO_RPU, TTC_CNT_RPU_TO_APU, TTC_DEV_NAME,
};
use crate::error::SetupError;
use crate::message::HEADER_SIZE;

/// Configuration options for [`crate::LatencyProbe`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Round trips per message size (default: 1000).
    pub iterations: usize,

    /// Total message sizes in bytes, header included (default: 16..=1024, doubling).
    pub sizes: Vec<usize>,

    /// Input clock of the timer counters (default: 100 MHz).
    pub clock_hz: u64,

    /// Counter reset locally before each kick (default: 2).
    pub outbound_counter: u8,

    /// Counter reset by the remote before it kicks back (default: 3).
    pub inbound_counter: u8,

    /// IPI channel bit used to kick the remote and to recognise its reply.
    pub ipi_mask: u32,

    /// Shared memory partitioning agreed with the remote firmware.
    pub layout: ShmLayout,

    /// Byte used to fill message payloads.
    pub fill_byte: u8,

    /// Run the clock preflight check before measuring (default: true).
    pub preflight: bool,

    /// Registry names of the devices to open.
    pub devices: DeviceNames,
}

/// Offsets of the control word and windows inside the shared memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShmLayout {
    /// Control word offset.
    pub control: usize,
    /// Transmit window offset (local writes, remote reads).
    pub tx: usize,
    /// Receive window offset (remote writes, local reads).
    pub rx: usize,
    /// Size of each window.
    pub window: usize,
}

/// Registry names of the three devices a probe needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceNames {
    /// Shared memory.
    pub shm: String,
    /// IPI block.
    pub ipi: String,
    /// Triple timer counter.
    pub ttc: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            iterations: ITERATIONS,
            sizes: geometric_sizes(PKG_SIZE_MIN, PKG_SIZE_MAX),
            clock_hz: TTC_CLK_FREQ_HZ,
            outbound_counter: TTC_CNT_APU_TO_RPU,
            inbound_counter: TTC_CNT_RPU_TO_APU,
            ipi_mask: IPI_MASK,
            layout: ShmLayout::default(),
            fill_byte: FILL_BYTE,
            preflight: true,
            devices: DeviceNames::default(),
        }
    }
}

impl Default for ShmLayout {
    fn default() -> Self {
        Self {
            control: SHM_DEMO_CNTRL_OFFSET,
            tx: SHM_BUFF_OFFSET_TX,
            rx: SHM_BUFF_OFFSET_RX,
            window: SHM_WINDOW_SIZE,
        }
    }
}

impl ShmLayout {
    /// Bytes of shared memory the layout occupies.
    pub fn span(&self) -> usize {
        let control_end = self.control + 4;
        control_end
            .max(self.tx + self.window)
            .max(self.rx + self.window)
    }

    fn windows_overlap(&self) -> bool {
        let overlaps = |a: usize, a_len: usize, b: usize, b_len: usize| a < b + b_len && b < a + a_len;
        overlaps(self.tx, self.window, self.rx, self.window)
            || overlaps(self.control, 4, self.tx, self.window)
            || overlaps(self.control, 4, self.rx, self.window)
    }
}

impl Default for DeviceNames {
    fn default() -> Self {
        Self {
            shm: SHM_DEV_NAME.to_string(),
            ipi: IPI_DEV_NAME.to_string(),
            ttc: TTC_DEV_NAME.to_string(),
        }
    }
}

/// Doubling sequence `min, 2*min, ...` up to and including `max`.
pub fn geometric_sizes(min: usize, max: usize) -> Vec<usize> {
    let mut sizes = Vec::new();
    let mut s = min.max(1);
    while s <= max {
        sizes.push(s);
        s <<= 1;
    }
    sizes
}

impl Config {
    /// Nanoseconds represented by one counter tick.
    pub fn ns_per_tick(&self) -> f64 {
        NS_PER_SEC as f64 / self.clock_hz as f64
    }

    /// Largest configured message size.
    pub fn max_size(&self) -> usize {
        self.sizes.iter().copied().max().unwrap_or(0)
    }

    /// Defaults with environment overrides applied (see [`Config::merge_env`]).
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Merge overrides from `AMP_LATENCY_ITERATIONS`, `AMP_LATENCY_SIZES`
    /// (comma separated) and `AMP_LATENCY_CLOCK_HZ`.
    ///
    /// Unparseable values are ignored.
    pub fn merge_env(mut self) -> Self {
        if let Some(n) = parse_env::<usize>("AMP_LATENCY_ITERATIONS") {
            self.iterations = n;
        }
        if let Some(sizes) = env::var("AMP_LATENCY_SIZES").ok().and_then(|v| parse_sizes(&v)) {
            self.sizes = sizes;
        }
        if let Some(hz) = parse_env::<u64>("AMP_LATENCY_CLOCK_HZ") {
            self.clock_hz = hz;
        }
        self
    }

    /// Check that the configuration describes a runnable probe.
    pub fn validate(&self) -> Result<(), SetupError> {
        let invalid = |msg: String| Err(SetupError::InvalidConfig(msg));

        if self.iterations == 0 {
            return invalid("iterations must be at least 1".into());
        }
        if u32::try_from(self.iterations).is_err() {
            return invalid(format!("iterations {} overflow the header index", self.iterations));
        }
        if self.sizes.is_empty() {
            return invalid("no message sizes".into());
        }
        if let Some(&s) = self.sizes.iter().find(|&&s| s < HEADER_SIZE) {
            return invalid(format!("message size {s} is smaller than the {HEADER_SIZE}-byte header"));
        }
        if let Some(&s) = self.sizes.iter().find(|&&s| s > self.layout.window) {
            return invalid(format!(
                "message size {s} exceeds the {:#x}-byte window",
                self.layout.window
            ));
        }
        if self.clock_hz == 0 {
            return invalid("clock rate must be non-zero".into());
        }
        for id in [self.outbound_counter, self.inbound_counter] {
            if !(1..=3).contains(&id) {
                return invalid(format!("counter id {id} is outside 1..=3"));
            }
        }
        if self.outbound_counter == self.inbound_counter {
            return invalid("outbound and inbound counters must differ".into());
        }
        if self.ipi_mask == 0 {
            return invalid("ipi mask must be non-zero".into());
        }
        if self.layout.windows_overlap() {
            return invalid("shared memory control word and windows overlap".into());
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.trim().parse().ok()
}

/// Parse a comma separated list of sizes, e.g. `16,32,64`.
pub fn parse_sizes(list: &str) -> Option<Vec<usize>> {
    list.split(',')
        .map(|s| s.trim().parse().ok())
        .collect::<Option<Vec<usize>>>()
        .filter(|v| !v.is_empty())
}
