//! Latency report types.

use serde::{Deserialize, Serialize};

use crate::preflight::PreflightWarning;
use crate::statistics::Stat;

/// What a probe measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeKind {
    /// Kick plus message echo through the shared memory windows.
    SharedMemory,
    /// Bare kick and kick-back, no payload.
    Ipi,
}

/// Complete result of one probe run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyReport {
    /// Probe that produced the report.
    pub kind: ProbeKind,

    /// Counter input clock.
    pub clock_hz: u64,

    /// Nanoseconds per counter tick.
    pub ns_per_tick: f64,

    /// Round trips per entry.
    pub iterations: usize,

    /// One entry per message size, in measurement order.
    pub entries: Vec<LatencyEntry>,

    /// Wall-clock duration of the run in seconds.
    pub runtime_secs: f64,

    /// Preflight warnings raised before measuring.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<PreflightWarning>,
}

/// Both directions' latency at one message size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyEntry {
    /// Total message size in bytes; 0 for the IPI probe.
    pub size: usize,

    /// Local core to remote core.
    pub outbound: DirectionSummary,

    /// Remote core to local core.
    pub inbound: DirectionSummary,
}

/// Finalized statistic for one direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectionSummary {
    /// Number of round trips.
    pub count: u64,
    /// Fastest sample in ticks.
    pub min_ticks: u64,
    /// Slowest sample in ticks.
    pub max_ticks: u64,
    /// Mean in ticks.
    pub avg_ticks: f64,
    /// Mean in nanoseconds.
    pub avg_ns: f64,
}

impl DirectionSummary {
    /// Finalize `stat`, or `None` if it holds no sample.
    pub fn from_stat(stat: &Stat, ns_per_tick: f64) -> Option<Self> {
        let avg_ticks = stat.mean()?;
        Some(Self {
            count: stat.count,
            min_ticks: stat.min,
            max_ticks: stat.max,
            avg_ticks,
            avg_ns: avg_ticks * ns_per_tick,
        })
    }
}

impl LatencyEntry {
    /// Finalize the two running statistics of a size block.
    pub fn new(size: usize, outbound: &Stat, inbound: &Stat, ns_per_tick: f64) -> Self {
        Self {
            size,
            outbound: DirectionSummary::from_stat(outbound, ns_per_tick).unwrap_or_default(),
            inbound: DirectionSummary::from_stat(inbound, ns_per_tick).unwrap_or_default(),
        }
    }
}

impl LatencyReport {
    /// Entry measured for `size`, if any.
    pub fn entry(&self, size: usize) -> Option<&LatencyEntry> {
        self.entries.iter().find(|e| e.size == size)
    }

    /// Whether a critical preflight warning makes the numbers suspect.
    pub fn is_suspect(&self) -> bool {
        self.warnings.iter().any(PreflightWarning::is_critical)
    }

    /// Total round trips across all entries.
    pub fn total_round_trips(&self) -> u64 {
        self.entries.iter().map(|e| e.outbound.count).sum()
    }
}
