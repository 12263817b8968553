//! `LatencyProbe` entry point and builder.

use std::time::Instant;

use crate::channel::Channel;
use crate::config::Config;
use crate::constants::BUF_SIZE_MAX;
use crate::error::{ProbeError, TransferOp};
use crate::hal::Peripherals;
use crate::message;
use crate::preflight::{self, PreflightWarning};
use crate::result::{LatencyEntry, LatencyReport, ProbeKind};
use crate::shmem::DemoStatus;
use crate::statistics::Stat;

/// Round-trip latency benchmark between the local and the remote core.
///
/// Use the builder setters to adjust the run, then call one of the probes
/// with the platform's [`Peripherals`].
///
/// # Example
///
/// ```ignore
/// use amp_latency::{LatencyProbe, sim::SimPlatform};
///
/// let platform = SimPlatform::new();
/// let report = LatencyProbe::new()
///     .iterations(100)
///     .sizes(vec![16, 64])
///     .shmem_latency(&platform.peripherals()?)?;
/// ```
///
/// # Blocking
///
/// Each round trip waits for the remote's reply without a deadline. A remote
/// that never kicks back blocks the probe forever.
#[derive(Debug, Clone, Default)]
pub struct LatencyProbe {
    config: Config,
}

impl LatencyProbe {
    /// Create with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an explicit configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the number of round trips per message size.
    pub fn iterations(mut self, n: usize) -> Self {
        self.config.iterations = n;
        self
    }

    /// Set the message sizes, header included.
    pub fn sizes(mut self, sizes: Vec<usize>) -> Self {
        self.config.sizes = sizes;
        self
    }

    /// Set the timer input clock.
    pub fn clock_hz(mut self, hz: u64) -> Self {
        self.config.clock_hz = hz;
        self
    }

    /// Enable or disable the preflight checks.
    pub fn preflight(mut self, enabled: bool) -> Self {
        self.config.preflight = enabled;
        self
    }

    /// Set the payload fill byte.
    pub fn fill_byte(mut self, byte: u8) -> Self {
        self.config.fill_byte = byte;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Measure kick-plus-echo latency for every configured message size.
    ///
    /// The first transfer or validation failure aborts the whole run. The
    /// interrupt registration is torn down on every exit path, but the
    /// remote is only told to stop after a complete run.
    pub fn shmem_latency(&self, peripherals: &Peripherals) -> Result<LatencyReport, ProbeError> {
        let config = &self.config;
        let start = Instant::now();
        let channel = Channel::open(peripherals, config)?;
        let warnings = self.run_preflight(&channel);

        tracing::info!(
            sizes = ?config.sizes,
            iterations = config.iterations,
            "starting shared memory latency measurement"
        );
        channel.shm().set_status(DemoStatus::Start);

        let mut buf = vec![config.fill_byte; BUF_SIZE_MAX.max(config.max_size())];
        let ns_per_tick = config.ns_per_tick();
        let mut entries = Vec::with_capacity(config.sizes.len());

        for &size in &config.sizes {
            let (outbound, inbound) = self.measure_size(&channel, &mut buf, size)?;
            let entry = LatencyEntry::new(size, &outbound, &inbound, ns_per_tick);
            log_entry(&entry);
            entries.push(entry);
        }

        finish(&channel);
        Ok(self.report(ProbeKind::SharedMemory, entries, warnings, start))
    }

    /// Measure bare kick and kick-back latency, without a payload.
    pub fn ipi_latency(&self, peripherals: &Peripherals) -> Result<LatencyReport, ProbeError> {
        let config = &self.config;
        let start = Instant::now();
        let channel = Channel::open(peripherals, config)?;
        let warnings = self.run_preflight(&channel);

        tracing::info!(
            iterations = config.iterations,
            "starting ipi latency measurement"
        );
        channel.shm().set_status(DemoStatus::Start);

        let clock = channel.clock();
        let mut outbound = Stat::new();
        let mut inbound = Stat::new();
        for _ in 0..config.iterations {
            clock.reset(channel.outbound());
            channel.kick();
            channel.wait();
            clock.stop(channel.inbound());
            outbound.update(u64::from(clock.read(channel.outbound())));
            inbound.update(u64::from(clock.read(channel.inbound())));
        }

        let entry = LatencyEntry::new(0, &outbound, &inbound, config.ns_per_tick());
        log_entry(&entry);

        finish(&channel);
        Ok(self.report(ProbeKind::Ipi, vec![entry], warnings, start))
    }

    fn run_preflight(&self, channel: &Channel) -> Vec<PreflightWarning> {
        if self.config.preflight {
            preflight::run_all_checks(channel)
        } else {
            Vec::new()
        }
    }

    /// Run every iteration of one size block.
    fn measure_size(
        &self,
        channel: &Channel,
        buf: &mut [u8],
        size: usize,
    ) -> Result<(Stat, Stat), ProbeError> {
        let clock = channel.clock();
        let shm = channel.shm();
        let msg = &mut buf[..size];

        let mut outbound = Stat::new();
        let mut inbound = Stat::new();

        // Bounded by Config::validate.
        let iterations = self.config.iterations as u32;
        for i in 1..=iterations {
            clock.reset(channel.outbound());

            message::prepare(msg, i, size);
            let written = shm.write_tx(msg);
            check_transfer(TransferOp::Write, size, i, written)?;

            channel.kick();
            channel.wait();

            let read = shm.read_rx(msg);
            check_transfer(TransferOp::Read, size, i, read)?;
            message::validate_echo(msg, size, i)?;

            clock.stop(channel.inbound());
            outbound.update(u64::from(clock.read(channel.outbound())));
            inbound.update(u64::from(clock.read(channel.inbound())));
        }

        Ok((outbound, inbound))
    }

    fn report(
        &self,
        kind: ProbeKind,
        entries: Vec<LatencyEntry>,
        warnings: Vec<PreflightWarning>,
        start: Instant,
    ) -> LatencyReport {
        let report = LatencyReport {
            kind,
            clock_hz: self.config.clock_hz,
            ns_per_tick: self.config.ns_per_tick(),
            iterations: self.config.iterations,
            entries,
            runtime_secs: start.elapsed().as_secs_f64(),
            warnings,
        };
        tracing::info!(
            ?kind,
            round_trips = report.total_round_trips(),
            runtime_secs = report.runtime_secs,
            "latency measurement finished"
        );
        report
    }
}

fn check_transfer(
    op: TransferOp,
    size: usize,
    iteration: u32,
    actual: usize,
) -> Result<(), ProbeError> {
    if actual == size {
        return Ok(());
    }
    tracing::debug!(
        %op,
        size,
        iteration,
        expected = size,
        actual,
        "shared memory transfer failed"
    );
    Err(ProbeError::Transfer {
        op,
        size,
        iteration,
        expected: size,
        actual,
    })
}

/// Tell the remote the demo is over. Its reply is not awaited.
fn finish(channel: &Channel) {
    channel.shm().set_status(DemoStatus::Idle);
    channel.notify().trigger_remote();
}

fn log_entry(entry: &LatencyEntry) {
    tracing::info!(
        size = entry.size,
        outbound_min = entry.outbound.min_ticks,
        outbound_max = entry.outbound.max_ticks,
        outbound_avg_ns = entry.outbound.avg_ns,
        inbound_min = entry.inbound.min_ticks,
        inbound_max = entry.inbound.max_ticks,
        inbound_avg_ns = entry.inbound.avg_ns,
        "package size {} latency result",
        entry.size
    );
}
