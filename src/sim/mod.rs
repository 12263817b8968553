//! Host simulation of the AMP platform.
//!
//! [`SimPlatform`] stands up shared memory, a two-agent IPI block, a TTC and
//! a local interrupt controller, and runs the remote core's echo firmware on
//! a background thread. The probes run against it unchanged.
//!
//! ```ignore
//! use amp_latency::{sim::SimPlatform, LatencyProbe};
//!
//! let platform = SimPlatform::new()?;
//! let report = LatencyProbe::new().iterations(100).shmem_latency(&platform.peripherals()?)?;
//! ```

mod ipi;
mod irq;
mod remote;
mod ttc;

pub use ipi::{IpiBlock, IpiRegion, AGENT_LOCAL, AGENT_REMOTE};
pub use irq::SimIrqController;
pub use remote::{EchoFault, RemoteBehavior};
pub use ttc::TtcRegion;

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::{Config, DeviceNames, ShmLayout};
use crate::constants::{DEMO_STATUS_IDLE, TTC_CLK_FREQ_HZ};
use crate::error::SetupError;
use crate::hal::{Device, DeviceRegistry, IoRegion, MemRegion, Peripherals};
use crate::measurement::{CounterId, HardwareClock};

use remote::RemoteCore;

/// Interrupt vector of the simulated IPI block.
pub const SIM_IPI_VECTOR: u32 = 65;

/// Builder for [`SimPlatform`].
#[derive(Debug, Clone)]
pub struct SimPlatformBuilder {
    config: Config,
    ttc_hz: u64,
    vector: u32,
    shm_size: Option<usize>,
    missing: HashSet<String>,
    behavior: RemoteBehavior,
}

impl Default for SimPlatformBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            ttc_hz: TTC_CLK_FREQ_HZ,
            vector: SIM_IPI_VECTOR,
            shm_size: None,
            missing: HashSet::new(),
            behavior: RemoteBehavior::default(),
        }
    }
}

impl SimPlatformBuilder {
    /// Take device names, layout, IPI bit and counter ids from `config`.
    pub fn config(mut self, config: &Config) -> Self {
        self.config = config.clone();
        self
    }

    /// Rate the simulated TTC counts at. Zero freezes every counter.
    pub fn ttc_hz(mut self, hz: u64) -> Self {
        self.ttc_hz = hz;
        self
    }

    /// Interrupt vector of the IPI device.
    pub fn vector(mut self, vector: u32) -> Self {
        self.vector = vector;
        self
    }

    /// Size of the shared memory region (default: the layout's span).
    pub fn shm_size(mut self, size: usize) -> Self {
        self.shm_size = Some(size);
        self
    }

    /// Leave the device called `name` out of the registry.
    pub fn without_device(mut self, name: impl Into<String>) -> Self {
        self.missing.insert(name.into());
        self
    }

    /// Replace the remote's behaviour wholesale.
    pub fn remote(mut self, behavior: RemoteBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Corrupt the echoed header, at every size or only at `size`.
    pub fn echo_fault(mut self, fault: EchoFault, size: Option<usize>) -> Self {
        self.behavior.fault = Some(fault);
        self.behavior.fault_size = size;
        self
    }

    /// Fixed reply delay.
    pub fn remote_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = delay;
        self
    }

    /// Random extra reply delay up to `jitter`, seeded with `seed`.
    pub fn remote_jitter(mut self, jitter: Duration, seed: u64) -> Self {
        self.behavior.jitter = jitter;
        self.behavior.seed = seed;
        self
    }

    /// Raise `n` unrelated interrupts before every reply.
    pub fn spurious_interrupts(mut self, n: u32) -> Self {
        self.behavior.spurious = n;
        self
    }

    /// Stand up the platform and start the remote core.
    pub fn build(self) -> Result<SimPlatform, SetupError> {
        let layout = self.config.layout;
        let irq = Arc::new(SimIrqController::new());
        let block = IpiBlock::new(irq.clone(), self.vector);
        let shm = Arc::new(MemRegion::new(self.shm_size.unwrap_or_else(|| layout.span())));
        let ttc = Arc::new(TtcRegion::new(self.ttc_hz));

        let finished_runs = Arc::new(AtomicU64::new(0));
        let replies = Arc::new(AtomicU64::new(0));
        let remote = RemoteCore {
            block: block.clone(),
            ipi: Arc::new(block.region(AGENT_REMOTE)),
            shm: shm.clone(),
            clock: HardwareClock::new(ttc.clone()),
            irq: irq.clone(),
            vector: self.vector,
            mask: self.config.ipi_mask,
            layout,
            outbound: CounterId(self.config.outbound_counter),
            inbound: CounterId(self.config.inbound_counter),
            behavior: self.behavior,
            finished_runs: finished_runs.clone(),
            replies: replies.clone(),
        }
        .spawn()
        .map_err(|e| SetupError::InvalidConfig(format!("cannot start remote core: {e}")))?;

        tracing::debug!(vector = self.vector, ttc_hz = self.ttc_hz, "simulated platform up");
        Ok(SimPlatform {
            names: self.config.devices,
            layout,
            vector: self.vector,
            missing: self.missing,
            irq,
            block,
            shm,
            ttc,
            finished_runs,
            replies,
            remote: Some(remote),
        })
    }
}

/// A running simulated AMP platform.
///
/// The remote core thread outlives single probe runs. A run ends with an
/// unacknowledged kick, so the next run on the same platform must not start
/// before [`SimPlatform::wait_finished`] has seen the previous one finish.
/// Otherwise the remote may handle the old kick after the new run has set
/// the control word, answer it as a request and fall one kick behind; the
/// next preflight then reports [`crate::preflight::PreflightWarning::RemoteBusy`].
pub struct SimPlatform {
    names: DeviceNames,
    layout: ShmLayout,
    vector: u32,
    missing: HashSet<String>,
    irq: Arc<SimIrqController>,
    block: Arc<IpiBlock>,
    shm: Arc<MemRegion>,
    ttc: Arc<TtcRegion>,
    finished_runs: Arc<AtomicU64>,
    replies: Arc<AtomicU64>,
    remote: Option<JoinHandle<()>>,
}

impl SimPlatform {
    /// Platform with default devices and a well-behaved remote.
    pub fn new() -> Result<Self, SetupError> {
        Self::builder().build()
    }

    /// Start configuring a platform.
    pub fn builder() -> SimPlatformBuilder {
        SimPlatformBuilder::default()
    }

    /// Resolve the devices the probes need.
    pub fn peripherals(&self) -> Result<Peripherals, SetupError> {
        Peripherals::open(self, &self.names, self.irq.clone())
    }

    /// The local interrupt controller.
    pub fn irq(&self) -> &Arc<SimIrqController> {
        &self.irq
    }

    /// Interrupt vector of the IPI device.
    pub fn vector(&self) -> u32 {
        self.vector
    }

    /// The shared memory.
    pub fn shm(&self) -> &Arc<MemRegion> {
        &self.shm
    }

    /// Kicks the local core has sent to the remote.
    pub fn trigger_count(&self) -> u64 {
        self.block.trigger_count(AGENT_LOCAL)
    }

    /// Replies the remote has kicked back.
    pub fn reply_count(&self) -> u64 {
        self.replies.load(Ordering::SeqCst)
    }

    /// Times the remote left its demo loop on an idle control word.
    pub fn finished_runs(&self) -> u64 {
        self.finished_runs.load(Ordering::SeqCst)
    }

    /// Whether the local IPI source is masked at the IPI block.
    pub fn ipi_masked(&self, mask: u32) -> bool {
        self.block.imr(AGENT_LOCAL) & mask == mask
    }

    /// Whether the control word reads idle.
    pub fn control_idle(&self) -> bool {
        self.shm.read32(self.layout.control) == DEMO_STATUS_IDLE
    }

    /// Wait until the remote has left its demo loop `runs` times.
    ///
    /// The final kick of a run is not acknowledged, so this is the only way
    /// to observe that the remote saw it. Gives up after `timeout`.
    pub fn wait_finished(&self, runs: u64, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        while self.finished_runs() < runs {
            if std::time::Instant::now() >= deadline {
                return false;
            }
            std::thread::yield_now();
        }
        true
    }
}

impl DeviceRegistry for SimPlatform {
    fn open(&self, name: &str) -> Option<Device> {
        if self.missing.contains(name) {
            return None;
        }
        if name == self.names.shm {
            Some(device(name, self.shm.clone(), None))
        } else if name == self.names.ttc {
            Some(device(name, self.ttc.clone(), None))
        } else if name == self.names.ipi {
            let region = Arc::new(self.block.region(AGENT_LOCAL));
            Some(device(name, region, Some(self.vector)))
        } else {
            None
        }
    }
}

fn device(name: &str, region: Arc<dyn IoRegion>, irq: Option<u32>) -> Device {
    Device {
        name: name.to_string(),
        region,
        irq,
    }
}

impl Drop for SimPlatform {
    fn drop(&mut self) {
        self.block.shutdown();
        if let Some(remote) = self.remote.take() {
            if remote.join().is_err() {
                tracing::error!("simulated remote core panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TTC_DEV_NAME;

    #[test]
    fn registry_serves_configured_devices() {
        let platform = SimPlatform::new().unwrap();
        let p = platform.peripherals().unwrap();
        assert_eq!(p.ipi.irq, Some(SIM_IPI_VECTOR));
        assert_eq!(p.shm.region.size(), 0x3000);
        assert!(platform.open("nope").is_none());
    }

    #[test]
    fn missing_device_fails_lookup() {
        let platform = SimPlatform::builder()
            .without_device(TTC_DEV_NAME)
            .build()
            .unwrap();
        assert!(matches!(
            platform.peripherals(),
            Err(SetupError::DeviceNotFound { device }) if device == TTC_DEV_NAME
        ));
    }
}
