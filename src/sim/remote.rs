//! Firmware of the remote core, run as a host thread.
//!
//! Per kick: acknowledge, leave if the control word says idle, stop the
//! outbound counter, echo the transmit window into the receive window, reset
//! the inbound counter and kick back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::ipi::{IpiBlock, IpiRegion, AGENT_REMOTE};
use super::irq::SimIrqController;
use crate::config::ShmLayout;
use crate::constants::IPI_ISR_OFFSET;
use crate::hal::{IoRegion, MemRegion};
use crate::measurement::{CounterId, HardwareClock};
use crate::message::{MessageHeader, HEADER_SIZE};
use crate::notify::NotifyChannel;
use crate::shmem::{DemoStatus, SharedBuffer};

/// Ways the remote can corrupt its echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoFault {
    /// Echo `len` as the total size instead of the payload size.
    LengthIncludesHeader,
    /// Overwrite the echoed `len` field.
    CorruptLength(u32),
}

/// How the simulated remote answers.
#[derive(Debug, Clone, Default)]
pub struct RemoteBehavior {
    /// Corrupt the echoed header.
    pub fault: Option<EchoFault>,
    /// Only apply `fault` to messages of this total size; every size if `None`.
    pub fault_size: Option<usize>,
    /// Fixed delay before kicking back.
    pub delay: Duration,
    /// Upper bound of an extra uniformly random delay.
    pub jitter: Duration,
    /// Unrelated interrupts raised on the local vector before each reply.
    pub spurious: u32,
    /// Seed for the jitter generator.
    pub seed: u64,
}

/// Everything the remote thread touches.
pub(crate) struct RemoteCore {
    pub(crate) block: Arc<IpiBlock>,
    pub(crate) ipi: Arc<IpiRegion>,
    pub(crate) shm: Arc<MemRegion>,
    pub(crate) clock: HardwareClock,
    pub(crate) irq: Arc<SimIrqController>,
    pub(crate) vector: u32,
    pub(crate) mask: u32,
    pub(crate) layout: ShmLayout,
    pub(crate) outbound: CounterId,
    pub(crate) inbound: CounterId,
    pub(crate) behavior: RemoteBehavior,
    pub(crate) finished_runs: Arc<AtomicU64>,
    pub(crate) replies: Arc<AtomicU64>,
}

impl RemoteCore {
    pub(crate) fn spawn(self) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("sim-remote".into())
            .spawn(move || self.run())
    }

    fn run(self) {
        let shm = SharedBuffer::new(self.shm.clone(), self.layout);
        let notify = NotifyChannel::new(self.ipi.clone(), self.mask);
        let mut rng = StdRng::seed_from_u64(self.behavior.seed);
        let mut staging = vec![0u8; self.layout.window];

        while self.block.wait_kick(AGENT_REMOTE, self.mask) {
            self.ipi.write32(IPI_ISR_OFFSET, self.mask);

            if shm.status() == DemoStatus::Idle {
                self.finished_runs.fetch_add(1, Ordering::SeqCst);
                tracing::debug!("remote left the demo loop");
                continue;
            }

            self.clock.stop(self.outbound);
            self.echo(&mut staging);
            self.pause(&mut rng);

            for _ in 0..self.behavior.spurious {
                self.irq.raise(self.vector);
            }

            self.clock.reset(self.inbound);
            self.replies.fetch_add(1, Ordering::SeqCst);
            notify.trigger_remote();
        }
        tracing::debug!("remote core stopped");
    }

    fn echo(&self, staging: &mut [u8]) {
        let tx = self.layout.tx;
        let rx = self.layout.rx;

        self.shm.block_read(tx, &mut staging[..HEADER_SIZE]);
        let header = MessageHeader::decode(staging);
        let size = header.total_size().min(staging.len());
        let n = self.shm.block_read(tx, &mut staging[..size]);

        if let Some(fault) = self.behavior.fault {
            if self.behavior.fault_size.map_or(true, |s| s == size) {
                let len = match fault {
                    EchoFault::LengthIncludesHeader => size as u32,
                    EchoFault::CorruptLength(len) => len,
                };
                MessageHeader { len, ..header }.encode(staging);
            }
        }
        self.shm.block_write(rx, &staging[..n]);
    }

    fn pause(&self, rng: &mut StdRng) {
        let mut delay = self.behavior.delay;
        let jitter = self.behavior.jitter.as_micros() as u64;
        if jitter > 0 {
            delay += Duration::from_micros(rng.random_range(0..=jitter));
        }
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
