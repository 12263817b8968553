//! Two-agent model of the IPI block.
//!
//! Each agent sees the same register layout through its own [`IpiRegion`].
//! A trigger write latches the written bits into the peer's status register;
//! the local agent's interrupt line is asserted while an unmasked status bit
//! is set.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use super::irq::SimIrqController;
use crate::constants::{
    IPI_IDR_OFFSET, IPI_IER_OFFSET, IPI_IMR_OFFSET, IPI_ISR_OFFSET, IPI_OBS_OFFSET,
    IPI_TRIG_OFFSET,
};
use crate::hal::IoRegion;

/// Agent index of the local (application) core.
pub const AGENT_LOCAL: usize = 0;
/// Agent index of the remote (real-time) core.
pub const AGENT_REMOTE: usize = 1;

const IPI_REGION_SIZE: usize = 0x20;

#[derive(Clone, Copy)]
struct Agent {
    isr: u32,
    imr: u32,
}

impl Default for Agent {
    fn default() -> Self {
        // Every source masked out of reset.
        Self {
            isr: 0,
            imr: u32::MAX,
        }
    }
}

#[derive(Default)]
struct State {
    agents: [Agent; 2],
    triggers: [u64; 2],
    shutdown: bool,
}

/// Shared state of the IPI block.
pub struct IpiBlock {
    state: Mutex<State>,
    kicked: Condvar,
    irq: Arc<SimIrqController>,
    vector: u32,
}

impl IpiBlock {
    /// A block whose local agent interrupts `irq` on `vector`.
    pub fn new(irq: Arc<SimIrqController>, vector: u32) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::default()),
            kicked: Condvar::new(),
            irq,
            vector,
        })
    }

    /// Register view for `agent`.
    pub fn region(self: &Arc<Self>, agent: usize) -> IpiRegion {
        IpiRegion {
            block: self.clone(),
            agent,
        }
    }

    /// Trigger writes issued by `agent`.
    pub fn trigger_count(&self, agent: usize) -> u64 {
        self.state.lock().triggers[agent]
    }

    /// Interrupt mask register of `agent`.
    pub fn imr(&self, agent: usize) -> u32 {
        self.state.lock().agents[agent].imr
    }

    /// Block until `agent` has one of `mask` latched. `false` after shutdown.
    pub fn wait_kick(&self, agent: usize, mask: u32) -> bool {
        let mut state = self.state.lock();
        loop {
            if state.shutdown {
                return false;
            }
            if state.agents[agent].isr & mask != 0 {
                return true;
            }
            self.kicked.wait(&mut state);
        }
    }

    /// Release every agent blocked in [`IpiBlock::wait_kick`].
    pub fn shutdown(&self) {
        self.state.lock().shutdown = true;
        self.kicked.notify_all();
    }

    fn read(&self, agent: usize, offset: usize) -> u32 {
        let state = self.state.lock();
        let me = state.agents[agent];
        match offset {
            IPI_OBS_OFFSET => state.agents[peer(agent)].isr,
            IPI_ISR_OFFSET => me.isr,
            IPI_IMR_OFFSET => me.imr,
            _ => 0,
        }
    }

    fn write(&self, agent: usize, offset: usize, value: u32) {
        let assert_local = {
            let mut state = self.state.lock();
            let target = match offset {
                IPI_TRIG_OFFSET => {
                    state.triggers[agent] += 1;
                    let p = peer(agent);
                    state.agents[p].isr |= value;
                    self.kicked.notify_all();
                    p
                }
                IPI_ISR_OFFSET => {
                    state.agents[agent].isr &= !value;
                    return;
                }
                IPI_IER_OFFSET => {
                    state.agents[agent].imr &= !value;
                    agent
                }
                IPI_IDR_OFFSET => {
                    state.agents[agent].imr |= value;
                    return;
                }
                _ => return,
            };
            let a = state.agents[target];
            target == AGENT_LOCAL && a.isr & !a.imr != 0
        };
        // Raised with the block unlocked: the handler reads and clears ISR.
        if assert_local {
            self.irq.raise(self.vector);
        }
    }
}

fn peer(agent: usize) -> usize {
    agent ^ 1
}

/// One agent's view of the IPI registers.
pub struct IpiRegion {
    block: Arc<IpiBlock>,
    agent: usize,
}

impl IoRegion for IpiRegion {
    fn size(&self) -> usize {
        IPI_REGION_SIZE
    }

    fn read32(&self, offset: usize) -> u32 {
        self.block.read(self.agent, offset)
    }

    fn write32(&self, offset: usize, value: u32) {
        self.block.write(self.agent, offset, value);
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
    fn trigger_latches_into_peer_status() {
        let block = IpiBlock::new(Arc::new(SimIrqController::new()), 65);
        let local = block.region(AGENT_LOCAL);
        let remote = block.region(AGENT_REMOTE);

        local.write32(IPI_TRIG_OFFSET, 0x100);
        assert_eq!(remote.read32(IPI_ISR_OFFSET), 0x100);
        assert_eq!(local.read32(IPI_OBS_OFFSET), 0x100);
        assert!(block.wait_kick(AGENT_REMOTE, 0x100));

        remote.write32(IPI_ISR_OFFSET, 0x100);
        assert_eq!(local.read32(IPI_OBS_OFFSET), 0);
        assert_eq!(block.trigger_count(AGENT_LOCAL), 1);
    }

    #[test]
    fn enable_and_disable_edit_mask() {
        let block = IpiBlock::new(Arc::new(SimIrqController::new()), 65);
        let local = block.region(AGENT_LOCAL);
        assert_eq!(local.read32(IPI_IMR_OFFSET) & 0x100, 0x100);
        local.write32(IPI_IER_OFFSET, 0x100);
        assert_eq!(local.read32(IPI_IMR_OFFSET) & 0x100, 0);
        local.write32(IPI_IDR_OFFSET, 0x100);
        assert_eq!(block.imr(AGENT_LOCAL) & 0x100, 0x100);
    }

    #[test]
    fn shutdown_releases_waiters() {
        let block = IpiBlock::new(Arc::new(SimIrqController::new()), 65);
        block.shutdown();
        assert!(!block.wait_kick(AGENT_REMOTE, 0x100));
    }
}
