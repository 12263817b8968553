//! Cross-core notification: kick the remote, then sleep until it kicks back.
//!
//! The local side arms a flag, raises the remote's IPI and waits. The IPI
//! handler clears the flag when the remote's reply interrupt arrives. The wait
//! checks the flag with interrupts masked and only then enters the low-power
//! wait, so a reply landing between the check and the sleep still ends the
//! sleep (the interrupt stays pending) instead of being lost.

use std::fmt;
use std::sync::atomic::{fence, AtomicBool, Ordering};
use std::sync::Arc;

use crate::constants::{IPI_ISR_OFFSET, IPI_OBS_OFFSET, IPI_TRIG_OFFSET};
use crate::hal::{IoRegion, IrqController, IrqStatus};

/// "Remote has not responded yet" flag.
///
/// Set by the local core before kicking, cleared by the interrupt handler.
#[derive(Debug)]
pub struct NotifyFlag {
    pending: AtomicBool,
}

impl NotifyFlag {
    /// A flag in the satisfied state, so a stray first wait returns at once.
    pub const fn satisfied() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Mark the remote as owing a response.
    #[inline]
    pub fn arm(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Record the remote's response.
    #[inline]
    pub fn clear(&self) {
        self.pending.store(false, Ordering::Release);
    }

    /// Re-arm the flag, returning whether it was still pending.
    ///
    /// A `false` return consumes exactly one response.
    #[inline]
    pub fn test_and_set(&self) -> bool {
        self.pending.swap(true, Ordering::AcqRel)
    }

    /// Whether a response is still outstanding.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for NotifyFlag {
    fn default() -> Self {
        Self::satisfied()
    }
}

/// The IPI channel to the remote core.
pub struct NotifyChannel {
    ipi: Arc<dyn IoRegion>,
    mask: u32,
    flag: NotifyFlag,
}

impl fmt::Debug for NotifyChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyChannel")
            .field("mask", &format_args!("{:#x}", self.mask))
            .field("flag", &self.flag)
            .finish()
    }
}

impl NotifyChannel {
    /// Channel over the IPI block `ipi`, kicking and listening on `mask`.
    pub fn new(ipi: Arc<dyn IoRegion>, mask: u32) -> Self {
        Self {
            ipi,
            mask,
            flag: NotifyFlag::satisfied(),
        }
    }

    /// The channel's IPI bit.
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// The response flag.
    pub fn flag(&self) -> &NotifyFlag {
        &self.flag
    }

    /// Expect a response to the next kick.
    #[inline]
    pub fn mark_awaiting(&self) {
        self.flag.arm();
    }

    /// Raise the remote's interrupt. Fire-and-forget.
    #[inline]
    pub fn trigger_remote(&self) {
        // Shared-memory writes must be visible before the remote can observe the kick.
        fence(Ordering::SeqCst);
        self.ipi.write32(IPI_TRIG_OFFSET, self.mask);
    }

    /// [`NotifyChannel::mark_awaiting`] followed by [`NotifyChannel::trigger_remote`].
    pub fn kick(&self) {
        self.mark_awaiting();
        self.trigger_remote();
    }

    /// Observation bits of the last kick if the remote has not yet
    /// acknowledged it.
    pub fn remote_busy(&self) -> Option<u32> {
        let obs = self.ipi.read32(IPI_OBS_OFFSET) & self.mask;
        (obs != 0).then_some(obs)
    }

    /// Block until the remote has responded.
    ///
    /// There is no timeout: a remote that never kicks back blocks the caller
    /// forever. Any interrupt wakes the core, so the flag is rechecked after
    /// every wake-up.
    pub fn wait_until_notified(&self, irq: &dyn IrqController) {
        loop {
            let flags = irq.save_and_disable();
            if !self.flag.test_and_set() {
                irq.restore(flags);
                break;
            }
            irq.wait_for_interrupt();
            irq.restore(flags);
        }
    }

    /// IPI interrupt handler body.
    ///
    /// Acknowledges and consumes the interrupt only if the channel's bit is
    /// set in the status register.
    pub fn handle_irq(&self, _vector: u32) -> IrqStatus {
        let isr = self.ipi.read32(IPI_ISR_OFFSET);
        if isr & self.mask == 0 {
            return IrqStatus::NotHandled;
        }
        self.ipi.write32(IPI_ISR_OFFSET, self.mask);
        self.flag.clear();
        IrqStatus::Handled
    }
}
