//! Simulated interrupt controller of the local core.
//!
//! One lock serializes handler execution against the core's mask, so a
//! handler never runs inside a `save_and_disable`/`restore` window. That is
//! the guarantee the wait loop relies on. Handlers run with the lock held
//! and must not call back into the controller.

use std::collections::{BTreeSet, HashMap};

use parking_lot::{Condvar, Mutex};

use crate::error::SetupError;
use crate::hal::{IrqController, IrqFlags, IrqHandler, IrqStatus};

#[derive(Default)]
struct Line {
    handler: Option<IrqHandler>,
    enabled: bool,
}

#[derive(Default)]
struct State {
    masked: bool,
    lines: HashMap<u32, Line>,
    pending: BTreeSet<u32>,
    handled: u64,
    unhandled: u64,
}

impl State {
    fn deliverable(&self) -> Vec<u32> {
        self.pending
            .iter()
            .copied()
            .filter(|v| self.lines.get(v).is_some_and(|l| l.enabled))
            .collect()
    }

    fn deliver(&mut self) {
        if self.masked {
            return;
        }
        for vector in self.deliverable() {
            self.pending.remove(&vector);
            let status = match self.lines.get(&vector).and_then(|l| l.handler.as_ref()) {
                Some(handler) => handler(vector),
                None => IrqStatus::NotHandled,
            };
            match status {
                IrqStatus::Handled => self.handled += 1,
                IrqStatus::NotHandled => self.unhandled += 1,
            }
        }
    }
}

/// Host stand-in for the local core's interrupt controller.
#[derive(Default)]
pub struct SimIrqController {
    state: Mutex<State>,
    wake: Condvar,
}

impl SimIrqController {
    /// A controller with no handlers and interrupts unmasked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert `vector`.
    ///
    /// Delivered at once unless the core is masked or the vector disabled,
    /// otherwise left pending. Always wakes a core sitting in
    /// [`IrqController::wait_for_interrupt`].
    pub fn raise(&self, vector: u32) {
        let mut state = self.state.lock();
        state.pending.insert(vector);
        self.wake.notify_all();
        state.deliver();
    }

    /// Whether a handler is installed for `vector`.
    pub fn is_registered(&self, vector: u32) -> bool {
        self.state
            .lock()
            .lines
            .get(&vector)
            .is_some_and(|l| l.handler.is_some())
    }

    /// Whether `vector` is enabled.
    pub fn is_enabled(&self, vector: u32) -> bool {
        self.state.lock().lines.get(&vector).is_some_and(|l| l.enabled)
    }

    /// Deliveries a handler claimed.
    pub fn handled_count(&self) -> u64 {
        self.state.lock().handled
    }

    /// Deliveries no handler claimed.
    pub fn unhandled_count(&self) -> u64 {
        self.state.lock().unhandled
    }
}

impl IrqController for SimIrqController {
    fn register(&self, vector: u32, handler: IrqHandler) -> Result<(), SetupError> {
        let mut state = self.state.lock();
        let line = state.lines.entry(vector).or_default();
        if line.handler.is_some() {
            return Err(SetupError::IrqInUse { vector });
        }
        line.handler = Some(handler);
        Ok(())
    }

    fn unregister(&self, vector: u32) {
        if let Some(line) = self.state.lock().lines.get_mut(&vector) {
            line.handler = None;
        }
    }

    fn enable(&self, vector: u32) {
        let mut state = self.state.lock();
        state.lines.entry(vector).or_default().enabled = true;
        self.wake.notify_all();
        state.deliver();
    }

    fn disable(&self, vector: u32) {
        if let Some(line) = self.state.lock().lines.get_mut(&vector) {
            line.enabled = false;
        }
    }

    fn save_and_disable(&self) -> IrqFlags {
        let mut state = self.state.lock();
        let prev = IrqFlags(u32::from(state.masked));
        state.masked = true;
        prev
    }

    fn restore(&self, flags: IrqFlags) {
        let mut state = self.state.lock();
        state.masked = flags.0 != 0;
        state.deliver();
    }

    fn wait_for_interrupt(&self) {
        let mut state = self.state.lock();
        while state.deliverable().is_empty() {
            self.wake.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting(hits: &Arc<AtomicU32>, status: IrqStatus) -> IrqHandler {
        let hits = hits.clone();
        Box::new(move |_| {
            hits.fetch_add(1, Ordering::SeqCst);
            status
        })
    }

    #[test]
    fn masked_raise_is_delivered_on_restore() {
        let irq = SimIrqController::new();
        let hits = Arc::new(AtomicU32::new(0));
        irq.register(65, counting(&hits, IrqStatus::Handled)).unwrap();
        irq.enable(65);

        let flags = irq.save_and_disable();
        irq.raise(65);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        irq.wait_for_interrupt();
        irq.restore(flags);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(irq.handled_count(), 1);
    }

    #[test]
    fn double_register_is_rejected() {
        let irq = SimIrqController::new();
        let hits = Arc::new(AtomicU32::new(0));
        irq.register(65, counting(&hits, IrqStatus::Handled)).unwrap();
        assert!(matches!(
            irq.register(65, counting(&hits, IrqStatus::Handled)),
            Err(SetupError::IrqInUse { vector: 65 })
        ));
        irq.unregister(65);
        assert!(!irq.is_registered(65));
    }

    #[test]
    fn disabled_vector_stays_pending() {
        let irq = SimIrqController::new();
        let hits = Arc::new(AtomicU32::new(0));
        irq.register(70, counting(&hits, IrqStatus::NotHandled)).unwrap();
        irq.raise(70);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        irq.enable(70);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(irq.unhandled_count(), 1);
    }
}
