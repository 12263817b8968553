//! Wake-up behaviour of the notify wait loop on the simulated interrupt path.

#![cfg(feature = "sim")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use amp_latency::constants::{IPI_IER_OFFSET, IPI_TRIG_OFFSET};
use amp_latency::hal::{IoRegion, IrqController};
use amp_latency::sim::{IpiBlock, IpiRegion, SimIrqController, AGENT_LOCAL, AGENT_REMOTE};
use amp_latency::NotifyChannel;

const VECTOR: u32 = 65;
const MASK: u32 = 0x100;

struct Rig {
    irq: Arc<SimIrqController>,
    notify: Arc<NotifyChannel>,
    remote: IpiRegion,
}

fn rig() -> Rig {
    let irq = Arc::new(SimIrqController::new());
    let block = IpiBlock::new(irq.clone(), VECTOR);
    let local = Arc::new(block.region(AGENT_LOCAL));
    let notify = Arc::new(NotifyChannel::new(local.clone(), MASK));

    let handler = notify.clone();
    irq.register(VECTOR, Box::new(move |v| handler.handle_irq(v)))
        .unwrap();
    irq.enable(VECTOR);
    local.write32(IPI_IER_OFFSET, MASK);

    Rig {
        irq,
        notify,
        remote: block.region(AGENT_REMOTE),
    }
}

fn spawn_waiter(rig: &Rig) -> (Arc<AtomicBool>, thread::JoinHandle<()>) {
    let done = Arc::new(AtomicBool::new(false));
    let handle = {
        let done = done.clone();
        let notify = rig.notify.clone();
        let irq = rig.irq.clone();
        thread::spawn(move || {
            notify.wait_until_notified(irq.as_ref());
            done.store(true, Ordering::SeqCst);
        })
    };
    (done, handle)
}

#[test]
fn wait_blocks_through_spurious_interrupts() {
    const SPURIOUS: usize = 5;
    let rig = rig();
    rig.notify.mark_awaiting();
    let (done, waiter) = spawn_waiter(&rig);

    for _ in 0..SPURIOUS {
        thread::sleep(Duration::from_millis(5));
        rig.irq.raise(VECTOR);
        thread::sleep(Duration::from_millis(5));
        assert!(!done.load(Ordering::SeqCst));
    }
    assert_eq!(rig.irq.handled_count(), 0);

    rig.remote.write32(IPI_TRIG_OFFSET, MASK);
    waiter.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
    assert_eq!(rig.irq.handled_count(), 1);
}

#[test]
fn one_kick_releases_one_wait() {
    let rig = rig();
    rig.notify.mark_awaiting();
    rig.remote.write32(IPI_TRIG_OFFSET, MASK);

    // The reply landed before the wait started.
    rig.notify.wait_until_notified(rig.irq.as_ref());

    let (done, waiter) = spawn_waiter(&rig);
    thread::sleep(Duration::from_millis(20));
    assert!(!done.load(Ordering::SeqCst));

    rig.remote.write32(IPI_TRIG_OFFSET, MASK);
    waiter.join().unwrap();
    assert!(done.load(Ordering::SeqCst));
}

#[test]
fn first_wait_returns_without_a_kick() {
    let rig = rig();
    rig.notify.wait_until_notified(rig.irq.as_ref());
    assert!(rig.notify.flag().is_pending());
}

#[test]
fn reply_while_masked_is_not_lost() {
    let rig = rig();
    rig.notify.mark_awaiting();

    let flags = rig.irq.save_and_disable();
    rig.remote.write32(IPI_TRIG_OFFSET, MASK);
    assert!(rig.notify.flag().is_pending());
    rig.irq.restore(flags);

    assert!(!rig.notify.flag().is_pending());
    rig.notify.wait_until_notified(rig.irq.as_ref());
}

#[test]
fn foreign_channel_bit_does_not_notify() {
    let rig = rig();
    rig.notify.mark_awaiting();
    rig.remote.write32(IPI_TRIG_OFFSET, 0x200);
    assert!(rig.notify.flag().is_pending());
    assert_eq!(rig.irq.handled_count(), 0);
}
