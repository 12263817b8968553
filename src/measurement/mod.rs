//! Measurement infrastructure for round-trip latency.
//!
//! Latencies are taken from two hardware counters of the triple timer counter
//! (TTC), not from the CPU clock: both cores can reset, stop and read them, so
//! one counter can be started on one core and stopped on the other.
//!
//! - The **outbound** counter is reset locally right before the message is
//!   written and stopped by the remote when the kick arrives.
//! - The **inbound** counter is reset by the remote right before it kicks
//!   back and stopped locally once the reply has been validated.

mod clock;

pub use clock::{counter_offset, CounterId, HardwareClock};
