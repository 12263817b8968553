//! # amp-latency
//!
//! Measure round-trip latency between the two cores of an asymmetric
//! multiprocessing platform that share only a memory region, an
//! inter-processor interrupt (IPI) block and a triple timer counter (TTC).
//!
//! Per message size the probe reports, for both directions:
//! - the fastest and slowest round trip in raw timer ticks
//! - the average in nanoseconds
//!
//! ## How one round trip works
//!
//! The local core resets the outbound counter, writes a message into the
//! transmit window, arms a flag and kicks the remote. The remote stops the
//! outbound counter, echoes the message into the receive window, resets the
//! inbound counter and kicks back. The local IPI handler clears the flag,
//! which releases the local core from its interrupt-masked wait loop. The
//! local core then checks the echoed header and stops the inbound counter.
//!
//! ## Quick Start
//!
//! ```ignore
//! use amp_latency::{sim::SimPlatform, LatencyProbe};
//!
//! let platform = SimPlatform::new()?;
//! let report = LatencyProbe::new()
//!     .iterations(100)
//!     .shmem_latency(&platform.peripherals()?)?;
//!
//! println!("{}", amp_latency::output::format_report(&report));
//! ```
//!
//! On a real target, implement [`hal::DeviceRegistry`] and
//! [`hal::IrqController`] over the platform's memory map and interrupt
//! controller, then build [`Peripherals`] with [`Peripherals::open`].

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod channel;
mod config;
pub mod constants;
mod error;
mod notify;
mod probe;
mod result;
mod shmem;

// Functional modules
pub mod hal;
pub mod measurement;
pub mod message;
pub mod output;
pub mod preflight;
pub mod statistics;

#[cfg(feature = "sim")]
pub mod sim;

// Re-exports for public API
pub use channel::{Channel, IrqRegistration};
pub use config::{geometric_sizes, parse_sizes, Config, DeviceNames, ShmLayout};
pub use error::{ErrorKind, ProbeError, SetupError, TransferOp};
pub use hal::Peripherals;
pub use measurement::{CounterId, HardwareClock};
pub use notify::{NotifyChannel, NotifyFlag};
pub use probe::LatencyProbe;
pub use result::{DirectionSummary, LatencyEntry, LatencyReport, ProbeKind};
pub use shmem::{DemoStatus, SharedBuffer};
pub use statistics::Stat;

/// Run the shared-memory probe with default settings.
///
/// Configuration is read from the environment (see [`Config::from_env`]).
/// Consecutive runs against the same remote must wait for it to leave the
/// previous run first (on the simulator, `SimPlatform::wait_finished`).
pub fn shmem_latency(peripherals: &Peripherals) -> Result<LatencyReport, ProbeError> {
    LatencyProbe::with_config(Config::from_env()).shmem_latency(peripherals)
}

/// Run the IPI-only probe with default settings.
///
/// Configuration is read from the environment (see [`Config::from_env`]).
/// The same ordering rule as [`shmem_latency`] applies between runs.
pub fn ipi_latency(peripherals: &Peripherals) -> Result<LatencyReport, ProbeError> {
    LatencyProbe::with_config(Config::from_env()).ipi_latency(peripherals)
}
