//! Preflight checks run on the bound channel before measuring.
//!
//! Warnings never stop a run; they are logged and attached to the report so
//! a suspicious result can be traced back to its setup.
//!
//! # Checks Performed
//!
//! - **Clock**: the outbound counter advances after a reset
//! - **Remote**: the remote has no unacknowledged kick from an earlier run

mod clock;
mod remote;

pub use clock::{check_clock, CLOCK_POLL_LIMIT};
pub use remote::check_remote_idle;

use serde::{Deserialize, Serialize};

use crate::channel::Channel;

/// Warning raised by a preflight check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreflightWarning {
    /// The counter did not move after a reset.
    ///
    /// Critical: every sample of the run will read as zero ticks.
    ClockStalled {
        /// Counter that stayed at zero.
        counter: u8,
        /// Reads attempted.
        polls: u32,
    },

    /// The remote still shows a pending kick in the observation register.
    RemoteBusy {
        /// Observation register value.
        obs: u32,
    },
}

impl PreflightWarning {
    /// Whether the run's numbers are meaningless with this warning.
    pub fn is_critical(&self) -> bool {
        matches!(self, PreflightWarning::ClockStalled { .. })
    }

    /// Human-readable description.
    pub fn description(&self) -> String {
        match self {
            PreflightWarning::ClockStalled { counter, polls } => format!(
                "CRITICAL: timer counter {counter} did not advance in {polls} reads after reset. \
                 Check that the TTC is clocked and not held disabled."
            ),
            PreflightWarning::RemoteBusy { obs } => format!(
                "Remote has not acknowledged an earlier kick (OBS {obs:#x}). \
                 The first round trip may be served by a stale reply."
            ),
        }
    }
}

/// Run every check against `channel`, logging each warning.
pub fn run_all_checks(channel: &Channel) -> Vec<PreflightWarning> {
    let warnings: Vec<_> = [
        check_clock(channel.clock(), channel.outbound()),
        check_remote_idle(channel.notify()),
    ]
    .into_iter()
    .flatten()
    .collect();

    for warning in &warnings {
        tracing::warn!(critical = warning.is_critical(), "{}", warning.description());
    }
    warnings
}
