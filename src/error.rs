//! Error taxonomy for channel setup and latency measurement.

use std::fmt;

use thiserror::Error;

/// A required resource could not be acquired before measuring.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The device registry has no device with this name.
    #[error("failed to open device {device}")]
    DeviceNotFound {
        /// Logical device name that was looked up.
        device: String,
    },

    /// The IPI device does not expose an interrupt vector.
    #[error("device {device} has no interrupt vector")]
    MissingIrq {
        /// Logical device name.
        device: String,
    },

    /// Another handler already owns the vector.
    #[error("interrupt vector {vector} already has a handler")]
    IrqInUse {
        /// Interrupt vector id.
        vector: u32,
    },

    /// The device region cannot hold the configured layout.
    #[error("io region of {device} is {actual:#x} bytes, need {required:#x}")]
    RegionTooSmall {
        /// Logical device name.
        device: String,
        /// Bytes the configured layout needs.
        required: usize,
        /// Bytes the region provides.
        actual: usize,
    },

    /// The configuration is inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Direction of a shared-memory block transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOp {
    /// Block write into the transmit window.
    Write,
    /// Block read from the receive window.
    Read,
}

impl fmt::Display for TransferOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferOp::Write => f.write_str("write"),
            TransferOp::Read => f.write_str("read"),
        }
    }
}

/// Coarse classification of a [`ProbeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Failure before any measurement started.
    Setup,
    /// Short block transfer.
    Transfer,
    /// Echoed header does not match the request.
    Protocol,
}

/// Fatal error aborting a latency probe.
///
/// Every variant invalidates the whole run: there is no retry and no partial
/// result for the sizes that already completed.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Setup failed; nothing was sent to the remote.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// A block transfer moved fewer (or more) bytes than requested.
    #[error("{op} shm failure: {expected},{actual} (size {size}, iteration {iteration})")]
    Transfer {
        /// Transfer direction.
        op: TransferOp,
        /// Message size being measured.
        size: usize,
        /// 1-based iteration within the size block.
        iteration: u32,
        /// Bytes requested.
        expected: usize,
        /// Bytes actually transferred.
        actual: usize,
    },

    /// The echoed length field is not `size - header`.
    #[error("read shm failure: {expected},{actual} (iteration {iteration})")]
    Protocol {
        /// Message size being measured.
        size: usize,
        /// 1-based iteration within the size block.
        iteration: u32,
        /// Expected total message size.
        expected: usize,
        /// Total size implied by the echoed length field.
        actual: usize,
    },
}

impl ProbeError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProbeError::Setup(_) => ErrorKind::Setup,
            ProbeError::Transfer { .. } => ErrorKind::Transfer,
            ProbeError::Protocol { .. } => ErrorKind::Protocol,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_message_names_counts() {
        let err = ProbeError::Transfer {
            op: TransferOp::Write,
            size: 16,
            iteration: 3,
            expected: 16,
            actual: 8,
        };
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(
            err.to_string(),
            "write shm failure: 16,8 (size 16, iteration 3)"
        );
    }

    #[test]
    fn setup_is_transparent() {
        let err: ProbeError = SetupError::DeviceNotFound {
            device: "ff110000.ttc".into(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Setup);
        assert_eq!(err.to_string(), "failed to open device ff110000.ttc");
    }
}
