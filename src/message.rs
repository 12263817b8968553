//! Message wire format exchanged through the shared memory windows.
//!
//! ```text
//! +--------+--------+------------------+
//! | index  |  len   | payload (len B)  |
//! +--------+--------+------------------+
//!   u32 LE   u32 LE
//! ```
//!
//! `len` always equals the total message size minus the 8-byte header. The
//! remote echoes the message unchanged; only the header is checked on return.

use crate::error::ProbeError;

/// Size of [`MessageHeader`] on the wire.
pub const HEADER_SIZE: usize = 8;

/// Sequence index and payload length preceding every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// 1-based iteration number.
    pub index: u32,
    /// Payload bytes following the header.
    pub len: u32,
}

impl MessageHeader {
    /// Header for a message of `size` total bytes.
    ///
    /// `size` must be at least [`HEADER_SIZE`]; [`crate::Config::validate`]
    /// guarantees this for every configured size.
    pub fn for_size(index: u32, size: usize) -> Self {
        Self {
            index,
            len: size.saturating_sub(HEADER_SIZE) as u32,
        }
    }

    /// Total message size described by this header.
    pub fn total_size(&self) -> usize {
        self.len as usize + HEADER_SIZE
    }

    /// Write the header into the first [`HEADER_SIZE`] bytes of `buf`.
    pub fn encode(&self, buf: &mut [u8]) {
        buf[0..4].copy_from_slice(&self.index.to_le_bytes());
        buf[4..8].copy_from_slice(&self.len.to_le_bytes());
    }

    /// Read a header from the first [`HEADER_SIZE`] bytes of `buf`.
    pub fn decode(buf: &[u8]) -> Self {
        let word = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Self {
            index: word(0),
            len: word(4),
        }
    }
}

/// Lay out a `size`-byte message for iteration `index` at the start of `buf`.
///
/// The payload is left as whatever `buf` already holds (the fill pattern).
pub fn prepare(buf: &mut [u8], index: u32, size: usize) {
    MessageHeader::for_size(index, size).encode(&mut buf[..size]);
}

/// Check the header of an echoed `size`-byte message.
pub fn validate_echo(buf: &[u8], size: usize, iteration: u32) -> Result<MessageHeader, ProbeError> {
    let header = MessageHeader::decode(buf);
    let expected = MessageHeader::for_size(iteration, size);
    if header.len != expected.len {
        tracing::debug!(
            size,
            iteration,
            expected = size,
            actual = header.total_size(),
            "read shm failure"
        );
        return Err(ProbeError::Protocol {
            size,
            iteration,
            expected: size,
            actual: header.total_size(),
        });
    }
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn header_layout_is_index_then_len() {
        let mut buf = [0u8; 16];
        prepare(&mut buf, 7, 16);
        assert_eq!(&buf[..8], &[7, 0, 0, 0, 8, 0, 0, 0]);
        assert_eq!(MessageHeader::decode(&buf), MessageHeader { index: 7, len: 8 });
    }

    #[test]
    fn prepare_keeps_payload() {
        let mut buf = [0x0Au8; 32];
        prepare(&mut buf, 1, 32);
        assert!(buf[HEADER_SIZE..].iter().all(|&b| b == 0x0A));
    }

    #[test]
    fn echo_with_length_including_header_is_rejected() {
        let mut buf = [0u8; 64];
        MessageHeader { index: 1, len: 64 }.encode(&mut buf);
        let err = validate_echo(&buf, 64, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(matches!(
            err,
            ProbeError::Protocol { expected: 64, actual: 72, .. }
        ));
    }

    #[test]
    fn index_is_not_validated() {
        let mut buf = [0u8; 16];
        MessageHeader { index: 99, len: 8 }.encode(&mut buf);
        assert_eq!(validate_echo(&buf, 16, 1).unwrap().index, 99);
    }
}
