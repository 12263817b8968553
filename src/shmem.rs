//! Shared memory partitioned into a control word and two message windows.
//!
//! The local core writes only the transmit window and the control word; the
//! remote writes only the receive window. This split is a contract with the
//! remote firmware and is not enforced here.

use std::fmt;
use std::sync::Arc;

use crate::config::ShmLayout;
use crate::constants::{DEMO_STATUS_IDLE, DEMO_STATUS_START};
use crate::hal::IoRegion;

/// Values of the shared control word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoStatus {
    /// No demo running; tells the remote to leave its loop.
    Idle,
    /// Demo running.
    Start,
}

impl DemoStatus {
    /// Raw control word value.
    pub const fn raw(self) -> u32 {
        match self {
            DemoStatus::Idle => DEMO_STATUS_IDLE,
            DemoStatus::Start => DEMO_STATUS_START,
        }
    }

    /// Decode a control word. Anything but START reads as idle.
    pub const fn from_raw(raw: u32) -> Self {
        if raw == DEMO_STATUS_START {
            DemoStatus::Start
        } else {
            DemoStatus::Idle
        }
    }
}

/// View of the shared memory region through the agreed layout.
#[derive(Clone)]
pub struct SharedBuffer {
    io: Arc<dyn IoRegion>,
    layout: ShmLayout,
}

impl fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}

impl SharedBuffer {
    /// Wrap the shared memory region.
    pub fn new(io: Arc<dyn IoRegion>, layout: ShmLayout) -> Self {
        Self { io, layout }
    }

    /// The layout in use.
    pub fn layout(&self) -> &ShmLayout {
        &self.layout
    }

    /// Write the control word.
    pub fn set_status(&self, status: DemoStatus) {
        self.io.write32(self.layout.control, status.raw());
    }

    /// Read the control word.
    pub fn status(&self) -> DemoStatus {
        DemoStatus::from_raw(self.io.read32(self.layout.control))
    }

    /// Copy `msg` into the transmit window. Returns the bytes written.
    pub fn write_tx(&self, msg: &[u8]) -> usize {
        self.io.block_write(self.layout.tx, msg)
    }

    /// Fill `buf` from the receive window. Returns the bytes read.
    pub fn read_rx(&self, buf: &mut [u8]) -> usize {
        self.io.block_read(self.layout.rx, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::MemRegion;

    #[test]
    fn windows_land_at_layout_offsets() {
        let region = Arc::new(MemRegion::new(0x3000));
        let shm = SharedBuffer::new(region.clone(), ShmLayout::default());

        shm.set_status(DemoStatus::Start);
        assert_eq!(region.read32(0), 1);
        assert_eq!(shm.status(), DemoStatus::Start);

        assert_eq!(shm.write_tx(&[0xAB; 16]), 16);
        assert_eq!(region.snapshot(0x1000, 16), vec![0xAB; 16]);

        region.block_write(0x2000, &[0xCD; 16]);
        let mut buf = [0u8; 16];
        assert_eq!(shm.read_rx(&mut buf), 16);
        assert_eq!(buf, [0xCD; 16]);

        shm.set_status(DemoStatus::Idle);
        assert_eq!(region.read32(0), 0);
    }
}
