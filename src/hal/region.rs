//! Plain RAM-backed I/O region.

use parking_lot::Mutex;

use super::IoRegion;

/// A RAM region with no register side effects.
///
/// Accesses outside the region are clipped: word reads return 0, word writes
/// are dropped and block transfers report the bytes actually moved.
#[derive(Debug)]
pub struct MemRegion {
    bytes: Mutex<Vec<u8>>,
}

impl MemRegion {
    /// Create a zero-filled region of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: Mutex::new(vec![0; size]),
        }
    }

    /// Copy of `len` bytes at `offset`, clipped to the region.
    pub fn snapshot(&self, offset: usize, len: usize) -> Vec<u8> {
        let bytes = self.bytes.lock();
        let end = offset.saturating_add(len).min(bytes.len());
        bytes.get(offset..end).map(<[u8]>::to_vec).unwrap_or_default()
    }
}

impl IoRegion for MemRegion {
    fn size(&self) -> usize {
        self.bytes.lock().len()
    }

    fn read32(&self, offset: usize) -> u32 {
        let bytes = self.bytes.lock();
        match bytes.get(offset..offset.saturating_add(4)) {
            Some(word) => u32::from_le_bytes([word[0], word[1], word[2], word[3]]),
            None => 0,
        }
    }

    fn write32(&self, offset: usize, value: u32) {
        let mut bytes = self.bytes.lock();
        if let Some(word) = bytes.get_mut(offset..offset.saturating_add(4)) {
            word.copy_from_slice(&value.to_le_bytes());
        }
    }

    fn block_read(&self, offset: usize, buf: &mut [u8]) -> usize {
        let bytes = self.bytes.lock();
        let Some(avail) = bytes.len().checked_sub(offset) else {
            return 0;
        };
        let n = buf.len().min(avail);
        buf[..n].copy_from_slice(&bytes[offset..offset + n]);
        n
    }

    fn block_write(&self, offset: usize, buf: &[u8]) -> usize {
        let mut bytes = self.bytes.lock();
        let Some(avail) = bytes.len().checked_sub(offset) else {
            return 0;
        };
        let n = buf.len().min(avail);
        bytes[offset..offset + n].copy_from_slice(&buf[..n]);
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_little_endian() {
        let region = MemRegion::new(8);
        region.write32(4, 0x0403_0201);
        assert_eq!(region.snapshot(4, 4), vec![1, 2, 3, 4]);
        assert_eq!(region.read32(4), 0x0403_0201);
    }

    #[test]
    fn block_transfers_clip_at_end() {
        let region = MemRegion::new(16);
        assert_eq!(region.block_write(12, &[0xAA; 8]), 4);
        let mut buf = [0u8; 8];
        assert_eq!(region.block_read(12, &mut buf), 4);
        assert_eq!(&buf[..4], &[0xAA; 4]);
        assert_eq!(region.block_write(32, &[1]), 0);
        assert_eq!(region.read32(14), 0);
    }
}
