//! Register layout, masks and shared-memory offsets of the AMP demo platform.
//!
//! These values are bit-exact with the hardware and with the firmware running
//! on the remote core. Changing any of them breaks the implicit protocol.

/// IPI block device name.
pub const IPI_DEV_NAME: &str = "ff340000.ipi";
/// Shared memory device name.
pub const SHM_DEV_NAME: &str = "3ed80000.shm";
/// Triple timer counter device name.
pub const TTC_DEV_NAME: &str = "ff110000.ttc";

/// IPI trigger register.
pub const IPI_TRIG_OFFSET: usize = 0x0;
/// IPI observation register.
pub const IPI_OBS_OFFSET: usize = 0x4;
/// IPI interrupt status register (write 1 to clear).
pub const IPI_ISR_OFFSET: usize = 0x10;
/// IPI interrupt mask register.
pub const IPI_IMR_OFFSET: usize = 0x14;
/// IPI interrupt enable register.
pub const IPI_IER_OFFSET: usize = 0x18;
/// IPI interrupt disable register.
pub const IPI_IDR_OFFSET: usize = 0x1C;

/// Channel bit identifying kicks exchanged with the remote core.
pub const IPI_MASK: u32 = 0x100;

/// TTC clock control register.
pub const TTC_CLK_CNTRL_OFFSET: usize = 0x0;
/// TTC counter control register.
pub const TTC_CNT_CNTRL_OFFSET: usize = 0xC;
/// TTC counter value register.
pub const TTC_CNT_VAL_OFFSET: usize = 0x18;

/// Counter control: reset the count.
pub const TTC_CNT_CNTRL_RST_MASK: u32 = 0x10;
/// Counter control: disable (freeze) the counter.
pub const TTC_CNT_CNTRL_DIS_MASK: u32 = 0x01;

/// Counter measuring local-to-remote latency.
pub const TTC_CNT_APU_TO_RPU: u8 = 2;
/// Counter measuring remote-to-local latency.
pub const TTC_CNT_RPU_TO_APU: u8 = 3;

/// Input clock of the TTC.
pub const TTC_CLK_FREQ_HZ: u64 = 100_000_000;
/// Nanoseconds per second.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Shared memory control word.
pub const SHM_DEMO_CNTRL_OFFSET: usize = 0x0;
/// Start of the transmit window (written locally, read by the remote).
pub const SHM_BUFF_OFFSET_TX: usize = 0x1000;
/// Start of the receive window (written by the remote, read locally).
pub const SHM_BUFF_OFFSET_RX: usize = 0x2000;
/// Size of each of the transmit and receive windows.
pub const SHM_WINDOW_SIZE: usize = 0x1000;

/// Control word value: demo idle or finished.
pub const DEMO_STATUS_IDLE: u32 = 0x0;
/// Control word value: demo running.
pub const DEMO_STATUS_START: u32 = 0x1;

/// Round trips per message size.
pub const ITERATIONS: usize = 1000;

/// Size of the local staging buffer.
pub const BUF_SIZE_MAX: usize = 4096;
/// Smallest message exchanged.
pub const PKG_SIZE_MIN: usize = 16;
/// Largest message exchanged.
pub const PKG_SIZE_MAX: usize = 1024;

/// Payload fill pattern. Content is never checked on the way back.
pub const FILL_BYTE: u8 = 0x0A;
