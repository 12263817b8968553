//! Interfaces to the platform: I/O regions, interrupts and device lookup.
//!
//! The measurement core only ever talks to hardware through these traits.
//! On a real target they wrap memory-mapped registers and the interrupt
//! controller; on the host they are backed by [`crate::sim`].

mod region;

use std::fmt;
use std::sync::Arc;

pub use region::MemRegion;

use crate::config::DeviceNames;
use crate::error::SetupError;

/// An addressable memory-mapped range with typed access at byte offsets.
///
/// Writes must be visible to the other core by the time the call returns;
/// the notify path relies on this before raising the remote interrupt.
pub trait IoRegion: Send + Sync {
    /// Size of the region in bytes.
    fn size(&self) -> usize;

    /// Read a 32-bit word.
    fn read32(&self, offset: usize) -> u32;

    /// Write a 32-bit word.
    fn write32(&self, offset: usize, value: u32);

    /// Copy `buf.len()` bytes out of the region. Returns the bytes read.
    fn block_read(&self, offset: usize, buf: &mut [u8]) -> usize;

    /// Copy `buf` into the region. Returns the bytes written.
    fn block_write(&self, offset: usize, buf: &[u8]) -> usize;
}

/// Result of an interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqStatus {
    /// The interrupt was for this handler and has been acknowledged.
    Handled,
    /// Not ours; the dispatcher may try other handlers on the vector.
    NotHandled,
}

/// Interrupt handler callback, invoked with the vector id.
pub type IrqHandler = Box<dyn Fn(u32) -> IrqStatus + Send + Sync>;

/// Saved interrupt mask state returned by [`IrqController::save_and_disable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqFlags(pub u32);

/// The interrupt subsystem of the local core.
pub trait IrqController: Send + Sync {
    /// Install `handler` for `vector`.
    fn register(&self, vector: u32, handler: IrqHandler) -> Result<(), SetupError>;

    /// Remove the handler for `vector`.
    fn unregister(&self, vector: u32);

    /// Unmask `vector` at the interrupt controller.
    fn enable(&self, vector: u32);

    /// Mask `vector` at the interrupt controller.
    fn disable(&self, vector: u32);

    /// Mask all interrupts on this core and return the previous state.
    fn save_and_disable(&self) -> IrqFlags;

    /// Restore a state returned by [`IrqController::save_and_disable`].
    fn restore(&self, flags: IrqFlags);

    /// Enter the low-power wait state until an interrupt is pending.
    ///
    /// Called with interrupts masked; a pending interrupt still ends the
    /// wait and is delivered once the mask is restored.
    fn wait_for_interrupt(&self);
}

/// A device found in the registry.
#[derive(Clone)]
pub struct Device {
    /// Logical device name.
    pub name: String,
    /// First I/O region of the device.
    pub region: Arc<dyn IoRegion>,
    /// Interrupt vector of the device, if it has one.
    pub irq: Option<u32>,
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("size", &self.region.size())
            .field("irq", &self.irq)
            .finish()
    }
}

/// Device lookup by logical name.
pub trait DeviceRegistry {
    /// Open the device called `name`, or `None` if absent.
    fn open(&self, name: &str) -> Option<Device>;
}

/// Every platform handle a probe needs, resolved once at program entry.
#[derive(Clone)]
pub struct Peripherals {
    /// Shared memory between the two cores.
    pub shm: Device,
    /// Triple timer counter.
    pub ttc: Device,
    /// IPI block, carrying the interrupt vector.
    pub ipi: Device,
    /// Local interrupt controller.
    pub irq: Arc<dyn IrqController>,
}

impl Peripherals {
    /// Look up the shared memory, timer and IPI devices.
    ///
    /// Fails on the first missing device without touching any of them.
    pub fn open(
        registry: &dyn DeviceRegistry,
        names: &DeviceNames,
        irq: Arc<dyn IrqController>,
    ) -> Result<Self, SetupError> {
        let shm = open_device(registry, &names.shm)?;
        let ttc = open_device(registry, &names.ttc)?;
        let ipi = open_device(registry, &names.ipi)?;
        if ipi.irq.is_none() {
            tracing::debug!(device = %ipi.name, "ipi device has no interrupt");
            return Err(SetupError::MissingIrq { device: ipi.name });
        }
        Ok(Self { shm, ttc, ipi, irq })
    }
}

fn open_device(registry: &dyn DeviceRegistry, name: &str) -> Result<Device, SetupError> {
    registry.open(name).ok_or_else(|| {
        tracing::debug!(device = name, "failed to map io region");
        SetupError::DeviceNotFound {
            device: name.to_string(),
        }
    })
}
