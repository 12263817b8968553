//! The channel binding shared memory, IPI block and timer for one run.
//!
//! [`Channel::open`] performs the interrupt bring-up in hardware order:
//! mask the IPI source, clear any stale kick, install the handler, enable
//! the vector, unmask the source. Dropping the channel undoes it on every
//! exit path, error returns included.

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::constants::{IPI_IDR_OFFSET, IPI_IER_OFFSET, IPI_ISR_OFFSET};
use crate::error::SetupError;
use crate::hal::{IoRegion, IrqController, Peripherals};
use crate::measurement::{CounterId, HardwareClock};
use crate::notify::NotifyChannel;
use crate::shmem::SharedBuffer;

/// Interrupt registration held for the lifetime of a [`Channel`].
///
/// Dropping it masks the IPI source, disables the vector and removes the
/// handler.
pub struct IrqRegistration {
    irq: Arc<dyn IrqController>,
    ipi: Arc<dyn IoRegion>,
    vector: u32,
    mask: u32,
}

impl IrqRegistration {
    fn acquire(
        irq: Arc<dyn IrqController>,
        ipi: Arc<dyn IoRegion>,
        vector: u32,
        notify: Arc<NotifyChannel>,
    ) -> Result<Self, SetupError> {
        let mask = notify.mask();

        ipi.write32(IPI_IDR_OFFSET, mask);
        let stale = ipi.read32(IPI_ISR_OFFSET) & mask;
        if stale != 0 {
            tracing::warn!(vector, isr = stale, "clearing stale ipi kick");
        }
        ipi.write32(IPI_ISR_OFFSET, mask);

        irq.register(vector, Box::new(move |v| notify.handle_irq(v)))?;
        irq.enable(vector);
        ipi.write32(IPI_IER_OFFSET, mask);
        tracing::debug!(vector, mask, "ipi handler registered");

        Ok(Self {
            irq,
            ipi,
            vector,
            mask,
        })
    }
}

impl Drop for IrqRegistration {
    fn drop(&mut self) {
        self.ipi.write32(IPI_IDR_OFFSET, self.mask);
        self.irq.disable(self.vector);
        self.irq.unregister(self.vector);
        tracing::debug!(vector = self.vector, "ipi handler unregistered");
    }
}

/// Everything one probe run talks to.
pub struct Channel {
    shm: SharedBuffer,
    clock: HardwareClock,
    notify: Arc<NotifyChannel>,
    irq: Arc<dyn IrqController>,
    outbound: CounterId,
    inbound: CounterId,
    _registration: IrqRegistration,
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("shm", &self.shm)
            .field("notify", &self.notify)
            .field("outbound", &self.outbound)
            .field("inbound", &self.inbound)
            .finish_non_exhaustive()
    }
}

impl Channel {
    /// Bind the peripherals and register the IPI handler.
    pub fn open(peripherals: &Peripherals, config: &Config) -> Result<Self, SetupError> {
        config.validate()?;

        let required = config.layout.span();
        let actual = peripherals.shm.region.size();
        if actual < required {
            return Err(SetupError::RegionTooSmall {
                device: peripherals.shm.name.clone(),
                required,
                actual,
            });
        }
        let vector = peripherals
            .ipi
            .irq
            .ok_or_else(|| SetupError::MissingIrq {
                device: peripherals.ipi.name.clone(),
            })?;

        let notify = Arc::new(NotifyChannel::new(
            peripherals.ipi.region.clone(),
            config.ipi_mask,
        ));
        let registration = IrqRegistration::acquire(
            peripherals.irq.clone(),
            peripherals.ipi.region.clone(),
            vector,
            notify.clone(),
        )?;

        Ok(Self {
            shm: SharedBuffer::new(peripherals.shm.region.clone(), config.layout),
            clock: HardwareClock::new(peripherals.ttc.region.clone()),
            notify,
            irq: peripherals.irq.clone(),
            outbound: CounterId(config.outbound_counter),
            inbound: CounterId(config.inbound_counter),
            _registration: registration,
        })
    }

    /// Shared memory view.
    pub fn shm(&self) -> &SharedBuffer {
        &self.shm
    }

    /// Timer counters.
    pub fn clock(&self) -> &HardwareClock {
        &self.clock
    }

    /// IPI channel.
    pub fn notify(&self) -> &NotifyChannel {
        &self.notify
    }

    /// Counter timing the local-to-remote leg.
    pub fn outbound(&self) -> CounterId {
        self.outbound
    }

    /// Counter timing the remote-to-local leg.
    pub fn inbound(&self) -> CounterId {
        self.inbound
    }

    /// Arm the response flag and raise the remote's interrupt.
    pub fn kick(&self) {
        self.notify.kick();
    }

    /// Block until the remote has kicked back.
    pub fn wait(&self) {
        self.notify.wait_until_notified(self.irq.as_ref());
    }
}
