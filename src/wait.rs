//! The LIDAR-Lite v3HP raises bit 0 of its status register while an
//! acquisition is running. This module polls that bit until the sensor is
//! idle, giving up after [`MAX_BUSY_POLLS`] reads rather than hanging on a
//! sensor that never settles.

use embedded_hal::{delay::DelayNs, i2c::I2c};

#[cfg(feature = "tracing")]
use tracing::warn;

use crate::{i2c::Device, Register};

/// Number of status reads before [`wait_for_idle`] gives up.
pub const MAX_BUSY_POLLS: u16 = 10_000;

const BUSY: u8 = 0x01;

/// Outcome of waiting for the busy flag to clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Idle {
    /// The sensor reported idle.
    Ready,
    /// The sensor was still busy after [`MAX_BUSY_POLLS`] reads.
    TimedOut,
}

impl Idle {
    /// Whether the poll gave up.
    #[inline]
    pub fn timed_out(&self) -> bool {
        *self == Idle::TimedOut
    }
}

pub(crate) fn is_busy<I2C, D>(dev: &mut Device<I2C, D>) -> Result<bool, I2C::Error>
where
    I2C: I2c,
    D: DelayNs,
{
    Ok(dev.read_byte(Register::STATUS)? & BUSY != 0)
}

/// Poll the busy flag back to back, with no delay between reads.
pub(crate) fn wait_for_idle<I2C, D>(dev: &mut Device<I2C, D>) -> Result<Idle, I2C::Error>
where
    I2C: I2c,
    D: DelayNs,
{
    for _ in 0..MAX_BUSY_POLLS {
        if !is_busy(dev)? {
            return Ok(Idle::Ready);
        }
    }

    #[cfg(feature = "tracing")]
    warn!(addr = dev.addr, "giving up on busy flag after {} polls", MAX_BUSY_POLLS);

    Ok(Idle::TimedOut)
}
