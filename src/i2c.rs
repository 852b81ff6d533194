//! [I²C](https://en.wikipedia.org/wiki/I%C2%B2C) register access.

use embedded_hal::{delay::DelayNs, i2c::I2c};

#[cfg(feature = "tracing")]
use tracing::trace;

use crate::Register;

/// Time the sensor needs after a register write before it accepts the
/// next transaction (microseconds).
pub const WRITE_SETTLE_US: u32 = 10;

/// Largest register payload the driver ever writes.
const MAX_PAYLOAD: usize = 2;

pub(crate) struct Device<I2C, D> {
    pub addr: u8,
    pub i2c: I2C,
    pub delay: D,
}

impl<I2C: I2c, D: DelayNs> Device<I2C, D> {
    pub fn read_bytes(&mut self, reg: Register, dest: &mut [u8]) -> Result<(), I2C::Error> {
        #[cfg(feature = "tracing")]
        trace!(addr = self.addr, "read {:#04x} len {}", reg.addr(), dest.len());
        self.i2c.write_read(self.addr, &[reg.addr()], dest)
    }

    /// Write `data` starting at `reg`, then wait [`WRITE_SETTLE_US`].
    pub fn write_bytes(&mut self, reg: Register, data: &[u8]) -> Result<(), I2C::Error> {
        debug_assert!(data.len() <= MAX_PAYLOAD);

        let mut msg = [0; 1 + MAX_PAYLOAD];
        msg[0] = reg.addr();
        msg[1..=data.len()].copy_from_slice(data);

        #[cfg(feature = "tracing")]
        trace!(addr = self.addr, "write {:x?}", &msg[..=data.len()]);
        self.i2c.write(self.addr, &msg[..=data.len()])?;
        self.delay.delay_us(WRITE_SETTLE_US);

        Ok(())
    }
}

macro_rules! read_impl {
    ($name:ident, $out:ty) => {
        impl<I2C: I2c, D: DelayNs> Device<I2C, D> {
            /// Read a big-endian
            #[doc = concat!("[`", stringify!($out), "`]")]
            /// from some [`Register`].
            pub fn $name(&mut self, reg: Register) -> Result<$out, I2C::Error> {
                let mut buf = [0; core::mem::size_of::<$out>()];
                self.read_bytes(reg, &mut buf)?;
                Ok(<$out>::from_be_bytes(buf))
            }
        }
    };
}

read_impl!(read_byte, u8);
read_impl!(read_word, u16);

macro_rules! write_impl {
    ($name:ident, $in:ty) => {
        impl<I2C: I2c, D: DelayNs> Device<I2C, D> {
            /// Write a big-endian
            #[doc = concat!("[`", stringify!($in), "`]")]
            /// into some [`Register`].
            pub fn $name(&mut self, reg: Register, data: $in) -> Result<(), I2C::Error> {
                self.write_bytes(reg, &data.to_be_bytes())
            }
        }
    };
}

write_impl!(write_byte, u8);
