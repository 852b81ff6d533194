//! Blocking driver for the [Garmin LIDAR-Lite v3HP](https://static.garmin.com/pumac/LIDAR-Lite_v3HP_Instructions_EN.pdf)
//! laser rangefinder.
//!
//! ```no_run
//! use embedded_hal_mock::eh1::{delay::NoopDelay, i2c::Mock};
//! use lidar_lite_v3hp::{LidarLite, Profile};
//!
//! let i2c = Mock::new(&[]);
//! let mut lidar = LidarLite::new(i2c, NoopDelay, Profile::Balanced)?;
//!
//! for _ in 0..100 {
//!     let measurement = lidar.range()?;
//!     if measurement.is_complete() {
//!         println!("{} cm", measurement.distance);
//!     }
//! }
//! # Ok::<(), lidar_lite_v3hp::Error<embedded_hal::i2c::ErrorKind>>(())
//! ```
//!
//! The driver takes any [`embedded_hal::i2c::I2c`] implementation, so the bus
//! can stay with the caller: pass `&mut bus`, or one handle per sensor from
//! [`embedded-hal-bus`](https://docs.rs/embedded-hal-bus). The driver holds no
//! lock of its own. When several sensors share a bus across threads, each full
//! operation (such as [`LidarLite::range`]) must be serialized by the caller.

#![warn(missing_docs)]
#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod i2c;
#[cfg(feature = "linux")]
pub mod linux;
mod profile;
mod wait;

use core::fmt;

use embedded_hal::{delay::DelayNs, i2c::I2c};

#[cfg(feature = "tracing")]
use tracing::{debug, instrument};

use crate::i2c::Device;
pub use crate::{
    i2c::WRITE_SETTLE_US,
    profile::{Profile, Settings, UnknownProfile},
    wait::{Idle, MAX_BUSY_POLLS},
};

#[derive(Debug, Clone, Copy)]
#[allow(non_camel_case_types)]
enum Register {
    ACQ_COMMAND = 0x00,
    STATUS = 0x01,
    SIG_COUNT_VAL = 0x02,
    ACQ_CONFIG_REG = 0x04,
    FULL_DELAY = 0x0f,
    REF_COUNT_VAL = 0x12,
    UNIT_ID = 0x16,
    I2C_ID = 0x18,
    I2C_SEC_ADDR = 0x1a,
    THRESHOLD_BYPASS = 0x1c,
    I2C_CONFIG = 0x1e,
}

impl Register {
    const fn addr(&self) -> u8 {
        *self as u8
    }
}

/// Default I<sup>2</sup>C address of the LIDAR-Lite v3HP.
pub const PERIPHERAL_ADDR: u8 = 0x62;

/// Time the bus needs to settle after the driver is constructed, before the
/// first transaction (microseconds).
pub const BUS_SETTLE_US: u32 = 80;

/// `ACQ_COMMAND` value starting an acquisition.
const TAKE_RANGE: u8 = 0x01;
/// `ACQ_CONFIG_REG` bit disabling the reference filter.
const DISABLE_REF_FILTER: u8 = 1 << 4;
/// Overflows the reference integration as fast as possible.
const REF_COUNT_OVERFLOW: u8 = 0xff;
/// `I2C_CONFIG` bit enabling the address in `I2C_SEC_ADDR`.
const ENABLE_SEC_ADDR: u8 = 1 << 4;
/// `I2C_CONFIG` bit disabling [`PERIPHERAL_ADDR`].
const DISABLE_DEFAULT_ADDR: u8 = 1 << 3;

/// Driver errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// I<sup>2</sup>C transaction failed. The driver never retries.
    I2c(E),
    /// Profile id outside `0..=6`. Rejected before any bus traffic.
    UnknownProfile(u8),
    /// Address does not fit in 7 bits. Rejected before any bus traffic.
    InvalidAddress(u8),
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::I2c(e) => write!(f, "i2c error: {e:?}"),
            Error::UnknownProfile(id) => write!(f, "unknown profile id {id}"),
            Error::InvalidAddress(addr) => write!(f, "invalid 7-bit address {addr:#04x}"),
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for Error<E> {}

impl<E> From<UnknownProfile> for Error<E> {
    fn from(UnknownProfile(id): UnknownProfile) -> Self {
        Error::UnknownProfile(id)
    }
}

/// How much a [`Measurement`] can be trusted.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Status {
    /// The acquisition finished before the distance was read.
    Complete,
    /// The distance was read without waiting for the acquisition, see
    /// [`LidarLite::range_fast`]. It may belong to the previous acquisition.
    Speculative,
    /// A busy poll gave up after [`MAX_BUSY_POLLS`] reads. The distance may
    /// be stale or incomplete.
    BusyTimeout,
}

/// A LIDAR-Lite v3HP measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Measured distance to the target (centimeters).
    pub distance: u16,
    /// Trustworthiness of the measurement.
    pub status: Status,
}

impl Measurement {
    /// Whether the distance belongs to a fully completed acquisition.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }
}

/// A LIDAR-Lite v3HP laser rangefinder.
pub struct LidarLite<I2C, D> {
    dev: Device<I2C, D>,
    settings: Settings,
    profile: Option<Profile>,
}

impl<I2C, D> LidarLite<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Construct a sensor at [`PERIPHERAL_ADDR`] and apply `profile`.
    pub fn new(i2c: I2C, delay: D, profile: Profile) -> Result<Self, Error<I2C::Error>> {
        Self::with_address(i2c, delay, PERIPHERAL_ADDR, profile)
    }

    /// Construct a sensor at `address` and apply `profile`.
    ///
    /// Waits [`BUS_SETTLE_US`] before the first transaction.
    pub fn with_address(
        i2c: I2C,
        delay: D,
        address: u8,
        profile: Profile,
    ) -> Result<Self, Error<I2C::Error>> {
        let mut dev = Device {
            addr: address,
            i2c,
            delay,
        };
        dev.delay.delay_us(BUS_SETTLE_US);

        let mut lidar = Self {
            dev,
            settings: Settings::POWER_ON,
            profile: None,
        };
        lidar.configure(profile)?;

        Ok(lidar)
    }

    /// Like [`Self::with_address`], taking a raw profile id.
    ///
    /// An unknown id fails with [`Error::UnknownProfile`] without touching
    /// the bus.
    pub fn from_profile_id(
        i2c: I2C,
        delay: D,
        address: u8,
        id: u8,
    ) -> Result<Self, Error<I2C::Error>> {
        let profile = Profile::try_from(id)?;
        Self::with_address(i2c, delay, address, profile)
    }

    /// Write the four registers of `profile` to the sensor, in the order
    /// `SIG_COUNT_VAL`, `ACQ_CONFIG_REG`, `REF_COUNT_VAL`, `THRESHOLD_BYPASS`.
    ///
    /// [`Self::settings`] follows each write as it succeeds. If a write fails
    /// the remaining registers are left alone and [`Self::profile`] returns
    /// `None` until a later call succeeds.
    #[cfg_attr(feature = "tracing", instrument(err, skip(self), fields(addr = self.dev.addr)))]
    pub fn configure(&mut self, profile: Profile) -> Result<(), Error<I2C::Error>> {
        let target = profile.settings();
        self.profile = None;

        self.dev
            .write_byte(Register::SIG_COUNT_VAL, target.sig_count_max)
            .map_err(Error::I2c)?;
        self.settings.sig_count_max = target.sig_count_max;

        self.dev
            .write_byte(Register::ACQ_CONFIG_REG, target.acq_config)
            .map_err(Error::I2c)?;
        self.settings.acq_config = target.acq_config;

        self.dev
            .write_byte(Register::REF_COUNT_VAL, target.ref_count_max)
            .map_err(Error::I2c)?;
        self.settings.ref_count_max = target.ref_count_max;

        self.dev
            .write_byte(Register::THRESHOLD_BYPASS, target.threshold_bypass)
            .map_err(Error::I2c)?;
        self.settings.threshold_bypass = target.threshold_bypass;

        self.profile = Some(profile);

        #[cfg(feature = "tracing")]
        debug!(?target, "configured");

        Ok(())
    }

    /// [`Self::configure`] with a raw profile id.
    pub fn configure_id(&mut self, id: u8) -> Result<(), Error<I2C::Error>> {
        let profile = Profile::try_from(id)?;
        self.configure(profile)
    }

    /// Move the sensor to `new_address`.
    ///
    /// The sensor unlocks address changes once its own unit id is echoed back,
    /// then stores the new address shifted left by one bit. The driver
    /// switches to `new_address` right after enabling it. With
    /// `disable_default`, [`PERIPHERAL_ADDR`] is then turned off through the
    /// new address.
    ///
    /// <div class="warning">
    ///
    /// The change persists across power cycles, and disabling the default
    /// address can only be undone by a full reset. Nothing here confirms the
    /// sensor answers at the new address: check with [`Self::unit_id`]
    /// before relying on it. If this fails after the address was written but
    /// before it was enabled, the sensor's state is unknown.
    ///
    /// </div>
    #[cfg_attr(feature = "tracing", instrument(err, skip(self), fields(addr = self.dev.addr)))]
    pub fn change_address(
        &mut self,
        new_address: u8,
        disable_default: bool,
    ) -> Result<(), Error<I2C::Error>> {
        if new_address > 0x7f {
            return Err(Error::InvalidAddress(new_address));
        }

        let mut id = [0; 2];
        self.dev
            .read_bytes(Register::UNIT_ID, &mut id)
            .map_err(Error::I2c)?;
        self.dev
            .write_bytes(Register::I2C_ID, &id)
            .map_err(Error::I2c)?;

        id[0] = new_address << 1;
        self.dev
            .write_bytes(Register::I2C_SEC_ADDR, &id)
            .map_err(Error::I2c)?;

        self.set_config_flag(ENABLE_SEC_ADDR).map_err(Error::I2c)?;
        self.dev.addr = new_address;

        #[cfg(feature = "tracing")]
        debug!(new_address, "address enabled");

        if disable_default {
            self.set_config_flag(DISABLE_DEFAULT_ADDR)
                .map_err(Error::I2c)?;

            #[cfg(feature = "tracing")]
            debug!("default address disabled");
        }

        Ok(())
    }

    /// Take a measurement, waiting for it to complete.
    ///
    /// Waits for idle, triggers an acquisition, waits for idle again and
    /// reads the distance.
    pub fn range(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let before = wait::wait_for_idle(&mut self.dev).map_err(Error::I2c)?;
        self.trigger()?;
        let after = wait::wait_for_idle(&mut self.dev).map_err(Error::I2c)?;
        let distance = self.read_distance()?;

        let status = if before.timed_out() || after.timed_out() {
            Status::BusyTimeout
        } else {
            Status::Complete
        };

        Ok(Measurement { distance, status })
    }

    /// Take a measurement without waiting for it to complete.
    ///
    /// The distance is read right after the trigger, so it usually belongs
    /// to the previous acquisition: back-to-back calls return results one
    /// acquisition behind. Faster than [`Self::range`].
    pub fn range_fast(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let before = wait::wait_for_idle(&mut self.dev).map_err(Error::I2c)?;
        self.trigger()?;
        let distance = self.read_distance()?;

        let status = if before.timed_out() {
            Status::BusyTimeout
        } else {
            Status::Speculative
        };

        Ok(Measurement { distance, status })
    }

    /// Quickly reset the reference filter to improve the accuracy of the
    /// first measurements. Usually unnecessary, the filter settles by itself
    /// after a few hundred measurements.
    ///
    /// Overrides the reference registers, takes one [`Self::range`] and
    /// restores both registers to what they held before the call. The
    /// measurement taken is returned.
    #[cfg_attr(feature = "tracing", instrument(err, skip(self), fields(addr = self.dev.addr)))]
    pub fn reset_reference_filter(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let result = self.override_reference_filter();
        if result.is_err() {
            self.profile = None;
        }

        result
    }

    fn override_reference_filter(&mut self) -> Result<Measurement, Error<I2C::Error>> {
        let acq_config = self
            .dev
            .read_byte(Register::ACQ_CONFIG_REG)
            .map_err(Error::I2c)?;
        let ref_count = self
            .dev
            .read_byte(Register::REF_COUNT_VAL)
            .map_err(Error::I2c)?;

        // The vendor sequence sends the filter-disable byte to REF_COUNT_VAL
        // rather than ACQ_CONFIG_REG, and overwrites it right away.
        self.write_ref_count(acq_config | DISABLE_REF_FILTER)?;
        self.write_ref_count(REF_COUNT_OVERFLOW)?;

        let measurement = self.range()?;

        self.write_ref_count(ref_count)?;
        self.dev
            .write_byte(Register::ACQ_CONFIG_REG, acq_config)
            .map_err(Error::I2c)?;
        self.settings.acq_config = acq_config;

        Ok(measurement)
    }

    /// Start an acquisition. Unless you really like low-level, use
    /// [`Self::range`] or [`Self::range_fast`] instead.
    #[inline]
    pub fn trigger(&mut self) -> Result<(), Error<I2C::Error>> {
        self.dev
            .write_byte(Register::ACQ_COMMAND, TAKE_RANGE)
            .map_err(Error::I2c)
    }

    /// Whether an acquisition is in progress.
    #[inline]
    pub fn is_busy(&mut self) -> Result<bool, Error<I2C::Error>> {
        wait::is_busy(&mut self.dev).map_err(Error::I2c)
    }

    /// Poll the busy flag until the sensor is idle or [`MAX_BUSY_POLLS`]
    /// reads have passed. Giving up is reported as [`Idle::TimedOut`], not as
    /// an error.
    #[inline]
    pub fn wait_for_idle(&mut self) -> Result<Idle, Error<I2C::Error>> {
        wait::wait_for_idle(&mut self.dev).map_err(Error::I2c)
    }

    /// Read the last measured distance (centimeters).
    #[inline]
    pub fn read_distance(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.dev
            .read_word(Register::FULL_DELAY)
            .map_err(Error::I2c)
    }

    /// Read the factory unit id.
    #[inline]
    pub fn unit_id(&mut self) -> Result<u16, Error<I2C::Error>> {
        self.dev.read_word(Register::UNIT_ID).map_err(Error::I2c)
    }

    /// I<sup>2</sup>C address the driver talks to.
    #[inline]
    pub fn address(&self) -> u8 {
        self.dev.addr
    }

    /// The active profile, or `None` if the sensor's acquisition registers
    /// are not known to match one.
    #[inline]
    pub fn profile(&self) -> Option<Profile> {
        self.profile
    }

    /// Acquisition register values as last written by the driver.
    #[inline]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Destroy the driver, giving back the bus and the delay.
    pub fn release(self) -> (I2C, D) {
        (self.dev.i2c, self.dev.delay)
    }

    fn write_ref_count(&mut self, value: u8) -> Result<(), Error<I2C::Error>> {
        self.dev
            .write_byte(Register::REF_COUNT_VAL, value)
            .map_err(Error::I2c)?;
        self.settings.ref_count_max = value;
        Ok(())
    }

    fn set_config_flag(&mut self, flag: u8) -> Result<(), I2C::Error> {
        let flags = self.dev.read_byte(Register::I2C_CONFIG)?;
        self.dev.write_byte(Register::I2C_CONFIG, flags | flag)
    }
}
