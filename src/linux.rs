//! Linux `i2c-dev` support through [`linux_embedded_hal`].
//!
//! [`I2cdev`] addresses every transaction itself, so one handle serves any
//! number of sensors on the bus.
//!
//! ```no_run
//! use lidar_lite_v3hp::{linux::{Delay, I2cdev}, LidarLite, Profile};
//!
//! let mut bus = I2cdev::new("/dev/i2c-1")?;
//! let mut lidar = LidarLite::new(&mut bus, Delay, Profile::Balanced)?;
//! println!("{} cm", lidar.range()?.distance);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use linux_embedded_hal::{i2cdev, Delay, I2cdev};
