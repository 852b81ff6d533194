//! Throughput of accurate versus fast ranging on a Linux I²C bus.
//!
//! Run the bus at 400 kHz and put a 680 µF capacitor across the sensor's
//! power pins.

use std::time::Instant;

use lidar_lite_v3hp::linux::{Delay, I2cdev};
use lidar_lite_v3hp::{LidarLite, Profile};

const ACCURATE_RUNS: u32 = 280;
const FAST_RUNS: u32 = 330;

fn main() -> anyhow::Result<()> {
    let mut bus = I2cdev::new("/dev/i2c-1")?;
    let mut lidar = LidarLite::new(&mut bus, Delay, Profile::ShortRangeFast)?;

    let start = Instant::now();
    let mut timeouts = 0;
    for _ in 0..ACCURATE_RUNS {
        if !lidar.range()?.is_complete() {
            timeouts += 1;
        }
    }
    println!(
        "{ACCURATE_RUNS} accurate ranges: {:?} ({timeouts} busy timeouts)",
        start.elapsed()
    );

    let start = Instant::now();
    let mut last = 0;
    for _ in 0..FAST_RUNS {
        last = lidar.range_fast()?.distance;
    }
    println!("{FAST_RUNS} fast ranges: {:?} (last {last} cm)", start.elapsed());

    Ok(())
}
