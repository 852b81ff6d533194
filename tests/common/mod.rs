//! A register-file model of the LIDAR-Lite v3HP, good enough to drive the
//! driver end to end.

#![allow(dead_code)]

use std::collections::VecDeque;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

pub const DEFAULT_ADDR: u8 = 0x62;
pub const UNIT_ID: [u8; 2] = [0x4a, 0x31];

/// One simulated sensor.
pub struct FakeLidar {
    pub regs: [u8; 0x20],
    /// Status polls that report busy after each trigger.
    pub busy_polls: u32,
    /// Distances produced by successive acquisitions.
    pub readings: VecDeque<u16>,
    /// Every register write, as `(bus address, register, data)`.
    pub writes: Vec<(u8, u8, Vec<u8>)>,
    busy_left: u32,
    pending: Option<u16>,
    pointer: u8,
}

impl FakeLidar {
    pub fn new() -> Self {
        let mut regs = [0; 0x20];
        regs[0x02] = 0x80;
        regs[0x04] = 0x08;
        regs[0x12] = 0x05;
        regs[0x16] = UNIT_ID[0];
        regs[0x17] = UNIT_ID[1];

        Self {
            regs,
            busy_polls: 0,
            readings: VecDeque::new(),
            writes: Vec::new(),
            busy_left: 0,
            pending: None,
            pointer: 0,
        }
    }

    pub fn with_readings(readings: impl IntoIterator<Item = u16>) -> Self {
        let mut fake = Self::new();
        fake.readings = readings.into_iter().collect();
        fake
    }

    pub fn distance(&self) -> u16 {
        u16::from_be_bytes([self.regs[0x0f], self.regs[0x10]])
    }

    pub fn responds_to(&self, address: u8) -> bool {
        let flags = self.regs[0x1e];
        let default = address == DEFAULT_ADDR && flags & 0x08 == 0;
        let secondary = flags & 0x10 != 0 && address == self.regs[0x1a] >> 1;
        default || secondary
    }

    fn latch(&mut self) {
        if let Some(distance) = self.pending.take() {
            let [hi, lo] = distance.to_be_bytes();
            self.regs[0x0f] = hi;
            self.regs[0x10] = lo;
        }
    }

    fn load(&mut self, reg: u8) -> u8 {
        if reg == 0x01 {
            if self.busy_left == 0 {
                return 0;
            }
            self.busy_left -= 1;
            if self.busy_left == 0 {
                self.latch();
            }
            return 0x01;
        }
        self.regs[usize::from(reg) % self.regs.len()]
    }

    fn store(&mut self, reg: u8, value: u8) {
        if reg == 0x00 && value == 0x01 {
            self.latch();
            self.pending = self.readings.pop_front();
            self.busy_left = self.busy_polls;
            if self.busy_left == 0 {
                self.latch();
            }
            return;
        }
        self.regs[usize::from(reg) % self.regs.len()] = value;
    }

    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let (&reg, data) = bytes.split_first().ok_or(ErrorKind::Other)?;
                    self.pointer = reg;
                    for (offset, &value) in data.iter().enumerate() {
                        self.store(reg + offset as u8, value);
                    }
                    if !data.is_empty() {
                        self.writes.push((address, reg, data.to_vec()));
                    }
                }
                Operation::Read(buf) => {
                    for (offset, slot) in buf.iter_mut().enumerate() {
                        *slot = self.load(self.pointer + offset as u8);
                    }
                }
            }
        }

        Ok(())
    }
}

/// A bus with any number of [`FakeLidar`]s on it.
pub struct FakeBus {
    pub sensors: Vec<FakeLidar>,
}

impl FakeBus {
    pub fn new(sensors: impl IntoIterator<Item = FakeLidar>) -> Self {
        Self {
            sensors: sensors.into_iter().collect(),
        }
    }

    pub fn sensor(&self) -> &FakeLidar {
        &self.sensors[0]
    }
}

impl ErrorType for FakeBus {
    type Error = ErrorKind;
}

impl I2c for FakeBus {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
        self.sensors
            .iter_mut()
            .find(|sensor| sensor.responds_to(address))
            .ok_or(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))?
            .transaction(address, operations)
    }
}

/// A delay that remembers every request, in nanoseconds.
#[derive(Default)]
pub struct RecordingDelay(pub Vec<u32>);

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(ns);
    }
}
