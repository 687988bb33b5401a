//! Low-level register and interface definitions for TSL2591

use embedded_hal::i2c::I2c;

#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c as AsyncI2c;

use crate::trace::{Trace, TraceEvent};

/// Default I2C address of the TSL2591
pub const I2C_ADDRESS: u8 = 0x29;

/// Expected content of the ID register
pub const DEVICE_ID: u8 = 0x50;

/// Command bit plus "normal operation" transaction type.
///
/// Every register access starts by writing `COMMAND | register`.
pub const COMMAND: u8 = 0xA0;

/// Register addresses
pub mod register {
    /// Power on, ALS enable and interrupt enables
    pub const ENABLE: u8 = 0x00;
    /// Gain and integration time
    pub const CONFIG: u8 = 0x01;
    /// Device identification
    pub const ID: u8 = 0x12;
    /// Channel 0 data, low byte
    pub const C0DATAL: u8 = 0x14;
    /// Channel 0 data, high byte
    pub const C0DATAH: u8 = 0x15;
    /// Channel 1 data, low byte
    pub const C1DATAL: u8 = 0x16;
    /// Channel 1 data, high byte
    pub const C1DATAH: u8 = 0x17;
}

/// Data registers in the order they are read
pub const DATA_REGISTERS: [u8; 4] = [
    register::C0DATAL,
    register::C0DATAH,
    register::C1DATAL,
    register::C1DATAH,
];

/// Mask applied to CONFIG before OR-ing in a new gain
pub const CONFIG_CLEAR_AGAIN_MASK: u8 = 0x07;

/// Mask applied to CONFIG before OR-ing in a new integration time
pub const CONFIG_CLEAR_ATIME_MASK: u8 = 0x30;

/// Command byte that points the device at `register`
#[inline]
pub const fn command(register: u8) -> u8 {
    COMMAND | register
}

/// Device interface implementation.
///
/// The TSL2591 has no addressed read: a register is selected with a one-byte
/// write, then read or written in a separate transfer.
#[derive(Debug)]
pub struct DeviceInterface<I2C, T = ()> {
    /// The I2C interface
    pub i2c: I2C,
    /// 7-bit bus address
    pub address: u8,
    /// Debug sink
    pub trace: T,
    /// Events reach `trace` only while this is set
    pub debug: bool,
}

impl<I2C, T: Trace> DeviceInterface<I2C, T> {
    /// Wrap a bus handle
    pub fn new(i2c: I2C, address: u8, trace: T, debug: bool) -> Self {
        Self {
            i2c,
            address,
            trace,
            debug,
        }
    }

    pub(crate) fn emit(&mut self, event: TraceEvent<'_>) {
        #[cfg(feature = "defmt-03")]
        defmt::trace!("tsl2591 {=u8:#x}: {}", self.address, event);
        if self.debug {
            self.trace.trace(event);
        }
    }
}

impl<I2C: I2c, T: Trace> DeviceInterface<I2C, T> {
    /// Point the device at `register`
    pub fn select(&mut self, register: u8) -> Result<(), I2C::Error> {
        let command = command(register);
        self.emit(TraceEvent::Command(command));
        self.i2c.write(self.address, &[command])
    }

    /// Read `data.len()` bytes from the selected register
    pub fn read(&mut self, data: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.read(self.address, data)?;
        self.emit(TraceEvent::Read(data));
        Ok(())
    }

    /// Write raw bytes to the selected register
    pub fn write(&mut self, data: &[u8]) -> Result<(), I2C::Error> {
        self.emit(TraceEvent::Write(data));
        self.i2c.write(self.address, data)
    }

    /// Select `register` and read one byte from it
    pub fn read_register(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut buffer = [0u8; 1];
        self.select(register)?;
        self.read(&mut buffer)?;
        Ok(buffer[0])
    }
}

#[cfg(feature = "async")]
impl<I2C: AsyncI2c, T: Trace> DeviceInterface<I2C, T> {
    /// Point the device at `register` (async version)
    pub async fn select_async(&mut self, register: u8) -> Result<(), I2C::Error> {
        let command = command(register);
        self.emit(TraceEvent::Command(command));
        self.i2c.write(self.address, &[command]).await
    }

    /// Read `data.len()` bytes from the selected register (async version)
    pub async fn read_async(&mut self, data: &mut [u8]) -> Result<(), I2C::Error> {
        self.i2c.read(self.address, data).await?;
        self.emit(TraceEvent::Read(data));
        Ok(())
    }

    /// Write raw bytes to the selected register (async version)
    pub async fn write_async(&mut self, data: &[u8]) -> Result<(), I2C::Error> {
        self.emit(TraceEvent::Write(data));
        self.i2c.write(self.address, data).await
    }

    /// Select `register` and read one byte from it (async version)
    pub async fn read_register_async(&mut self, register: u8) -> Result<u8, I2C::Error> {
        let mut buffer = [0u8; 1];
        self.select_async(register).await?;
        self.read_async(&mut buffer).await?;
        Ok(buffer[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};
    extern crate std;
    use std::vec;
    use std::vec::Vec;

    #[derive(Default)]
    struct Recorder {
        commands: Vec<u8>,
        reads: Vec<Vec<u8>>,
        writes: Vec<Vec<u8>>,
    }

    impl Trace for Recorder {
        fn trace(&mut self, event: TraceEvent<'_>) {
            match event {
                TraceEvent::Command(command) => self.commands.push(command),
                TraceEvent::Read(data) => self.reads.push(data.to_vec()),
                TraceEvent::Write(data) => self.writes.push(data.to_vec()),
                TraceEvent::Message(_) => {}
            }
        }
    }

    #[test]
    fn test_command_byte() {
        assert_eq!(command(register::ENABLE), 0xA0);
        assert_eq!(command(register::CONFIG), 0xA1);
        assert_eq!(command(register::ID), 0xB2);
        assert_eq!(command(register::C1DATAH), 0xB7);
    }

    #[test]
    fn test_read_register_is_select_then_read() {
        let expectations = [
            I2cTransaction::write(I2C_ADDRESS, vec![0xB2]),
            I2cTransaction::read(I2C_ADDRESS, vec![0x50]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut interface = DeviceInterface::new(i2c, I2C_ADDRESS, (), false);

        assert_eq!(interface.read_register(register::ID).unwrap(), 0x50);

        interface.i2c.done();
    }

    #[test]
    fn test_write_does_not_reselect() {
        let expectations = [
            I2cTransaction::write(0x30, vec![0xA0]),
            I2cTransaction::write(0x30, vec![0x03]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut interface = DeviceInterface::new(i2c, 0x30, (), false);

        interface.select(register::ENABLE).unwrap();
        interface.write(&[0x03]).unwrap();

        interface.i2c.done();
    }

    #[test]
    fn test_select_error_skips_read() {
        let expectations =
            [I2cTransaction::write(I2C_ADDRESS, vec![0xB2]).with_error(ErrorKind::Other)];
        let i2c = I2cMock::new(&expectations);
        let mut interface = DeviceInterface::new(i2c, I2C_ADDRESS, (), false);

        assert_eq!(
            interface.read_register(register::ID),
            Err(ErrorKind::Other)
        );

        interface.i2c.done();
    }

    #[test]
    fn test_trace_only_when_debug() {
        let expectations = [
            I2cTransaction::write(I2C_ADDRESS, vec![0xA1]),
            I2cTransaction::read(I2C_ADDRESS, vec![0x12]),
            I2cTransaction::write(I2C_ADDRESS, vec![0x22]),
            I2cTransaction::write(I2C_ADDRESS, vec![0xA1]),
        ];
        let i2c = I2cMock::new(&expectations);
        let mut recorder = Recorder::default();
        let mut interface = DeviceInterface::new(i2c, I2C_ADDRESS, &mut recorder, true);

        interface.read_register(register::CONFIG).unwrap();
        interface.write(&[0x22]).unwrap();
        interface.debug = false;
        interface.select(register::CONFIG).unwrap();

        interface.i2c.done();
        drop(interface);
        assert_eq!(recorder.commands, vec![0xA1]);
        assert_eq!(recorder.reads, vec![vec![0x12]]);
        assert_eq!(recorder.writes, vec![vec![0x22]]);
    }
}
