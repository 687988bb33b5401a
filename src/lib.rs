//! # TSL2591 High-Dynamic-Range Ambient Light Sensor Driver
//!
//! This is a platform-agnostic Rust driver for the TSL2591 light-to-digital converter,
//! built using the [`embedded-hal`] traits for I2C communication.
//!
//! The TSL2591 has two photodiodes:
//! - Channel 0, sensitive to the full spectrum (visible plus infrared)
//! - Channel 1, sensitive to infrared only
//!
//! ## Features
//!
//! - **Identity check** and power-up on construction
//! - **Configurable gain** (1x, 25x, 428x, 9876x) and **integration time** (100ms to 600ms)
//! - **Raw, full-spectrum, infrared and visible** readings
//! - **Lux calculation** with overflow detection
//! - **Async/await support** with feature gating (optional)
//! - **Debug tracing** of every bus transfer through a pluggable [`Trace`] sink
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tsl2591::{Gain, IntegrationTime, Tsl2591};
//!
//! # fn main() {
//! # let i2c = embedded_hal_mock::eh1::i2c::Mock::new(&[]);
//! // Check the device ID and power the sensor up
//! let mut sensor = Tsl2591::new(i2c).unwrap();
//!
//! // Configure measurement settings
//! sensor.set_gain(Gain::Medium).unwrap();
//! sensor.set_integration_time(IntegrationTime::Ms300).unwrap();
//!
//! // Every reading goes back to the device
//! let raw = sensor.raw_luminosity().unwrap();
//! let lux = sensor.lux().unwrap();
//! # let _ = (raw, lux);
//! # }
//! ```
//!
//! ## Async Usage
//!
//! Enable the `async` feature to use async/await patterns:
//!
//! ```toml
//! [dependencies]
//! tsl2591 = { version = "0.1", features = ["async"] }
//! ```
//!
//! ```rust,ignore
//! use tsl2591::{Gain, Tsl2591};
//!
//! let mut sensor = Tsl2591::new_async(i2c).await?;
//! sensor.set_gain_async(Gain::High).await?;
//! let lux = sensor.lux_async().await?;
//! ```
//!
//! [`embedded-hal`]: https://crates.io/crates/embedded-hal

#![no_std]
#![deny(missing_docs)]

use embedded_hal::i2c::I2c;

#[cfg(feature = "async")]
use embedded_hal_async::i2c::I2c as AsyncI2c;

pub mod ll;
mod trace;

use ll::{register, DeviceInterface, CONFIG_CLEAR_AGAIN_MASK, CONFIG_CLEAR_ATIME_MASK};
pub use ll::{DEVICE_ID, I2C_ADDRESS};
pub use trace::{Trace, TraceEvent};

// Lux coefficients
const LUX_DF: f32 = 408.0;
const LUX_COEFB: f32 = 1.64;
const LUX_COEFC: f32 = 0.59;
const LUX_COEFD: f32 = 0.86;

/// Channel ceiling at 100ms integration time
pub const MAX_COUNT_100MS: u16 = 36863;
/// Channel ceiling at every other integration time
pub const MAX_COUNT: u16 = 65535;

/// Analog gain settings, encoded as they appear in the CONFIG register
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Gain {
    /// 1x gain
    #[default]
    Low = 0x00,
    /// 25x gain
    Medium = 0x10,
    /// 428x gain
    High = 0x20,
    /// 9876x gain
    Max = 0x30,
}

impl Gain {
    /// Every gain setting, lowest first
    pub const ALL: [Gain; 4] = [Gain::Low, Gain::Medium, Gain::High, Gain::Max];

    /// Amplification factor used in the lux calculation
    pub const fn multiplier(self) -> f32 {
        match self {
            Gain::Low => 1.0,
            Gain::Medium => 25.0,
            Gain::High => 428.0,
            Gain::Max => 9876.0,
        }
    }
}

impl TryFrom<u8> for Gain {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Gain::Low),
            0x10 => Ok(Gain::Medium),
            0x20 => Ok(Gain::High),
            0x30 => Ok(Gain::Max),
            _ => Err(InvalidArgument {
                kind: "gain",
                value,
            }),
        }
    }
}

/// ALS integration time settings
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 100ms integration time
    #[default]
    Ms100 = 0x00,
    /// 200ms integration time
    Ms200 = 0x01,
    /// 300ms integration time
    Ms300 = 0x02,
    /// 400ms integration time
    Ms400 = 0x03,
    /// 500ms integration time
    Ms500 = 0x04,
    /// 600ms integration time
    Ms600 = 0x05,
}

impl IntegrationTime {
    /// Every integration time, shortest first
    pub const ALL: [IntegrationTime; 6] = [
        IntegrationTime::Ms100,
        IntegrationTime::Ms200,
        IntegrationTime::Ms300,
        IntegrationTime::Ms400,
        IntegrationTime::Ms500,
        IntegrationTime::Ms600,
    ];

    /// Integration time in milliseconds
    pub const fn as_millis(self) -> u16 {
        100 * (self as u16 + 1)
    }

    /// Count at which a channel is considered saturated
    pub const fn max_count(self) -> u16 {
        match self {
            IntegrationTime::Ms100 => MAX_COUNT_100MS,
            _ => MAX_COUNT,
        }
    }
}

impl TryFrom<u8> for IntegrationTime {
    type Error = InvalidArgument;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(IntegrationTime::Ms100),
            0x01 => Ok(IntegrationTime::Ms200),
            0x02 => Ok(IntegrationTime::Ms300),
            0x03 => Ok(IntegrationTime::Ms400),
            0x04 => Ok(IntegrationTime::Ms500),
            0x05 => Ok(IntegrationTime::Ms600),
            _ => Err(InvalidArgument {
                kind: "integration time",
                value,
            }),
        }
    }
}

/// Contents of the ENABLE register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct Enable {
    /// AEN: run the ALS ADCs
    pub als_enable: bool,
    /// AIEN: ALS interrupt
    pub als_interrupt_enable: bool,
    /// NPIEN: no-persist interrupt
    pub no_persist_interrupt_enable: bool,
    /// PON: oscillator power
    pub power_on: bool,
}

impl Enable {
    /// Everything off
    pub const OFF: Enable = Enable {
        als_enable: false,
        als_interrupt_enable: false,
        no_persist_interrupt_enable: false,
        power_on: false,
    };

    /// Register encoding: NPIEN bit 7, AIEN bit 4, AEN bit 1, PON bit 0
    pub const fn bits(self) -> u8 {
        (self.no_persist_interrupt_enable as u8) << 7
            | (self.als_interrupt_enable as u8) << 4
            | (self.als_enable as u8) << 1
            | self.power_on as u8
    }
}

impl Default for Enable {
    fn default() -> Self {
        Enable {
            als_enable: true,
            power_on: true,
            ..Enable::OFF
        }
    }
}

/// One sample of both photodiode channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub struct RawLuminosity {
    /// Channel 0: full spectrum (visible plus infrared)
    pub channel_0: u16,
    /// Channel 1: infrared only
    pub channel_1: u16,
}

impl RawLuminosity {
    /// Assemble both channels from the C0DATAL, C0DATAH, C1DATAL, C1DATAH bytes
    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            channel_0: (bytes[1] as u16) << 8 | bytes[0] as u16,
            channel_1: (bytes[3] as u16) << 8 | bytes[2] as u16,
        }
    }

    /// Channel 1 in the upper 16 bits, channel 0 in the lower 16 bits.
    ///
    /// This is a packing of both counts, not their sum.
    pub const fn full_spectrum(&self) -> u32 {
        (self.channel_1 as u32) << 16 | self.channel_0 as u32
    }

    /// Infrared count (channel 1)
    pub const fn infrared(&self) -> u16 {
        self.channel_1
    }

    /// [`full_spectrum`](Self::full_spectrum) minus the infrared count
    pub const fn visible(&self) -> u32 {
        self.full_spectrum() - self.channel_1 as u32
    }

    /// Convert to lux for the given gain and integration time.
    ///
    /// Fails with [`Overflow`] when either channel has reached the ceiling for `time`;
    /// reduce gain or integration time, or shade the sensor.
    pub fn lux(&self, gain: Gain, time: IntegrationTime) -> Result<f32, Overflow> {
        let max_count = time.max_count();
        if self.channel_0 >= max_count || self.channel_1 >= max_count {
            return Err(Overflow {
                channel_0: self.channel_0,
                channel_1: self.channel_1,
                max_count,
            });
        }

        // Counts per lux
        let cpl = f32::from(time.as_millis()) * gain.multiplier() / LUX_DF;

        let ch0 = f32::from(self.channel_0);
        let ch1 = f32::from(self.channel_1);
        let lux0 = (ch0 - LUX_COEFB * ch1) / cpl;
        let lux1 = (LUX_COEFC * ch0 - LUX_COEFD * ch1) / cpl;

        Ok(lux0.max(lux1))
    }
}

/// A gain or integration time outside the supported set
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[error("invalid {kind} value {value:#04x}")]
pub struct InvalidArgument {
    /// Which setting was rejected
    pub kind: &'static str,
    /// The rejected register value
    pub value: u8,
}

/// A channel reached its ceiling, so lux cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
#[error(
    "channel overflow (ch0 = {channel_0}, ch1 = {channel_1}, max = {max_count}); reduce gain or integration time"
)]
pub struct Overflow {
    /// Channel 0 count
    pub channel_0: u16,
    /// Channel 1 count
    pub channel_1: u16,
    /// Ceiling for the active integration time
    pub max_count: u16,
}

/// All possible errors in this crate
#[derive(Debug, thiserror::Error)]
#[cfg_attr(feature = "defmt-03", derive(defmt::Format))]
pub enum Error<E> {
    /// I2C communication error
    #[error("I2C bus error: {0:?}")]
    I2c(E),
    /// Invalid device ID detected
    #[error("invalid device ID: expected {expected:#04x}, found {found:#04x}")]
    InvalidDeviceId {
        /// Expected device ID
        expected: u8,
        /// Found device ID
        found: u8,
    },
    /// Gain or integration time outside the supported set
    #[error(transparent)]
    InvalidArgument(#[from] InvalidArgument),
    /// Channel saturated
    #[error(transparent)]
    Overflow(#[from] Overflow),
}

/// High-level TSL2591 driver
pub struct Tsl2591<I2C, T = ()> {
    interface: DeviceInterface<I2C, T>,
    // Mirrors of what was last written to the device
    gain: Gain,
    integration_time: IntegrationTime,
    enable: Enable,
}

impl<I2C, T> Tsl2591<I2C, T>
where
    T: Trace,
{
    fn from_interface(interface: DeviceInterface<I2C, T>) -> Self {
        Self {
            interface,
            gain: Gain::default(),
            integration_time: IntegrationTime::default(),
            enable: Enable::OFF,
        }
    }

    /// Current gain
    pub fn gain(&self) -> Gain {
        self.gain
    }

    /// Current integration time
    pub fn integration_time(&self) -> IntegrationTime {
        self.integration_time
    }

    /// Flags last written to the ENABLE register
    pub fn enable_flags(&self) -> Enable {
        self.enable
    }

    /// True while the device is powered on
    pub fn is_enabled(&self) -> bool {
        self.enable.power_on
    }

    /// Bus address of the device
    pub fn address(&self) -> u8 {
        self.interface.address
    }

    /// Turn trace output on or off
    pub fn set_debug(&mut self, debug: bool) {
        self.interface.debug = debug;
    }

    /// Whether trace output is on
    pub fn is_debug(&self) -> bool {
        self.interface.debug
    }

    /// Compute lux for `raw` with the current gain and integration time
    pub fn calculate_lux(&self, raw: &RawLuminosity) -> Result<f32, Overflow> {
        raw.lux(self.gain, self.integration_time)
    }

    /// Destroy the driver and return the I2C interface
    pub fn destroy(self) -> I2C {
        self.interface.i2c
    }
}

impl<I2C, E> Tsl2591<I2C, ()>
where
    I2C: I2c<Error = E>,
{
    /// Create a driver at the default address, check the device ID and power it up
    pub fn new(i2c: I2C) -> Result<Self, Error<E>> {
        Self::with_address(i2c, I2C_ADDRESS)
    }

    /// Create a driver at `address`, check the device ID and power it up
    pub fn with_address(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        let mut sensor = Self::from_interface(DeviceInterface::new(i2c, address, (), false));
        sensor.init()?;
        Ok(sensor)
    }
}

impl<I2C, E, T> Tsl2591<I2C, T>
where
    I2C: I2c<Error = E>,
    T: Trace,
{
    /// Create a driver that reports bus traffic to `trace`.
    ///
    /// Tracing starts enabled and covers the identity check.
    pub fn with_trace(i2c: I2C, address: u8, trace: T) -> Result<Self, Error<E>> {
        let mut sensor = Self::from_interface(DeviceInterface::new(i2c, address, trace, true));
        sensor.init()?;
        Ok(sensor)
    }

    fn init(&mut self) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message("checking ID"));
        let found = self.device_id()?;
        if found != DEVICE_ID {
            return Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found,
            });
        }

        self.enable()
    }

    /// Read the ID register
    pub fn device_id(&mut self) -> Result<u8, Error<E>> {
        self.interface
            .read_register(register::ID)
            .map_err(Error::I2c)
    }

    /// Power on with the ALS running and interrupts off
    pub fn enable(&mut self) -> Result<(), Error<E>> {
        self.enable_with(Enable::default())
    }

    /// Power off
    pub fn disable(&mut self) -> Result<(), Error<E>> {
        self.enable_with(Enable {
            als_enable: false,
            power_on: false,
            ..Enable::default()
        })
    }

    /// Write `flags` to the ENABLE register
    pub fn enable_with(&mut self, flags: Enable) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message(if flags.power_on {
            "enabling"
        } else {
            "disabling"
        }));
        self.interface
            .select(register::ENABLE)
            .map_err(Error::I2c)?;
        self.interface.write(&[flags.bits()]).map_err(Error::I2c)?;
        self.enable = flags;
        Ok(())
    }

    /// Set the analog gain
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message("setting gain"));
        let config = self
            .interface
            .read_register(register::CONFIG)
            .map_err(Error::I2c)?;
        let config = (config & CONFIG_CLEAR_AGAIN_MASK) | gain as u8;
        self.interface.write(&[config]).map_err(Error::I2c)?;
        self.gain = gain;
        Ok(())
    }

    /// Set the analog gain from its CONFIG register encoding.
    ///
    /// Values other than 0x00, 0x10, 0x20 and 0x30 are rejected before touching the bus.
    pub fn set_gain_bits(&mut self, bits: u8) -> Result<(), Error<E>> {
        let gain = Gain::try_from(bits)?;
        self.set_gain(gain)
    }

    /// Set the ALS integration time
    pub fn set_integration_time(&mut self, time: IntegrationTime) -> Result<(), Error<E>> {
        self.interface
            .emit(TraceEvent::Message("setting integration time"));
        let config = self
            .interface
            .read_register(register::CONFIG)
            .map_err(Error::I2c)?;
        let config = (config & CONFIG_CLEAR_ATIME_MASK) | time as u8;
        self.interface.write(&[config]).map_err(Error::I2c)?;
        self.integration_time = time;
        Ok(())
    }

    /// Set the integration time from its CONFIG register encoding (0x00 to 0x05)
    pub fn set_integration_time_bits(&mut self, bits: u8) -> Result<(), Error<E>> {
        let time = IntegrationTime::try_from(bits)?;
        self.set_integration_time(time)
    }

    /// Read both channels.
    ///
    /// Each of the four data bytes is fetched with its own select and read.
    pub fn raw_luminosity(&mut self) -> Result<RawLuminosity, Error<E>> {
        let mut bytes = [0u8; 4];
        for (byte, register) in bytes.iter_mut().zip(ll::DATA_REGISTERS) {
            *byte = self
                .interface
                .read_register(register)
                .map_err(Error::I2c)?;
        }
        Ok(RawLuminosity::from_bytes(bytes))
    }

    /// Both channels packed into one word, see [`RawLuminosity::full_spectrum`]
    pub fn full_spectrum(&mut self) -> Result<u32, Error<E>> {
        Ok(self.raw_luminosity()?.full_spectrum())
    }

    /// Infrared count
    pub fn infrared(&mut self) -> Result<u16, Error<E>> {
        Ok(self.raw_luminosity()?.infrared())
    }

    /// Visible light, derived from a single sample
    pub fn visible(&mut self) -> Result<u32, Error<E>> {
        Ok(self.raw_luminosity()?.visible())
    }

    /// Take a sample and convert it to lux
    pub fn lux(&mut self) -> Result<f32, Error<E>> {
        let raw = self.raw_luminosity()?;
        Ok(self.calculate_lux(&raw)?)
    }
}

#[cfg(feature = "async")]
impl<I2C, E> Tsl2591<I2C, ()>
where
    I2C: AsyncI2c<Error = E>,
{
    /// Create a driver at the default address (async version)
    pub async fn new_async(i2c: I2C) -> Result<Self, Error<E>> {
        Self::with_address_async(i2c, I2C_ADDRESS).await
    }

    /// Create a driver at `address` (async version)
    pub async fn with_address_async(i2c: I2C, address: u8) -> Result<Self, Error<E>> {
        let mut sensor = Self::from_interface(DeviceInterface::new(i2c, address, (), false));
        sensor.init_async().await?;
        Ok(sensor)
    }
}

#[cfg(feature = "async")]
impl<I2C, E, T> Tsl2591<I2C, T>
where
    I2C: AsyncI2c<Error = E>,
    T: Trace,
{
    /// Create a driver that reports bus traffic to `trace` (async version)
    pub async fn with_trace_async(i2c: I2C, address: u8, trace: T) -> Result<Self, Error<E>> {
        let mut sensor = Self::from_interface(DeviceInterface::new(i2c, address, trace, true));
        sensor.init_async().await?;
        Ok(sensor)
    }

    async fn init_async(&mut self) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message("checking ID"));
        let found = self.device_id_async().await?;
        if found != DEVICE_ID {
            return Err(Error::InvalidDeviceId {
                expected: DEVICE_ID,
                found,
            });
        }

        self.enable_async().await
    }

    /// Read the ID register (async version)
    pub async fn device_id_async(&mut self) -> Result<u8, Error<E>> {
        self.interface
            .read_register_async(register::ID)
            .await
            .map_err(Error::I2c)
    }

    /// Power on with the ALS running (async version)
    pub async fn enable_async(&mut self) -> Result<(), Error<E>> {
        self.enable_with_async(Enable::default()).await
    }

    /// Power off (async version)
    pub async fn disable_async(&mut self) -> Result<(), Error<E>> {
        self.enable_with_async(Enable {
            als_enable: false,
            power_on: false,
            ..Enable::default()
        })
        .await
    }

    /// Write `flags` to the ENABLE register (async version)
    pub async fn enable_with_async(&mut self, flags: Enable) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message(if flags.power_on {
            "enabling"
        } else {
            "disabling"
        }));
        self.interface
            .select_async(register::ENABLE)
            .await
            .map_err(Error::I2c)?;
        self.interface
            .write_async(&[flags.bits()])
            .await
            .map_err(Error::I2c)?;
        self.enable = flags;
        Ok(())
    }

    /// Set the analog gain (async version)
    pub async fn set_gain_async(&mut self, gain: Gain) -> Result<(), Error<E>> {
        self.interface.emit(TraceEvent::Message("setting gain"));
        let config = self
            .interface
            .read_register_async(register::CONFIG)
            .await
            .map_err(Error::I2c)?;
        let config = (config & CONFIG_CLEAR_AGAIN_MASK) | gain as u8;
        self.interface
            .write_async(&[config])
            .await
            .map_err(Error::I2c)?;
        self.gain = gain;
        Ok(())
    }

    /// Set the ALS integration time (async version)
    pub async fn set_integration_time_async(
        &mut self,
        time: IntegrationTime,
    ) -> Result<(), Error<E>> {
        self.interface
            .emit(TraceEvent::Message("setting integration time"));
        let config = self
            .interface
            .read_register_async(register::CONFIG)
            .await
            .map_err(Error::I2c)?;
        let config = (config & CONFIG_CLEAR_ATIME_MASK) | time as u8;
        self.interface
            .write_async(&[config])
            .await
            .map_err(Error::I2c)?;
        self.integration_time = time;
        Ok(())
    }

    /// Set the analog gain from its CONFIG register encoding (async version)
    pub async fn set_gain_bits_async(&mut self, bits: u8) -> Result<(), Error<E>> {
        let gain = Gain::try_from(bits)?;
        self.set_gain_async(gain).await
    }

    /// Set the integration time from its CONFIG register encoding (async version)
    pub async fn set_integration_time_bits_async(&mut self, bits: u8) -> Result<(), Error<E>> {
        let time = IntegrationTime::try_from(bits)?;
        self.set_integration_time_async(time).await
    }

    /// Read both channels (async version)
    pub async fn raw_luminosity_async(&mut self) -> Result<RawLuminosity, Error<E>> {
        let mut bytes = [0u8; 4];
        for (byte, register) in bytes.iter_mut().zip(ll::DATA_REGISTERS) {
            *byte = self
                .interface
                .read_register_async(register)
                .await
                .map_err(Error::I2c)?;
        }
        Ok(RawLuminosity::from_bytes(bytes))
    }

    /// Both channels packed into one word (async version)
    pub async fn full_spectrum_async(&mut self) -> Result<u32, Error<E>> {
        Ok(self.raw_luminosity_async().await?.full_spectrum())
    }

    /// Infrared count (async version)
    pub async fn infrared_async(&mut self) -> Result<u16, Error<E>> {
        Ok(self.raw_luminosity_async().await?.infrared())
    }

    /// Visible light, derived from a single sample (async version)
    pub async fn visible_async(&mut self) -> Result<u32, Error<E>> {
        Ok(self.raw_luminosity_async().await?.visible())
    }

    /// Take a sample and convert it to lux (async version)
    pub async fn lux_async(&mut self) -> Result<f32, Error<E>> {
        let raw = self.raw_luminosity_async().await?;
        Ok(self.calculate_lux(&raw)?)
    }
}
