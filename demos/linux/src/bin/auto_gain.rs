//! Automatic gain control example
//!
//! This example demonstrates how to:
//! - Recover from channel overflow by lowering gain, then integration time
//! - Raise gain again once readings stay low for a while

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use tsl2591::{Error, Gain, IntegrationTime, RawLuminosity, Tsl2591};

// This example uses linux-embedded-hal for demonstration
use linux_embedded_hal::{Delay, I2cdev};

// Raise gain when the brighter channel sits below this many counts
const LOW_LIGHT_THRESHOLD: u16 = 100;

struct AutoGainController {
    dim_readings: u8,
    min_dim_readings: u8,
}

impl AutoGainController {
    fn new() -> Self {
        Self {
            dim_readings: 0,
            min_dim_readings: 3,
        }
    }

    /// Step down after an overflow. Returns false when already at the bottom.
    fn reduce<I: I2c>(&mut self, sensor: &mut Tsl2591<I>) -> Result<bool, Error<I::Error>> {
        self.dim_readings = 0;
        let lower_gain = match sensor.gain() {
            Gain::Max => Some(Gain::High),
            Gain::High => Some(Gain::Medium),
            Gain::Medium => Some(Gain::Low),
            Gain::Low => None,
        };
        if let Some(gain) = lower_gain {
            println!("📉 Reducing gain: {:?} -> {:?}", sensor.gain(), gain);
            sensor.set_gain(gain)?;
            return Ok(true);
        }

        let shorter_time = IntegrationTime::ALL
            .iter()
            .rev()
            .copied()
            .find(|time| time.as_millis() < sensor.integration_time().as_millis());
        match shorter_time {
            Some(time) => {
                println!(
                    "📉 Reducing integration time: {}ms -> {}ms",
                    sensor.integration_time().as_millis(),
                    time.as_millis()
                );
                sensor.set_integration_time(time)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Count consecutive dim readings; true once there have been enough of them.
    ///
    /// A bright reading starts the count over.
    fn record_reading(&mut self, max_channel: u16) -> bool {
        if max_channel >= LOW_LIGHT_THRESHOLD {
            self.dim_readings = 0;
            return false;
        }
        self.dim_readings = self.dim_readings.saturating_add(1);
        self.dim_readings >= self.min_dim_readings
    }

    /// Step gain up when readings have been dim for long enough
    fn maybe_increase<I: I2c>(
        &mut self,
        sensor: &mut Tsl2591<I>,
        raw: &RawLuminosity,
    ) -> Result<bool, Error<I::Error>> {
        let max_channel = raw.channel_0.max(raw.channel_1);
        if !self.record_reading(max_channel) {
            return Ok(false);
        }

        let higher_gain = match sensor.gain() {
            Gain::Low => Gain::Medium,
            Gain::Medium => Gain::High,
            Gain::High => Gain::Max,
            Gain::Max => return Ok(false),
        };
        println!(
            "📈 Increasing gain: {:?} -> {:?} (low light detected: {})",
            sensor.gain(),
            higher_gain,
            max_channel
        );
        sensor.set_gain(higher_gain)?;
        self.dim_readings = 0;
        Ok(true)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize I2C interface
    let i2c = I2cdev::new("/dev/i2c-1")?;
    let mut delay = Delay;

    println!("Initializing TSL2591 sensor with automatic gain control...");
    let mut sensor = Tsl2591::new(i2c)?;
    let mut agc = AutoGainController::new();

    sensor.set_integration_time(IntegrationTime::Ms200)?;
    sensor.set_gain(Gain::Medium)?;

    println!("Starting automatic gain control...");
    println!("Press Ctrl+C to exit\n");

    let mut reading_count = 0u32;

    loop {
        delay.delay_ms(u32::from(sensor.integration_time().as_millis()) + 100);
        reading_count += 1;

        let raw = sensor.raw_luminosity()?;
        match sensor.calculate_lux(&raw) {
            Ok(lux) => {
                let changed = agc.maybe_increase(&mut sensor, &raw)?;
                println!(
                    "Reading #{:3}: ch0: {:5} ch1: {:5} | Lux: {:10.4} | Gain: {:?} {}ms{}",
                    reading_count,
                    raw.channel_0,
                    raw.channel_1,
                    lux,
                    sensor.gain(),
                    sensor.integration_time().as_millis(),
                    if changed { " ⚡" } else { "" }
                );
            }
            Err(overflow) => {
                println!("Reading #{:3}: {}", reading_count, overflow);
                if !agc.reduce(&mut sensor)? {
                    println!("Already at lowest sensitivity; too bright to measure");
                }
            }
        }
    }
}
