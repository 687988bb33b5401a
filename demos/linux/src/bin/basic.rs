//! Basic light sensor reading example
//!
//! This example demonstrates how to:
//! - Initialize the TSL2591 sensor
//! - Configure gain and integration time
//! - Read raw, full-spectrum, infrared and visible values
//! - Calculate lux
//!
//! Pass `--debug` to print every byte that crosses the bus.

use embedded_hal::delay::DelayNs;
use tsl2591::{Gain, IntegrationTime, Trace, TraceEvent, Tsl2591, I2C_ADDRESS};

// This example uses linux-embedded-hal for demonstration
// Replace with your platform's I2C implementation
use linux_embedded_hal::{Delay, I2cdev};

/// Prints each transfer as bytes, hex, decimal and binary
struct StdoutTrace;

impl Trace for StdoutTrace {
    fn trace(&mut self, event: TraceEvent<'_>) {
        let (label, bytes) = match event {
            TraceEvent::Message(message) => {
                println!("{}", message);
                return;
            }
            TraceEvent::Command(command) => ("Command", vec![command]),
            TraceEvent::Read(data) => ("Reading", data.to_vec()),
            TraceEvent::Write(data) => ("Writing", data.to_vec()),
        };
        let value = bytes.iter().fold(0u64, |acc, &b| acc << 8 | u64::from(b));
        let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        println!(
            "{}: Bytes {:?} | Hex {} | Dec {} | Bin {:#b}",
            label, bytes, hex, value, value
        );
    }
}

fn run<T: Trace>(mut sensor: Tsl2591<I2cdev, T>) -> Result<(), Box<dyn std::error::Error>> {
    let mut delay = Delay;

    sensor.set_gain(Gain::Medium)?;
    sensor.set_integration_time(IntegrationTime::Ms300)?;

    println!("Sensor configured and enabled. Starting measurements...");
    println!("Press Ctrl+C to exit\n");

    loop {
        println!("Full Spectrum: {}", sensor.full_spectrum()?);
        println!("Infrared: {}", sensor.infrared()?);
        match sensor.lux() {
            Ok(lux) => println!("Lux: {:.2}", lux),
            Err(tsl2591::Error::Overflow(overflow)) => println!("Lux: -- ({})", overflow),
            Err(e) => return Err(e.into()),
        }
        let raw = sensor.raw_luminosity()?;
        println!("Raw Luminosity: ({}, {})", raw.channel_0, raw.channel_1);
        println!("Visible: {}", sensor.visible()?);
        println!("{}", "*".repeat(4));

        delay.delay_ms(2000);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let debug = std::env::args().any(|arg| arg == "--debug");

    // Initialize I2C interface
    let i2c = I2cdev::new("/dev/i2c-1")?;

    println!("Initializing TSL2591 sensor...");

    if debug {
        run(Tsl2591::with_trace(i2c, I2C_ADDRESS, StdoutTrace)?)
    } else {
        run(Tsl2591::new(i2c)?)
    }
}
