use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use rppal::gpio::{Bias, Gpio, IoPin, Level, Mode};

use crate::measurement::RawReading;
use crate::sensor::{SensorChannel, SensorError};

/// Host pulls the line low at least this long to wake the sensor.
pub const START_SIGNAL: Duration = Duration::from_micros(1_100);
/// No phase of the protocol keeps the line at one level longer than ~80µs.
pub const LEVEL_TIMEOUT: Duration = Duration::from_micros(200);
/// High pulses longer than this encode a 1 bit (0 ≈ 27µs, 1 ≈ 70µs).
pub const BIT_ONE_THRESHOLD: Duration = Duration::from_micros(50);

pub const FRAME_BITS: usize = 40;

#[derive(Debug)]
pub struct DHT22 {
    pin: IoPin,
}

impl DHT22 {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<DHT22, anyhow::Error> {
        let mut pin = gpio
            .get(pin)
            .with_context(|| format!("Failed to get GPIO{pin}"))?
            .into_io(Mode::Output);
        pin.set_bias(Bias::PullUp);
        pin.set_high();

        Ok(DHT22 { pin })
    }

    fn capture_pulses(&mut self) -> Result<[Duration; FRAME_BITS], SensorError> {
        self.pin.set_mode(Mode::Output);
        self.pin.set_low();
        thread::sleep(START_SIGNAL);
        self.pin.set_high();
        self.pin.set_mode(Mode::Input);

        // Handshake: line released high, sensor answers ~80µs low then ~80µs high.
        self.wait_while(Level::High, "release")?;
        self.wait_while(Level::Low, "response")?;
        self.wait_while(Level::High, "response")?;

        let mut pulses = [Duration::ZERO; FRAME_BITS];
        for pulse in pulses.iter_mut() {
            self.wait_while(Level::Low, "bit start")?;
            *pulse = self.wait_while(Level::High, "bit")?;
        }

        Ok(pulses)
    }

    /// Busy waits until the line leaves `level` and returns how long it stayed.
    fn wait_while(&self, level: Level, phase: &'static str) -> Result<Duration, SensorError> {
        let start = Instant::now();
        while self.pin.read() == level {
            if start.elapsed() > LEVEL_TIMEOUT {
                return Err(SensorError::Timeout {
                    phase,
                    level: match level {
                        Level::High => "low",
                        Level::Low => "high",
                    },
                });
            }
        }
        Ok(start.elapsed())
    }
}

impl SensorChannel for DHT22 {
    fn read(&mut self) -> Result<RawReading, SensorError> {
        let pulses = self.capture_pulses();
        // Leave the bus idle high between reads.
        self.pin.set_mode(Mode::Output);
        self.pin.set_high();

        decode_frame(pulses_to_frame(&pulses?))
    }
}

pub fn pulses_to_frame(pulses: &[Duration; FRAME_BITS]) -> [u8; 5] {
    let mut frame = [0u8; 5];
    for (i, pulse) in pulses.iter().enumerate() {
        if *pulse > BIT_ONE_THRESHOLD {
            frame[i / 8] |= 0x80 >> (i % 8);
        }
    }
    frame
}

pub fn calculate_checksum(frame: &[u8; 5]) -> u8 {
    frame[..4].iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

pub fn decode_frame(frame: [u8; 5]) -> Result<RawReading, SensorError> {
    let checksum = calculate_checksum(&frame);
    if frame[4] != checksum {
        return Err(SensorError::Checksum {
            expected: checksum,
            actual: frame[4],
        });
    }

    if frame == [0; 5] {
        return Err(SensorError::InvalidFrame("all bits zero".into()));
    }

    let humidity = u16::from_be_bytes([frame[0], frame[1]]) as f32 / 10.0;
    if humidity > 100.0 {
        return Err(SensorError::InvalidFrame(format!(
            "humidity {humidity:.1}% above 100%"
        )));
    }

    let magnitude = u16::from_be_bytes([frame[2] & 0x7f, frame[3]]) as f32 / 10.0;
    let temperature = if frame[2] & 0x80 != 0 {
        -magnitude
    } else {
        magnitude
    };

    Ok(RawReading {
        temperature,
        humidity,
    })
}
