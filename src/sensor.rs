use std::time::Duration;

use backon::{BlockingRetryable, ConstantBuilder};
use thiserror::Error;

use crate::measurement::{Location, RawReading};

/// Failure of a single read attempt.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SensorError {
    #[error("timed out waiting for the line to go {level} ({phase})")]
    Timeout { phase: &'static str, level: &'static str },
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    Checksum { expected: u8, actual: u8 },
    #[error("implausible frame: {0}")]
    InvalidFrame(String),
    #[error("gpio: {0}")]
    Gpio(String),
}

/// Every attempt of a read failed.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{location} sensor failed after {attempts} attempts: {last}")]
pub struct ReadFailure {
    pub location: Location,
    pub attempts: usize,
    pub last: SensorError,
}

impl ReadFailure {
    pub fn retries(&self) -> usize {
        self.attempts.saturating_sub(1)
    }
}

/// A single temperature/humidity source.
pub trait SensorChannel {
    fn read(&mut self) -> Result<RawReading, SensorError>;
}

/// Successful read together with the number of retries it consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub reading: RawReading,
    pub retries: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SensorReader {
    retry_builder: ConstantBuilder,
    max_retries: usize,
}

impl SensorReader {
    pub fn new(max_retries: usize, delay: Duration) -> Self {
        let retry_builder = ConstantBuilder::default()
            .with_delay(delay)
            .with_max_times(max_retries);

        Self {
            retry_builder,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    pub fn read<C: SensorChannel>(
        &self,
        location: Location,
        channel: &mut C,
    ) -> Result<Sample, ReadFailure> {
        let mut retries = 0;

        let result = (|| channel.read())
            .retry(self.retry_builder)
            .notify(|e, dur| {
                retries += 1;
                log::warn!("{}: {e}", location.tag());
                log::debug!("{}: retrying in {:?}", location.tag(), dur);
            })
            .call();

        match result {
            Ok(reading) => Ok(Sample { reading, retries }),
            Err(last) => Err(ReadFailure {
                location,
                attempts: retries + 1,
                last,
            }),
        }
    }
}

/// Accepted physical temperature range; anything outside is a sensor glitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlausibleRange {
    pub min: f32,
    pub max: f32,
}

impl PlausibleRange {
    pub fn contains(&self, temperature: f32) -> bool {
        (self.min..=self.max).contains(&temperature)
    }
}
