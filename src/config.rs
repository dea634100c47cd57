use std::time::Duration;

use crate::measurement::Location;

pub const INSIDE_SENSOR_PIN: u8 = 24;
pub const OUTSIDE_SENSOR_PIN: u8 = 23;
/// Relay driving the fan, active low.
pub const RELAY_PIN: u8 = 25;
/// Senses the relay circuit after the 3-state switch. High means the fan is off.
pub const SWITCH_SENSE_PIN: u8 = 22;

pub const SENSOR_RETRIES: usize = 15;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_secs(15);
/// Added to the worst case cycle when waiting for the loop to stop.
pub const SHUTDOWN_MARGIN: Duration = Duration::from_secs(10);

pub const TEMP_PLAUSIBLE_MIN: f32 = -20.0;
pub const TEMP_PLAUSIBLE_MAX: f32 = 40.0;

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Switching thresholds of the venting decision, all in °C except the humidity floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimal dew point difference (inside - outside) to keep venting.
    pub diff_min: f32,
    /// Extra difference above `diff_min` required to start venting.
    pub hysteresis: f32,
    /// No venting below this inside humidity (%).
    pub hum_inside_min: f32,
    pub temp_inside_min: f32,
    pub temp_outside_min: f32,
    /// Largest dew point change between two polls that is still believed.
    pub max_dew_point_jump: f32,
}

impl Thresholds {
    pub const DEFAULT: Self = Self {
        diff_min: 3.0,
        hysteresis: 1.0,
        hum_inside_min: 50.0,
        temp_inside_min: 10.0,
        temp_outside_min: -10.0,
        max_dew_point_jump: 1.0,
    };

    pub fn switch_on_above(&self) -> f32 {
        self.diff_min + self.hysteresis
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Additive correction for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub temperature: f32,
    pub humidity: f32,
}

/// Each DHT22 is a little different, so every location has its own offsets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOffsets {
    pub inside: Offset,
    pub outside: Offset,
}

impl CalibrationOffsets {
    pub const DEFAULT: Self = Self {
        inside: Offset {
            temperature: -4.0,
            humidity: 10.0,
        },
        outside: Offset {
            temperature: 0.0,
            humidity: -6.0,
        },
    };

    pub const NONE: Self = Self {
        inside: Offset {
            temperature: 0.0,
            humidity: 0.0,
        },
        outside: Offset {
            temperature: 0.0,
            humidity: 0.0,
        },
    };

    pub fn for_location(&self, location: Location) -> Offset {
        match location {
            Location::Inside => self.inside,
            Location::Outside => self.outside,
        }
    }
}

impl Default for CalibrationOffsets {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: Thresholds,
    pub offsets: CalibrationOffsets,
    pub sensor_retries: usize,
    pub retry_delay: Duration,
    pub temp_plausible_min: f32,
    pub temp_plausible_max: f32,
    /// Consecutive spike rejections after which the dew point baseline is re-seeded.
    pub spike_reseed_after: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::DEFAULT,
            offsets: CalibrationOffsets::DEFAULT,
            sensor_retries: SENSOR_RETRIES,
            retry_delay: RETRY_DELAY,
            temp_plausible_min: TEMP_PLAUSIBLE_MIN,
            temp_plausible_max: TEMP_PLAUSIBLE_MAX,
            spike_reseed_after: 4,
        }
    }
}

impl Config {
    /// Longest a single cycle can block: every attempt on every sensor failing.
    pub fn worst_case_cycle(&self) -> Duration {
        let attempts = (self.sensor_retries as u32 + 1) * Location::ALL.len() as u32;
        self.retry_delay * attempts
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.worst_case_cycle() + SHUTDOWN_MARGIN
    }
}
