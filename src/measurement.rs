use std::fmt;

/// Temperature meaning "not read yet".
pub const DEF_TEMP: f32 = -200.0;
/// Humidity meaning "not read yet".
pub const DEF_HUM: f32 = -1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Inside,
    Outside,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::Inside, Location::Outside];

    pub fn index(self) -> usize {
        match self {
            Location::Inside => 0,
            Location::Outside => 1,
        }
    }

    /// One letter tag used on the display and in log lines.
    pub fn tag(self) -> &'static str {
        match self {
            Location::Inside => "I",
            Location::Outside => "O",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Inside => f.write_str("Inside"),
            Location::Outside => f.write_str("Outside"),
        }
    }
}

/// What a sensor channel delivers before any correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawReading {
    pub temperature: f32,
    pub humidity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub location: Location,
    pub temperature: f32,
    pub humidity: f32,
    /// Only set when temperature and humidity are valid and plausible.
    pub dew_point: Option<f32>,
    pub retries: usize,
}

impl SensorReading {
    pub fn unset(location: Location) -> Self {
        Self {
            location,
            temperature: DEF_TEMP,
            humidity: DEF_HUM,
            dew_point: None,
            retries: 0,
        }
    }

    pub fn has_values(&self) -> bool {
        self.temperature > DEF_TEMP && self.humidity > DEF_HUM
    }
}

/// Readings of one location that passed every check of the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Climate {
    pub temperature: f32,
    pub humidity: f32,
    pub dew_point: f32,
}

pub fn round_to(value: f32, precision: u32) -> f32 {
    let ratio = 10f64.powi(precision as i32);
    ((value as f64 * ratio).round() / ratio) as f32
}
