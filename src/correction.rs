use crate::config::CalibrationOffsets;
use crate::measurement::{Location, RawReading, round_to};

#[derive(Debug, Clone, Copy)]
pub struct ValueCorrector {
    offsets: CalibrationOffsets,
}

impl ValueCorrector {
    pub fn new(offsets: CalibrationOffsets) -> Self {
        Self { offsets }
    }

    pub fn correct(&self, location: Location, raw: RawReading) -> RawReading {
        let offset = self.offsets.for_location(location);
        RawReading {
            temperature: round_to(raw.temperature + offset.temperature, 1),
            humidity: round_to(raw.humidity + offset.humidity, 1),
        }
    }
}
