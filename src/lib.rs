//! Dew point controlled cellar ventilation.
//!
//! Two DHT22 sensors measure inside and outside air. When venting lowers the
//! inside humidity without risk of condensation, a relay switches the fan on.

pub mod actuator;
pub mod arbiter;
pub mod config;
pub mod controller;
pub mod correction;
pub mod dew_point;
pub mod dht22;
pub mod display;
pub mod engine;
pub mod measurement;
pub mod sensor;
pub mod shutdown;
pub mod status;
pub mod telemetry;

#[cfg(test)]
mod test_log;
