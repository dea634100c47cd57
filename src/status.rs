//! State shared with the status/control surface.
//!
//! The polling loop is the only writer of [`SharedStatus`] and the only
//! reader of [`OverrideHandle`]; the surface does the opposite.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::arbiter::RemoteOverride;
use crate::config::Thresholds;
use crate::measurement::SensorReading;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorData {
    pub name: String,
    pub temperature: f32,
    pub humidity: f32,
    pub dew_point: Option<f32>,
}

impl From<&SensorReading> for SensorData {
    fn from(reading: &SensorReading) -> Self {
        Self {
            name: reading.location.to_string(),
            temperature: reading.temperature,
            humidity: reading.humidity,
            dew_point: reading.dew_point,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Local time of the last finished cycle, `---` before the first one.
    pub update: String,
    pub sensors: Vec<SensorData>,
    /// Command currently sent to the relay.
    pub venting: bool,
    /// The manual switch overrules the command.
    #[serde(rename = "override")]
    pub override_active: bool,
    pub remote_override: RemoteOverride,
    pub diff_min: f32,
    pub hysteresis: f32,
    pub hum_inside_min: f32,
    pub temp_inside_min: f32,
    pub temp_outside_min: f32,
}

impl StatusSnapshot {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            update: "---".to_string(),
            sensors: Vec::new(),
            venting: false,
            override_active: false,
            remote_override: RemoteOverride::None,
            diff_min: thresholds.diff_min,
            hysteresis: thresholds.hysteresis,
            hum_inside_min: thresholds.hum_inside_min,
            temp_inside_min: thresholds.temp_inside_min,
            temp_outside_min: thresholds.temp_outside_min,
        }
    }

    pub fn to_json(&self) -> Result<String, anyhow::Error> {
        serde_json::to_string_pretty(self).context("Failed to serialize status")
    }

    /// Plain text page for a browser.
    pub fn to_text(&self) -> String {
        let mut text = format!("Dew Point Fan                     {}\n", self.update);
        text.push_str("-----------------------------------------------------\n");
        for sensor in &self.sensors {
            let dew_point = sensor
                .dew_point
                .map_or_else(|| "   ---".to_string(), |dp| format!("{dp:6.1}"));
            text.push_str(&format!(
                "{:<8} DP: {dew_point}, Temp: {:5.1}°C, Humidity: {:5.1}%\n",
                format!("{}:", sensor.name),
                sensor.temperature,
                sensor.humidity
            ));
        }
        text.push_str(&format!(
            "Fan should be {:<3}                        Override {}",
            if self.venting { "on" } else { "off" },
            if self.override_active { "active" } else { "inactive" }
        ));
        text
    }
}

#[derive(Debug, Clone)]
pub struct SharedStatus {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl SharedStatus {
    pub fn new(initial: StatusSnapshot) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    pub fn publish(&self, snapshot: StatusSnapshot) {
        *self.inner.lock() = snapshot;
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().clone()
    }
}

/// Body of an override request: `{"override": 0|1|2}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteControl {
    #[serde(rename = "override")]
    pub remote: RemoteOverride,
}

#[derive(Debug, Clone, Default)]
pub struct OverrideHandle {
    value: Arc<AtomicU8>,
}

impl OverrideHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> RemoteOverride {
        RemoteOverride::try_from(self.value.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set(&self, remote: RemoteOverride) {
        self.value.store(remote.into(), Ordering::Release);
    }

    /// Applies a JSON override request and echoes it back.
    pub fn apply_request(&self, body: &str) -> Result<RemoteControl, anyhow::Error> {
        let request: RemoteControl =
            serde_json::from_str(body).context("Failed to parse override request")?;
        log::info!("Remote override set to {}", request.remote);
        self.set(request.remote);
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::measurement::Location;

    fn snapshot() -> StatusSnapshot {
        let mut snapshot = StatusSnapshot::new(&Thresholds::DEFAULT);
        snapshot.update = "2026-10-16 12:00:00".into();
        snapshot.sensors = vec![
            SensorData::from(&SensorReading {
                location: Location::Inside,
                temperature: 22.0,
                humidity: 55.0,
                dew_point: Some(12.5),
                retries: 0,
            }),
            SensorData::from(&SensorReading::unset(Location::Outside)),
        ];
        snapshot.venting = true;
        snapshot.remote_override = RemoteOverride::ForceOn;
        snapshot
    }

    #[test]
    fn test_json_shape() {
        let value: serde_json::Value = serde_json::from_str(&snapshot().to_json().unwrap()).unwrap();
        assert_eq!(value["update"], json!("2026-10-16 12:00:00"));
        assert_eq!(value["sensors"][0]["name"], json!("Inside"));
        assert_eq!(value["sensors"][0]["dew_point"], json!(12.5));
        assert_eq!(value["sensors"][1]["dew_point"], json!(null));
        assert_eq!(value["venting"], json!(true));
        assert_eq!(value["override"], json!(false));
        assert_eq!(value["remote_override"], json!(1));
        assert_eq!(value["diff_min"], json!(3.0));
        assert_eq!(value["hysteresis"], json!(1.0));
    }

    #[test]
    fn test_text_page() {
        let text = snapshot().to_text();
        assert!(text.contains("Inside:  DP:   12.5, Temp:  22.0°C, Humidity:  55.0%"));
        assert!(text.contains("Outside: DP:    ---"));
        assert!(text.contains("Fan should be on"));
    }

    #[test]
    fn test_shared_status_roundtrip() {
        let shared = SharedStatus::new(StatusSnapshot::new(&Thresholds::DEFAULT));
        let reader = shared.clone();
        assert_eq!(reader.snapshot().update, "---");

        shared.publish(snapshot());
        assert!(reader.snapshot().venting);
    }

    #[test]
    fn test_override_request() {
        let handle = OverrideHandle::new();
        let surface = handle.clone();
        assert_eq!(handle.get(), RemoteOverride::None);

        let echoed = surface.apply_request(r#"{"override": 2}"#).unwrap();
        assert_eq!(echoed.remote, RemoteOverride::ForceOff);
        assert_eq!(handle.get(), RemoteOverride::ForceOff);

        assert!(surface.apply_request(r#"{"override": 7}"#).is_err());
        assert!(surface.apply_request("not json").is_err());
        assert_eq!(handle.get(), RemoteOverride::ForceOff);
    }
}
