use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local};

use crate::measurement::Climate;

pub const MEASUREMENT: &str = "dp";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Float(f32),
    Integer(i64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Integer(v) => write!(f, "{v}i"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryPoint {
    pub measurement: String,
    pub timestamp: DateTime<Local>,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
}

impl TelemetryPoint {
    /// One point per accepted cycle; `retries` is (inside, outside).
    pub fn from_cycle(
        timestamp: DateTime<Local>,
        inside: &Climate,
        outside: &Climate,
        retries: (usize, usize),
        venting: bool,
    ) -> Self {
        let fields = [
            ("temp_i", FieldValue::Float(inside.temperature)),
            ("temp_o", FieldValue::Float(outside.temperature)),
            ("dewpoint_i", FieldValue::Float(inside.dew_point)),
            ("dewpoint_o", FieldValue::Float(outside.dew_point)),
            ("hum_i", FieldValue::Float(inside.humidity)),
            ("hum_o", FieldValue::Float(outside.humidity)),
            ("retry_i", FieldValue::Integer(retries.0 as i64)),
            ("retry_o", FieldValue::Integer(retries.1 as i64)),
            ("vent_val", FieldValue::Integer(venting as i64)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            measurement: MEASUREMENT.to_string(),
            timestamp,
            tags: BTreeMap::new(),
            fields,
        }
    }

    /// InfluxDB line protocol with nanosecond precision.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement);
        for (k, v) in &self.tags {
            line.push_str(&format!(",{}={}", escape(k), escape(v)));
        }

        let fields = self
            .fields
            .iter()
            .map(|(k, v)| format!("{}={v}", escape(k)))
            .collect::<Vec<_>>()
            .join(",");
        line.push(' ');
        line.push_str(&fields);

        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            line.push_str(&format!(" {ns}"));
        }
        line
    }
}

fn escape(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

/// Receives one point per accepted cycle. Failures are logged by the caller and the point is dropped.
pub trait TelemetrySink {
    fn publish(&mut self, point: &TelemetryPoint) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Default)]
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn publish(&mut self, point: &TelemetryPoint) -> Result<(), anyhow::Error> {
        log::info!("{}", point.to_line_protocol());
        Ok(())
    }
}
