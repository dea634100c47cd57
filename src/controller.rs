use chrono::Local;

use crate::actuator::{ActuatorDriver, RelayOutput, SwitchInput};
use crate::arbiter::OverrideArbiter;
use crate::config::{Config, DATE_TIME_FORMAT};
use crate::correction::ValueCorrector;
use crate::dew_point::calc_dew_point;
use crate::display::{self, DisplaySink};
use crate::engine::{VentingDecisionEngine, Verdict};
use crate::measurement::{Climate, Location, SensorReading};
use crate::sensor::{PlausibleRange, SensorChannel, SensorReader};
use crate::status::{OverrideHandle, SensorData, SharedStatus, StatusSnapshot};
use crate::telemetry::{TelemetryPoint, TelemetrySink};

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub readings_good: bool,
    /// `None` when the decision step was skipped because of bad readings.
    pub verdict: Option<Verdict>,
    /// Final relay command.
    pub command: bool,
}

/// Hardware and collaborators one controller drives.
pub struct Ports<C, O, S, D, T> {
    pub inside: C,
    pub outside: C,
    pub relay: O,
    pub switch: S,
    pub display: D,
    pub telemetry: T,
}

pub struct Controller<C, O, S, D, T> {
    inside: C,
    outside: C,
    reader: SensorReader,
    corrector: ValueCorrector,
    plausible: PlausibleRange,
    engine: VentingDecisionEngine,
    arbiter: OverrideArbiter,
    actuator: ActuatorDriver<O>,
    switch: S,
    display: D,
    telemetry: T,
    /// Last known values per location, kept across failed reads for display.
    readings: [SensorReading; 2],
    status: SharedStatus,
    remote: OverrideHandle,
    alive: bool,
}

impl<C, O, S, D, T> Controller<C, O, S, D, T>
where
    C: SensorChannel,
    O: RelayOutput,
    S: SwitchInput,
    D: DisplaySink,
    T: TelemetrySink,
{
    pub fn new(
        config: &Config,
        ports: Ports<C, O, S, D, T>,
        status: SharedStatus,
        remote: OverrideHandle,
    ) -> Self {
        Self {
            inside: ports.inside,
            outside: ports.outside,
            reader: SensorReader::new(config.sensor_retries, config.retry_delay),
            corrector: ValueCorrector::new(config.offsets),
            plausible: PlausibleRange {
                min: config.temp_plausible_min,
                max: config.temp_plausible_max,
            },
            engine: VentingDecisionEngine::new(config.thresholds, config.spike_reseed_after),
            arbiter: OverrideArbiter::new(),
            actuator: ActuatorDriver::new(ports.relay),
            switch: ports.switch,
            display: ports.display,
            telemetry: ports.telemetry,
            readings: Location::ALL.map(SensorReading::unset),
            status,
            remote,
            alive: false,
        }
    }

    pub fn reading(&self, location: Location) -> &SensorReading {
        &self.readings[location.index()]
    }

    pub fn cycle(&mut self) -> CycleReport {
        let inside = self.sample(Location::Inside);
        let outside = self.sample(Location::Outside);

        let verdict = match (inside, outside) {
            (Some(inside), Some(outside)) => Some(self.decide(&inside, &outside)),
            _ => None,
        };

        let computed = self.engine.desired();
        let command = self.arbiter.arbitrate(computed, self.remote.get());
        self.actuator.drive(command);

        self.alive = !self.alive;
        let fan_running = self.switch.fan_running();
        if let Some(change) = self.arbiter.observe(fan_running) {
            log::info!("Venting change: {change}");
        }

        let state = *self.arbiter.state();
        self.display.show_line(
            display::ROW_STATUS,
            &display::status_line(self.alive, state.remote, state.fan_running),
            false,
        );
        log::info!(
            "Fan should be {} - fan is {}",
            if computed { "on" } else { "off" },
            if state.fan_running { "ON" } else { "OFF" }
        );

        self.publish_status();

        CycleReport {
            readings_good: verdict.is_some(),
            verdict,
            command,
        }
    }

    /// Reads, corrects and checks one location. `None` marks the cycle's readings as not good.
    fn sample(&mut self, location: Location) -> Option<Climate> {
        let channel = match location {
            Location::Inside => &mut self.inside,
            Location::Outside => &mut self.outside,
        };
        let result = self.reader.read(location, channel);
        let row = location.index();
        let reading = &mut self.readings[row];

        let sample = match result {
            Ok(sample) => sample,
            Err(failure) => {
                log::error!("{failure}");
                reading.retries = failure.retries();
                self.display
                    .show_line(row, &display::retry_line(location, reading.retries), false);
                return None;
            }
        };

        let corrected = self.corrector.correct(location, sample.reading);
        reading.temperature = corrected.temperature;
        reading.humidity = corrected.humidity;
        reading.retries = sample.retries;
        self.display
            .show_line(row, &display::reading_line(location, &corrected), false);

        if !reading.has_values() {
            return None;
        }
        if !self.plausible.contains(reading.temperature) {
            log::warn!(
                "{}: temperature is out of range: {:5.1}°C",
                location.tag(),
                reading.temperature
            );
            reading.dew_point = None;
            return None;
        }

        if reading.humidity <= 0.0 {
            log::warn!(
                "{}: humidity is out of range: {:5.1}%",
                location.tag(),
                reading.humidity
            );
            reading.dew_point = None;
            return None;
        }

        let dew_point = calc_dew_point(reading.temperature, reading.humidity);
        if !dew_point.is_finite() {
            log::warn!("{}: dew point could not be computed", location.tag());
            reading.dew_point = None;
            return None;
        }
        reading.dew_point = Some(dew_point);
        log::info!(
            "{}: Dewpoint ={:5.1}, Temperature ={:5.1}°C, Humidity ={:5.1}% (retried {} times)",
            location.tag(),
            dew_point,
            reading.temperature,
            reading.humidity,
            reading.retries
        );

        Some(Climate {
            temperature: reading.temperature,
            humidity: reading.humidity,
            dew_point,
        })
    }

    fn decide(&mut self, inside: &Climate, outside: &Climate) -> Verdict {
        let verdict = self.engine.evaluate(inside, outside);

        match &verdict {
            Verdict::Seeded => {
                log::info!("Dew point baseline set, deciding from the next cycle on");
            }
            Verdict::SpikeRejected { .. } => {}
            Verdict::Decided {
                desired,
                blocked_by,
                delta,
            } => {
                for floor in blocked_by {
                    log::info!("No venting: {floor}");
                }
                log::debug!("Dew point difference {delta:.1}°C");

                self.display.show_line(
                    display::ROW_DEW_POINTS,
                    &display::dew_point_line(inside.dew_point, outside.dew_point, *desired),
                    false,
                );

                let point = TelemetryPoint::from_cycle(
                    Local::now(),
                    inside,
                    outside,
                    (
                        self.readings[Location::Inside.index()].retries,
                        self.readings[Location::Outside.index()].retries,
                    ),
                    *desired,
                );
                if let Err(e) = self.telemetry.publish(&point) {
                    log::error!("Failed to publish telemetry: {e:#}");
                }
            }
        }

        verdict
    }

    fn publish_status(&self) {
        let state = self.arbiter.state();
        let mut snapshot = StatusSnapshot::new(self.engine.thresholds());
        snapshot.update = Local::now().format(DATE_TIME_FORMAT).to_string();
        snapshot.sensors = self.readings.iter().map(SensorData::from).collect();
        snapshot.venting = state.desired;
        snapshot.override_active = state.manual_override_active;
        snapshot.remote_override = state.remote;
        self.status.publish(snapshot);
    }

    /// Fan off; called once when the loop stops.
    pub fn shutdown(&mut self) {
        self.actuator.release();
        self.display.show_line(display::ROW_STATUS, "Stopped", false);
    }

    #[cfg(test)]
    pub fn ports(&self) -> (&C, &C, &O, &D, &T) {
        (
            &self.inside,
            &self.outside,
            self.actuator.output(),
            &self.display,
            &self.telemetry,
        )
    }

    #[cfg(test)]
    pub fn switch_mut(&mut self) -> &mut S {
        &mut self.switch
    }
}
