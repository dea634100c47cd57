use crate::arbiter::RemoteOverride;
use crate::measurement::{Location, RawReading};

pub const ROWS: usize = 4;
pub const COLUMNS: usize = 20;

pub const ROW_DEW_POINTS: usize = 2;
pub const ROW_STATUS: usize = 3;

/// Character display the loop pushes its status lines to.
pub trait DisplaySink {
    fn show_line(&mut self, row: usize, text: &str, scroll: bool);
}

pub fn reading_line(location: Location, reading: &RawReading) -> String {
    format!(
        "{}-T:{:5.1}C H:{:5.1}%",
        location.tag(),
        reading.temperature,
        reading.humidity
    )
}

pub fn retry_line(location: Location, retries: usize) -> String {
    format!("{}: retried {retries}", location.tag())
}

pub fn dew_point_line(inside: f32, outside: f32, venting: bool) -> String {
    format!(
        "DP:{inside:5.1}C {outside:5.1}C {}",
        if venting { "on" } else { "off" }
    )
}

/// Alive marker, remote override code and the sensed fan status, right aligned.
pub fn status_line(alive: bool, remote: RemoteOverride, fan_running: bool) -> String {
    let fan = if fan_running { "ON " } else { "OFF" };
    let marker = if alive { '*' } else { ' ' };
    format!("{marker} {remote}{fan:>width$}", width = COLUMNS - 3)
}

/// Keeps the current screen content and logs rows whenever they change.
#[derive(Debug, Default)]
pub struct LogDisplay {
    lines: [String; ROWS],
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String; ROWS] {
        &self.lines
    }
}

impl DisplaySink for LogDisplay {
    fn show_line(&mut self, row: usize, text: &str, scroll: bool) {
        let Some(line) = self.lines.get_mut(row) else {
            log::warn!("Display has no row {row}");
            return;
        };

        let text = text.trim();
        if *line != text {
            *line = text.to_string();
            log::info!(
                "LCD[{row}]{} {text}",
                if scroll && text.len() > COLUMNS { "~" } else { ":" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_line() {
        let reading = RawReading {
            temperature: 22.0,
            humidity: 55.0,
        };
        assert_eq!(reading_line(Location::Inside, &reading), "I-T: 22.0C H: 55.0%");
        assert_eq!(retry_line(Location::Outside, 15), "O: retried 15");
    }

    #[test]
    fn test_dew_point_line() {
        assert_eq!(dew_point_line(12.5, 1.8, true), "DP: 12.5C   1.8C on");
        assert_eq!(dew_point_line(-3.0, 1.8, false), "DP: -3.0C   1.8C off");
    }

    #[test]
    fn test_status_line_fits_display() {
        let line = status_line(true, RemoteOverride::ForceOff, false);
        assert_eq!(line.len(), COLUMNS);
        assert!(line.starts_with("* 2"));
        assert!(line.ends_with("OFF"));
    }

    #[test]
    fn test_changed_rows_are_logged_at_info() {
        crate::test_log::init();
        let mut display = LogDisplay::new();
        display.show_line(2, "DP: 11.1C   0.4C on", false);
        assert_eq!(
            crate::test_log::levels_of("DP: 11.1C   0.4C on"),
            vec![log::Level::Info]
        );
    }

    #[test]
    fn test_log_display_keeps_trimmed_lines() {
        let mut display = LogDisplay::new();
        display.show_line(1, "  O: retried 3 ", false);
        display.show_line(7, "ignored", false);
        assert_eq!(display.lines()[1], "O: retried 3");
        assert!(display.lines()[0].is_empty());
    }
}
