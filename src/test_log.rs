//! Captures log records so tests can check what reaches the default `Info` level.

use std::sync::OnceLock;

use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;

struct CaptureLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        self.records
            .lock()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: OnceLock<CaptureLogger> = OnceLock::new();

pub fn init() {
    let logger = LOGGER.get_or_init(|| CaptureLogger {
        records: Mutex::new(Vec::new()),
    });
    if log::set_logger(logger).is_ok() {
        log::set_max_level(LevelFilter::Trace);
    }
}

/// Levels of captured records whose message contains `needle`.
pub fn levels_of(needle: &str) -> Vec<Level> {
    LOGGER.get().map_or_else(Vec::new, |logger| {
        logger
            .records
            .lock()
            .iter()
            .filter(|(_, msg)| msg.contains(needle))
            .map(|(level, _)| *level)
            .collect()
    })
}
