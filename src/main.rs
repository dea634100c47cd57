use anyhow::Context;
use dew_point_fan::controller::{Controller, Ports};
use dew_point_fan::dht22::DHT22;
use dew_point_fan::display::{DisplaySink, LogDisplay};
use dew_point_fan::status::{OverrideHandle, SharedStatus, StatusSnapshot};
use dew_point_fan::{actuator, config, shutdown, telemetry};
use log::LevelFilter;
use rppal::gpio::Gpio;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    TermLogger::init(
        LevelFilter::Info,
        ConfigBuilder::new()
            .set_time_format_rfc3339()
            .set_time_offset_to_local()
            .map_err(|_| anyhow::anyhow!("Failed to set time offset to local"))?
            .build(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;

    if let Err(e) = run().await {
        log::error!("{e:#}");
    }

    Ok(())
}

pub async fn run() -> Result<(), anyhow::Error> {
    log::info!("Starting Dew Point Fan...");

    let cfg = config::Config::default();
    let gpio = Gpio::new().context("Failed to initialize GPIO")?;

    let mut display = LogDisplay::new();
    display.show_line(0, "Starting...", false);

    let ports = Ports {
        inside: DHT22::new(&gpio, config::INSIDE_SENSOR_PIN)
            .context("Failed to initialize inside DHT22")?,
        outside: DHT22::new(&gpio, config::OUTSIDE_SENSOR_PIN)
            .context("Failed to initialize outside DHT22")?,
        relay: actuator::RelayPin::new(&gpio, config::RELAY_PIN)?,
        switch: actuator::SwitchSense::new(&gpio, config::SWITCH_SENSE_PIN)?,
        display,
        telemetry: telemetry::LogTelemetry,
    };

    let status = SharedStatus::new(StatusSnapshot::new(&cfg.thresholds));
    let remote = OverrideHandle::new();
    let mut controller = Controller::new(&cfg, ports, status.clone(), remote);

    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let poller = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config::POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut stop_rx => break,
            }

            // Sensor reads block for up to the whole retry budget.
            let report = tokio::task::block_in_place(|| controller.cycle());
            if !report.readings_good {
                log::warn!("Readings not good, decision skipped");
            }
        }
        controller.shutdown();
    });

    let received = shutdown::wait_for_signal().await?;
    log::info!("{received:?} received... Exiting");

    // The poller may be inside a cycle; it stops after finishing it.
    let _ = stop_tx.send(());
    tokio::time::timeout(cfg.shutdown_timeout(), poller)
        .await
        .context("Polling loop did not stop in time")?
        .context("Polling loop panicked")?;

    log::debug!("Last status: {}", status.snapshot().to_json()?);

    Ok(())
}
