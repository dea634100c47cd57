use anyhow::Context;
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};

/// Digital output driving the fan relay.
pub trait RelayOutput {
    fn write(&mut self, level: Level) -> Result<(), anyhow::Error>;
}

/// Reads whether the fan is actually running, whatever the manual switch does.
pub trait SwitchInput {
    fn fan_running(&mut self) -> bool;
}

/// The relay board is active low.
pub fn level_for(on: bool) -> Level {
    if on { Level::Low } else { Level::High }
}

#[derive(Debug)]
pub struct ActuatorDriver<O> {
    output: O,
}

impl<O: RelayOutput> ActuatorDriver<O> {
    pub fn new(output: O) -> Self {
        Self { output }
    }

    /// Re-asserts the level every call; a failed write is retried by the next cycle.
    pub fn drive(&mut self, on: bool) -> bool {
        match self.output.write(level_for(on)) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to switch fan relay {}: {e:#}", if on { "on" } else { "off" });
                false
            }
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &O {
        &self.output
    }

    /// Fan off before the process exits.
    pub fn release(&mut self) {
        if self.drive(false) {
            log::info!("Fan relay released");
        }
    }
}

#[derive(Debug)]
pub struct RelayPin {
    pin: OutputPin,
}

impl RelayPin {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<RelayPin, anyhow::Error> {
        // Start with the fan off.
        let pin = gpio
            .get(pin)
            .with_context(|| format!("Failed to get relay GPIO{pin}"))?
            .into_output_high();

        Ok(RelayPin { pin })
    }
}

impl RelayOutput for RelayPin {
    fn write(&mut self, level: Level) -> Result<(), anyhow::Error> {
        self.pin.write(level);
        Ok(())
    }
}

#[derive(Debug)]
pub struct SwitchSense {
    pin: InputPin,
}

impl SwitchSense {
    pub fn new(gpio: &Gpio, pin: u8) -> Result<SwitchSense, anyhow::Error> {
        let pin = gpio
            .get(pin)
            .with_context(|| format!("Failed to get switch sense GPIO{pin}"))?
            .into_input();

        Ok(SwitchSense { pin })
    }
}

impl SwitchInput for SwitchSense {
    fn fan_running(&mut self) -> bool {
        self.pin.is_low()
    }
}
