use std::fmt;

use serde::{Deserialize, Serialize};

/// Operator decision coming from the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RemoteOverride {
    #[default]
    None,
    ForceOn,
    ForceOff,
}

impl From<RemoteOverride> for u8 {
    fn from(value: RemoteOverride) -> Self {
        match value {
            RemoteOverride::None => 0,
            RemoteOverride::ForceOn => 1,
            RemoteOverride::ForceOff => 2,
        }
    }
}

impl TryFrom<u8> for RemoteOverride {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RemoteOverride::None),
            1 => Ok(RemoteOverride::ForceOn),
            2 => Ok(RemoteOverride::ForceOff),
            other => Err(format!("invalid override {other}, expected 0, 1 or 2")),
        }
    }
}

impl fmt::Display for RemoteOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanState {
    /// Final command sent to the relay.
    pub desired: bool,
    /// Relay state sensed behind the manual switch.
    pub fan_running: bool,
    /// The manual switch overrules the command.
    pub manual_override_active: bool,
    pub remote: RemoteOverride,
    pub last_desired: bool,
    pub last_fan_running: bool,
    pub last_remote: RemoteOverride,
}

/// Emitted once whenever command, sensed relay state or remote override changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VentingChange {
    pub desired: bool,
    pub fan_running: bool,
    pub remote: RemoteOverride,
}

impl fmt::Display for VentingChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "new state is {}, fan status {}, remote override {}",
            self.desired, self.fan_running, self.remote
        )
    }
}

#[derive(Debug, Default)]
pub struct OverrideArbiter {
    state: FanState,
}

impl OverrideArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &FanState {
        &self.state
    }

    /// Final relay command. A remote override wins over the computed decision.
    pub fn arbitrate(&mut self, computed: bool, remote: RemoteOverride) -> bool {
        self.state.remote = remote;
        self.state.desired = match remote {
            RemoteOverride::None => computed,
            RemoteOverride::ForceOn => true,
            RemoteOverride::ForceOff => false,
        };
        self.state.desired
    }

    /// Records the sensed relay state after actuation and closes the cycle.
    pub fn observe(&mut self, fan_running: bool) -> Option<VentingChange> {
        let s = &mut self.state;
        s.fan_running = fan_running;
        s.manual_override_active = s.desired != fan_running;

        let changed = s.desired != s.last_desired
            || s.fan_running != s.last_fan_running
            || s.remote != s.last_remote;

        s.last_desired = s.desired;
        s.last_fan_running = s.fan_running;
        s.last_remote = s.remote;

        changed.then_some(VentingChange {
            desired: s.desired,
            fan_running: s.fan_running,
            remote: s.remote,
        })
    }
}
