//! Alert / retry controller.
//!
//! Decides, once per tick, whether the water situation warrants a warning
//! SMS, and how to react when an outbound SMS fails.
//!
//! An alert is requested only when every condition holds:
//!
//! | Condition                  | Source                               |
//! |----------------------------|--------------------------------------|
//! | water present              | any float switch wet                 |
//! | battery below start level  | pump cannot (re)start on its own     |
//! | enough switches, validly   | contiguous run ≥ `alert_min_switches`|
//! | modem idle                 | no dialog outstanding                |
//! | cooldown elapsed           | since the last *delivered* alert     |
//! | owner number provisioned   |                                      |
//!
//! The retry counter covers every outbound SMS kind: it counts failed
//! submissions of the message currently in flight and is cleared on
//! delivery or abandonment.

use log::{info, warn};

use crate::config::SystemConfig;
use crate::sensors::SensorReadings;
use crate::sensors::float_switch::contiguous_level;

/// Alert-related slice of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    pub battery_high_threshold: u8,
    pub float_switch_count: u8,
    pub alert_min_switches: u8,
    pub cooldown_ms: u64,
    pub max_send_attempts: u8,
}

impl AlertPolicy {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            battery_high_threshold: config.battery_high_threshold,
            float_switch_count: config.float_switch_count,
            alert_min_switches: config.alert_min_switches,
            cooldown_ms: u64::from(config.alert_cooldown_secs) * 1000,
            max_send_attempts: config.max_send_attempts,
        }
    }
}

/// Everything resets to "never sent" at boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertState {
    /// Uptime of the last delivered alert.
    pub last_alert_ms: Option<u64>,
    /// Failed submissions of the SMS currently in flight.
    pub retry_count: u8,
    /// At least one alert delivered since boot.
    pub alert_sent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Arm the backoff timer; `attempt` is the number of the next try.
    Retry { attempt: u8 },
    /// Ceiling reached after `attempts` failures.
    Abandon { attempts: u8 },
}

/// Inputs that come from outside the controller for one decision.
#[derive(Debug, Clone, Copy)]
pub struct AlertInputs<'a> {
    pub readings: &'a SensorReadings,
    pub sequencer_idle: bool,
    pub owner_provisioned: bool,
    pub now_ms: u64,
}

#[derive(Debug, Default)]
pub struct AlertController {
    state: AlertState,
}

impl AlertController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &AlertState {
        &self.state
    }

    pub fn cooldown_elapsed(&self, now_ms: u64, policy: &AlertPolicy) -> bool {
        self.state
            .last_alert_ms
            .is_none_or(|sent| now_ms.saturating_sub(sent) >= policy.cooldown_ms)
    }

    pub fn should_alert(&self, inputs: &AlertInputs<'_>, policy: &AlertPolicy) -> bool {
        let readings = inputs.readings;
        let enough_water = contiguous_level(readings.float_switch_mask, policy.float_switch_count)
            .is_some_and(|level| level >= policy.alert_min_switches);

        readings.water_present()
            && readings.battery_level < policy.battery_high_threshold
            && enough_water
            && inputs.sequencer_idle
            && inputs.owner_provisioned
            && self.cooldown_elapsed(inputs.now_ms, policy)
    }

    /// A submission failed.  Retry until the ceiling, then give up.
    pub fn on_send_failed(&mut self, policy: &AlertPolicy) -> RetryDecision {
        self.state.retry_count = self.state.retry_count.saturating_add(1);
        let failures = self.state.retry_count;
        if failures >= policy.max_send_attempts {
            warn!("alert: giving up after {failures} failed attempts");
            self.state.retry_count = 0;
            RetryDecision::Abandon { attempts: failures }
        } else {
            RetryDecision::Retry {
                attempt: failures + 1,
            }
        }
    }

    /// An SMS went out.  Only alerts start the cooldown.
    pub fn on_delivered(&mut self, was_alert: bool, now_ms: u64) {
        self.state.retry_count = 0;
        if was_alert {
            info!("alert: delivered at {now_ms} ms uptime");
            self.state.last_alert_ms = Some(now_ms);
            self.state.alert_sent = true;
        }
    }

    /// The in-flight SMS was dropped for a reason other than the ceiling.
    pub fn reset_retries(&mut self) {
        self.state.retry_count = 0;
    }
}
