//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces one [`SensorReadings`]
//! per tick.  Only the tick handler writes readings; everything else
//! works from a copy.

pub mod float_switch;
pub mod power;

use embedded_hal::digital::InputPin;

use crate::drivers::hw_init::Gpio;
use float_switch::FloatSwitchBank;
use power::PowerMonitor;

/// Raw sensor state for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorReadings {
    /// One bit per float switch, LSB = lowest switch, set = wet.
    pub float_switch_mask: u8,
    /// Battery voltage code, 0..=255.
    pub battery_level: u8,
    /// Solar panel voltage code, 0..=255.
    pub panel_voltage_level: u8,
}

impl SensorReadings {
    /// Any switch wet, regardless of validity.
    pub fn water_present(&self) -> bool {
        self.float_switch_mask != 0
    }
}

/// Aggregates all sensor drivers and produces a unified reading.
pub struct SensorHub<P = Gpio> {
    pub float_switches: FloatSwitchBank<P>,
    pub power: PowerMonitor,
}

impl<P: InputPin> SensorHub<P> {
    pub fn new(float_switches: FloatSwitchBank<P>, power: PowerMonitor) -> Self {
        Self {
            float_switches,
            power,
        }
    }

    pub fn read_all(&mut self) -> SensorReadings {
        let mask = self.float_switches.read_mask();
        let power = self.power.read();
        SensorReadings {
            float_switch_mask: mask,
            battery_level: power.battery_level,
            panel_voltage_level: power.panel_voltage_level,
        }
    }
}
