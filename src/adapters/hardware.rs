//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and all actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, SensorPort, StatusIndicator};
use crate::drivers::modem_power::ModemPower;
use crate::drivers::pump::PumpDriver;
use crate::drivers::status_led::StatusLed;
use crate::sensors::{SensorHub, SensorReadings};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    sensor_hub: SensorHub,
    pump: PumpDriver,
    led: StatusLed,
    modem_power: ModemPower,
}

impl HardwareAdapter {
    pub fn new(
        sensor_hub: SensorHub,
        pump: PumpDriver,
        led: StatusLed,
        modem_power: ModemPower,
    ) -> Self {
        Self {
            sensor_hub,
            pump,
            led,
            modem_power,
        }
    }

    /// Used by `main` for the boot-time power sequence.
    pub fn modem_power_mut(&mut self) -> &mut ModemPower {
        &mut self.modem_power
    }

    pub fn pump_running(&self) -> bool {
        self.pump.is_running()
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl SensorPort for HardwareAdapter {
    fn read_all(&mut self) -> SensorReadings {
        self.sensor_hub.read_all()
    }

    fn modem_powered(&mut self) -> bool {
        self.modem_power.is_powered()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_pump(&mut self, on: bool) {
        if on != self.pump.is_running() {
            self.pump.set(on);
        }
    }

    fn set_indicator(&mut self, indicator: StatusIndicator) {
        self.led.show(indicator);
    }

    fn all_off(&mut self) {
        self.pump.set(false);
        self.led.off();
    }
}
