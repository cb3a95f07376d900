//! Bilge pump driver: one MOSFET gate output.
//!
//! This is a dumb actuator.  Whether the pump may run is decided by
//! [`PumpController`](crate::control::pump::PumpController).

use embedded_hal::digital::OutputPin;

use crate::drivers::hw_init::Gpio;
use crate::pins;

pub struct PumpDriver<P: OutputPin = Gpio> {
    gate: P,
    running: bool,
}

impl PumpDriver<Gpio> {
    /// Driver on the board's pump pin.
    pub fn on_board() -> Self {
        Self::new(Gpio::new(pins::PUMP_GPIO))
    }
}

impl<P: OutputPin> PumpDriver<P> {
    /// Takes the gate pin and forces the pump off.
    pub fn new(gate: P) -> Self {
        let mut driver = Self {
            gate,
            running: true,
        };
        driver.set(false);
        driver
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.gate.set_high()
        } else {
            self.gate.set_low()
        };
        match result {
            Ok(()) => self.running = on,
            Err(_) => log::warn!("pump: gate write failed, state unchanged"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
