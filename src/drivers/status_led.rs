//! Red/green status LED driver.
//!
//! | Indicator | Red | Green |
//! |-----------|-----|-------|
//! | Ready     | off | on    |
//! | Busy      | on  | on    |
//! | Offline   | on  | off   |

use embedded_hal::digital::OutputPin;

use crate::app::ports::StatusIndicator;
use crate::drivers::hw_init::Gpio;
use crate::pins;

pub struct StatusLed<P: OutputPin = Gpio> {
    red: P,
    green: P,
    current: Option<StatusIndicator>,
}

impl StatusLed<Gpio> {
    pub fn on_board() -> Self {
        Self::new(
            Gpio::new(pins::LED_RED_GPIO),
            Gpio::new(pins::LED_GREEN_GPIO),
        )
    }
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(red: P, green: P) -> Self {
        Self {
            red,
            green,
            current: None,
        }
    }

    pub fn show(&mut self, indicator: StatusIndicator) {
        if self.current == Some(indicator) {
            return;
        }
        let (red, green) = match indicator {
            StatusIndicator::Ready => (false, true),
            StatusIndicator::Busy => (true, true),
            StatusIndicator::Offline => (true, false),
        };
        Self::drive(&mut self.red, red);
        Self::drive(&mut self.green, green);
        self.current = Some(indicator);
    }

    pub fn off(&mut self) {
        Self::drive(&mut self.red, false);
        Self::drive(&mut self.green, false);
        self.current = None;
    }

    pub fn current(&self) -> Option<StatusIndicator> {
        self.current
    }

    fn drive(pin: &mut P, on: bool) {
        let _ = if on { pin.set_high() } else { pin.set_low() };
    }
}
