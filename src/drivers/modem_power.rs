//! Modem supply and power-key sequencing.
//!
//! The module boots when its PWRKEY line is held low for about a second
//! with the supply rail enabled, then raises STATUS once it is ready for
//! AT commands.  [`ModemPower::power_on`] runs that sequence with a
//! bounded wait; callers treat failure as "no SMS this boot".

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::drivers::hw_init::Gpio;
use crate::error::{Error, Result};
use crate::pins;

const POWER_KEY_PULSE_MS: u32 = 1_200;
const STATUS_POLL_MS: u32 = 100;
const STATUS_TIMEOUT_MS: u32 = 5_000;

pub struct ModemPower<O: OutputPin = Gpio, I: InputPin = Gpio> {
    enable: O,
    power_key: O,
    status: I,
}

impl ModemPower<Gpio, Gpio> {
    pub fn on_board() -> Self {
        Self::new(
            Gpio::new(pins::MODEM_POWER_ENABLE_GPIO),
            Gpio::new(pins::MODEM_POWER_KEY_GPIO),
            Gpio::new(pins::MODEM_STATUS_GPIO),
        )
    }
}

impl<O: OutputPin, I: InputPin> ModemPower<O, I> {
    pub fn new(enable: O, power_key: O, status: I) -> Self {
        Self {
            enable,
            power_key,
            status,
        }
    }

    /// STATUS high means the module has booted.
    pub fn is_powered(&mut self) -> bool {
        self.status.is_high().unwrap_or(false)
    }

    fn set_supply(&mut self, on: bool) {
        let _ = if on {
            self.enable.set_high()
        } else {
            self.enable.set_low()
        };
    }

    /// Enable the rail and pulse PWRKEY until STATUS rises or the wait
    /// runs out.  A module that is already up is left alone.
    pub fn power_on(&mut self, delay: &mut impl DelayNs) -> Result<()> {
        self.set_supply(true);
        if self.is_powered() {
            log::info!("modem_power: already on");
            return Ok(());
        }

        self.power_key
            .set_low()
            .map_err(|_| Error::Init("modem PWRKEY write failed"))?;
        delay.delay_ms(POWER_KEY_PULSE_MS);
        self.power_key
            .set_high()
            .map_err(|_| Error::Init("modem PWRKEY write failed"))?;

        let mut waited = 0;
        while waited < STATUS_TIMEOUT_MS {
            if self.is_powered() {
                log::info!("modem_power: ready after {} ms", POWER_KEY_PULSE_MS + waited);
                return Ok(());
            }
            delay.delay_ms(STATUS_POLL_MS);
            waited += STATUS_POLL_MS;
        }

        log::warn!("modem_power: no STATUS after {STATUS_TIMEOUT_MS} ms");
        Err(Error::Init("modem did not power up"))
    }
}
