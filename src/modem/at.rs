//! AT command builders and outbound SMS templates.
//!
//! Parameterised commands go through `at_commands::builder::CommandBuilder`
//! into a stack buffer, so nothing here allocates.  The two bare commands
//! are constants.

use core::fmt::Write as _;

use at_commands::builder::CommandBuilder;
use heapless::{String, Vec};

use crate::phone::PhoneNumber;
use crate::sensors::SensorReadings;
use crate::sensors::float_switch::WaterLevel;
use crate::sensors::power::{BatteryBand, ChargeBand};

use super::buffer::TX_CAPACITY;

/// Room for the longest command: `AT+CMGS="<16 chars>"\r\n`.
pub const COMMAND_CAPACITY: usize = 48;

/// Largest composed SMS body (one GSM-7 segment).
pub const SMS_CAPACITY: usize = 160;

/// Ends an SMS body after the `> ` prompt.
pub const CTRL_Z: u8 = 0x1A;

pub const ATTENTION: &[u8] = b"AT\r\n";
pub const ECHO_OFF: &[u8] = b"ATE0\r\n";

pub type Command = Vec<u8, COMMAND_CAPACITY>;
pub type SmsPayload = Vec<u8, TX_CAPACITY>;

fn collect(built: Result<&[u8], usize>) -> Command {
    match built {
        Ok(bytes) => Vec::from_slice(bytes).unwrap_or_default(),
        Err(needed) => {
            log::error!("AT command needs {needed} bytes, buffer has {COMMAND_CAPACITY}");
            Vec::new()
        }
    }
}

/// `AT+CMGF=1`: SMS text mode.
pub fn text_mode() -> Command {
    let mut buf = [0u8; COMMAND_CAPACITY];
    collect(
        CommandBuilder::create_set(&mut buf, true)
            .named("+CMGF")
            .with_int_parameter(1)
            .finish(),
    )
}

/// `AT+CMGS="<number>"`: start an outbound SMS; the modem answers `> `.
pub fn send_sms(to: &PhoneNumber) -> Command {
    let mut buf = [0u8; COMMAND_CAPACITY];
    collect(
        CommandBuilder::create_set(&mut buf, true)
            .named("+CMGS")
            .with_string_parameter(to.as_str())
            .finish(),
    )
}

/// `AT+CMGR=<index>`: read one stored message.
pub fn read_sms(index: u32) -> Command {
    let mut buf = [0u8; COMMAND_CAPACITY];
    collect(
        CommandBuilder::create_set(&mut buf, true)
            .named("+CMGR")
            .with_int_parameter(index as i32)
            .finish(),
    )
}

/// `AT+CMGD=1,4`: delete every stored message.
pub fn delete_all_sms() -> Command {
    let mut buf = [0u8; COMMAND_CAPACITY];
    collect(
        CommandBuilder::create_set(&mut buf, true)
            .named("+CMGD")
            .with_int_parameter(1)
            .with_int_parameter(4)
            .finish(),
    )
}

// ── Outbound templates ───────────────────────────────────────

pub const WARNING_TEXT: &str = "Msg from Sol-Mate: Check your boat; water level is getting high.";
pub const ACKNOWLEDGMENT_TEXT: &str =
    "Msg from Sol-Mate: Your phone number has been successfully changed.";
const STATUS_HEADER: &str = "Msg from Sol-Mate: Here's your status report.\r\n";

/// Point-in-time view of everything the status SMS reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub battery: BatteryBand,
    pub charge: ChargeBand,
    pub water: WaterLevel,
    pub pump_on: bool,
}

impl StatusReport {
    pub fn from_readings(readings: &SensorReadings, switch_count: u8, pump_on: bool) -> Self {
        Self {
            battery: BatteryBand::from_level(readings.battery_level),
            charge: ChargeBand::from_level(readings.panel_voltage_level),
            water: WaterLevel::classify(readings.float_switch_mask, switch_count),
            pump_on,
        }
    }

    pub fn compose(&self) -> String<SMS_CAPACITY> {
        let mut text = String::new();
        // Worst case is well under SMS_CAPACITY, so writes cannot fail.
        let _ = write!(
            text,
            "{STATUS_HEADER}Battery level: {} -- Charge rate: {} -- Water level: {} -- Pump: {}",
            self.battery.label(),
            self.charge.label(),
            self.water.label(),
            if self.pump_on { "On" } else { "Off" },
        );
        text
    }
}

/// Body bytes followed by Ctrl-Z, ready for the link.
pub fn sms_payload(text: &str) -> SmsPayload {
    let mut payload = Vec::new();
    let room = TX_CAPACITY - 1;
    let body = &text.as_bytes()[..text.len().min(room)];
    let _ = payload.extend_from_slice(body);
    let _ = payload.push(CTRL_Z);
    payload
}
