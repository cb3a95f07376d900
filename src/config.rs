//! System configuration parameters
//!
//! All tunable parameters for the Sol-Mate bilge monitor.
//! Values can be overridden via NVS (non-volatile storage); see
//! [`NvsAdapter`](crate::adapters::nvs::NvsAdapter) for the range checks
//! applied before anything is persisted.

use heapless::String;
use serde::{Deserialize, Serialize};

/// Capacity of the inbound SMS keyword fields.
pub const KEYWORD_CAPACITY: usize = 24;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Timing ---
    /// Sensor / pump / alert tick interval (milliseconds)
    pub tick_interval_ms: u32,
    /// Telemetry log interval (seconds)
    pub telemetry_interval_secs: u32,

    // --- Pump hysteresis (8-bit battery codes) ---
    /// A running pump keeps running down to this battery level
    pub battery_low_threshold: u8,
    /// A stopped pump may only start at or above this battery level
    pub battery_high_threshold: u8,

    // --- Water level ---
    /// Number of stacked float switches (bit 0 = lowest)
    pub float_switch_count: u8,
    /// Contiguous wet switches required before an alert is raised
    pub alert_min_switches: u8,

    // --- Alerting ---
    /// Minimum spacing between two delivered alerts (seconds)
    pub alert_cooldown_secs: u32,
    /// Delay before a failed SMS submission is re-attempted (milliseconds)
    pub retry_backoff_ms: u32,
    /// Failed submissions tolerated before an outbound SMS is abandoned
    pub max_send_attempts: u8,

    // --- SMS vocabulary ---
    /// Shared secret that provisions the sender as the alert recipient
    pub sms_secret: String<KEYWORD_CAPACITY>,
    /// Phrase that requests a status report
    pub status_phrase: String<KEYWORD_CAPACITY>,

    // --- Modem link ---
    /// UART baud rate towards the cellular modem
    pub modem_baud_rate: u32,
}

impl SystemConfig {
    /// Tick interval as seconds (for log output only).
    pub fn tick_secs(&self) -> f32 {
        self.tick_interval_ms as f32 / 1000.0
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_interval_ms: 500,       // 2 Hz
            telemetry_interval_secs: 60, // 1/min

            // Pump hysteresis
            battery_low_threshold: 140,
            battery_high_threshold: 200,

            // Water level
            float_switch_count: 5,
            alert_min_switches: 2,

            // Alerting
            alert_cooldown_secs: 24 * 60 * 60,
            retry_backoff_ms: 16_000, // 65535 ticks of the 4096 Hz backoff timer
            max_send_attempts: 8,

            // SMS vocabulary
            sms_secret: keyword("978SolMate"),
            status_phrase: keyword("What's up"),

            // Modem link
            modem_baud_rate: 14_400,
        }
    }
}

/// Build a keyword field from a literal that is known to fit.
fn keyword(text: &str) -> String<KEYWORD_CAPACITY> {
    let mut s = String::new();
    for ch in text.chars() {
        if s.push(ch).is_err() {
            break;
        }
    }
    s
}
