//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log today).

use crate::modem::sequencer::{DialogState, OutboundSms};
use crate::phone::PhoneNumber;
use crate::sensors::SensorReadings;
use crate::sensors::float_switch::WaterLevel;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// The service has started (carries the initial dialog state).
    Started(DialogState),

    /// The modem dialog moved between states.
    DialogChanged { from: DialogState, to: DialogState },

    /// Modem setup failed or the modem never powered up.
    ModemOffline,

    /// The pump switched on or off.
    PumpChanged(bool),

    /// A water warning dialog was started.
    AlertRequested,

    /// A new owner number was adopted from an inbound SMS.
    PhoneProvisioned(PhoneNumber),

    /// A status query was accepted.
    StatusRequested,

    /// An inbound SMS was not understood and was deleted.
    MessageDiscarded,

    /// An outbound SMS was accepted by the network.
    SmsDelivered(OutboundSms),

    /// An outbound SMS failed; `attempt` is the number of the next try.
    SendFailed { sms: OutboundSms, attempt: u8 },

    /// An outbound SMS was given up after `attempts` failures.
    RetryAbandoned { sms: OutboundSms, attempts: u8 },
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryData {
    pub dialog: DialogState,
    pub readings: SensorReadings,
    pub water: WaterLevel,
    pub pump_on: bool,
    pub owner_provisioned: bool,
    pub retry_count: u8,
    pub alert_sent: bool,
    pub uptime_secs: u64,
}
