//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, modem link, timers, event sinks,
//! storage) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches hardware
//! directly and runs unchanged against the mocks in `tests/`.
//!
//! Config and storage errors are defined here, next to their traits.

use core::fmt;

use crate::config::SystemConfig;
use crate::error::ModemError;
use crate::modem::buffer::ResponseText;
use crate::modem::link::Reply;
use crate::sensors::SensorReadings;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Sample every sensor.
    fn read_all(&mut self) -> SensorReadings;

    /// Whether the modem reports that it is powered and booted.
    fn modem_powered(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// What the indicator lights show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// Modem idle and listening.
    Ready,
    /// A dialog is in flight or backing off.
    Busy,
    /// No SMS capability this boot.
    Offline,
}

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    fn set_pump(&mut self, on: bool);

    fn set_indicator(&mut self, indicator: StatusIndicator);

    /// Pump and lights off.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Modem port (driven adapter: sequencer → byte transport)
// ───────────────────────────────────────────────────────────────

/// Command side of the modem link.
///
/// Every call starts a new dialog turn: the receive buffer and matcher are
/// reset and the previous response is gone.
pub trait ModemPort {
    /// Transmit `command` and arm the receiver for its terminator.
    /// Fails with [`ModemError::Busy`] while a reply is still outstanding.
    fn send(&mut self, command: &[u8]) -> Result<(), ModemError>;

    /// Arm the receiver for one unsolicited line.
    fn listen(&mut self);

    /// Stop receiving until the next `send` or `listen`.
    fn suspend(&mut self);

    /// Copy of everything received during the current turn.
    fn response(&self) -> ResponseText;
}

// ───────────────────────────────────────────────────────────────
// Reply delegate (decouples the transport from the event system)
// ───────────────────────────────────────────────────────────────

/// Capability the byte transport calls when a scan completes.
///
/// The transport does not know who consumes its completions.  The main
/// loop implements this by forwarding to
/// [`push_event`](crate::events::push_event); tests record the replies.
pub trait ReplyDelegate {
    fn on_reply(&mut self, reply: Reply);
}

// ───────────────────────────────────────────────────────────────
// Retry timer port
// ───────────────────────────────────────────────────────────────

/// One-shot countdown used for send-retry backoff.
pub trait RetryTimerPort {
    /// Start (or restart) the countdown.
    fn arm(&mut self, duration_ms: u32);

    /// Cancel a running countdown.  No-op if idle.
    fn disarm(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ── Persistence ───────────────────────────────────────────────

/// Where [`SystemConfig`] lives between boots.
///
/// `save` runs the range checks first; a bad value is an error, not a
/// silent clamp.
pub trait ConfigPort {
    /// [`ConfigError::NotFound`] means nothing was ever saved.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Namespaced blob store (NVS on target).
///
/// A `write` replaces the whole value.  The phone record relies on
/// `delete` followed by `write` to mimic a flash segment erase.
pub trait StoragePort {
    /// Copy the value into `buf`; returns the byte count copied.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Missing keys are not an error.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// First boot.
    NotFound,
    /// The stored blob did not decode.
    Corrupted,
    /// Names the offending field.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no saved config"),
            Self::Corrupted => write!(f, "saved config unreadable"),
            Self::ValidationFailed(field) => write!(f, "out of range: {field}"),
            Self::StorageFull => write!(f, "NVS full"),
            Self::IoError => write!(f, "NVS access failed"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "no such key"),
            Self::Full => write!(f, "NVS full"),
            Self::IoError => write!(f, "NVS access failed"),
        }
    }
}
