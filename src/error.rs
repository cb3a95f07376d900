//! Unified error types for the Sol-Mate firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! top-level event loop's error handling uniform.  All variants are `Copy`
//! so they can be passed through the sequencer and alert controller
//! without allocation.
//!
//! None of these are fatal: every failure is logged and the firmware falls
//! back to an idle, still-sensing state.

use core::fmt;

use crate::modem::sequencer::DialogState;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The serial link to the modem refused an operation.
    Modem(ModemError),
    /// A modem dialog could not be started.
    Dialog(DialogError),
    /// A phone number failed validation.
    PhoneNumber(PhoneNumberError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modem(e) => write!(f, "modem: {e}"),
            Self::Dialog(e) => write!(f, "dialog: {e}"),
            Self::PhoneNumber(e) => write!(f, "phone number: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Modem link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// A command is still waiting for its terminator.
    Busy,
    /// The UART driver rejected a read or write.
    Io,
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => write!(f, "command in progress"),
            Self::Io => write!(f, "UART I/O failed"),
        }
    }
}

impl From<ModemError> for Error {
    fn from(e: ModemError) -> Self {
        Self::Modem(e)
    }
}

// ---------------------------------------------------------------------------
// Dialog errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogError {
    /// Another dialog is outstanding; requests are never queued.
    Busy(DialogState),
    /// Modem setup failed this boot; no SMS capability.
    Offline,
    /// No provisioned phone number to address the message to.
    NoRecipient,
    /// The link refused the command.
    Link(ModemError),
}

impl fmt::Display for DialogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy(state) => write!(f, "dialog busy in {state:?}"),
            Self::Offline => write!(f, "modem offline"),
            Self::NoRecipient => write!(f, "no phone number provisioned"),
            Self::Link(e) => write!(f, "link: {e}"),
        }
    }
}

impl From<ModemError> for DialogError {
    fn from(e: ModemError) -> Self {
        Self::Link(e)
    }
}

impl From<DialogError> for Error {
    fn from(e: DialogError) -> Self {
        Self::Dialog(e)
    }
}

// ---------------------------------------------------------------------------
// Phone number errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneNumberError {
    Empty,
    TooLong,
    /// The number does not start with the trusted country-code prefix.
    MissingCountryPrefix,
    /// Something other than digits followed the leading `+`.
    InvalidCharacter,
    /// Nothing after the country prefix.
    NoSubscriberDigits,
}

impl fmt::Display for PhoneNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::TooLong => write!(f, "longer than 16 characters"),
            Self::MissingCountryPrefix => write!(f, "missing +1 country prefix"),
            Self::InvalidCharacter => write!(f, "invalid character"),
            Self::NoSubscriberDigits => write!(f, "no digits after +1"),
        }
    }
}

impl From<PhoneNumberError> for Error {
    fn from(e: PhoneNumberError) -> Self {
        Self::PhoneNumber(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
