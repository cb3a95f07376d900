//! Owner phone number and its non-volatile record.
//!
//! The record is a fixed 64-byte, NUL-padded segment.  Saving erases the
//! old record before programming the new one, so a torn write leaves the
//! slot empty rather than half-old.  On boot the record is trusted only if
//! it carries the `+1` country prefix.

use core::fmt;
use core::str::FromStr;

use heapless::String;
use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::PhoneNumberError;

/// Longest number accepted, in characters.
pub const PHONE_CAPACITY: usize = 16;

/// Country prefix a number must start with before it is trusted.
pub const COUNTRY_PREFIX: &str = "+1";

pub const PHONE_NAMESPACE: &str = "solmate";
pub const PHONE_KEY: &str = "phone";

/// Size of the persisted record.
pub const RECORD_LEN: usize = 64;

/// A validated `+1...` phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String<PHONE_CAPACITY>);

impl PhoneNumber {
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }
        if s.len() > PHONE_CAPACITY {
            return Err(PhoneNumberError::TooLong);
        }
        let Some(digits) = s.strip_prefix(COUNTRY_PREFIX) else {
            return Err(PhoneNumberError::MissingCountryPrefix);
        };
        if digits.is_empty() {
            return Err(PhoneNumberError::NoSubscriberDigits);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneNumberError::InvalidCharacter);
        }
        String::try_from(s)
            .map(Self)
            .map_err(|_| PhoneNumberError::TooLong)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Encode as the fixed-size persisted record.
    pub fn to_record(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        let bytes = self.0.as_bytes();
        record[..bytes.len()].copy_from_slice(bytes);
        record
    }

    /// Decode a persisted record.  Anything that is not a valid `+1`
    /// number up to the first NUL yields `None`.
    pub fn from_record(record: &[u8]) -> Option<Self> {
        let end = record.iter().position(|&b| b == 0).unwrap_or(record.len());
        let text = core::str::from_utf8(&record[..end]).ok()?;
        if !text.starts_with(COUNTRY_PREFIX) {
            return None;
        }
        Self::parse(text).ok()
    }
}

impl FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory copy of the owner number plus its persistence.
#[derive(Debug, Clone, Default)]
pub struct PhoneNumberStore {
    current: Option<PhoneNumber>,
}

impl PhoneNumberStore {
    pub fn new(current: Option<PhoneNumber>) -> Self {
        Self { current }
    }

    /// Read the record at boot.  Missing or untrusted records mean unset.
    pub fn load(storage: &impl StoragePort) -> Self {
        let mut record = [0u8; RECORD_LEN];
        let current = match storage.read(PHONE_NAMESPACE, PHONE_KEY, &mut record) {
            Ok(n) => PhoneNumber::from_record(&record[..n.min(RECORD_LEN)]),
            Err(StorageError::NotFound) => None,
            Err(e) => {
                warn!("phone: record read failed: {e}");
                None
            }
        };
        match &current {
            Some(n) => info!("phone: provisioned number {n}"),
            None => info!("phone: no number provisioned"),
        }
        Self { current }
    }

    pub fn get(&self) -> Option<&PhoneNumber> {
        self.current.as_ref()
    }

    pub fn is_provisioned(&self) -> bool {
        self.current.is_some()
    }

    /// Adopt `number` immediately, then persist it.  A storage failure is
    /// returned but the in-memory number stays adopted.
    pub fn adopt(
        &mut self,
        number: PhoneNumber,
        storage: &mut impl StoragePort,
    ) -> Result<(), StorageError> {
        let record = number.to_record();
        self.current = Some(number);
        storage.delete(PHONE_NAMESPACE, PHONE_KEY)?;
        storage.write(PHONE_NAMESPACE, PHONE_KEY, &record)
    }
}
