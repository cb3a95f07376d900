//! SMS content parser.
//!
//! Pulls the notification index out of `+CMTI` lines and the origin
//! number and body out of `+CMGR` replies, then classifies the body
//! against the configured vocabulary.
//!
//! ```text
//!   +CMTI: "SM",<index>\r\n
//!
//!   \r\n+CMGR: "<status>","<origin>","<?>","<timestamp>"\r\n
//!   <body>\r\n
//!   \r\n
//!   OK\r\n
//! ```
//!
//! Nothing here panics or allocates.  Every missing delimiter is a
//! [`ParseError`], and [`interpret`] folds all of them into
//! [`SmsIntent::Unrecognized`].

use core::fmt;

use log::debug;

use crate::phone::{PHONE_CAPACITY, PhoneNumber};

/// Most digits a storage index may have (99999).
pub const MAX_INDEX_DIGITS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The line is not a `+CMTI` notification.
    NotNotification,
    /// No `,` or no `\r` around the index.
    MissingIndex,
    /// Index empty, too long, or not all digits.
    InvalidIndex,
    /// No `,"` opening the origin field, or no closing quote.
    MissingOrigin,
    OriginTooLong,
    /// No line break before the body, or no `\r` after it.
    MissingBody,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotNotification => write!(f, "not a +CMTI notification"),
            Self::MissingIndex => write!(f, "notification index not delimited"),
            Self::InvalidIndex => write!(f, "notification index is not 1-5 digits"),
            Self::MissingOrigin => write!(f, "origin number not quoted"),
            Self::OriginTooLong => write!(f, "origin number longer than {PHONE_CAPACITY}"),
            Self::MissingBody => write!(f, "message body not delimited"),
        }
    }
}

/// Inbound keywords.  Matching is exact and case-sensitive.
#[derive(Debug, Clone, Copy)]
pub struct SmsVocabulary<'a> {
    pub secret: &'a str,
    pub status_phrase: &'a str,
}

/// Fields of a read message, borrowed from the receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundSms<'a> {
    pub origin: &'a [u8],
    pub body: &'a [u8],
}

/// What the sender asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmsIntent {
    /// Secret token seen; adopt the origin as the owner number.
    Provision(PhoneNumber),
    /// Status phrase seen.
    StatusQuery,
    Unrecognized,
}

fn find(haystack: &[u8], byte: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == byte)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Storage index from a `+CMTI` line.
pub fn parse_notification(line: &[u8]) -> Result<u32, ParseError> {
    if !contains(line, b"+CMTI") {
        return Err(ParseError::NotNotification);
    }
    let start = find(line, b',').ok_or(ParseError::MissingIndex)? + 1;
    let len = find(&line[start..], b'\r').ok_or(ParseError::MissingIndex)?;
    let digits = &line[start..start + len];
    if digits.is_empty()
        || digits.len() > MAX_INDEX_DIGITS
        || !digits.iter().all(u8::is_ascii_digit)
    {
        return Err(ParseError::InvalidIndex);
    }
    Ok(digits
        .iter()
        .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0')))
}

/// Origin and body of a `+CMGR` reply.
pub fn parse_message(response: &[u8]) -> Result<InboundSms<'_>, ParseError> {
    // The reply opens with the blank line the modem puts before every
    // information response.
    let lead = response
        .iter()
        .position(|&b| b != b'\r' && b != b'\n')
        .unwrap_or(response.len());
    let text = &response[lead..];

    let comma = find(text, b',').ok_or(ParseError::MissingOrigin)?;
    if text.get(comma + 1) != Some(&b'"') {
        return Err(ParseError::MissingOrigin);
    }
    let origin_start = comma + 2;
    let origin_len = find(&text[origin_start..], b'"').ok_or(ParseError::MissingOrigin)?;
    if origin_len > PHONE_CAPACITY {
        return Err(ParseError::OriginTooLong);
    }
    let origin = &text[origin_start..origin_start + origin_len];

    let body_start = find(text, b'\n').ok_or(ParseError::MissingBody)? + 1;
    let body_len = find(&text[body_start..], b'\r').ok_or(ParseError::MissingBody)?;
    let body = &text[body_start..body_start + body_len];

    Ok(InboundSms { origin, body })
}

/// Parse and classify a `+CMGR` reply.  Never fails.
pub fn interpret(response: &[u8], vocabulary: &SmsVocabulary<'_>) -> SmsIntent {
    let sms = match parse_message(response) {
        Ok(sms) => sms,
        Err(e) => {
            debug!("sms: unparseable reply: {e}");
            return SmsIntent::Unrecognized;
        }
    };

    if contains(sms.body, vocabulary.secret.as_bytes()) {
        let origin = core::str::from_utf8(sms.origin).unwrap_or("");
        return match PhoneNumber::parse(origin) {
            Ok(number) => SmsIntent::Provision(number),
            Err(e) => {
                debug!("sms: provisioning origin rejected: {e}");
                SmsIntent::Unrecognized
            }
        };
    }
    if contains(sms.body, vocabulary.status_phrase.as_bytes()) {
        return SmsIntent::StatusQuery;
    }
    SmsIntent::Unrecognized
}
