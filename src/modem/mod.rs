//! Cellular modem: byte link, terminator matching, AT command building,
//! SMS parsing and the dialog sequencer.
//!
//! ```text
//!  UART bytes ─▶ ModemLink ─(matcher)─▶ Reply ─▶ CommandSequencer ─▶ ModemPort::send
//! ```
//!
//! Everything here is hardware-independent; the UART itself lives in
//! `adapters::uart_modem`.

pub mod at;
pub mod buffer;
pub mod link;
pub mod matcher;
pub mod sequencer;
pub mod sms;
