//! Byte transport glue between the UART and the dialog state machine.
//!
//! The link has two halves:
//!
//! - **receive side** ([`ModemLink::on_byte_received`]), called once per
//!   byte from the UART path.  It appends to the receive buffer, feeds the
//!   matcher and, on a completed scan, disarms itself and hands the
//!   [`Reply`] to a [`ReplyDelegate`].  It never runs state-machine logic.
//! - **command side** ([`ModemPort`]), used from the main loop by the
//!   sequencer to start the next dialog turn.
//!
//! ```text
//!   UART rx ──▶ on_byte_received ──▶ RxBuffer
//!                      │
//!                      └──▶ ResponseMatcher ──▶ ReplyDelegate::on_reply
//!
//!   sequencer ──▶ ModemPort::send ──▶ TxBuffer ──▶ next_tx_byte ──▶ UART tx
//! ```
//!
//! Because the link disarms after every completion and only a `send` or
//! `listen` re-arms it, at most one reply is ever outstanding.

use crate::app::ports::{ModemPort, ReplyDelegate};
use crate::error::ModemError;

use super::buffer::{ResponseText, RxBuffer, TxBuffer};
use super::matcher::{ResponseMatcher, ScanMode, Terminator};

/// Result of one command turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogResult {
    Ok,
    Error,
    /// `> ` prompt: the modem wants the SMS body.
    InputPrompt,
}

/// One completed scan, as seen by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A command got its terminator.
    Dialog(DialogResult),
    /// A full unsolicited line arrived while listening.
    UnsolicitedLine,
}

impl From<Terminator> for Reply {
    fn from(t: Terminator) -> Self {
        match t {
            Terminator::Ok => Self::Dialog(DialogResult::Ok),
            Terminator::Error => Self::Dialog(DialogResult::Error),
            Terminator::InputPrompt => Self::Dialog(DialogResult::InputPrompt),
            Terminator::LineEnd => Self::UnsolicitedLine,
        }
    }
}

/// What the receive side does with incoming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// A reply was delivered; bytes are ignored until re-armed.
    Disarmed,
    /// Waiting for the terminator of the last command.
    AwaitingReply,
    /// Idle; waiting for an unsolicited line.
    Listening,
    /// Retry backoff in progress; receive is off.
    Suspended,
}

pub struct ModemLink {
    rx: RxBuffer,
    tx: TxBuffer,
    matcher: ResponseMatcher,
    mode: LinkMode,
}

impl ModemLink {
    pub const fn new() -> Self {
        Self {
            rx: RxBuffer::new(),
            tx: TxBuffer::new(),
            matcher: ResponseMatcher::new(),
            mode: LinkMode::Disarmed,
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.mode
    }

    /// Receive-side entry point.  Call once per byte, in arrival order.
    pub fn on_byte_received(&mut self, byte: u8, delegate: &mut impl ReplyDelegate) {
        let scan = match self.mode {
            LinkMode::AwaitingReply => ScanMode::Command,
            LinkMode::Listening => ScanMode::Unsolicited,
            LinkMode::Disarmed | LinkMode::Suspended => return,
        };

        // Overflow drops the byte but the matcher still sees it, so a
        // terminator at the end of an over-long reply is not lost.
        self.rx.push(byte);

        if let Some(terminator) = self.matcher.feed(byte, scan) {
            self.mode = LinkMode::Disarmed;
            delegate.on_reply(Reply::from(terminator));
        }
    }

    /// Feed a chunk of received bytes.  Bytes after a completion are
    /// discarded, same as the per-byte path.
    pub fn on_bytes_received(&mut self, bytes: &[u8], delegate: &mut impl ReplyDelegate) {
        for &b in bytes {
            self.on_byte_received(b, delegate);
        }
    }

    /// Transmit-ready entry point: the next byte for the UART, if any.
    pub fn next_tx_byte(&mut self) -> Option<u8> {
        self.tx.next_byte()
    }

    /// Unsent bytes, for bulk UART writes.
    pub fn pending_tx(&self) -> &[u8] {
        self.tx.pending()
    }

    /// Mark `n` bytes of [`pending_tx`](Self::pending_tx) as written.
    pub fn consume_tx(&mut self, n: usize) {
        self.tx.advance(n);
    }

    /// Bytes the receive buffer had to drop since the last turn began.
    pub fn rx_dropped(&self) -> usize {
        self.rx.dropped()
    }

    fn begin_turn(&mut self, mode: LinkMode) {
        self.rx.clear();
        self.matcher.reset();
        self.mode = mode;
    }
}

impl Default for ModemLink {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemPort for ModemLink {
    fn send(&mut self, command: &[u8]) -> Result<(), ModemError> {
        if self.mode == LinkMode::AwaitingReply {
            return Err(ModemError::Busy);
        }
        let truncated = self.tx.load(command);
        if truncated > 0 {
            log::warn!("modem tx truncated by {truncated} bytes");
        }
        self.begin_turn(LinkMode::AwaitingReply);
        Ok(())
    }

    fn listen(&mut self) {
        self.tx.clear();
        self.begin_turn(LinkMode::Listening);
    }

    fn suspend(&mut self) {
        self.tx.clear();
        self.begin_turn(LinkMode::Suspended);
    }

    fn response(&self) -> ResponseText {
        self.rx.snapshot()
    }
}
