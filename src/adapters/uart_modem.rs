//! UART modem adapter.
//!
//! Wraps a [`ModemLink`] and moves bytes between it and the modem UART.
//! [`UartModem::poll`] runs once per main-loop iteration:
//!
//! 1. drain pending transmit bytes to the UART;
//! 2. read whatever has arrived, without blocking;
//! 3. feed each byte to the link, which reports completed scans to the
//!    [`ReplyDelegate`].
//!
//! Once a scan completes the link ignores input until the sequencer
//! starts the next turn.  Bytes after the terminator are held back in a
//! carry buffer, and the UART is not read at all, until the link is
//! re-armed.  A `listen` turn replays them, since an unsolicited line may
//! be among them.  A command turn discards them along with the UART
//! backlog: anything received before the command goes out belongs to an
//! earlier turn.
//!
//! The sequencer drives the adapter through [`ModemPort`], which is a
//! straight delegation to the link.

use crate::app::ports::{ModemPort, ReplyDelegate};
use crate::drivers::hw_init;
use crate::error::ModemError;
use crate::events::{push_event, Event};
use crate::modem::buffer::{RX_CAPACITY, ResponseText};
use crate::modem::link::{LinkMode, ModemLink, Reply};

const READ_CHUNK: usize = 64;

type Carry = heapless::Vec<u8, READ_CHUNK>;

/// Forwards completed replies into the main-loop event queue.
#[derive(Debug, Default)]
pub struct EventQueueDelegate;

impl ReplyDelegate for EventQueueDelegate {
    fn on_reply(&mut self, reply: Reply) {
        push_event(Event::ModemReply(reply));
    }
}

pub struct UartModem {
    link: ModemLink,
    carry: Carry,
}

impl UartModem {
    pub const fn new() -> Self {
        Self {
            link: ModemLink::new(),
            carry: Carry::new(),
        }
    }

    pub fn mode(&self) -> LinkMode {
        self.link.mode()
    }

    /// Move bytes in both directions.  Never blocks.
    pub fn poll(&mut self, delegate: &mut impl ReplyDelegate) {
        let pending = self.link.pending_tx();
        if !pending.is_empty() {
            let written = hw_init::uart_write(pending);
            self.link.consume_tx(written);
        }

        if !self.carry.is_empty() {
            if self.link.mode() == LinkMode::Disarmed {
                return;
            }
            let carry = core::mem::take(&mut self.carry);
            let used = self.feed(&carry, delegate);
            self.hold_back(&carry[used..]);
        }

        let mut chunk = [0u8; READ_CHUNK];
        while self.link.mode() != LinkMode::Disarmed {
            let n = hw_init::uart_read(&mut chunk);
            if n == 0 {
                break;
            }
            let used = self.feed(&chunk[..n], delegate);
            self.hold_back(&chunk[used..n]);
        }

        let dropped = self.link.rx_dropped();
        if dropped > 0 {
            log::debug!(
                "uart_modem: {dropped} bytes past the {RX_CAPACITY}-byte receive buffer dropped"
            );
        }
    }

    /// Feed bytes until the link disarms.  Returns how many were consumed.
    fn feed(&mut self, bytes: &[u8], delegate: &mut impl ReplyDelegate) -> usize {
        for (i, &byte) in bytes.iter().enumerate() {
            if self.link.mode() == LinkMode::Disarmed {
                return i;
            }
            self.link.on_byte_received(byte, delegate);
        }
        bytes.len()
    }

    fn hold_back(&mut self, rest: &[u8]) {
        // `rest` is at most one chunk and the carry was emptied first.
        let _ = self.carry.extend_from_slice(rest);
    }
}

impl Default for UartModem {
    fn default() -> Self {
        Self::new()
    }
}

impl ModemPort for UartModem {
    fn send(&mut self, command: &[u8]) -> Result<(), ModemError> {
        self.link.send(command)?;
        if !self.carry.is_empty() {
            log::debug!("uart_modem: {} stale bytes dropped", self.carry.len());
            self.carry.clear();
        }
        hw_init::uart_discard_rx();
        Ok(())
    }

    fn listen(&mut self) {
        self.link.listen();
    }

    fn suspend(&mut self) {
        self.link.suspend();
    }

    fn response(&self) -> ResponseText {
        self.link.response()
    }
}
