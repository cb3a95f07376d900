//! Fixed-capacity receive / transmit buffers for the modem link.
//!
//! Both are backed by `heapless::Vec`, so the write cursor can never pass
//! the capacity.  Bytes that do not fit are dropped and counted; they never
//! overwrite anything.

use heapless::Vec;

/// Receive capacity: the longest `+CMGR` reply we act on (header, a
/// 160-character body is truncated, trailing `OK`).
pub const RX_CAPACITY: usize = 190;

/// Transmit capacity: the status report body plus Ctrl-Z.
pub const TX_CAPACITY: usize = 190;

/// Snapshot of a received response, handed to the sequencer by value.
pub type ResponseText = Vec<u8, RX_CAPACITY>;

// ── Receive ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RxBuffer {
    bytes: Vec<u8, RX_CAPACITY>,
    dropped: usize,
}

impl RxBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            dropped: 0,
        }
    }

    /// Append one byte.  Returns `false` if it was dropped for lack of room.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.bytes.push(byte).is_ok() {
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.dropped = 0;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes discarded since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn snapshot(&self) -> ResponseText {
        self.bytes.clone()
    }
}

// ── Transmit ─────────────────────────────────────────────────

/// Outgoing bytes plus a read cursor for the transmit-ready handler.
#[derive(Debug, Default)]
pub struct TxBuffer {
    bytes: Vec<u8, TX_CAPACITY>,
    cursor: usize,
}

impl TxBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: Vec::new(),
            cursor: 0,
        }
    }

    /// Replace the contents with `data`, truncating at capacity.
    /// Returns the number of bytes that did not fit.
    pub fn load(&mut self, data: &[u8]) -> usize {
        self.bytes.clear();
        self.cursor = 0;
        let take = data.len().min(TX_CAPACITY);
        // Cannot fail: `take` is bounded by the capacity.
        let _ = self.bytes.extend_from_slice(&data[..take]);
        data.len() - take
    }

    /// Next byte to put on the wire, advancing the cursor.
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Bytes not yet handed to the UART.
    pub fn pending(&self) -> &[u8] {
        &self.bytes[self.cursor..]
    }

    /// Mark `n` pending bytes as sent (bulk UART writes).
    pub fn advance(&mut self, n: usize) {
        self.cursor = (self.cursor + n).min(self.bytes.len());
    }

    pub fn is_drained(&self) -> bool {
        self.cursor >= self.bytes.len()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
        self.cursor = 0;
    }
}
