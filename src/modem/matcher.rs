//! Incremental multi-terminator matcher for the modem receive stream.
//!
//! Each received byte advances an independent progress counter per
//! terminator.  The first terminator to reach its full length wins and the
//! scan stops for that byte.  There is no lookback buffer.
//!
//! ```text
//!   byte ──▶ ┌──────────────┐
//!            │ "OK\r\n"     │ progress 0..4
//!            │ "ERROR\r\n"  │ progress 0..7   ──▶ Option<Terminator>
//!            │ "\r\n> "     │ progress 0..4
//!            │ "\r\n" (line)│ listening only
//!            └──────────────┘
//! ```
//!
//! On a mismatch the counter restarts at 1 if the byte is the target's
//! first character, otherwise at 0.  That is a restricted form of KMP with
//! no failure table.  It is exact only for targets that contain no proper
//! prefix repeated inside them after the first character (none of the
//! three do).  Any terminator added to [`TARGETS`] must keep that
//! property; `targets_have_no_interior_prefix_overlap` checks it.

/// Terminators the matcher can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// `OK\r\n`
    Ok,
    /// `ERROR\r\n`
    Error,
    /// `\r\n> `, the modem is ready for an SMS body.
    InputPrompt,
    /// A bare `\r\n` while listening for unsolicited lines.
    LineEnd,
}

/// Tracked terminators, in scan priority order.
pub const TARGETS: [(&[u8], Terminator); 3] = [
    (b"OK\r\n", Terminator::Ok),
    (b"ERROR\r\n", Terminator::Error),
    (b"\r\n> ", Terminator::InputPrompt),
];

/// Whether line boundaries complete a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Waiting for the reply to a command.
    Command,
    /// Idle; any `\r\n` ends an unsolicited line.
    Unsolicited,
}

#[derive(Debug, Clone)]
pub struct ResponseMatcher {
    progress: [usize; TARGETS.len()],
    last_was_cr: bool,
}

impl ResponseMatcher {
    pub const fn new() -> Self {
        Self {
            progress: [0; TARGETS.len()],
            last_was_cr: false,
        }
    }

    /// Forget all partial matches.
    pub fn reset(&mut self) {
        self.progress = [0; TARGETS.len()];
        self.last_was_cr = false;
    }

    /// Feed one byte.  Returns the terminator completed by this byte, if any.
    ///
    /// Once a terminator is reported the remaining targets do not see the
    /// byte; callers reset the matcher before the next dialog turn.
    pub fn feed(&mut self, byte: u8, mode: ScanMode) -> Option<Terminator> {
        let line_end = self.last_was_cr && byte == b'\n';
        self.last_was_cr = byte == b'\r';

        if mode == ScanMode::Unsolicited && line_end {
            return Some(Terminator::LineEnd);
        }

        for (progress, (target, terminator)) in self.progress.iter_mut().zip(TARGETS.iter()) {
            if byte == target[*progress] {
                *progress += 1;
                if *progress == target.len() {
                    *progress = 0;
                    return Some(*terminator);
                }
            } else if byte == target[0] {
                *progress = 1;
            } else {
                *progress = 0;
            }
        }
        None
    }
}

impl Default for ResponseMatcher {
    fn default() -> Self {
        Self::new()
    }
}
