//! Command sequencer: the modem dialog state machine.
//!
//! Owns the single [`DialogState`].  Each state has an entry action (what
//! is transmitted, if anything) and a transition on the next [`Reply`].
//!
//! ```text
//!   SendingInit ─OK─▶ EchoOff ─OK─▶ SmsTextMode ─OK─▶ Idle
//!        └──────────────┴──────────────┴── not OK ──▶ Offline
//!
//!   Idle ─line─▶ AwaitingUnsolicited ─+CMTI─▶ ReadingMessage
//!                       └── other ──▶ Idle        │ OK
//!                                                 ▼
//!            secret ─▶ Preparing(Ack)     status ─▶ Preparing(Status)
//!            other  ─▶ DeletingStored ─any─▶ Idle
//!
//!   Idle ──begin_send──▶ Preparing(Alert)
//!
//!   Preparing(k) ─"> "─▶ Sending(k) ─OK─▶ DeletingStored ─any─▶ Idle
//!        │                   │
//!        └──── otherwise ────┴──▶ RetryBackoff(k) ─resume─▶ Preparing(k)
//!                                        └──abandon──▶ Idle
//! ```
//!
//! Only [`begin_send`](CommandSequencer::begin_send) may start a dialog
//! from outside, and only from `Idle`.  There is no queue.

use core::fmt;

use log::{debug, info, warn};

use crate::app::ports::ModemPort;
use crate::error::{DialogError, ModemError};
use crate::phone::PhoneNumber;

use super::at::{self, StatusReport};
use super::link::{DialogResult, Reply};
use super::sms::{self, SmsIntent, SmsVocabulary};

/// Which outbound message a send dialog carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundSms {
    Alert,
    Acknowledgment,
    /// Status report, frozen when the query was accepted.
    Status(StatusReport),
}

impl OutboundSms {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Alert => "Alert",
            Self::Acknowledgment => "Acknowledgment",
            Self::Status(_) => "Status",
        }
    }

    pub fn payload(&self) -> at::SmsPayload {
        match self {
            Self::Alert => at::sms_payload(at::WARNING_TEXT),
            Self::Acknowledgment => at::sms_payload(at::ACKNOWLEDGMENT_TEXT),
            Self::Status(report) => at::sms_payload(&report.compose()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    SendingInit,
    EchoOff,
    SmsTextMode,
    Idle,
    /// Setup failed; no SMS until the next power-on.
    Offline,
    AwaitingUnsolicited,
    ReadingMessage,
    Preparing(OutboundSms),
    Sending(OutboundSms),
    /// Send failed; the link is suspended until resumed or abandoned.
    RetryBackoff(OutboundSms),
    DeletingStored,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preparing(sms) => write!(f, "Preparing({})", sms.label()),
            Self::Sending(sms) => write!(f, "Sending({})", sms.label()),
            Self::RetryBackoff(sms) => write!(f, "RetryBackoff({})", sms.label()),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Notable outcomes of a dialog step, for the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogEvent {
    /// Setup finished; SMS available.
    Ready,
    SetupFailed,
    /// Secret received.  The caller adopts and persists the number; the
    /// acknowledgment dialog is already under way.
    Provisioned(PhoneNumber),
    StatusRequested,
    /// Unrecognized message dropped.
    Discarded,
    Delivered(OutboundSms),
    /// Now in `RetryBackoff`; the caller resumes or abandons.
    SendFailed(OutboundSms),
}

/// What the sequencer needs from the rest of the system for one step.
pub struct DialogContext<'a> {
    /// Stored owner number, the recipient for status reports.
    pub owner: Option<&'a PhoneNumber>,
    /// Snapshot to freeze if a status query arrives.
    pub status: StatusReport,
    pub vocabulary: SmsVocabulary<'a>,
}

pub struct CommandSequencer {
    state: DialogState,
}

impl CommandSequencer {
    pub const fn new() -> Self {
        Self {
            state: DialogState::SendingInit,
        }
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DialogState::Idle
    }

    pub fn is_offline(&self) -> bool {
        self.state == DialogState::Offline
    }

    fn transition(&mut self, to: DialogState) {
        if self.state != to {
            info!("Modem dialog: {} -> {}", self.state, to);
            self.state = to;
        }
    }

    fn transmit(
        &mut self,
        command: &[u8],
        next: DialogState,
        modem: &mut impl ModemPort,
    ) -> Result<(), ModemError> {
        modem.send(command)?;
        self.transition(next);
        Ok(())
    }

    fn enter_idle(&mut self, modem: &mut impl ModemPort) {
        self.transition(DialogState::Idle);
        modem.listen();
    }

    // ── Lifecycle ────────────────────────────────────────────

    /// Send `AT` to begin setup.
    pub fn start(&mut self, modem: &mut impl ModemPort) -> Result<(), DialogError> {
        self.state = DialogState::SendingInit;
        if let Err(e) = modem.send(at::ATTENTION) {
            warn!("Modem dialog: AT not sent: {e}");
            self.go_offline(modem);
            return Err(e.into());
        }
        info!("Modem dialog: setup started");
        Ok(())
    }

    /// No SMS capability for the rest of this boot.
    pub fn go_offline(&mut self, modem: &mut impl ModemPort) {
        self.transition(DialogState::Offline);
        modem.suspend();
    }

    // ── Replies ──────────────────────────────────────────────

    pub fn on_reply(
        &mut self,
        reply: Reply,
        ctx: &DialogContext<'_>,
        modem: &mut impl ModemPort,
    ) -> Option<DialogEvent> {
        use DialogState as S;

        match (self.state, reply) {
            (S::SendingInit, Reply::Dialog(DialogResult::Ok)) => {
                self.setup_step(at::ECHO_OFF, S::EchoOff, modem)
            }
            (S::EchoOff, Reply::Dialog(DialogResult::Ok)) => {
                self.setup_step(&at::text_mode(), S::SmsTextMode, modem)
            }
            (S::SmsTextMode, Reply::Dialog(DialogResult::Ok)) => {
                self.enter_idle(modem);
                Some(DialogEvent::Ready)
            }
            (S::SendingInit | S::EchoOff | S::SmsTextMode, other) => {
                warn!("Modem dialog: setup got {other:?} in {}", self.state);
                self.go_offline(modem);
                Some(DialogEvent::SetupFailed)
            }

            (S::Idle, Reply::UnsolicitedLine) => {
                self.on_unsolicited_line(modem);
                None
            }

            (S::ReadingMessage, Reply::Dialog(DialogResult::Ok)) => self.on_message(ctx, modem),
            (S::ReadingMessage, Reply::Dialog(other)) => {
                debug!("Modem dialog: read failed with {other:?}");
                self.enter_idle(modem);
                None
            }

            (S::Preparing(sms), Reply::Dialog(DialogResult::InputPrompt)) => {
                if self.transmit(&sms.payload(), S::Sending(sms), modem).is_ok() {
                    None
                } else {
                    Some(self.send_failed(sms, modem))
                }
            }
            (S::Sending(sms), Reply::Dialog(DialogResult::Ok)) => {
                info!("Modem dialog: {} delivered", sms.label());
                self.clear_store(modem);
                Some(DialogEvent::Delivered(sms))
            }
            (S::Preparing(sms) | S::Sending(sms), Reply::Dialog(_)) => {
                Some(self.send_failed(sms, modem))
            }

            (S::DeletingStored, Reply::Dialog(_)) => {
                self.enter_idle(modem);
                None
            }

            // Stale or impossible: the link only delivers a line while
            // listening and delivers nothing while suspended.
            (S::Idle, Reply::Dialog(_))
            | (S::Offline | S::AwaitingUnsolicited | S::RetryBackoff(_), _)
            | (
                S::ReadingMessage | S::Preparing(_) | S::Sending(_) | S::DeletingStored,
                Reply::UnsolicitedLine,
            ) => {
                debug!("Modem dialog: {reply:?} ignored in {}", self.state);
                None
            }
        }
    }

    fn setup_step(
        &mut self,
        command: &[u8],
        next: DialogState,
        modem: &mut impl ModemPort,
    ) -> Option<DialogEvent> {
        if let Err(e) = self.transmit(command, next, modem) {
            warn!("Modem dialog: setup command not sent: {e}");
            self.go_offline(modem);
            return Some(DialogEvent::SetupFailed);
        }
        None
    }

    fn on_unsolicited_line(&mut self, modem: &mut impl ModemPort) {
        self.transition(DialogState::AwaitingUnsolicited);
        let line = modem.response();
        match sms::parse_notification(&line) {
            Ok(index) => {
                let read = at::read_sms(index);
                if let Err(e) = self.transmit(&read, DialogState::ReadingMessage, modem) {
                    warn!("Modem dialog: read of #{index} not sent: {e}");
                    self.enter_idle(modem);
                }
            }
            Err(e) => {
                debug!("Modem dialog: unsolicited line dropped: {e}");
                self.enter_idle(modem);
            }
        }
    }

    fn on_message(
        &mut self,
        ctx: &DialogContext<'_>,
        modem: &mut impl ModemPort,
    ) -> Option<DialogEvent> {
        let response = modem.response();
        match sms::interpret(&response, &ctx.vocabulary) {
            SmsIntent::Provision(number) => {
                let prepare = DialogState::Preparing(OutboundSms::Acknowledgment);
                if let Err(e) = self.transmit(&at::send_sms(&number), prepare, modem) {
                    warn!("Modem dialog: acknowledgment not started: {e}");
                    self.enter_idle(modem);
                }
                Some(DialogEvent::Provisioned(number))
            }
            SmsIntent::StatusQuery => {
                let Some(owner) = ctx.owner else {
                    debug!("Modem dialog: status query with no owner number");
                    self.clear_store(modem);
                    return Some(DialogEvent::Discarded);
                };
                let prepare = DialogState::Preparing(OutboundSms::Status(ctx.status));
                if let Err(e) = self.transmit(&at::send_sms(owner), prepare, modem) {
                    warn!("Modem dialog: status report not started: {e}");
                    self.enter_idle(modem);
                    return None;
                }
                Some(DialogEvent::StatusRequested)
            }
            SmsIntent::Unrecognized => {
                self.clear_store(modem);
                Some(DialogEvent::Discarded)
            }
        }
    }

    fn clear_store(&mut self, modem: &mut impl ModemPort) {
        if let Err(e) = self.transmit(&at::delete_all_sms(), DialogState::DeletingStored, modem) {
            warn!("Modem dialog: delete not sent: {e}");
            self.enter_idle(modem);
        }
    }

    fn send_failed(&mut self, sms: OutboundSms, modem: &mut impl ModemPort) -> DialogEvent {
        warn!("Modem dialog: {} send failed", sms.label());
        self.transition(DialogState::RetryBackoff(sms));
        modem.suspend();
        DialogEvent::SendFailed(sms)
    }

    // ── Requests ─────────────────────────────────────────────

    /// Start an outbound SMS.  Rejected unless `Idle`; never queued.
    pub fn begin_send(
        &mut self,
        sms: OutboundSms,
        to: &PhoneNumber,
        modem: &mut impl ModemPort,
    ) -> Result<(), DialogError> {
        match self.state {
            DialogState::Idle => {}
            DialogState::Offline => return Err(DialogError::Offline),
            busy => return Err(DialogError::Busy(busy)),
        }
        self.transmit(&at::send_sms(to), DialogState::Preparing(sms), modem)?;
        Ok(())
    }

    /// Backoff expired: re-enter `Preparing` for the same message.
    pub fn resume(
        &mut self,
        to: Option<&PhoneNumber>,
        modem: &mut impl ModemPort,
    ) -> Result<(), DialogError> {
        let DialogState::RetryBackoff(sms) = self.state else {
            return Err(DialogError::Busy(self.state));
        };
        let Some(to) = to else {
            self.enter_idle(modem);
            return Err(DialogError::NoRecipient);
        };
        if let Err(e) = self.transmit(&at::send_sms(to), DialogState::Preparing(sms), modem) {
            self.enter_idle(modem);
            return Err(e.into());
        }
        Ok(())
    }

    /// Give up on the message in backoff and go back to listening.
    pub fn abandon(&mut self, modem: &mut impl ModemPort) {
        if let DialogState::RetryBackoff(sms) = self.state {
            warn!("Modem dialog: {} abandoned", sms.label());
            self.enter_idle(modem);
        }
    }
}

impl Default for CommandSequencer {
    fn default() -> Self {
        Self::new()
    }
}
