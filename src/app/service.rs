//! Application service: the hexagonal core.
//!
//! [`AppService`] is the owned system-state aggregate.  It holds the
//! configuration, latest readings, pump controller, alert controller,
//! command sequencer and owner number, and is the only thing that mutates
//! them.  All I/O flows through port traits passed in at each call, so
//! the whole service runs against mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          AppService           │
//! ActuatorPort ◀──│ Pump · Alert · Sequencer ·    │ ──▶ ModemPort
//!                 │ PhoneNumberStore              │ ──▶ RetryTimerPort
//!                 └──────────────────────────────┘ ──▶ StoragePort
//! ```
//!
//! Entry points map one-to-one onto the main loop's events:
//! [`tick`](AppService::tick) for `SensorTick`,
//! [`on_modem_reply`](AppService::on_modem_reply) for `ModemReply`,
//! [`on_retry_expired`](AppService::on_retry_expired) for `RetryTimerExpired`.

use log::{debug, info, warn};

use crate::alert::{AlertController, AlertInputs, AlertPolicy, AlertState, RetryDecision};
use crate::config::SystemConfig;
use crate::control::pump::{BatteryHysteresis, PumpController};
use crate::modem::at::StatusReport;
use crate::modem::link::Reply;
use crate::modem::sequencer::{
    CommandSequencer, DialogContext, DialogEvent, DialogState, OutboundSms,
};
use crate::modem::sms::SmsVocabulary;
use crate::phone::{PhoneNumber, PhoneNumberStore};
use crate::sensors::SensorReadings;
use crate::sensors::float_switch::WaterLevel;

use super::events::{AppEvent, TelemetryData};
use super::ports::{
    ActuatorPort, EventSink, ModemPort, RetryTimerPort, SensorPort, StatusIndicator, StoragePort,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    config: SystemConfig,
    policy: AlertPolicy,
    readings: SensorReadings,
    pump: PumpController,
    alert: AlertController,
    sequencer: CommandSequencer,
    phone: PhoneNumberStore,
    tick_count: u64,
}

impl AppService {
    /// Construct the service.  Does **not** touch the modem; call
    /// [`start`](Self::start) next.
    pub fn new(config: SystemConfig, phone: PhoneNumberStore) -> Self {
        let policy = AlertPolicy::from_config(&config);
        Self {
            config,
            policy,
            readings: SensorReadings::default(),
            pump: PumpController::new(),
            alert: AlertController::new(),
            sequencer: CommandSequencer::new(),
            phone,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Begin modem setup, or go offline if the modem has no power.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        modem: &mut impl ModemPort,
        sink: &mut impl EventSink,
    ) {
        hw.set_pump(false);

        if hw.modem_powered() {
            if let Err(e) = self.sequencer.start(modem) {
                warn!("AppService: modem setup not started: {e}");
            }
        } else {
            warn!("AppService: modem reports no power, SMS disabled");
            self.sequencer.go_offline(modem);
        }

        hw.set_indicator(self.indicator());
        sink.emit(&AppEvent::Started(self.sequencer.state()));
        if self.sequencer.is_offline() {
            sink.emit(&AppEvent::ModemOffline);
        }
        info!("AppService started, dialog {}", self.sequencer.state());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One sensing cycle: read sensors → pump → alert → indicator.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`], which avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        modem: &mut impl ModemPort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Sensors
        self.readings = hw.read_all();

        // 2. Pump
        let was_on = self.pump.is_active();
        let on = self.pump.update(
            self.readings.water_present(),
            self.readings.battery_level,
            BatteryHysteresis {
                low: self.config.battery_low_threshold,
                high: self.config.battery_high_threshold,
            },
        );
        hw.set_pump(on);
        if on != was_on {
            info!(
                "Pump {} (battery={}, switches=0b{:05b})",
                if on { "on" } else { "off" },
                self.readings.battery_level,
                self.readings.float_switch_mask
            );
            sink.emit(&AppEvent::PumpChanged(on));
        }

        // 3. Alert
        self.maybe_alert(modem, sink);

        // 4. Indicator
        hw.set_indicator(self.indicator());

        // 5. Telemetry
        if self.tick_count % self.ticks_per_telemetry() == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    fn maybe_alert(&mut self, modem: &mut impl ModemPort, sink: &mut impl EventSink) {
        let inputs = AlertInputs {
            readings: &self.readings,
            sequencer_idle: self.sequencer.is_idle(),
            owner_provisioned: self.phone.is_provisioned(),
            now_ms: self.uptime_ms(),
        };
        if !self.alert.should_alert(&inputs, &self.policy) {
            return;
        }
        let Some(owner) = self.phone.get() else {
            return;
        };

        let prev = self.sequencer.state();
        match self.sequencer.begin_send(OutboundSms::Alert, owner, modem) {
            Ok(()) => {
                info!("Alert: water high and battery low, warning {owner}");
                sink.emit(&AppEvent::AlertRequested);
                self.note_transition(prev, sink);
            }
            Err(e) => warn!("Alert: not started: {e}"),
        }
    }

    // ── Modem events ──────────────────────────────────────────

    /// Advance the dialog with a completed reply from the link.
    pub fn on_modem_reply(
        &mut self,
        reply: Reply,
        modem: &mut impl ModemPort,
        storage: &mut impl StoragePort,
        timer: &mut impl RetryTimerPort,
        sink: &mut impl EventSink,
    ) {
        let prev = self.sequencer.state();
        let event = {
            let ctx = DialogContext {
                owner: self.phone.get(),
                status: self.status_report(),
                vocabulary: SmsVocabulary {
                    secret: &self.config.sms_secret,
                    status_phrase: &self.config.status_phrase,
                },
            };
            self.sequencer.on_reply(reply, &ctx, modem)
        };
        self.note_transition(prev, sink);

        let Some(event) = event else {
            return;
        };
        match event {
            DialogEvent::Ready => info!("Modem ready for SMS"),
            DialogEvent::SetupFailed => sink.emit(&AppEvent::ModemOffline),
            DialogEvent::Provisioned(number) => {
                if let Err(e) = self.phone.adopt(number.clone(), storage) {
                    warn!("phone: record not saved: {e}");
                }
                info!("Owner number changed to {number}");
                sink.emit(&AppEvent::PhoneProvisioned(number));
            }
            DialogEvent::StatusRequested => sink.emit(&AppEvent::StatusRequested),
            DialogEvent::Discarded => sink.emit(&AppEvent::MessageDiscarded),
            DialogEvent::Delivered(sms) => {
                let now = self.uptime_ms();
                self.alert
                    .on_delivered(matches!(sms, OutboundSms::Alert), now);
                sink.emit(&AppEvent::SmsDelivered(sms));
            }
            DialogEvent::SendFailed(sms) => self.on_send_failed(sms, modem, timer, sink),
        }
    }

    fn on_send_failed(
        &mut self,
        sms: OutboundSms,
        modem: &mut impl ModemPort,
        timer: &mut impl RetryTimerPort,
        sink: &mut impl EventSink,
    ) {
        match self.alert.on_send_failed(&self.policy) {
            RetryDecision::Retry { attempt } => {
                timer.arm(self.config.retry_backoff_ms);
                info!(
                    "{} retry {attempt}/{} in {} ms",
                    sms.label(),
                    self.policy.max_send_attempts,
                    self.config.retry_backoff_ms
                );
                sink.emit(&AppEvent::SendFailed { sms, attempt });
            }
            RetryDecision::Abandon { attempts } => {
                timer.disarm();
                let prev = self.sequencer.state();
                self.sequencer.abandon(modem);
                sink.emit(&AppEvent::RetryAbandoned { sms, attempts });
                self.note_transition(prev, sink);
            }
        }
    }

    /// Backoff elapsed: re-attempt the message waiting in `RetryBackoff`.
    pub fn on_retry_expired(&mut self, modem: &mut impl ModemPort, sink: &mut impl EventSink) {
        let prev = self.sequencer.state();
        if !matches!(prev, DialogState::RetryBackoff(_)) {
            debug!("Retry timer expired in {prev}, ignored");
            return;
        }
        if let Err(e) = self.sequencer.resume(self.phone.get(), modem) {
            warn!("Retry not started: {e}");
            self.alert.reset_retries();
        }
        self.note_transition(prev, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            dialog: self.sequencer.state(),
            readings: self.readings,
            water: WaterLevel::classify(
                self.readings.float_switch_mask,
                self.config.float_switch_count,
            ),
            pump_on: self.pump.is_active(),
            owner_provisioned: self.phone.is_provisioned(),
            retry_count: self.alert.state().retry_count,
            alert_sent: self.alert.state().alert_sent,
            uptime_secs: self.uptime_ms() / 1000,
        }
    }

    /// Status report as it would be sent right now.
    pub fn status_report(&self) -> StatusReport {
        StatusReport::from_readings(
            &self.readings,
            self.config.float_switch_count,
            self.pump.is_active(),
        )
    }

    pub fn dialog_state(&self) -> DialogState {
        self.sequencer.state()
    }

    pub fn readings(&self) -> &SensorReadings {
        &self.readings
    }

    pub fn pump_active(&self) -> bool {
        self.pump.is_active()
    }

    pub fn alert_state(&self) -> &AlertState {
        self.alert.state()
    }

    pub fn owner(&self) -> Option<&PhoneNumber> {
        self.phone.get()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Uptime as counted by ticks.
    pub fn uptime_ms(&self) -> u64 {
        self.tick_count * u64::from(self.config.tick_interval_ms)
    }

    // ── Internal ──────────────────────────────────────────────

    fn indicator(&self) -> StatusIndicator {
        match self.sequencer.state() {
            DialogState::Idle => StatusIndicator::Ready,
            DialogState::Offline => StatusIndicator::Offline,
            _ => StatusIndicator::Busy,
        }
    }

    fn ticks_per_telemetry(&self) -> u64 {
        let ms = u64::from(self.config.telemetry_interval_secs) * 1000;
        (ms / u64::from(self.config.tick_interval_ms.max(1))).max(1)
    }

    fn note_transition(&self, prev: DialogState, sink: &mut impl EventSink) {
        let now = self.sequencer.state();
        if now != prev {
            sink.emit(&AppEvent::DialogChanged { from: prev, to: now });
        }
    }
}
