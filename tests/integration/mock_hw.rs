//! Mock adapters for integration tests.
//!
//! Records every actuator call, modem command and emitted event so tests
//! can assert on the full history without touching real GPIO or a UART.
//! The modem side runs the real [`ModemLink`]; only the wire is faked.

use solmate::app::events::AppEvent;
use solmate::app::ports::{
    ActuatorPort, ConfigError, ConfigPort, EventSink, ModemPort, ReplyDelegate, RetryTimerPort,
    SensorPort, StatusIndicator, StorageError, StoragePort,
};
use solmate::app::service::AppService;
use solmate::config::SystemConfig;
use solmate::error::ModemError;
use solmate::modem::buffer::ResponseText;
use solmate::modem::link::{ModemLink, Reply};
use solmate::phone::{PHONE_KEY, PHONE_NAMESPACE, PhoneNumber, PhoneNumberStore};
use solmate::sensors::SensorReadings;
use std::cell::RefCell;
use std::collections::HashMap;

pub const OWNER: &str = "+15551234567";
pub const STRANGER: &str = "+15559876543";

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    SetPump(bool),
    SetIndicator(StatusIndicator),
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub readings: SensorReadings,
    pub modem_powered: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            readings: SensorReadings {
                float_switch_mask: 0,
                battery_level: 255,
                panel_voltage_level: 0,
            },
            modem_powered: true,
        }
    }

    pub fn pump_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::SetPump(on) => Some(*on),
                ActuatorCall::AllOff => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn indicator(&self) -> Option<StatusIndicator> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::SetIndicator(i) => Some(*i),
            _ => None,
        })
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorPort for MockHardware {
    fn read_all(&mut self) -> SensorReadings {
        self.readings
    }

    fn modem_powered(&mut self) -> bool {
        self.modem_powered
    }
}

impl ActuatorPort for MockHardware {
    fn set_pump(&mut self, on: bool) {
        self.calls.push(ActuatorCall::SetPump(on));
    }

    fn set_indicator(&mut self, indicator: StatusIndicator) {
        self.calls.push(ActuatorCall::SetIndicator(indicator));
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    config: RefCell<Option<SystemConfig>>,
    pub fail_writes: bool,
    pub ops: Vec<String>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            config: RefCell::new(None),
            fail_writes: false,
            ops: Vec::new(),
        }
    }

    pub fn raw(&self, namespace: &str, key: &str) -> Option<&[u8]> {
        self.store
            .get(&format!("{}::{}", namespace, key))
            .map(Vec::as_slice)
    }

    pub fn stored_phone(&self) -> Option<PhoneNumber> {
        self.raw(PHONE_NAMESPACE, PHONE_KEY)
            .and_then(PhoneNumber::from_record)
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.ops.push(format!("write {}::{}", namespace, key));
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.ops.push(format!("delete {}::{}", namespace, key));
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        self.config.borrow().clone().ok_or(ConfigError::NotFound)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        *self.config.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn saw(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── MockRetryTimer ────────────────────────────────────────────

#[derive(Default)]
pub struct MockRetryTimer {
    pub armed_ms: Option<u32>,
    pub arms: usize,
}

impl RetryTimerPort for MockRetryTimer {
    fn arm(&mut self, duration_ms: u32) {
        self.armed_ms = Some(duration_ms);
        self.arms += 1;
    }

    fn disarm(&mut self) {
        self.armed_ms = None;
    }
}

// ── ModemHarness ──────────────────────────────────────────────

/// The real link with the UART replaced by a command log.
#[derive(Default)]
pub struct ModemHarness {
    pub link: ModemLink,
    pub sent: Vec<Vec<u8>>,
}

impl ModemPort for ModemHarness {
    fn send(&mut self, command: &[u8]) -> Result<(), ModemError> {
        self.link.send(command)?;
        self.sent.push(command.to_vec());
        let n = self.link.pending_tx().len();
        self.link.consume_tx(n);
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

#[derive(Default)]
struct Pending(Vec<Reply>);

impl ReplyDelegate for Pending {
    fn on_reply(&mut self, reply: Reply) {
        self.0.push(reply);
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// Everything the main loop wires together, with mocks at every port.
pub struct Rig {
    pub app: AppService,
    pub hw: MockHardware,
    pub modem: ModemHarness,
    pub nvs: MockNvs,
    pub timer: MockRetryTimer,
    pub sink: LogSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig, owner: Option<&str>) -> Self {
        let mut nvs = MockNvs::new();
        if let Some(owner) = owner {
            let number = PhoneNumber::parse(owner).unwrap();
            nvs.write(PHONE_NAMESPACE, PHONE_KEY, &number.to_record())
                .unwrap();
            nvs.ops.clear();
        }
        let phone = PhoneNumberStore::load(&nvs);
        Self {
            app: AppService::new(config, phone),
            hw: MockHardware::new(),
            modem: ModemHarness::default(),
            nvs,
            timer: MockRetryTimer::default(),
            sink: LogSink::new(),
        }
    }

    /// Boot and answer the three setup commands.
    pub fn ready(config: SystemConfig, owner: Option<&str>) -> Self {
        let mut rig = Self::new(config, owner);
        rig.boot();
        for _ in 0..3 {
            rig.modem_says(b"\r\nOK\r\n");
        }
        rig
    }

    pub fn boot(&mut self) {
        self.app.start(&mut self.hw, &mut self.modem, &mut self.sink);
    }

    pub fn tick(&mut self) {
        self.app.tick(&mut self.hw, &mut self.modem, &mut self.sink);
    }

    /// Bytes from the modem, dispatched the way the main loop does.
    pub fn modem_says(&mut self, bytes: &[u8]) {
        let mut pending = Pending::default();
        for &b in bytes {
            self.modem.link.on_byte_received(b, &mut pending);
            for reply in pending.0.drain(..) {
                self.app.on_modem_reply(
                    reply,
                    &mut self.modem,
                    &mut self.nvs,
                    &mut self.timer,
                    &mut self.sink,
                );
            }
        }
    }

    /// The backoff countdown fires.
    pub fn expire_retry(&mut self) {
        assert!(self.timer.armed_ms.take().is_some(), "retry timer not armed");
        self.app.on_retry_expired(&mut self.modem, &mut self.sink);
    }

    /// New SMS notification followed by the `+CMGR` response.
    pub fn sms_arrives(&mut self, origin: &str, body: &str) {
        self.modem_says(b"\r\n+CMTI: \"SM\",3\r\n");
        assert_eq!(self.last_command(), b"AT+CMGR=3\r\n");
        let response = format!(
            "\r\n+CMGR: \"REC UNREAD\",\"{origin}\",\"\",\"24/06/01,09:30:00-20\"\r\n{body}\r\n\r\nOK\r\n"
        );
        self.modem_says(response.as_bytes());
    }

    pub fn last_command(&self) -> &[u8] {
        self.modem.sent.last().map_or(&[][..], Vec::as_slice)
    }

    pub fn commands_since(&self, start: usize) -> Vec<String> {
        self.modem.sent[start..]
            .iter()
            .map(|c| String::from_utf8_lossy(c).into_owned())
            .collect()
    }
}
