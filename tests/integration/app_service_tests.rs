//! Integration tests for the AppService → sensors/pump/modem pipeline.
//!
//! Boot, pump hysteresis, indicator lights and telemetry, all driven
//! through the port traits with mock adapters.

use crate::mock_hw::{ActuatorCall, OWNER, Rig};

use solmate::app::events::AppEvent;
use solmate::app::ports::StatusIndicator;
use solmate::config::SystemConfig;
use solmate::modem::link::LinkMode;
use solmate::modem::sequencer::DialogState;

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_runs_setup_sequence_then_listens() {
    let mut rig = Rig::new(SystemConfig::default(), None);
    rig.boot();

    assert_eq!(rig.commands_since(0), vec!["AT\r\n"]);
    assert_eq!(rig.app.dialog_state(), DialogState::SendingInit);
    assert!(rig.sink.saw(&AppEvent::Started(DialogState::SendingInit)));
    assert_eq!(rig.hw.calls.first(), Some(&ActuatorCall::SetPump(false)));
    assert_eq!(rig.hw.indicator(), Some(StatusIndicator::Busy));

    for _ in 0..3 {
        rig.modem_says(b"\r\nOK\r\n");
    }

    assert_eq!(
        rig.commands_since(0),
        vec!["AT\r\n", "ATE0\r\n", "AT+CMGF=1\r\n"]
    );
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.modem.link.mode(), LinkMode::Listening);
    assert!(rig.sink.saw(&AppEvent::DialogChanged {
        from: DialogState::SmsTextMode,
        to: DialogState::Idle,
    }));

    rig.tick();
    assert_eq!(rig.hw.indicator(), Some(StatusIndicator::Ready));
}

#[test]
fn unpowered_modem_goes_offline() {
    let mut rig = Rig::new(SystemConfig::default(), Some(OWNER));
    rig.hw.modem_powered = false;
    rig.boot();

    assert!(rig.modem.sent.is_empty());
    assert_eq!(rig.app.dialog_state(), DialogState::Offline);
    assert!(rig.sink.saw(&AppEvent::ModemOffline));
    assert_eq!(rig.hw.indicator(), Some(StatusIndicator::Offline));
    assert_eq!(rig.modem.link.mode(), LinkMode::Suspended);
}

#[test]
fn setup_error_goes_offline_and_stays_there() {
    let mut rig = Rig::new(SystemConfig::default(), Some(OWNER));
    rig.boot();
    rig.modem_says(b"\r\nOK\r\n");
    rig.modem_says(b"\r\nERROR\r\n");

    assert_eq!(rig.app.dialog_state(), DialogState::Offline);
    assert!(rig.sink.saw(&AppEvent::ModemOffline));

    // Flooding with a weak battery would normally alert.
    rig.hw.readings.float_switch_mask = 0b00011;
    rig.hw.readings.battery_level = 120;
    let sent = rig.modem.sent.len();
    for _ in 0..5 {
        rig.tick();
    }
    assert_eq!(rig.modem.sent.len(), sent);
    assert!(!rig.sink.saw(&AppEvent::AlertRequested));
    assert_eq!(rig.hw.indicator(), Some(StatusIndicator::Offline));

    // Incoming bytes are ignored while offline.
    rig.modem_says(b"\r\n+CMTI: \"SM\",1\r\n");
    assert_eq!(rig.modem.sent.len(), sent);
}

// ── Pump ──────────────────────────────────────────────────────

#[test]
fn pump_follows_battery_hysteresis() {
    let mut rig = Rig::ready(SystemConfig::default(), None);

    rig.hw.readings.float_switch_mask = 0b00001;
    rig.hw.readings.battery_level = 199;
    rig.tick();
    assert!(!rig.hw.pump_on(), "below start threshold");

    rig.hw.readings.battery_level = 200;
    rig.tick();
    assert!(rig.hw.pump_on());
    assert!(rig.sink.saw(&AppEvent::PumpChanged(true)));

    rig.hw.readings.battery_level = 140;
    rig.tick();
    assert!(rig.hw.pump_on(), "running pump holds down to the low threshold");

    rig.hw.readings.battery_level = 139;
    rig.tick();
    assert!(!rig.hw.pump_on());
    assert!(rig.sink.saw(&AppEvent::PumpChanged(false)));

    rig.hw.readings.battery_level = 180;
    rig.tick();
    assert!(!rig.hw.pump_on(), "stopped pump needs the high threshold");
}

#[test]
fn pump_stops_when_bilge_dries() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.hw.readings.float_switch_mask = 0b00111;
    rig.tick();
    assert!(rig.app.pump_active());

    rig.hw.readings.float_switch_mask = 0;
    rig.tick();
    assert!(!rig.app.pump_active());
    assert!(!rig.hw.pump_on());
}

#[test]
fn invalid_switch_pattern_still_runs_pump() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.hw.readings.float_switch_mask = 0b00100;
    rig.tick();
    assert!(rig.app.pump_active());
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_emitted_on_interval() {
    let config = SystemConfig {
        tick_interval_ms: 1000,
        telemetry_interval_secs: 5,
        ..Default::default()
    };
    let mut rig = Rig::ready(config, Some(OWNER));
    for _ in 0..10 {
        rig.tick();
    }

    let telemetry: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert_eq!(telemetry.len(), 2);
    assert_eq!(telemetry[0].uptime_secs, 5);
    assert_eq!(telemetry[1].uptime_secs, 10);
    assert!(telemetry[1].owner_provisioned);
    assert_eq!(telemetry[1].dialog, DialogState::Idle);
}
