//! Inbound SMS handling: status queries, junk and malformed input.

use solmate::app::events::AppEvent;
use solmate::config::SystemConfig;
use solmate::modem::at::CTRL_Z;
use solmate::modem::sequencer::{DialogState, OutboundSms};

use crate::mock_hw::{OWNER, Rig, STRANGER};

#[test]
fn status_query_reports_to_stored_owner() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.hw.readings.float_switch_mask = 0b00011;
    rig.hw.readings.panel_voltage_level = 150;
    rig.tick();
    assert!(rig.app.pump_active());

    // Anyone may ask; the answer goes to the owner.
    rig.sms_arrives(STRANGER, "What's up");
    assert!(rig.sink.saw(&AppEvent::StatusRequested));
    assert_eq!(rig.last_command(), format!("AT+CMGS=\"{OWNER}\"\r\n").as_bytes());
    assert!(matches!(
        rig.app.dialog_state(),
        DialogState::Preparing(OutboundSms::Status(_))
    ));

    rig.modem_says(b"\r\n> ");
    let payload = String::from_utf8_lossy(rig.last_command()).into_owned();
    assert!(payload.starts_with("Msg from Sol-Mate: Here's your status report.\r\n"));
    assert!(payload.contains("Battery level: Full"));
    assert!(payload.contains("Charge rate: Medium"));
    assert!(payload.contains("Water level: Medium"));
    assert!(payload.ends_with(&format!("Pump: On{}", CTRL_Z as char)));

    rig.modem_says(b"\r\nOK\r\n");
    rig.modem_says(b"\r\nOK\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SmsDelivered(_))), 1);
}

#[test]
fn status_report_is_frozen_at_query_time() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.tick();
    rig.sms_arrives(OWNER, "What's up");

    // Water rises while the modem is still preparing.
    rig.hw.readings.float_switch_mask = 0b11111;
    rig.tick();

    rig.modem_says(b"\r\n> ");
    let payload = String::from_utf8_lossy(rig.last_command()).into_owned();
    assert!(payload.contains("Water level: None"));
    assert!(payload.contains("Pump: Off"));
}

#[test]
fn status_query_without_owner_is_discarded() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives(STRANGER, "What's up");

    assert!(rig.sink.saw(&AppEvent::MessageDiscarded));
    assert!(!rig.sink.saw(&AppEvent::StatusRequested));
    assert_eq!(rig.last_command(), b"AT+CMGD=1,4\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::DeletingStored);

    rig.modem_says(b"\r\nOK\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
}

#[test]
fn unrecognized_message_is_deleted() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.sms_arrives(STRANGER, "Free cruise! Reply YES");

    assert!(rig.sink.saw(&AppEvent::MessageDiscarded));
    assert_eq!(rig.last_command(), b"AT+CMGD=1,4\r\n");

    // A failed delete still returns to listening.
    rig.modem_says(b"\r\nERROR\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.app.owner().map(|n| n.as_str()), Some(OWNER));
}

#[test]
fn secret_from_unusable_origin_is_unrecognized() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives("15551234567", "978SolMate");

    assert!(rig.app.owner().is_none());
    assert!(rig.sink.saw(&AppEvent::MessageDiscarded));
    assert_eq!(rig.last_command(), b"AT+CMGD=1,4\r\n");
    assert!(rig.nvs.ops.is_empty());
}

#[test]
fn non_notification_line_is_ignored() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    let sent = rig.modem.sent.len();
    rig.modem_says(b"\r\nRING\r\n");

    assert_eq!(rig.modem.sent.len(), sent);
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert!(!rig.sink.saw(&AppEvent::MessageDiscarded));
}

#[test]
fn failed_read_returns_to_idle() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.modem_says(b"\r\n+CMTI: \"SM\",12\r\n");
    assert_eq!(rig.last_command(), b"AT+CMGR=12\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::ReadingMessage);

    rig.modem_says(b"\r\nERROR\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert!(!rig.sink.saw(&AppEvent::MessageDiscarded));
}
