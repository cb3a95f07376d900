//! Integration tests for the SMS provisioning flow.
//!
//! Verifies the end-to-end sequence: a secret-bearing SMS arrives, the
//! origin becomes the owner number in memory and in NVS, and the
//! acknowledgment goes back to the new owner through the retry path.

use solmate::app::events::AppEvent;
use solmate::config::SystemConfig;
use solmate::modem::at::{self, ACKNOWLEDGMENT_TEXT};
use solmate::modem::link::LinkMode;
use solmate::modem::sequencer::{DialogState, OutboundSms};
use solmate::phone::{PHONE_KEY, PHONE_NAMESPACE, PhoneNumber};

use crate::mock_hw::{OWNER, Rig, STRANGER};

fn number(s: &str) -> PhoneNumber {
    PhoneNumber::parse(s).unwrap()
}

fn cmgs(to: &str) -> String {
    format!("AT+CMGS=\"{to}\"\r\n")
}

#[test]
fn secret_provisions_owner_and_acknowledges() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    assert!(rig.app.owner().is_none());

    let start = rig.modem.sent.len();
    rig.sms_arrives(OWNER, "978SolMate");

    assert_eq!(rig.app.owner(), Some(&number(OWNER)));
    assert!(rig.sink.saw(&AppEvent::PhoneProvisioned(number(OWNER))));
    assert_eq!(rig.nvs.stored_phone(), Some(number(OWNER)));
    assert_eq!(
        rig.nvs.ops,
        vec![
            format!("delete {PHONE_NAMESPACE}::{PHONE_KEY}"),
            format!("write {PHONE_NAMESPACE}::{PHONE_KEY}"),
        ]
    );
    assert_eq!(rig.commands_since(start).last(), Some(&cmgs(OWNER)));
    assert_eq!(
        rig.app.dialog_state(),
        DialogState::Preparing(OutboundSms::Acknowledgment)
    );

    rig.modem_says(b"\r\n> ");
    assert_eq!(rig.last_command(), &at::sms_payload(ACKNOWLEDGMENT_TEXT)[..]);
    assert_eq!(
        rig.app.dialog_state(),
        DialogState::Sending(OutboundSms::Acknowledgment)
    );

    rig.modem_says(b"\r\nOK\r\n");
    assert_eq!(rig.last_command(), b"AT+CMGD=1,4\r\n");
    assert!(rig.sink.saw(&AppEvent::SmsDelivered(OutboundSms::Acknowledgment)));

    rig.modem_says(b"\r\nOK\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.modem.link.mode(), LinkMode::Listening);
}

#[test]
fn acknowledgment_survives_one_failure() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives(OWNER, "978SolMate");
    rig.modem_says(b"\r\n> ");
    rig.modem_says(b"\r\nERROR\r\n");

    assert_eq!(
        rig.app.dialog_state(),
        DialogState::RetryBackoff(OutboundSms::Acknowledgment)
    );
    assert_eq!(rig.timer.armed_ms, Some(16_000));
    assert_eq!(rig.modem.link.mode(), LinkMode::Suspended);
    assert!(rig.sink.saw(&AppEvent::SendFailed {
        sms: OutboundSms::Acknowledgment,
        attempt: 2,
    }));
    assert_eq!(rig.app.alert_state().retry_count, 1);

    // Nothing reaches the dialog during backoff.
    let before = rig.sink.events.len();
    rig.modem_says(b"\r\n+CMTI: \"SM\",4\r\n");
    assert_eq!(rig.sink.events.len(), before);

    let start = rig.modem.sent.len();
    rig.expire_retry();
    assert_eq!(rig.commands_since(start), vec![cmgs(OWNER)]);
    assert_eq!(
        rig.app.dialog_state(),
        DialogState::Preparing(OutboundSms::Acknowledgment)
    );

    rig.modem_says(b"\r\n> ");
    rig.modem_says(b"\r\nOK\r\n");
    rig.modem_says(b"\r\nOK\r\n");

    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.app.alert_state().retry_count, 0);
    assert_eq!(rig.timer.arms, 1);
}

#[test]
fn error_instead_of_prompt_counts_as_send_failure() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives(OWNER, "978SolMate");
    rig.modem_says(b"\r\nERROR\r\n");

    assert_eq!(
        rig.app.dialog_state(),
        DialogState::RetryBackoff(OutboundSms::Acknowledgment)
    );
    assert_eq!(rig.timer.armed_ms, Some(16_000));
}

#[test]
fn new_secret_replaces_previous_owner() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    let start = rig.modem.sent.len();
    rig.sms_arrives(STRANGER, "please add me: 978SolMate thanks");

    assert_eq!(rig.app.owner(), Some(&number(STRANGER)));
    assert_eq!(rig.nvs.stored_phone(), Some(number(STRANGER)));
    // The acknowledgment goes to the newcomer, not the old owner.
    assert_eq!(rig.commands_since(start).last(), Some(&cmgs(STRANGER)));
}

#[test]
fn persistence_failure_keeps_number_in_memory() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.nvs.fail_writes = true;
    rig.sms_arrives(STRANGER, "978SolMate");

    assert_eq!(rig.app.owner(), Some(&number(STRANGER)));
    assert!(rig.sink.saw(&AppEvent::PhoneProvisioned(number(STRANGER))));
    assert_eq!(rig.nvs.stored_phone(), None);
    assert_eq!(
        rig.app.dialog_state(),
        DialogState::Preparing(OutboundSms::Acknowledgment)
    );
}

#[test]
fn secret_is_case_sensitive() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives(OWNER, "978solmate");

    assert!(rig.app.owner().is_none());
    assert!(rig.sink.saw(&AppEvent::MessageDiscarded));
    assert!(rig.nvs.ops.is_empty());
}

#[test]
fn custom_secret_from_config() {
    let mut config = SystemConfig::default();
    config.sms_secret.clear();
    config.sms_secret.push_str("bilge-42").unwrap();
    let mut rig = Rig::ready(config, None);

    rig.sms_arrives(OWNER, "978SolMate");
    assert!(rig.app.owner().is_none());
    rig.modem_says(b"\r\nOK\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);

    rig.sms_arrives(OWNER, "bilge-42");
    assert_eq!(rig.app.owner(), Some(&number(OWNER)));
}
