//! Water alert: trigger conditions, retry ceiling and cooldown.

use solmate::app::events::AppEvent;
use solmate::config::SystemConfig;
use solmate::modem::at::{self, WARNING_TEXT};
use solmate::modem::sequencer::{DialogState, OutboundSms};

use crate::mock_hw::{OWNER, Rig};

fn flooding(rig: &mut Rig) {
    rig.hw.readings.float_switch_mask = 0b00011;
    rig.hw.readings.battery_level = 120;
}

fn deliver(rig: &mut Rig) {
    rig.modem_says(b"\r\n> ");
    rig.modem_says(b"\r\nOK\r\n");
    rig.modem_says(b"\r\nOK\r\n");
}

fn alerts(rig: &Rig) -> usize {
    rig.sink.count(|e| *e == AppEvent::AlertRequested)
}

#[test]
fn rising_water_on_weak_battery_alerts_owner() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    flooding(&mut rig);
    rig.tick();

    assert_eq!(alerts(&rig), 1);
    assert_eq!(
        rig.last_command(),
        format!("AT+CMGS=\"{OWNER}\"\r\n").as_bytes()
    );
    assert_eq!(
        rig.app.dialog_state(),
        DialogState::Preparing(OutboundSms::Alert)
    );
    assert!(!rig.app.pump_active(), "battery too low to start the pump");

    rig.modem_says(b"\r\n> ");
    assert_eq!(rig.last_command(), &at::sms_payload(WARNING_TEXT)[..]);
    rig.modem_says(b"\r\nOK\r\n");
    assert!(rig.sink.saw(&AppEvent::SmsDelivered(OutboundSms::Alert)));
    assert!(rig.app.alert_state().alert_sent);
    assert_eq!(rig.app.alert_state().last_alert_ms, Some(rig.app.uptime_ms()));
}

#[test]
fn no_alert_without_each_condition() {
    // No owner.
    let mut rig = Rig::ready(SystemConfig::default(), None);
    flooding(&mut rig);
    rig.tick();
    assert_eq!(alerts(&rig), 0);

    // Battery healthy enough to pump.
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    flooding(&mut rig);
    rig.hw.readings.battery_level = 200;
    rig.tick();
    assert_eq!(alerts(&rig), 0);

    // Only the lowest switch is wet.
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    flooding(&mut rig);
    rig.hw.readings.float_switch_mask = 0b00001;
    rig.tick();
    assert_eq!(alerts(&rig), 0);

    // Gap in the stack reads as a fault, not as high water.
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    flooding(&mut rig);
    rig.hw.readings.float_switch_mask = 0b00110;
    rig.tick();
    assert_eq!(alerts(&rig), 0);

    // Modem still in setup.
    let mut rig = Rig::new(SystemConfig::default(), Some(OWNER));
    rig.boot();
    flooding(&mut rig);
    rig.tick();
    assert_eq!(alerts(&rig), 0);
}

#[test]
fn busy_dialog_defers_alert() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    rig.modem_says(b"\r\n+CMTI: \"SM\",3\r\n");
    assert_eq!(rig.app.dialog_state(), DialogState::ReadingMessage);

    flooding(&mut rig);
    rig.tick();
    assert_eq!(alerts(&rig), 0);

    rig.modem_says(b"\r\nERROR\r\n");
    rig.tick();
    assert_eq!(alerts(&rig), 1);
}

#[test]
fn retry_ceiling_abandons_after_max_attempts() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    flooding(&mut rig);
    rig.tick();

    for attempt in 2..=8u8 {
        rig.modem_says(b"\r\nERROR\r\n");
        assert!(rig.sink.saw(&AppEvent::SendFailed {
            sms: OutboundSms::Alert,
            attempt,
        }));
        assert_eq!(rig.app.alert_state().retry_count, attempt - 1);
        rig.expire_retry();
        assert_eq!(
            rig.app.dialog_state(),
            DialogState::Preparing(OutboundSms::Alert)
        );
    }

    rig.modem_says(b"\r\nERROR\r\n");
    assert!(rig.sink.saw(&AppEvent::RetryAbandoned {
        sms: OutboundSms::Alert,
        attempts: 8,
    }));
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
    assert_eq!(rig.timer.armed_ms, None);
    assert_eq!(rig.timer.arms, 7);
    assert_eq!(rig.app.alert_state().retry_count, 0);
    assert!(!rig.app.alert_state().alert_sent);

    // Nothing was delivered, so the next qualifying tick tries again.
    rig.tick();
    assert_eq!(alerts(&rig), 2);
}

#[test]
fn stale_retry_expiry_is_ignored() {
    let mut rig = Rig::ready(SystemConfig::default(), Some(OWNER));
    let sent = rig.modem.sent.len();
    rig.app.on_retry_expired(&mut rig.modem, &mut rig.sink);
    assert_eq!(rig.modem.sent.len(), sent);
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);
}

#[test]
fn cooldown_blocks_second_alert() {
    let config = SystemConfig {
        tick_interval_ms: 1000,
        alert_cooldown_secs: 10,
        ..Default::default()
    };
    let mut rig = Rig::ready(config, Some(OWNER));
    flooding(&mut rig);
    rig.tick();
    deliver(&mut rig);
    assert_eq!(rig.app.dialog_state(), DialogState::Idle);

    for _ in 0..9 {
        rig.tick();
    }
    assert_eq!(alerts(&rig), 1, "still inside the cooldown");

    rig.tick();
    assert_eq!(alerts(&rig), 2);
}

#[test]
fn acknowledgment_does_not_start_cooldown() {
    let mut rig = Rig::ready(SystemConfig::default(), None);
    rig.sms_arrives(OWNER, "978SolMate");
    deliver(&mut rig);
    assert_eq!(rig.app.alert_state().last_alert_ms, None);

    flooding(&mut rig);
    rig.tick();
    assert_eq!(alerts(&rig), 1);
}
