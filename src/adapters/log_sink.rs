//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | dialog={} | switches=0b{:05b} water={} | battery={} panel={} | \
                     pump={} | owner={} | retries={} alert_sent={} | up={}s",
                    t.dialog,
                    t.readings.float_switch_mask,
                    t.water.label(),
                    t.readings.battery_level,
                    t.readings.panel_voltage_level,
                    if t.pump_on { "on" } else { "off" },
                    if t.owner_provisioned { "set" } else { "unset" },
                    t.retry_count,
                    t.alert_sent,
                    t.uptime_secs,
                );
            }
            AppEvent::Started(state) => info!("START | dialog={}", state),
            AppEvent::DialogChanged { from, to } => info!("STATE | {} -> {}", from, to),
            AppEvent::ModemOffline => warn!("STATE | modem offline, SMS disabled"),
            AppEvent::PumpChanged(on) => {
                info!("PUMP | {}", if *on { "on" } else { "off" });
            }
            AppEvent::AlertRequested => info!("SMS | alert requested"),
            AppEvent::PhoneProvisioned(number) => info!("SMS | owner now {}", number),
            AppEvent::StatusRequested => info!("SMS | status report requested"),
            AppEvent::MessageDiscarded => info!("SMS | inbound message discarded"),
            AppEvent::SmsDelivered(sms) => info!("SMS | {} delivered", sms.label()),
            AppEvent::SendFailed { sms, attempt } => {
                warn!("SMS | {} failed, attempt {} pending", sms.label(), attempt);
            }
            AppEvent::RetryAbandoned { sms, attempts } => {
                warn!("SMS | {} abandoned after {} attempts", sms.label(), attempts);
            }
        }
    }
}
