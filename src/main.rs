//! Sol-Mate Firmware: Main Entry Point
//!
//! Hexagonal architecture with event-driven execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter    UartModem      │
//! │  (Sensor+Actuator) (EventSink)    (Config+NVS)  (ModemPort)    │
//! │  RetryTimer (RetryTimerPort)                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Pump · Alert/Retry · Command Sequencer · Phone store  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Event queue: SensorTick · ModemReply · RetryTimerExpired      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use solmate::adapters::hardware::HardwareAdapter;
use solmate::adapters::log_sink::LogEventSink;
use solmate::adapters::nvs::{self, NvsAdapter};
use solmate::adapters::uart_modem::{EventQueueDelegate, UartModem};
use solmate::app::ports::ActuatorPort;
use solmate::app::service::AppService;
use solmate::drivers::hw_init::{self, Gpio};
use solmate::drivers::hw_timer::{self, RetryTimer};
use solmate::drivers::modem_power::ModemPower;
use solmate::drivers::pump::PumpDriver;
use solmate::drivers::status_led::StatusLed;
use solmate::events::{self, Event};
use solmate::phone::PhoneNumberStore;
use solmate::pins;
use solmate::sensors::SensorHub;
use solmate::sensors::float_switch::FloatSwitchBank;
use solmate::sensors::power::PowerMonitor;

/// Main-loop pacing between UART polls.
const POLL_INTERVAL_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("Sol-Mate v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::detached()
        }
    };
    let config = nvs::load_or_init(&nvs);
    info!(
        "Config: tick={:.1}s, battery {}..{}, alert at {} of {} switches",
        config.tick_secs(),
        config.battery_low_threshold,
        config.battery_high_threshold,
        config.alert_min_switches,
        config.float_switch_count,
    );

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals(config.modem_baud_rate) {
        // Without GPIO the pump cannot be driven safely.
        error!("HAL init failed: {}, halting", e);
        loop {
            FreeRtos::delay_ms(1_000);
        }
    }

    // ── 4. Construct adapters ─────────────────────────────────
    let switch_count = usize::from(config.float_switch_count);
    let sensor_hub = SensorHub::new(
        FloatSwitchBank::new(
            pins::FLOAT_SWITCH_GPIOS
                .iter()
                .take(switch_count)
                .map(|&pin| Gpio::new(pin)),
        ),
        PowerMonitor::new(pins::ADC1_CH_BATTERY, pins::ADC1_CH_SOLAR),
    );
    let mut hw = HardwareAdapter::new(
        sensor_hub,
        PumpDriver::on_board(),
        StatusLed::on_board(),
        ModemPower::on_board(),
    );
    hw.all_off();

    if let Err(e) = hw.modem_power_mut().power_on(&mut FreeRtos) {
        warn!("Modem power-up failed: {}", e);
    }

    let mut modem = UartModem::new();
    let mut reply_delegate = EventQueueDelegate;
    let mut retry_timer = RetryTimer::new();
    let mut log_sink = LogEventSink::new();

    // ── 5. Construct app service ──────────────────────────────
    let phone = PhoneNumberStore::load(&nvs);
    let tick_ms = config.tick_interval_ms;
    let mut app = AppService::new(config, phone);
    app.start(&mut hw, &mut modem, &mut log_sink);

    hw_timer::start_sensor_tick(tick_ms);
    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        modem.poll(&mut reply_delegate);

        events::drain_events(|event| match event {
            Event::SensorTick => app.tick(&mut hw, &mut modem, &mut log_sink),
            Event::ModemReply(reply) => app.on_modem_reply(
                reply,
                &mut modem,
                &mut nvs,
                &mut retry_timer,
                &mut log_sink,
            ),
            Event::RetryTimerExpired => app.on_retry_expired(&mut modem, &mut log_sink),
        });

        FreeRtos::delay_ms(POLL_INTERVAL_MS);
    }
}
