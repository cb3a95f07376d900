//! One-shot hardware peripheral initialization and raw I/O helpers.
//!
//! Configures GPIO directions, ADC1 channels and the modem UART using
//! raw ESP-IDF sys calls.  Called once from `main()` before the event
//! loop starts.
//!
//! On host builds every helper is backed by in-memory state so drivers
//! and adapters run unchanged in tests.  The `sim_*` functions inject
//! levels and bytes.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Boot-time peripheral setup failure, carrying the raw `esp_err_t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    UartInitFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "battery/panel ADC setup failed (esp_err {rc})"),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO direction setup failed (esp_err {rc})"),
            Self::UartInitFailed(rc) => write!(f, "modem UART setup failed (esp_err {rc})"),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

/// Map an `esp_err_t` onto the given stage error.
#[cfg(target_os = "espidf")]
fn check(ret: esp_err_t, stage: fn(i32) -> HwInitError) -> Result<(), HwInitError> {
    if ret == ESP_OK as i32 { Ok(()) } else { Err(stage(ret)) }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals(modem_baud: u32) -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the event loop; single-threaded.
    unsafe {
        init_adc()?;
        configure_pins(&INPUT_PINS, PinRole::PulledUpInput)?;
        configure_pins(&OUTPUT_PINS, PinRole::Output)?;
        init_uart(modem_baud)?;
    }
    // Charge path stays enabled for the whole run.
    gpio_write(pins::SOLAR_ENABLE_GPIO, true);
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals(modem_baud: u32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped (modem @ {modem_baud} baud)");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut BATTERY_ADC: adc_oneshot_unit_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let unit = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: BATTERY_ADC is written only here, once at boot.
    check(
        unsafe { adc_oneshot_new_unit(&unit, &raw mut BATTERY_ADC) },
        HwInitError::AdcInitFailed,
    )?;

    // 12 dB attenuation covers the divided-down 0..3.1 V range.
    let channel_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    for channel in [pins::ADC1_CH_BATTERY, pins::ADC1_CH_SOLAR] {
        check(
            unsafe { adc_oneshot_config_channel(BATTERY_ADC, channel, &channel_cfg) },
            HwInitError::AdcInitFailed,
        )?;
    }
    info!(
        "hw_init: battery on ADC1 CH{}, panel on CH{}",
        pins::ADC1_CH_BATTERY,
        pins::ADC1_CH_SOLAR
    );
    Ok(())
}

/// Raw 12-bit sample, or 0 if the conversion failed.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut sample: i32 = 0;
    // SAFETY: BATTERY_ADC is set by init_adc() and only read afterwards.
    match unsafe { adc_oneshot_read(BATTERY_ADC, channel, &mut sample) } {
        ret if ret == ESP_OK as i32 => u16::try_from(sample).unwrap_or(0),
        _ => 0,
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO directions ───────────────────────────────────────────

/// Float switches pull to ground when wet; the modem status line is
/// open-drain.
#[cfg(target_os = "espidf")]
const INPUT_PINS: [i32; 6] = [
    pins::FLOAT_SWITCH_GPIOS[0],
    pins::FLOAT_SWITCH_GPIOS[1],
    pins::FLOAT_SWITCH_GPIOS[2],
    pins::FLOAT_SWITCH_GPIOS[3],
    pins::FLOAT_SWITCH_GPIOS[4],
    pins::MODEM_STATUS_GPIO,
];

/// All outputs start low.
#[cfg(target_os = "espidf")]
const OUTPUT_PINS: [i32; 6] = [
    pins::PUMP_GPIO,
    pins::SOLAR_ENABLE_GPIO,
    pins::LED_RED_GPIO,
    pins::LED_GREEN_GPIO,
    pins::MODEM_POWER_ENABLE_GPIO,
    pins::MODEM_POWER_KEY_GPIO,
];

#[cfg(target_os = "espidf")]
#[derive(Clone, Copy, PartialEq, Eq)]
enum PinRole {
    PulledUpInput,
    Output,
}

#[cfg(target_os = "espidf")]
unsafe fn configure_pins(lines: &[i32], role: PinRole) -> Result<(), HwInitError> {
    let (mode, pull_up) = match role {
        PinRole::PulledUpInput => (gpio_mode_t_GPIO_MODE_INPUT, gpio_pullup_t_GPIO_PULLUP_ENABLE),
        PinRole::Output => (gpio_mode_t_GPIO_MODE_OUTPUT, gpio_pullup_t_GPIO_PULLUP_DISABLE),
    };
    let cfg = gpio_config_t {
        pin_bit_mask: lines.iter().fold(0u64, |m, &pin| m | (1u64 << pin)),
        mode,
        pull_up_en: pull_up,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    check(unsafe { gpio_config(&cfg) }, HwInitError::GpioConfigFailed)?;
    if role == PinRole::Output {
        for &pin in lines {
            gpio_write(pin, false);
        }
    }
    info!("hw_init: {} GPIO lines as {}", lines.len(), match role {
        PinRole::PulledUpInput => "inputs",
        PinRole::Output => "outputs",
    });
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: level read of a configured input.
    unsafe { gpio_get_level(pin) != 0 }
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: configured output; main loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

// ── GPIO simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const SIM_GPIO_COUNT: usize = 64;

/// Every simulated line idles high, like an input with its pull-up.
#[cfg(not(target_os = "espidf"))]
static SIM_GPIO: [core::sync::atomic::AtomicBool; SIM_GPIO_COUNT] =
    [const { core::sync::atomic::AtomicBool::new(true) }; SIM_GPIO_COUNT];

#[cfg(not(target_os = "espidf"))]
fn sim_line(pin: i32) -> Option<&'static core::sync::atomic::AtomicBool> {
    usize::try_from(pin).ok().and_then(|i| SIM_GPIO.get(i))
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    sim_line(pin).is_none_or(|l| l.load(core::sync::atomic::Ordering::Relaxed))
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) {
    if let Some(line) = sim_line(pin) {
        line.store(high, core::sync::atomic::Ordering::Relaxed);
    }
}

/// Drive a simulated line (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_gpio(pin: i32, high: bool) {
    gpio_write(pin, high);
}

// ── embedded-hal pin ──────────────────────────────────────────

/// A configured GPIO line exposed through the `embedded-hal` digital traits.
///
/// Direction is fixed by [`init_peripherals`]; this handle only reads or
/// writes the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gpio {
    pin: i32,
}

impl Gpio {
    pub const fn new(pin: i32) -> Self {
        Self { pin }
    }

    pub const fn pin(&self) -> i32 {
        self.pin
    }
}

impl ErrorType for Gpio {
    type Error = Infallible;
}

impl InputPin for Gpio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(gpio_read(self.pin))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!gpio_read(self.pin))
    }
}

impl OutputPin for Gpio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        gpio_write(self.pin, true);
        Ok(())
    }
}

// ── Modem UART ────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const UART_RX_RING: i32 = 512;

#[cfg(target_os = "espidf")]
unsafe fn init_uart(baud: u32) -> Result<(), HwInitError> {
    let cfg = uart_config_t {
        baud_rate: baud as i32,
        data_bits: uart_word_length_t_UART_DATA_8_BITS,
        parity: uart_parity_t_UART_PARITY_DISABLE,
        stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
        flow_ctrl: uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
        ..Default::default()
    };
    let port = pins::MODEM_UART_PORT;

    // SAFETY: boot-time configuration from the single main task.
    unsafe {
        check(uart_param_config(port, &cfg), HwInitError::UartInitFailed)?;
        check(
            uart_set_pin(port, pins::MODEM_TX_GPIO, pins::MODEM_RX_GPIO, -1, -1),
            HwInitError::UartInitFailed,
        )?;
        check(
            uart_driver_install(port, UART_RX_RING, 0, 0, core::ptr::null_mut(), 0),
            HwInitError::UartInitFailed,
        )?;
    }

    info!("hw_init: modem UART{} at {} baud", port, baud);
    Ok(())
}

/// Queue bytes for transmission.  Returns how many were accepted.
#[cfg(target_os = "espidf")]
pub fn uart_write(bytes: &[u8]) -> usize {
    // SAFETY: UART driver installed in init_uart(); main loop only.
    let n = unsafe {
        uart_write_bytes(
            pins::MODEM_UART_PORT,
            bytes.as_ptr().cast(),
            bytes.len(),
        )
    };
    usize::try_from(n).unwrap_or(0)
}

/// Non-blocking read of whatever the driver has buffered.
#[cfg(target_os = "espidf")]
pub fn uart_read(buf: &mut [u8]) -> usize {
    // SAFETY: UART driver installed in init_uart(); zero tick timeout.
    let n = unsafe {
        uart_read_bytes(
            pins::MODEM_UART_PORT,
            buf.as_mut_ptr().cast(),
            buf.len() as u32,
            0,
        )
    };
    usize::try_from(n).unwrap_or(0)
}

/// Drop everything the UART driver has received but not yet handed out.
#[cfg(target_os = "espidf")]
pub fn uart_discard_rx() {
    // SAFETY: UART driver installed in init_uart(); main loop only.
    let ret = unsafe { uart_flush_input(pins::MODEM_UART_PORT) };
    if ret != ESP_OK as i32 {
        log::warn!("hw_init: modem UART rx flush failed (esp_err {ret})");
    }
}

#[cfg(not(target_os = "espidf"))]
mod sim_uart {
    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    pub static RX: Mutex<VecDeque<u8>> = Mutex::new(VecDeque::new());
    pub static TX: Mutex<Vec<u8>> = Mutex::new(Vec::new());

    pub fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_write(bytes: &[u8]) -> usize {
    sim_uart::lock(&sim_uart::TX).extend_from_slice(bytes);
    bytes.len()
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_read(buf: &mut [u8]) -> usize {
    let mut rx = sim_uart::lock(&sim_uart::RX);
    let n = buf.len().min(rx.len());
    for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
        *slot = byte;
    }
    n
}

#[cfg(not(target_os = "espidf"))]
pub fn uart_discard_rx() {
    sim_uart::lock(&sim_uart::RX).clear();
}

/// Queue bytes as if the modem had sent them (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_uart_inject(bytes: &[u8]) {
    sim_uart::lock(&sim_uart::RX).extend(bytes.iter().copied());
}

/// Take everything written to the modem so far (host only).
#[cfg(not(target_os = "espidf"))]
pub fn sim_uart_take_tx() -> Vec<u8> {
    core::mem::take(&mut *sim_uart::lock(&sim_uart::TX))
}
