//! GPIO / peripheral pin assignments for the Sol-Mate main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Float switches (active-low, internal pull-up; closed = wet)
// ---------------------------------------------------------------------------

/// Stacked float switches, lowest first.  Index `i` becomes bit `i` of the
/// float-switch mask.
pub const FLOAT_SWITCH_GPIOS: [i32; 5] = [4, 5, 6, 7, 15];

// ---------------------------------------------------------------------------
// Power budget (ADC1)
// ---------------------------------------------------------------------------

/// Battery voltage divider, ADC1 channel 0 (GPIO 1 on ESP32-S3).
pub const BATTERY_ADC_GPIO: i32 = 1;
/// Solar panel voltage divider, ADC1 channel 1 (GPIO 2 on ESP32-S3).
pub const SOLAR_ADC_GPIO: i32 = 2;

pub const ADC1_CH_BATTERY: u32 = 0;
pub const ADC1_CH_SOLAR: u32 = 1;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Bilge pump MOSFET gate (active HIGH).
pub const PUMP_GPIO: i32 = 16;
/// Solar charge path enable (held on; the charge controller is external).
pub const SOLAR_ENABLE_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Status LEDs
// ---------------------------------------------------------------------------

pub const LED_RED_GPIO: i32 = 11;
pub const LED_GREEN_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// Cellular modem (SIM800-class, UART1)
// ---------------------------------------------------------------------------

pub const MODEM_UART_PORT: i32 = 1;
pub const MODEM_TX_GPIO: i32 = 43;
pub const MODEM_RX_GPIO: i32 = 44;
/// Supply switch for the modem rail (active HIGH).
pub const MODEM_POWER_ENABLE_GPIO: i32 = 13;
/// Modem PWRKEY line, pulsed to boot the module.
pub const MODEM_POWER_KEY_GPIO: i32 = 14;
/// Modem STATUS output: HIGH once the module has booted.
pub const MODEM_STATUS_GPIO: i32 = 10;
