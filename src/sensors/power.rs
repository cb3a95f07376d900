//! Battery and solar-panel voltage sensing.
//!
//! Both rails go through resistor dividers into ADC1.  The control logic
//! works on 8-bit codes (0..=255), so the 12-bit oneshot samples are
//! scaled down here and nowhere else.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via hw_init helpers.
//! On host/test: returns the levels set with [`sim_set_levels`].

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU8, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_BATTERY: AtomicU8 = AtomicU8::new(255);
#[cfg(not(target_os = "espidf"))]
static SIM_PANEL: AtomicU8 = AtomicU8::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_levels(battery: u8, panel: u8) {
    SIM_BATTERY.store(battery, Ordering::Relaxed);
    SIM_PANEL.store(panel, Ordering::Relaxed);
}

/// 12-bit ADC sample to the 8-bit code the core uses.
pub fn scale_to_level(raw: u16) -> u8 {
    (raw.min(0x0FFF) >> 4) as u8
}

/// Battery charge band for the status SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryBand {
    Full,
    Medium,
    Low,
}

impl BatteryBand {
    pub fn from_level(level: u8) -> Self {
        match level {
            231..=255 => Self::Full,
            101..=230 => Self::Medium,
            _ => Self::Low,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

/// Solar charge-rate band for the status SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeBand {
    High,
    Medium,
    Low,
    None,
}

impl ChargeBand {
    pub fn from_level(level: u8) -> Self {
        match level {
            231..=255 => Self::High,
            101..=230 => Self::Medium,
            31..=100 => Self::Low,
            _ => Self::None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerReading {
    pub battery_level: u8,
    pub panel_voltage_level: u8,
}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub struct PowerMonitor {
    battery_channel: u32,
    panel_channel: u32,
}

impl PowerMonitor {
    pub fn new(battery_channel: u32, panel_channel: u32) -> Self {
        Self {
            battery_channel,
            panel_channel,
        }
    }

    #[cfg(target_os = "espidf")]
    pub fn read(&mut self) -> PowerReading {
        PowerReading {
            battery_level: scale_to_level(hw_init::adc1_read(self.battery_channel)),
            panel_voltage_level: scale_to_level(hw_init::adc1_read(self.panel_channel)),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn read(&mut self) -> PowerReading {
        PowerReading {
            battery_level: SIM_BATTERY.load(Ordering::Relaxed),
            panel_voltage_level: SIM_PANEL.load(Ordering::Relaxed),
        }
    }
}
