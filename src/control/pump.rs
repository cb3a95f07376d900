//! Bilge pump on/off decision with battery hysteresis.
//!
//! ```text
//!             battery ≥ high            battery < low
//!   Stopped ────────────────▶ Running ────────────────▶ Stopped
//!      ▲     (and water)         │
//!      └──────── no water ───────┘
//! ```
//!
//! A running pump keeps draining the battery down to the low threshold;
//! a stopped pump waits until the battery has recovered to the high
//! threshold.  The gap between the two stops the pump chattering on a
//! sagging battery.

/// Battery thresholds as 8-bit codes.  `low < high` is enforced by config
/// validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryHysteresis {
    pub low: u8,
    pub high: u8,
}

#[derive(Debug, Default)]
pub struct PumpController {
    active: bool,
}

impl PumpController {
    pub const fn new() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Decide the pump state for this tick.  Returns the new state.
    pub fn update(
        &mut self,
        water_present: bool,
        battery_level: u8,
        limits: BatteryHysteresis,
    ) -> bool {
        let threshold = if self.active { limits.low } else { limits.high };
        self.active = water_present && battery_level >= threshold;
        self.active
    }
}
