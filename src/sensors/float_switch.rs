//! Stacked bilge float switches.
//!
//! Switch `i` (lowest first) becomes bit `i` of the float-switch mask.
//! Water rises from the bottom, so a healthy reading is a contiguous run
//! of set bits starting at bit 0:
//!
//! ```text
//!   0b00000  dry                 level 0
//!   0b00111  three switches wet  level 3
//!   0b00101  gap below a wet one invalid (stuck or broken switch)
//! ```
//!
//! The switches are wired active-low against the internal pull-up: a
//! closed (wet) switch reads LOW.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::drivers::hw_init::Gpio;

/// Hard ceiling on switches: the mask is a `u8`.
pub const MAX_FLOAT_SWITCHES: usize = 8;

/// Number of wet switches if `mask` is a contiguous run from bit 0,
/// otherwise `None`.  Bits at or above `switch_count` are ignored.
pub fn contiguous_level(mask: u8, switch_count: u8) -> Option<u8> {
    let width = u32::from(switch_count.min(MAX_FLOAT_SWITCHES as u8));
    let mask = if width >= 8 { mask } else { mask & ((1u8 << width) - 1) };
    // A contiguous low run plus one is a power of two (or overflows to 0
    // for 0xFF).
    if mask & mask.wrapping_add(1) == 0 {
        Some(mask.count_ones() as u8)
    } else {
        None
    }
}

/// Water level band as reported in the status SMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterLevel {
    None,
    Medium,
    High,
    /// Non-contiguous switch pattern.
    Invalid,
}

impl WaterLevel {
    pub fn classify(mask: u8, switch_count: u8) -> Self {
        match contiguous_level(mask, switch_count) {
            None => Self::Invalid,
            Some(0) => Self::None,
            Some(n) if n >= switch_count => Self::High,
            Some(_) => Self::Medium,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Invalid => "Invalid reading",
        }
    }
}

/// The physical switch stack.
pub struct FloatSwitchBank<P = Gpio> {
    switches: Vec<P, MAX_FLOAT_SWITCHES>,
}

impl<P: InputPin> FloatSwitchBank<P> {
    /// Pins lowest first.  Anything past [`MAX_FLOAT_SWITCHES`] is ignored.
    pub fn new(pins: impl IntoIterator<Item = P>) -> Self {
        let mut switches = Vec::new();
        for pin in pins {
            if switches.push(pin).is_err() {
                log::warn!("float switch bank: more than {MAX_FLOAT_SWITCHES} pins, extra ignored");
                break;
            }
        }
        Self { switches }
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }

    /// Sample every switch.  A pin that fails to read counts as dry.
    pub fn read_mask(&mut self) -> u8 {
        self.switches
            .iter_mut()
            .enumerate()
            .fold(0u8, |mask, (bit, pin)| {
                if pin.is_low().unwrap_or(false) {
                    mask | (1 << bit)
                } else {
                    mask
                }
            })
    }
}
