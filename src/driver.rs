//! Peripheral interface consumed by the dispatcher.
//!
//! The board layer implements [`OutputDriver`] and [`ButtonDriver`]; the
//! dispatcher never touches registers itself.

use core::ops::BitOr;

use crate::duty::DutyLevel;

/// Latched edge status of the two buttons, sampled at handler entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonEdges {
    pub increase: bool,
    pub decrease: bool,
}

impl ButtonEdges {
    pub const NONE: Self = Self {
        increase: false,
        decrease: false,
    };

    pub fn is_empty(&self) -> bool {
        !self.increase && !self.decrease
    }
}

/// Selects which button pins an interrupt-control call acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const NONE: Self = Self(0);
    pub const INCREASE: Self = Self(1 << 0);
    pub const DECREASE: Self = Self(1 << 1);
    pub const BOTH: Self = Self(Self::INCREASE.0 | Self::DECREASE.0);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for ButtonMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The PWM output channel.
pub trait OutputDriver {
    /// One-time setup of the period and the starting compare value.
    fn configure_output(&mut self, period_ticks: u32, initial: DutyLevel);

    /// Reprograms the compare register, see [`compare_value`].
    fn set_duty(&mut self, duty: DutyLevel);
}

/// Edge-triggered interrupt control for the two buttons.
pub trait ButtonDriver {
    /// One-time arming of both pins after bring-up.
    fn enable_button_interrupts(&mut self);

    /// Non-blocking read of the latched edge flags.
    fn read_pending_edges(&mut self) -> ButtonEdges;

    /// Stops interrupt generation; latched flags are kept.
    fn mask_interrupts(&mut self, mask: ButtonMask);

    /// Resumes interrupt generation; latched flags are kept.
    fn unmask_interrupts(&mut self, mask: ButtonMask);

    /// Drops the latched flags without touching interrupt generation.
    fn clear_pending(&mut self, mask: ButtonMask);

    /// Clears the latched flags, then resumes interrupt generation.
    ///
    /// Unmasking first would fire on a flag latched while masked.
    fn clear_and_rearm(&mut self, mask: ButtonMask) {
        self.clear_pending(mask);
        self.unmask_interrupts(mask);
    }
}

/// Compare value for `duty` within a period of `period_ticks`.
///
/// Integer arithmetic truncating toward zero: `(period * percent) / 100`.
pub const fn compare_value(period_ticks: u32, duty: DutyLevel) -> u32 {
    ((period_ticks as u64 * duty.percent() as u64) / 100) as u32
}

/// Timer ticks per PWM period when the timer counts at `clock_hz`.
pub const fn period_ticks(clock_hz: u32, pwm_hz: u32) -> u32 {
    if pwm_hz == 0 {
        0
    } else {
        clock_hz / pwm_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duty(percent: u8) -> DutyLevel {
        DutyLevel::new(percent).unwrap()
    }

    #[test]
    fn compare_value_truncates() {
        assert_eq!(compare_value(2400, duty(50)), 1200);
        assert_eq!(compare_value(2400, duty(5)), 120);
        assert_eq!(compare_value(999, duty(33)), 329);
        assert_eq!(compare_value(7, duty(50)), 3);
    }

    #[test]
    fn compare_value_covers_the_extremes() {
        assert_eq!(compare_value(2400, DutyLevel::ZERO), 0);
        assert_eq!(compare_value(2400, DutyLevel::FULL), 2400);
        assert_eq!(compare_value(u32::MAX, DutyLevel::FULL), u32::MAX);
    }

    #[test]
    fn period_from_clock() {
        assert_eq!(period_ticks(48_000_000, 20_000), 2400);
        assert_eq!(period_ticks(16_000_000, 1_000), 16_000);
        assert_eq!(period_ticks(48_000_000, 0), 0);
    }

    #[test]
    fn masks_combine() {
        let both = ButtonMask::INCREASE | ButtonMask::DECREASE;
        assert_eq!(both, ButtonMask::BOTH);
        assert!(both.contains(ButtonMask::INCREASE));
        assert!(!ButtonMask::DECREASE.contains(ButtonMask::INCREASE));
        assert!(ButtonMask::INCREASE.contains(ButtonMask::NONE));
    }

    #[test]
    fn empty_edges() {
        assert!(ButtonEdges::NONE.is_empty());
        assert!(!ButtonEdges {
            increase: false,
            decrease: true
        }
        .is_empty());
    }
}
