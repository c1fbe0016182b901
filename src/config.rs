//! Build-time configuration for the dimmer.
//!
//! Everything here is fixed when the firmware is flashed. [`DimmerConfig::DEFAULT`]
//! collects the constants below and is checked at compile time.

use fugit::{HertzU32, MillisDurationU32};

use crate::driver::period_ticks;
use crate::duty::{DutyLevel, SimultaneousPolicy};

/// Core clock the board is brought up with.
pub const SYSCLK: HertzU32 = HertzU32::from_raw(48_000_000);

/// Output PWM frequency.
pub const PWM_FREQ: HertzU32 = HertzU32::from_raw(20_000);

/// Lowest duty the buttons can reach, in percent.
pub const MIN_DUTY: u8 = 5;

/// Highest duty the buttons can reach, in percent.
pub const MAX_DUTY: u8 = 90;

/// Duty applied at power-up, in percent.
pub const INITIAL_DUTY: u8 = 50;

/// Percentage points added or removed per press.
pub const DUTY_STEP: u8 = 15;

/// Time the handler waits for contact bounce to settle.
pub const DEBOUNCE: MillisDurationU32 = MillisDurationU32::from_ticks(250);

/// Reasons a [`DimmerConfig`] is rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `min_duty` is greater than `max_duty`.
    InvertedLimits,
    /// `max_duty` exceeds 100 %.
    LimitAbove100,
    /// `initial_duty` lies outside `min_duty..=max_duty`.
    InitialOutOfRange,
    /// A step of zero would make both buttons inert.
    ZeroStep,
    /// The PWM or system clock frequency is zero, or PWM is faster than the clock.
    ZeroFrequency,
}

/// Complete set of tunables consumed by the controller and the dispatcher.
#[derive(Clone, Copy, Debug)]
pub struct DimmerConfig {
    pub sysclk: HertzU32,
    pub pwm_frequency: HertzU32,
    pub min_duty: u8,
    pub max_duty: u8,
    pub initial_duty: u8,
    pub step: u8,
    pub debounce: MillisDurationU32,
    pub simultaneous: SimultaneousPolicy,
}

impl DimmerConfig {
    pub const DEFAULT: Self = Self {
        sysclk: SYSCLK,
        pwm_frequency: PWM_FREQ,
        min_duty: MIN_DUTY,
        max_duty: MAX_DUTY,
        initial_duty: INITIAL_DUTY,
        step: DUTY_STEP,
        debounce: DEBOUNCE,
        simultaneous: SimultaneousPolicy::Sequential,
    };

    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_duty > 100 {
            return Err(ConfigError::LimitAbove100);
        }
        if self.min_duty > self.max_duty {
            return Err(ConfigError::InvertedLimits);
        }
        if self.initial_duty < self.min_duty || self.initial_duty > self.max_duty {
            return Err(ConfigError::InitialOutOfRange);
        }
        if self.step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        if self.pwm_frequency.raw() == 0 || self.sysclk.raw() < self.pwm_frequency.raw() {
            return Err(ConfigError::ZeroFrequency);
        }
        Ok(())
    }

    /// Timer ticks in one PWM period.
    pub const fn period_ticks(&self) -> u32 {
        period_ticks(self.sysclk.raw(), self.pwm_frequency.raw())
    }

    /// Duty the output starts with. Only meaningful for a validated config.
    pub const fn initial(&self) -> DutyLevel {
        DutyLevel::saturating(self.initial_duty)
    }
}

impl Default for DimmerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const _: () = assert!(DimmerConfig::DEFAULT.validate().is_ok());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(DimmerConfig::DEFAULT.validate(), Ok(()));
        assert_eq!(DimmerConfig::DEFAULT.period_ticks(), 2400);
        assert_eq!(DimmerConfig::DEFAULT.initial().percent(), 50);
    }

    #[test]
    fn rejects_bad_limits() {
        let cfg = DimmerConfig {
            min_duty: 60,
            max_duty: 40,
            initial_duty: 50,
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvertedLimits));

        let cfg = DimmerConfig {
            max_duty: 101,
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::LimitAbove100));
    }

    #[test]
    fn rejects_initial_outside_limits() {
        let cfg = DimmerConfig {
            initial_duty: 95,
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InitialOutOfRange));

        let cfg = DimmerConfig {
            initial_duty: 4,
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InitialOutOfRange));
    }

    #[test]
    fn rejects_zero_step_and_frequency() {
        let cfg = DimmerConfig {
            step: 0,
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroStep));

        let cfg = DimmerConfig {
            pwm_frequency: HertzU32::from_raw(0),
            ..DimmerConfig::DEFAULT
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFrequency));
    }
}
