//! Button-driven PWM dimmer for the Nucleo-F411RE.
//!
//! Two push buttons raise and lower the duty cycle of one PWM output. All
//! state changes happen in the button interrupt, see [`dispatch`].
#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod dispatch;
pub mod driver;
pub mod duty;

#[cfg(target_os = "none")]
pub mod board;

pub use config::{ConfigError, DimmerConfig};
pub use dispatch::{DispatchState, Dispatcher, MaskGuard};
pub use driver::{ButtonDriver, ButtonEdges, ButtonMask, OutputDriver};
pub use duty::{DutyController, DutyLevel, SimultaneousPolicy};

#[cfg(all(target_os = "none", feature = "firmware"))]
mod rt {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use defmt_rtt as _; // global logger
    use panic_probe as _;
    use stm32f4xx_hal as _; // memory layout

    // same panicking *behavior* as `panic-probe` but doesn't print a panic message
    // this prevents the panic message being printed *twice* when `defmt::panic` is invoked
    #[defmt::panic_handler]
    fn panic() -> ! {
        cortex_m::asm::udf()
    }

    static COUNT: AtomicUsize = AtomicUsize::new(0);
    defmt::timestamp!("{=usize}", {
        // NOTE(no-CAS) `timestamps` runs with interrupts disabled
        let n = COUNT.load(Ordering::Relaxed);
        COUNT.store(n + 1, Ordering::Relaxed);
        n
    });
}
