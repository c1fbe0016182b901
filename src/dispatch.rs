//! Button interrupt dispatcher.
//!
//! One call to [`Dispatcher::on_edge_interrupt`] walks the whole cycle:
//!
//! ```text
//! Armed -> Triggered -> Reading -> Updating -> Debouncing -> Rearming -> Armed
//! ```
//!
//! Both button pins are masked from `Triggered` until `Rearming`, so a bounce
//! that latches while the handler runs is cleared rather than serviced. The
//! mask is held by a [`MaskGuard`]; dropping it is the only way out of the
//! handler and always clears and re-enables the pins.

use embedded_hal::blocking::delay::DelayMs;

use crate::config::{ConfigError, DimmerConfig};
use crate::driver::{ButtonDriver, ButtonEdges, ButtonMask, OutputDriver};
use crate::duty::{DutyController, DutyLevel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchState {
    /// Interrupts enabled, waiting for an edge.
    Armed,
    /// Handler entered, pins being masked.
    Triggered,
    /// Sampling the latched edge flags.
    Reading,
    /// Computing and programming the new duty.
    Updating,
    /// Blocking for the debounce interval.
    Debouncing,
    /// Clearing latched flags and unmasking.
    Rearming,
}

impl DispatchState {
    fn advance(&mut self, next: Self) {
        trace!("dispatch {} -> {}", *self, next);
        *self = next;
    }
}

/// Keeps button interrupts masked for as long as it lives.
///
/// Engaging moves the dispatch state to `Triggered` and masks the pins. On
/// drop the state passes through `Rearming`, the latched flags are cleared,
/// the pins re-enabled and the state returns to `Armed`, on every exit path
/// including unwinding.
pub struct MaskGuard<'a, B: ButtonDriver> {
    buttons: &'a mut B,
    state: &'a mut DispatchState,
    mask: ButtonMask,
}

impl<'a, B: ButtonDriver> MaskGuard<'a, B> {
    pub fn engage(buttons: &'a mut B, state: &'a mut DispatchState, mask: ButtonMask) -> Self {
        state.advance(DispatchState::Triggered);
        buttons.mask_interrupts(mask);
        Self {
            buttons,
            state,
            mask,
        }
    }

    pub fn read_pending_edges(&mut self) -> ButtonEdges {
        self.buttons.read_pending_edges()
    }

    pub fn advance(&mut self, next: DispatchState) {
        self.state.advance(next);
    }
}

impl<B: ButtonDriver> Drop for MaskGuard<'_, B> {
    fn drop(&mut self) {
        self.state.advance(DispatchState::Rearming);
        self.buttons.clear_and_rearm(self.mask);
        self.state.advance(DispatchState::Armed);
    }
}

/// Owns the duty state and the peripherals it drives.
///
/// The only mutation path is [`on_edge_interrupt`](Self::on_edge_interrupt),
/// which takes `&mut self`; hand the dispatcher to exactly one interrupt
/// handler.
pub struct Dispatcher<O, B, D> {
    output: O,
    buttons: B,
    delay: D,
    controller: DutyController,
    debounce_ms: u32,
    state: DispatchState,
    handled: u32,
}

impl<O, B, D> Dispatcher<O, B, D>
where
    O: OutputDriver,
    B: ButtonDriver,
    D: DelayMs<u32>,
{
    /// Brings the output up at the initial duty and arms both buttons.
    pub fn start(
        mut output: O,
        mut buttons: B,
        delay: D,
        config: &DimmerConfig,
    ) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("rejecting dimmer config: {}", e);
            return Err(e);
        }

        let controller = DutyController::new(config);
        let period_ticks = config.period_ticks();
        output.configure_output(period_ticks, controller.duty());
        buttons.enable_button_interrupts();

        info!(
            "dimmer armed: period {} ticks, duty {}%, debounce {} ms",
            period_ticks,
            controller.duty().percent(),
            config.debounce.ticks()
        );

        Ok(Self {
            output,
            buttons,
            delay,
            controller,
            debounce_ms: config.debounce.ticks(),
            state: DispatchState::Armed,
            handled: 0,
        })
    }

    /// Services one button interrupt.
    ///
    /// Returns the programmed duty, or `None` when no button flag was latched.
    pub fn on_edge_interrupt(&mut self) -> Option<DutyLevel> {
        let mut guard = MaskGuard::engage(&mut self.buttons, &mut self.state, ButtonMask::BOTH);

        let outcome = 'service: {
            guard.advance(DispatchState::Reading);
            let edges = guard.read_pending_edges();
            if edges.is_empty() {
                warn!("button interrupt with no edge latched");
                break 'service None;
            }

            guard.advance(DispatchState::Updating);
            let before = self.controller.duty();
            let duty = self.controller.apply_edges(edges);
            self.output.set_duty(duty);
            self.handled = self.handled.wrapping_add(1);
            info!("{} duty {}% -> {}%", edges, before.percent(), duty.percent());

            guard.advance(DispatchState::Debouncing);
            self.delay.delay_ms(self.debounce_ms);

            Some(duty)
        };

        drop(guard);
        outcome
    }

    pub fn duty(&self) -> DutyLevel {
        self.controller.duty()
    }

    /// Where the last handler invocation got to.
    ///
    /// `Armed` after every call, including one that unwinds. On target a
    /// panic halts without unwinding, so after a crash this holds the stage
    /// the handler stopped in, for reading back with a debugger.
    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Number of edge events that reached the update step.
    pub fn handled(&self) -> u32 {
        self.handled
    }
}
