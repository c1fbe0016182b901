//! Nucleo-F411RE implementation of the peripheral interface.
//!
//! PWM comes out of any `embedded_hal` PWM channel (TIM2 CH1 on PA5, the
//! green user LED, in the firmware). The buttons are two EXTI lines that
//! share one interrupt vector, active low with pull-ups, triggering on the
//! falling edge.

use embedded_hal::{digital::v2::InputPin, PwmPin};
use stm32f4xx_hal::{
    gpio::{Edge, ExtiPin},
    pac::EXTI,
    syscfg::SysCfg,
};

use crate::driver::{compare_value, ButtonDriver, ButtonEdges, ButtonMask, OutputDriver};
use crate::duty::DutyLevel;

pub struct PwmOutput<P> {
    channel: P,
    period: u32,
}

impl<P> PwmOutput<P>
where
    P: PwmPin<Duty = u16>,
{
    pub fn new(channel: P) -> Self {
        Self { channel, period: 0 }
    }

    /// Compare value currently programmed.
    pub fn compare(&self) -> u16 {
        self.channel.get_duty()
    }

    /// Ticks per period as used for compare values.
    pub fn period(&self) -> u32 {
        self.period
    }
}

impl<P> OutputDriver for PwmOutput<P>
where
    P: PwmPin<Duty = u16>,
{
    fn configure_output(&mut self, period_ticks: u32, initial: DutyLevel) {
        // The timer period is fixed by the HAL from the PWM frequency.
        let max = u32::from(self.channel.get_max_duty());
        if period_ticks != max {
            warn!("requested period {} ticks, timer runs {}", period_ticks, max);
        }
        self.period = period_ticks.min(max);
        self.set_duty(initial);
        self.channel.enable();
        debug!("pwm enabled, period {} ticks", self.period);
    }

    fn set_duty(&mut self, duty: DutyLevel) {
        let compare = compare_value(self.period, duty) as u16;
        self.channel.set_duty(compare);
        trace!("compare = {}", compare);
    }
}

pub struct ExtiButtons<I, D> {
    increase: I,
    decrease: D,
    exti: EXTI,
}

impl<I, D> ExtiButtons<I, D>
where
    I: ExtiPin,
    D: ExtiPin,
{
    /// Routes both pins to EXTI on the falling edge. Interrupts stay off
    /// until [`ButtonDriver::enable_button_interrupts`].
    pub fn new(mut increase: I, mut decrease: D, mut exti: EXTI, syscfg: &mut SysCfg) -> Self {
        increase.make_interrupt_source(syscfg);
        increase.trigger_on_edge(&mut exti, Edge::Falling);
        decrease.make_interrupt_source(syscfg);
        decrease.trigger_on_edge(&mut exti, Edge::Falling);
        Self {
            increase,
            decrease,
            exti,
        }
    }

    /// Buttons currently held down, read from the pin levels. The buttons
    /// pull to GND, so an idle pair reads [`ButtonEdges::NONE`].
    pub fn held(&self) -> ButtonEdges
    where
        I: InputPin,
        D: InputPin,
    {
        ButtonEdges {
            increase: matches!(InputPin::is_low(&self.increase), Ok(true)),
            decrease: matches!(InputPin::is_low(&self.decrease), Ok(true)),
        }
    }
}

impl<I, D> ButtonDriver for ExtiButtons<I, D>
where
    I: ExtiPin,
    D: ExtiPin,
{
    fn enable_button_interrupts(&mut self) {
        self.clear_and_rearm(ButtonMask::BOTH);
    }

    fn read_pending_edges(&mut self) -> ButtonEdges {
        ButtonEdges {
            increase: self.increase.check_interrupt(),
            decrease: self.decrease.check_interrupt(),
        }
    }

    fn mask_interrupts(&mut self, mask: ButtonMask) {
        if mask.contains(ButtonMask::INCREASE) {
            self.increase.disable_interrupt(&mut self.exti);
        }
        if mask.contains(ButtonMask::DECREASE) {
            self.decrease.disable_interrupt(&mut self.exti);
        }
    }

    fn unmask_interrupts(&mut self, mask: ButtonMask) {
        if mask.contains(ButtonMask::INCREASE) {
            self.increase.enable_interrupt(&mut self.exti);
        }
        if mask.contains(ButtonMask::DECREASE) {
            self.decrease.enable_interrupt(&mut self.exti);
        }
    }

    fn clear_pending(&mut self, mask: ButtonMask) {
        if mask.contains(ButtonMask::INCREASE) {
            self.increase.clear_interrupt_pending_bit();
        }
        if mask.contains(ButtonMask::DECREASE) {
            self.decrease.clear_interrupt_pending_bit();
        }
    }
}
