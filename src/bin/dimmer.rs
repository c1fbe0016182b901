// $ cargo rb dimmer
#![no_main]
#![no_std]

use f411_dimmer as _; // global logger + panicking-behavior + memory layout

#[rtic::app(device = stm32f4xx_hal::pac, peripherals = true)]
mod app {
    use dwt_systick_monotonic::{DwtSystick, ExtU32};
    use embedded_hal::blocking::delay::DelayMs;
    use f411_dimmer::{
        board::{ExtiButtons, PwmOutput},
        config::{self, DimmerConfig},
        Dispatcher,
    };
    use stm32f4xx_hal::{
        gpio::{
            gpiob::{PB12, PB13},
            Input, PullUp,
        },
        pac::TIM2,
        prelude::*,
        pwm::{PwmChannel, C1},
        timer::Timer,
    };
    const FREQ: u32 = 48_000_000;

    #[monotonic(binds = SysTick, default = true)]
    type MyMono = DwtSystick<FREQ>;

    /// Blocking wait on the monotonic, used for the debounce interval.
    pub struct MonoDelay;

    impl DelayMs<u32> for MonoDelay {
        fn delay_ms(&mut self, ms: u32) {
            let start = monotonics::now();
            while monotonics::now() - start < ms.millis() {
                cortex_m::asm::nop();
            }
        }
    }

    type Dimmer = Dispatcher<
        PwmOutput<PwmChannel<TIM2, C1>>,
        ExtiButtons<PB12<Input<PullUp>>, PB13<Input<PullUp>>>,
        MonoDelay,
    >;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        dimmer: Dimmer,
    }

    #[init]
    fn init(mut ctx: init::Context) -> (Shared, Local, init::Monotonics) {
        let rcc = ctx.device.RCC.constrain();
        let clocks = rcc.cfgr.sysclk(config::SYSCLK.raw().hz()).freeze();

        // Set up the LED and PWM. On the Nucleo-F411RE it's connected to pin PA5.
        let gpioa = ctx.device.GPIOA.split();
        let led = gpioa.pa5.into_alternate::<1>();
        let pwm = Timer::new(ctx.device.TIM2, &clocks).pwm(led, config::PWM_FREQ.raw().hz());

        // Buttons to GND on PB12 (brighter) and PB13 (dimmer), both on EXTI15_10.
        let gpiob = ctx.device.GPIOB.split();
        let increase = gpiob.pb12.into_pull_up_input();
        let decrease = gpiob.pb13.into_pull_up_input();
        let mut sys_cfg = ctx.device.SYSCFG.constrain();
        let buttons = ExtiButtons::new(increase, decrease, ctx.device.EXTI, &mut sys_cfg);

        ctx.core.DCB.enable_trace();
        ctx.core.DWT.enable_cycle_counter();
        let mono = DwtSystick::new(
            &mut ctx.core.DCB,
            ctx.core.DWT,
            ctx.core.SYST,
            clocks.hclk().0,
        );

        let dimmer = match Dispatcher::start(
            PwmOutput::new(pwm),
            buttons,
            MonoDelay,
            &DimmerConfig::DEFAULT,
        ) {
            Ok(dimmer) => dimmer,
            Err(e) => defmt::panic!("Invalid dimmer config: {:?}", e),
        };

        defmt::info!("Press PB12 / PB13!");
        (Shared {}, Local { dimmer }, init::Monotonics(mono))
    }

    #[idle]
    fn idle(_: idle::Context) -> ! {
        loop {
            cortex_m::asm::nop();
        }
    }

    #[task(binds = EXTI15_10, local = [dimmer])]
    fn on_exti(ctx: on_exti::Context) {
        ctx.local.dimmer.on_edge_interrupt();
    }
}
