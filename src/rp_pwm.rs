//! [`PwmTimer`] adapter for the RP2040/RP2350 PWM slices.
//!
//! Each GPIO is wired to exactly one slice and channel (`slice = (gpio / 2) % 8` on Pico 1,
//! even pins on channel A, odd pins on channel B). [`RpPwm::new`] only accepts pin/slice pairs
//! that match, so a pin without a PWM slice is rejected at compile time.
//!
//! # Example
//!
//! ```rust,no_run
//! # #![no_std]
//! # #![no_main]
//! # use panic_probe as _;
//! use pico_servo_sweep::{Result, pwm_channel::PwmChannel, rp_pwm::RpPwm};
//!
//! fn example(p: embassy_rp::Peripherals) -> Result<()> {
//!     // GPIO 22 -> (22 / 2) % 8 = slice 3, channel A.
//!     let channel = PwmChannel::configure(RpPwm::new(p.PIN_22, p.PWM_SLICE3))?;
//!     # let _ = channel;
//!     Ok(())
//! }
//! ```

use defmt::info;
use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, Pwm};
use embassy_rp::{Peri, PeripheralType};
use fixed::FixedU16;
use fixed::types::extra::U4;

use crate::pwm_channel::{ClockDivider, PwmTimer};

// Public so downstream crates can name it in bounds; hidden from docs.
#[doc(hidden)]
pub trait PwmPin<S: PeripheralType>: PeripheralType {
    const GPIO: u8;
    const IS_CHANNEL_A: bool;
    fn new_pwm<'d>(slice: Peri<'d, S>, pin: Peri<'d, Self>) -> Pwm<'d>;
}

macro_rules! pwm_pin_map {
    ($gpio:literal, $pin:ident, $slice:ident, A) => {
        impl PwmPin<embassy_rp::peripherals::$slice> for embassy_rp::peripherals::$pin {
            const GPIO: u8 = $gpio;
            const IS_CHANNEL_A: bool = true;
            fn new_pwm<'d>(
                slice: Peri<'d, embassy_rp::peripherals::$slice>,
                pin: Peri<'d, Self>,
            ) -> Pwm<'d> {
                Pwm::new_output_a(slice, pin, Config::default())
            }
        }
    };
    ($gpio:literal, $pin:ident, $slice:ident, B) => {
        impl PwmPin<embassy_rp::peripherals::$slice> for embassy_rp::peripherals::$pin {
            const GPIO: u8 = $gpio;
            const IS_CHANNEL_A: bool = false;
            fn new_pwm<'d>(
                slice: Peri<'d, embassy_rp::peripherals::$slice>,
                pin: Peri<'d, Self>,
            ) -> Pwm<'d> {
                Pwm::new_output_b(slice, pin, Config::default())
            }
        }
    };
}

pwm_pin_map!(0, PIN_0, PWM_SLICE0, A);
pwm_pin_map!(1, PIN_1, PWM_SLICE0, B);
pwm_pin_map!(2, PIN_2, PWM_SLICE1, A);
pwm_pin_map!(3, PIN_3, PWM_SLICE1, B);
pwm_pin_map!(4, PIN_4, PWM_SLICE2, A);
pwm_pin_map!(5, PIN_5, PWM_SLICE2, B);
pwm_pin_map!(6, PIN_6, PWM_SLICE3, A);
pwm_pin_map!(7, PIN_7, PWM_SLICE3, B);
pwm_pin_map!(8, PIN_8, PWM_SLICE4, A);
pwm_pin_map!(9, PIN_9, PWM_SLICE4, B);
pwm_pin_map!(10, PIN_10, PWM_SLICE5, A);
pwm_pin_map!(11, PIN_11, PWM_SLICE5, B);
pwm_pin_map!(12, PIN_12, PWM_SLICE6, A);
pwm_pin_map!(13, PIN_13, PWM_SLICE6, B);
pwm_pin_map!(14, PIN_14, PWM_SLICE7, A);
pwm_pin_map!(15, PIN_15, PWM_SLICE7, B);
pwm_pin_map!(16, PIN_16, PWM_SLICE0, A);
pwm_pin_map!(17, PIN_17, PWM_SLICE0, B);
pwm_pin_map!(18, PIN_18, PWM_SLICE1, A);
pwm_pin_map!(19, PIN_19, PWM_SLICE1, B);
pwm_pin_map!(20, PIN_20, PWM_SLICE2, A);
pwm_pin_map!(21, PIN_21, PWM_SLICE2, B);
pwm_pin_map!(22, PIN_22, PWM_SLICE3, A);
pwm_pin_map!(23, PIN_23, PWM_SLICE3, B);
pwm_pin_map!(24, PIN_24, PWM_SLICE4, A);
pwm_pin_map!(25, PIN_25, PWM_SLICE4, B);
pwm_pin_map!(26, PIN_26, PWM_SLICE5, A);
pwm_pin_map!(27, PIN_27, PWM_SLICE5, B);
pwm_pin_map!(28, PIN_28, PWM_SLICE6, A);
pwm_pin_map!(29, PIN_29, PWM_SLICE6, B);

#[cfg(feature = "pico2")]
pwm_pin_map!(30, PIN_30, PWM_SLICE7, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(31, PIN_31, PWM_SLICE7, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(32, PIN_32, PWM_SLICE8, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(33, PIN_33, PWM_SLICE8, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(34, PIN_34, PWM_SLICE9, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(35, PIN_35, PWM_SLICE9, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(36, PIN_36, PWM_SLICE10, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(37, PIN_37, PWM_SLICE10, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(38, PIN_38, PWM_SLICE11, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(39, PIN_39, PWM_SLICE11, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(40, PIN_40, PWM_SLICE8, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(41, PIN_41, PWM_SLICE8, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(42, PIN_42, PWM_SLICE9, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(43, PIN_43, PWM_SLICE9, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(44, PIN_44, PWM_SLICE10, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(45, PIN_45, PWM_SLICE10, B);
#[cfg(feature = "pico2")]
pwm_pin_map!(46, PIN_46, PWM_SLICE11, A);
#[cfg(feature = "pico2")]
pwm_pin_map!(47, PIN_47, PWM_SLICE11, B);

#[derive(Debug, Clone, Copy)]
enum PwmOutput {
    A,
    B,
}

/// One RP PWM slice with the channel bound to a GPIO.
///
/// See the [module-level example](self) for usage.
pub struct RpPwm<'d> {
    pwm: Pwm<'d>,
    cfg: Config, // Every set_config writes the whole slice, so keep divider and top here
    gpio: u8,
    output: PwmOutput,
}

impl<'d> RpPwm<'d> {
    /// Bind `pin` to the PWM function of `slice`.
    ///
    /// See the [module-level example](self) for usage.
    #[must_use]
    pub fn new<P, S>(pin: Peri<'d, P>, slice: Peri<'d, S>) -> Self
    where
        P: PwmPin<S>,
        S: PeripheralType,
    {
        let output = if P::IS_CHANNEL_A {
            PwmOutput::A
        } else {
            PwmOutput::B
        };
        Self {
            pwm: P::new_pwm(slice, pin),
            cfg: Config::default(),
            gpio: P::GPIO,
            output,
        }
    }
}

impl PwmTimer for RpPwm<'_> {
    fn pin(&self) -> u8 {
        self.gpio
    }

    fn base_clock_hz(&self) -> u32 {
        clk_sys_freq()
    }

    fn configure(&mut self, period_ticks: u16, divider: ClockDivider) {
        // The counter runs 0..=top, so top = period - 1 gives exactly `period_ticks` ticks.
        let top = period_ticks.saturating_sub(1);
        self.cfg.top = top;
        self.cfg.phase_correct = false; // edge-aligned => exact 1 µs steps
        self.cfg.divider = FixedU16::<U4>::from_bits(divider.to_bits());
        self.pwm.set_config(&self.cfg);

        info!(
            "pwm gpio={} clk={}Hz div={}+{}/16 top={}",
            self.gpio,
            clk_sys_freq(),
            divider.integer(),
            divider.fraction(),
            top
        );
    }

    fn set_duty(&mut self, ticks: u16) {
        // Compare registers are double-buffered; the new value starts at the next wrap.
        match self.output {
            PwmOutput::A => self.cfg.compare_a = ticks,
            PwmOutput::B => self.cfg.compare_b = ticks,
        }
        self.pwm.set_config(&self.cfg);
    }

    fn enable(&mut self, enabled: bool) {
        self.cfg.enable = enabled;
        self.pwm.set_config(&self.cfg);
    }
}
