//! A PWM channel configured for hobby-servo timing: a 20 ms period counted in 1 µs ticks.
//!
//! The hardware is reached through the [`PwmTimer`] trait. On the Pico the adapter is
//! [`RpPwm`](crate::rp_pwm::RpPwm); host tests use [`SimPwm`](crate::pwm_sim::SimPwm).
//!
//! # Example
//!
//! ```rust,ignore
//! use pico_servo_sweep::{Result, pwm_channel::{PulseWidth, PwmChannel}, rp_pwm::RpPwm};
//!
//! fn example(p: embassy_rp::Peripherals) -> Result<()> {
//!     // GPIO 22 is channel A of PWM slice 3.
//!     let mut channel = PwmChannel::configure(RpPwm::new(p.PIN_22, p.PWM_SLICE3))?;
//!     channel.set_duty_us(PulseWidth::DEGREES_90);
//!     Ok(())
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::{Error, Result};

/// Ticks in one servo frame. At 1 µs per tick this is 20 ms (50 Hz).
pub const PERIOD_TICKS: u16 = 20_000;

/// PWM counter rate: one tick per microsecond.
pub const TICK_HZ: u32 = 1_000_000;

// ============================================================================
// PulseWidth
// ============================================================================

/// High time of one PWM period, in microseconds.
///
/// Values from 500 µs to 2400 µs cover the servo's 0°–180° travel. Nothing outside
/// that range is rejected.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, derive_more::Display)]
#[display("{_0} us")]
pub struct PulseWidth(u16);

impl PulseWidth {
    /// Pulse for 0°.
    pub const DEGREES_0: Self = Self(500);
    /// Pulse for 90°.
    pub const DEGREES_90: Self = Self(1_470);
    /// Pulse for 180°.
    pub const DEGREES_180: Self = Self(2_400);

    /// Wrap a pulse width given in microseconds.
    #[must_use]
    pub const fn from_micros(micros: u16) -> Self {
        Self(micros)
    }

    /// The pulse width in microseconds (equal to PWM ticks).
    #[must_use]
    pub const fn as_micros(self) -> u16 {
        self.0
    }

    /// Add `micros`, or `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, micros: u16) -> Option<Self> {
        match self.0.checked_add(micros) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Subtract `micros`, or `None` below zero.
    #[must_use]
    pub const fn checked_sub(self, micros: u16) -> Option<Self> {
        match self.0.checked_sub(micros) {
            Some(difference) => Some(Self(difference)),
            None => None,
        }
    }
}

// ============================================================================
// ClockDivider
// ============================================================================

/// PWM clock divider in the RP 8.4 fixed-point format (integer part plus sixteenths).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ClockDivider {
    integer: u8,
    fraction: u8,
}

impl ClockDivider {
    /// Divider that turns `base_clock_hz` into [`TICK_HZ`] ticks, rounded to the nearest 1/16.
    ///
    /// 125 MHz (Pico 1) gives exactly 125; 150 MHz (Pico 2) gives exactly 150.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockDivider`] if the integer part falls outside `1..=255`.
    pub fn for_microsecond_ticks(base_clock_hz: u32) -> Result<Self> {
        let err = Error::ClockDivider { base_clock_hz };
        let base = u64::from(base_clock_hz);
        let tick = u64::from(TICK_HZ);
        // Sixteenths of the ideal divider, rounded to nearest.
        let sixteenths = (base * 16 + tick / 2) / tick;
        let integer = u8::try_from(sixteenths / 16).map_err(|_| err)?;
        if integer == 0 {
            return Err(err);
        }
        let fraction = u8::try_from(sixteenths % 16).map_err(|_| err)?;
        Ok(Self { integer, fraction })
    }

    /// Integer part of the divider.
    #[must_use]
    pub const fn integer(self) -> u8 {
        self.integer
    }

    /// Fractional part of the divider, in sixteenths.
    #[must_use]
    pub const fn fraction(self) -> u8 {
        self.fraction
    }

    /// Raw register value: integer part in bits 11..4, fraction in bits 3..0.
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        ((self.integer as u16) << 4) | self.fraction as u16
    }
}

// ============================================================================
// PwmTimer
// ============================================================================

/// Access to one hardware PWM output: the slice timer plus the channel bound to a pin.
///
/// Binding the pin to the PWM function is the adapter's job and happens when the adapter
/// is constructed.
pub trait PwmTimer {
    /// GPIO number the output is bound to.
    fn pin(&self) -> u8;

    /// Frequency of the clock that feeds the PWM counter, in Hz.
    fn base_clock_hz(&self) -> u32;

    /// Set the counter period (in ticks) and the clock divider.
    fn configure(&mut self, period_ticks: u16, divider: ClockDivider);

    /// Set the compare value: the output is high for `ticks` ticks of each period.
    fn set_duty(&mut self, ticks: u16);

    /// Gate the PWM output on or off.
    fn enable(&mut self, enabled: bool);
}

// ============================================================================
// PwmChannel
// ============================================================================

/// Timing of a configured channel. Only the duty value changes after configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PwmChannelConfig {
    /// GPIO number carrying the signal.
    pub pin: u8,
    /// Counter period in ticks.
    pub period_ticks: u16,
    /// Nominal tick rate in Hz.
    pub tick_hz: u32,
    /// Divider applied to the base clock.
    pub divider: ClockDivider,
    /// Whether the output is running.
    pub enabled: bool,
}

/// A PWM output running at 50 Hz with microsecond duty resolution.
///
/// See the [module-level example](self) for usage.
pub struct PwmChannel<T> {
    timer: T,
    config: PwmChannelConfig,
    duty: PulseWidth,
}

impl<T: PwmTimer> PwmChannel<T> {
    /// Configure `timer` for a 20 ms period with 1 µs ticks, duty 0, output enabled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockDivider`] if the timer's base clock cannot be divided to 1 MHz.
    /// The hardware is left untouched in that case.
    pub fn configure(timer: T) -> Result<Self> {
        let divider = ClockDivider::for_microsecond_ticks(timer.base_clock_hz())?;
        let config = PwmChannelConfig {
            pin: timer.pin(),
            period_ticks: PERIOD_TICKS,
            tick_hz: TICK_HZ,
            divider,
            enabled: false,
        };
        let mut channel = Self {
            timer,
            config,
            duty: PulseWidth::default(),
        };
        channel.apply();
        Ok(channel)
    }

    /// Run the configuration sequence again on the same timer.
    ///
    /// The result is the same as a single [`configure`](Self::configure): enabled, 20 ms
    /// period, duty 0.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockDivider`] if the base clock has changed to an unusable rate.
    pub fn reconfigure(&mut self) -> Result<()> {
        self.config.divider = ClockDivider::for_microsecond_ticks(self.timer.base_clock_hz())?;
        self.apply();
        Ok(())
    }

    fn apply(&mut self) {
        self.timer.enable(false);
        self.config.enabled = false;
        self.timer.configure(self.config.period_ticks, self.config.divider);
        self.set_duty_us(PulseWidth::default());
        self.timer.enable(true);
        self.config.enabled = true;
    }

    /// Set the high time of every following period. Takes effect at the next period boundary.
    ///
    /// The value is written as-is; widths at or above the period keep the line high.
    pub fn set_duty_us(&mut self, pulse_width: PulseWidth) {
        self.duty = pulse_width;
        self.timer.set_duty(pulse_width.as_micros());
    }

    /// Current timing configuration.
    #[must_use]
    pub const fn config(&self) -> &PwmChannelConfig {
        &self.config
    }

    /// Last pulse width written.
    #[must_use]
    pub const fn duty(&self) -> PulseWidth {
        self.duty
    }
}

impl<T> ErrorType for PwmChannel<T> {
    type Error = Infallible;
}

impl<T: PwmTimer> SetDutyCycle for PwmChannel<T> {
    fn max_duty_cycle(&self) -> u16 {
        self.config.period_ticks
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.set_duty_us(PulseWidth::from_micros(duty));
        Ok(())
    }
}
