//! Drives a servo through a fixed motion profile: timed holds, then an endless sweep.
//!
//! The sequence is an explicit state machine. [`ServoController::step`] performs one duty
//! write plus one wait and moves to the next [`Phase`]; [`ServoController::run`] steps forever.
//! [`MotionProfile::next_phase`] is the pure transition function behind it.
//!
//! # Example
//!
//! ```rust,ignore
//! use pico_servo_sweep::{
//!     Result,
//!     rp_pwm::RpPwm,
//!     servo_controller::{DefmtDiagnostics, MotionProfile, ServoController},
//! };
//! use embassy_time::Delay;
//!
//! async fn example(p: embassy_rp::Peripherals) -> Result<core::convert::Infallible> {
//!     let pwm = RpPwm::new(p.PIN_22, p.PWM_SLICE3);
//!     let controller = ServoController::start(pwm, Delay, DefmtDiagnostics, MotionProfile::DEMO)?;
//!     controller.run().await
//! }
//! ```

#[cfg(not(feature = "host"))]
use defmt::info;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

use crate::Result;
use crate::pwm_channel::{PulseWidth, PwmChannel, PwmTimer};

// ============================================================================
// Motion profile
// ============================================================================

/// A position held for [`MotionProfile::hold_duration`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct HoldPosition {
    /// Angle, used for diagnostics only.
    pub degrees: u16,
    /// Pulse width that puts the servo at `degrees`.
    pub pulse: PulseWidth,
}

/// Timing and positions of the motion sequence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MotionProfile {
    /// Positions held in order before sweeping.
    pub holds: &'static [HoldPosition],
    /// How long each hold lasts.
    pub hold_duration: Duration,
    /// Low end of the sweep.
    pub sweep_min: PulseWidth,
    /// High end of the sweep.
    pub sweep_max: PulseWidth,
    /// Pulse change per sweep step, in microseconds.
    pub sweep_step_us: u16,
    /// Wait after each sweep step.
    pub sweep_step_delay: Duration,
}

impl MotionProfile {
    /// 180°, 90°, 0° for 5 s each, then sweep 500 µs ↔ 2400 µs in 5 µs steps every 10 ms.
    pub const DEMO: Self = Self {
        holds: &[
            HoldPosition {
                degrees: 180,
                pulse: PulseWidth::DEGREES_180,
            },
            HoldPosition {
                degrees: 90,
                pulse: PulseWidth::DEGREES_90,
            },
            HoldPosition {
                degrees: 0,
                pulse: PulseWidth::DEGREES_0,
            },
        ],
        hold_duration: Duration::from_millis(5_000),
        sweep_min: PulseWidth::DEGREES_0,
        sweep_max: PulseWidth::DEGREES_180,
        sweep_step_us: 5,
        sweep_step_delay: Duration::from_millis(10),
    };

    /// Phase the sequence starts in.
    #[must_use]
    pub const fn first_phase(&self) -> Phase {
        if self.holds.is_empty() {
            self.sweep_start(SweepDirection::Up)
        } else {
            Phase::Hold { index: 0 }
        }
    }

    /// Phase that follows `phase`. Once sweeping, the sequence never leaves [`Phase::Sweep`].
    ///
    /// Ascending stops at the last step that does not pass `sweep_max`; descending then starts
    /// at `sweep_max` itself (and symmetrically at the low end).
    #[must_use]
    pub fn next_phase(&self, phase: Phase) -> Phase {
        match phase {
            Phase::Hold { index } => match index.checked_add(1) {
                Some(next) if next < self.holds.len() => Phase::Hold { index: next },
                _ => self.sweep_start(SweepDirection::Up),
            },
            Phase::Sweep {
                direction: SweepDirection::Up,
                pulse,
            } => match pulse.checked_add(self.sweep_step_us) {
                Some(next) if next <= self.sweep_max => Phase::Sweep {
                    direction: SweepDirection::Up,
                    pulse: next,
                },
                _ => self.sweep_start(SweepDirection::Down),
            },
            Phase::Sweep {
                direction: SweepDirection::Down,
                pulse,
            } => match pulse.checked_sub(self.sweep_step_us) {
                Some(next) if next >= self.sweep_min => Phase::Sweep {
                    direction: SweepDirection::Down,
                    pulse: next,
                },
                _ => self.sweep_start(SweepDirection::Up),
            },
        }
    }

    const fn sweep_start(&self, direction: SweepDirection) -> Phase {
        Phase::Sweep {
            direction,
            pulse: self.sweep_origin(direction),
        }
    }

    const fn sweep_origin(&self, direction: SweepDirection) -> PulseWidth {
        match direction {
            SweepDirection::Up => self.sweep_min,
            SweepDirection::Down => self.sweep_max,
        }
    }

    const fn sweep_target(&self, direction: SweepDirection) -> PulseWidth {
        match direction {
            SweepDirection::Up => self.sweep_max,
            SweepDirection::Down => self.sweep_min,
        }
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::DEMO
    }
}

// ============================================================================
// Phase
// ============================================================================

/// Direction of travel during the sweep.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, derive_more::Display)]
pub enum SweepDirection {
    /// Toward `sweep_max`.
    #[display("up")]
    Up,
    /// Toward `sweep_min`.
    #[display("down")]
    Down,
}

/// Where the controller is in its motion sequence. The next [`ServoController::step`]
/// writes the pulse this phase names.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Holding `profile.holds[index]`.
    Hold {
        /// Index into [`MotionProfile::holds`].
        index: usize,
    },
    /// Sweeping; terminal.
    Sweep {
        /// Current direction.
        direction: SweepDirection,
        /// Pulse written by the next step.
        pulse: PulseWidth,
    },
}

impl Phase {
    /// True once the controller has reached the endless sweep.
    #[must_use]
    pub const fn is_sweeping(self) -> bool {
        matches!(self, Self::Sweep { .. })
    }
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Progress marker emitted at each phase transition.
///
/// The [`Display`](core::fmt::Display) form is the human-readable line: `"180"`, `"90"`,
/// `"0"` for holds and `"Sweeping up: 500 us -> 2400 us"` for sweeps.
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display)]
pub enum Progress {
    /// A hold position was entered.
    #[display("{degrees}")]
    Hold {
        /// Angle being held.
        degrees: u16,
    },
    /// A sweep in one direction started.
    #[display("Sweeping {direction}: {from} -> {to}")]
    Sweep {
        /// Direction of the sweep.
        direction: SweepDirection,
        /// First pulse of the sweep.
        from: PulseWidth,
        /// Last pulse of the sweep.
        to: PulseWidth,
    },
}

/// Best-effort sink for [`Progress`] markers. Losing them never changes servo behavior.
pub trait Diagnostics {
    /// Report one progress marker.
    fn report(&mut self, progress: Progress);
}

/// No diagnostics.
impl Diagnostics for () {
    fn report(&mut self, _progress: Progress) {}
}

/// Prints progress markers with defmt.
#[cfg(not(feature = "host"))]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtDiagnostics;

#[cfg(not(feature = "host"))]
impl Diagnostics for DefmtDiagnostics {
    fn report(&mut self, progress: Progress) {
        match progress {
            Progress::Hold { degrees } => info!("{}", degrees),
            Progress::Sweep {
                direction: SweepDirection::Up,
                from,
                to,
            } => info!(
                "Sweeping up: {} us -> {} us",
                from.as_micros(),
                to.as_micros()
            ),
            Progress::Sweep {
                direction: SweepDirection::Down,
                from,
                to,
            } => info!(
                "Sweeping down: {} us -> {} us",
                from.as_micros(),
                to.as_micros()
            ),
        }
    }
}

// ============================================================================
// ServoController
// ============================================================================

/// Owns the servo's [`PwmChannel`] and plays a [`MotionProfile`] on it.
///
/// See the [module-level example](self) for usage.
pub struct ServoController<T, D, G = ()> {
    channel: PwmChannel<T>,
    delay: D,
    diagnostics: G,
    profile: MotionProfile,
    phase: Phase,
}

impl<T, D, G> ServoController<T, D, G>
where
    T: PwmTimer,
    D: DelayNs,
    G: Diagnostics,
{
    /// Configure the PWM channel on `timer` and get ready to play `profile`.
    ///
    /// # Errors
    ///
    /// Returns the channel's configuration error; nothing else can fail later.
    ///
    /// # Panics
    ///
    /// Panics if `profile.sweep_min` is not below `profile.sweep_max` or the step is zero.
    pub fn start(timer: T, delay: D, diagnostics: G, profile: MotionProfile) -> Result<Self> {
        assert!(
            profile.sweep_min < profile.sweep_max,
            "sweep_min must be less than sweep_max"
        );
        assert!(profile.sweep_step_us > 0, "sweep_step_us must be positive");
        let channel = PwmChannel::configure(timer)?;
        Ok(Self {
            channel,
            delay,
            diagnostics,
            profile,
            phase: profile.first_phase(),
        })
    }

    /// Write the current phase's pulse, wait, and advance. Returns the new phase.
    pub async fn step(&mut self) -> Phase {
        let (pulse, wait) = match self.phase {
            Phase::Hold { index } => {
                let Some(hold) = self.profile.holds.get(index).copied() else {
                    self.phase = self.profile.sweep_start(SweepDirection::Up);
                    return self.phase;
                };
                self.diagnostics.report(Progress::Hold {
                    degrees: hold.degrees,
                });
                (hold.pulse, self.profile.hold_duration)
            }
            Phase::Sweep { direction, pulse } => {
                if pulse == self.profile.sweep_origin(direction) {
                    self.diagnostics.report(Progress::Sweep {
                        direction,
                        from: pulse,
                        to: self.profile.sweep_target(direction),
                    });
                }
                (pulse, self.profile.sweep_step_delay)
            }
        };
        self.channel.set_duty_us(pulse);
        self.wait(wait).await;
        self.phase = self.profile.next_phase(self.phase);
        self.phase
    }

    /// Play the profile forever.
    pub async fn run(mut self) -> ! {
        loop {
            self.step().await;
        }
    }

    async fn wait(&mut self, duration: Duration) {
        // Waits longer than u32::MAX µs are split.
        let mut remaining = duration.as_micros();
        while remaining > 0 {
            let chunk = u32::try_from(remaining).unwrap_or(u32::MAX);
            self.delay.delay_us(chunk).await;
            remaining = remaining.saturating_sub(u64::from(chunk));
        }
    }

    /// Phase the next [`step`](Self::step) will play.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The PWM channel driving the servo.
    #[must_use]
    pub const fn channel(&self) -> &PwmChannel<T> {
        &self.channel
    }

    /// The profile being played.
    #[must_use]
    pub const fn profile(&self) -> &MotionProfile {
        &self.profile
    }
}
