//! Host stand-ins for the PWM hardware and the delay, sharing one simulated clock.
//!
//! [`SimPwm`] records every register write with its simulated time and can reconstruct the
//! waveform: the period, and the high time of any period. [`SimDelay`] advances the clock
//! instead of sleeping. Handles are cheap clones over shared state, so a test can keep one
//! while the controller owns another.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embassy_futures::yield_now;
use embedded_hal_async::delay::DelayNs;

use crate::pwm_channel::{ClockDivider, PwmTimer};
use crate::servo_controller::{Diagnostics, Progress};

const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Simulated monotonic time in nanoseconds, starting at 0.
#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    /// A clock at time 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in nanoseconds.
    #[must_use]
    pub fn now_ns(&self) -> u64 {
        self.0.get()
    }

    /// Move the clock forward.
    pub fn advance_ns(&self, nanos: u64) {
        self.0.set(self.0.get().saturating_add(nanos));
    }
}

/// A register-level change made through [`PwmTimer`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PwmEvent {
    /// Period and divider were set.
    Configured {
        /// Period in ticks.
        period_ticks: u16,
        /// Clock divider.
        divider: ClockDivider,
    },
    /// Output gated on or off.
    Enabled(bool),
    /// Compare value written.
    Duty(u16),
}

/// A [`PwmEvent`] stamped with the simulated time it happened.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TimedEvent {
    /// Simulated time in nanoseconds.
    pub at_ns: u64,
    /// What changed.
    pub event: PwmEvent,
}

/// Simulated PWM slice. Compare writes are double-buffered like the RP hardware: a value
/// takes effect at the first period boundary at or after the write.
#[derive(Clone, Debug)]
pub struct SimPwm {
    pin: u8,
    base_clock_hz: u32,
    clock: SimClock,
    events: Rc<RefCell<Vec<TimedEvent>>>,
}

impl SimPwm {
    /// A simulated PWM output on `pin` fed by `base_clock_hz`.
    #[must_use]
    pub fn new(pin: u8, base_clock_hz: u32, clock: &SimClock) -> Self {
        Self {
            pin,
            base_clock_hz,
            clock: clock.clone(),
            events: Rc::default(),
        }
    }

    fn record(&self, event: PwmEvent) {
        self.events.borrow_mut().push(TimedEvent {
            at_ns: self.clock.now_ns(),
            event,
        });
    }

    /// Every event so far, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<TimedEvent> {
        self.events.borrow().clone()
    }

    /// Every compare value written, oldest first.
    #[must_use]
    pub fn duty_writes(&self) -> Vec<u16> {
        self.timed_duty_writes()
            .into_iter()
            .map(|(_, ticks)| ticks)
            .collect()
    }

    /// Every compare value written, with the time of the write.
    #[must_use]
    pub fn timed_duty_writes(&self) -> Vec<(u64, u16)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|timed| match timed.event {
                PwmEvent::Duty(ticks) => Some((timed.at_ns, ticks)),
                _ => None,
            })
            .collect()
    }

    /// Whether the output is currently running.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|timed| match timed.event {
                PwmEvent::Enabled(enabled) => Some(enabled),
                _ => None,
            })
            .unwrap_or(false)
    }

    fn configured(&self) -> Option<(u16, ClockDivider)> {
        self.events
            .borrow()
            .iter()
            .rev()
            .find_map(|timed| match timed.event {
                PwmEvent::Configured {
                    period_ticks,
                    divider,
                } => Some((period_ticks, divider)),
                _ => None,
            })
    }

    /// Time the counter last started, i.e. the most recent enable.
    #[must_use]
    pub fn started_at_ns(&self) -> Option<u64> {
        let events = self.events.borrow();
        let last = events.last()?;
        if last.event == PwmEvent::Enabled(false) {
            return None;
        }
        events
            .iter()
            .rev()
            .find(|timed| timed.event == PwmEvent::Enabled(true))
            .map(|timed| timed.at_ns)
    }

    /// Length of `ticks` counter ticks in nanoseconds under the current divider.
    fn ticks_to_ns(&self, ticks: u16, divider: ClockDivider) -> u64 {
        let sixteenth_ticks = u128::from(ticks) * u128::from(divider.to_bits());
        let nanos = sixteenth_ticks * NANOS_PER_SECOND / (16 * u128::from(self.base_clock_hz));
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    /// Signal period in nanoseconds, once configured.
    #[must_use]
    pub fn period_ns(&self) -> Option<u64> {
        let (period_ticks, divider) = self.configured()?;
        Some(self.ticks_to_ns(period_ticks, divider))
    }

    /// Start time of the first period that begins at or after `at_ns`.
    #[must_use]
    pub fn next_period_start_ns(&self, at_ns: u64) -> Option<u64> {
        let started = self.started_at_ns()?;
        let period = self.period_ns()?;
        if at_ns <= started {
            return Some(started);
        }
        let elapsed = at_ns - started;
        let periods = elapsed.div_ceil(period);
        Some(started + periods * period)
    }

    /// High time of the period starting at `period_start_ns`, in nanoseconds.
    ///
    /// Uses the last compare value written at or before the period start. Values at or above
    /// the period keep the output high for the whole period.
    #[must_use]
    pub fn high_time_ns(&self, period_start_ns: u64) -> Option<u64> {
        let (period_ticks, divider) = self.configured()?;
        let compare = self
            .timed_duty_writes()
            .into_iter()
            .take_while(|(at_ns, _)| *at_ns <= period_start_ns)
            .last()
            .map_or(0, |(_, ticks)| ticks);
        Some(self.ticks_to_ns(compare.min(period_ticks), divider))
    }
}

impl PwmTimer for SimPwm {
    fn pin(&self) -> u8 {
        self.pin
    }

    fn base_clock_hz(&self) -> u32 {
        self.base_clock_hz
    }

    fn configure(&mut self, period_ticks: u16, divider: ClockDivider) {
        self.record(PwmEvent::Configured {
            period_ticks,
            divider,
        });
    }

    fn set_duty(&mut self, ticks: u16) {
        self.record(PwmEvent::Duty(ticks));
    }

    fn enable(&mut self, enabled: bool) {
        self.record(PwmEvent::Enabled(enabled));
    }
}

/// Delay that advances a [`SimClock`] and then yields once, so other futures can observe time.
#[derive(Clone, Debug)]
pub struct SimDelay {
    clock: SimClock,
}

impl SimDelay {
    /// A delay driving `clock`.
    #[must_use]
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for SimDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(u64::from(ns));
        yield_now().await;
    }
}

/// Diagnostics sink that keeps every [`Progress`] marker.
#[derive(Clone, Debug, Default)]
pub struct RecordingDiagnostics(Rc<RefCell<Vec<Progress>>>);

impl RecordingDiagnostics {
    /// An empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers reported so far, oldest first.
    #[must_use]
    pub fn progress(&self) -> Vec<Progress> {
        self.0.borrow().clone()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&mut self, progress: Progress) {
        self.0.borrow_mut().push(progress);
    }
}
