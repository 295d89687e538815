//! Crate-wide error and result types.

/// Errors raised while bringing up the servo signal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, derive_more::Display, derive_more::Error)]
pub enum Error {
    /// The base clock cannot be divided down to one tick per microsecond.
    #[display("no PWM clock divider gives 1 MHz ticks from a {base_clock_hz} Hz base clock")]
    ClockDivider {
        /// Base clock frequency reported by the timer.
        base_clock_hz: u32,
    },
}

/// Result type used throughout the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;
