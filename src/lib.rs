//! Hobby-servo sweep for the Raspberry Pi Pico 1 and 2.
//!
//! A [`PwmChannel`](pwm_channel::PwmChannel) sets one PWM output to 50 Hz with 1 µs ticks,
//! and a [`ServoController`](servo_controller::ServoController) plays a motion profile on it:
//! three timed holds, then an endless sweep between the servo's extremes.
//!
//! # Glossary
//!
//! - **PWM ([Pulse Width Modulation](https://en.wikipedia.org/wiki/Pulse-width_modulation)) Slices:** Pico 1 and Pico 2A have 8 slices (& 16 channels); Pico 2B has 12. These "slices"
//!   are unrelated Rust slices.
//! - **Tick:** one count of a slice's counter. Here one tick is one microsecond.
//! - **Clock divider:** factor between the system clock and the tick rate (125 on Pico 1, 150 on Pico 2).
#![cfg_attr(not(feature = "host"), no_std)]
#![cfg_attr(not(feature = "host"), no_main)]

// Compile-time checks: exactly one board must be selected (unless testing with host feature)
#[cfg(all(not(any(feature = "pico1", feature = "pico2")), not(feature = "host")))]
compile_error!("Must enable exactly one board feature: 'pico1' or 'pico2'");

#[cfg(all(feature = "pico1", feature = "pico2"))]
compile_error!("Cannot enable both 'pico1' and 'pico2' features simultaneously");

// Compile-time check: an architecture must be selected (unless testing with host feature)
#[cfg(all(not(feature = "arm"), not(feature = "host")))]
compile_error!("Must enable the 'arm' architecture feature");

mod error;
pub mod pwm_channel;
#[cfg(feature = "host")]
pub mod pwm_sim;
// These modules require embassy_rp and are excluded when testing on host
#[cfg(not(feature = "host"))]
pub mod rp_pwm;
pub mod servo_controller;

// Re-export error types and result (used throughout)
pub use crate::error::{Error, Result};
