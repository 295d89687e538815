#![allow(missing_docs)]
//! Host-level tests for PWM channel timing.

use embedded_hal::pwm::SetDutyCycle;
use pico_servo_sweep::{
    Error,
    pwm_channel::{ClockDivider, PERIOD_TICKS, PulseWidth, PwmChannel, TICK_HZ},
    pwm_sim::{PwmEvent, SimClock, SimPwm},
};

const PICO1_CLOCK_HZ: u32 = 125_000_000;
const PICO2_CLOCK_HZ: u32 = 150_000_000;
const SERVO_PIN: u8 = 22;

fn sim(base_clock_hz: u32) -> (SimClock, SimPwm) {
    let clock = SimClock::new();
    let pwm = SimPwm::new(SERVO_PIN, base_clock_hz, &clock);
    (clock, pwm)
}

#[test]
fn divider_is_125_at_125_mhz() {
    let divider = ClockDivider::for_microsecond_ticks(PICO1_CLOCK_HZ).unwrap();
    assert_eq!(divider.integer(), 125);
    assert_eq!(divider.fraction(), 0);
    assert_eq!(divider.to_bits(), 125 << 4);
}

#[test]
fn divider_follows_the_base_clock() {
    let divider = ClockDivider::for_microsecond_ticks(PICO2_CLOCK_HZ).unwrap();
    assert_eq!((divider.integer(), divider.fraction()), (150, 0));

    // 125.5 MHz -> 125 + 8/16
    let divider = ClockDivider::for_microsecond_ticks(125_500_000).unwrap();
    assert_eq!((divider.integer(), divider.fraction()), (125, 8));
}

#[test]
fn divider_rejects_clocks_outside_the_register_range() {
    assert_eq!(
        ClockDivider::for_microsecond_ticks(400_000),
        Err(Error::ClockDivider {
            base_clock_hz: 400_000
        })
    );
    assert_eq!(
        ClockDivider::for_microsecond_ticks(300_000_000),
        Err(Error::ClockDivider {
            base_clock_hz: 300_000_000
        })
    );
    assert!(ClockDivider::for_microsecond_ticks(255_000_000).is_ok());
}

#[test]
fn clock_divider_error_message_names_the_clock() {
    let err = ClockDivider::for_microsecond_ticks(0).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no PWM clock divider gives 1 MHz ticks from a 0 Hz base clock"
    );
}

#[test]
fn configure_disables_sets_timing_zeroes_duty_then_enables() {
    let (_clock, pwm) = sim(PICO1_CLOCK_HZ);
    let channel = PwmChannel::configure(pwm.clone()).unwrap();

    let events: Vec<PwmEvent> = pwm.events().into_iter().map(|timed| timed.event).collect();
    assert_eq!(
        events,
        [
            PwmEvent::Enabled(false),
            PwmEvent::Configured {
                period_ticks: PERIOD_TICKS,
                divider: ClockDivider::for_microsecond_ticks(PICO1_CLOCK_HZ).unwrap(),
            },
            PwmEvent::Duty(0),
            PwmEvent::Enabled(true),
        ]
    );

    let config = channel.config();
    assert_eq!(config.pin, SERVO_PIN);
    assert_eq!(config.period_ticks, 20_000);
    assert_eq!(config.tick_hz, TICK_HZ);
    assert_eq!(config.divider.integer(), 125);
    assert!(config.enabled);
    assert_eq!(channel.duty(), PulseWidth::from_micros(0));
    assert!(pwm.is_enabled());
}

#[test]
fn configure_fails_without_touching_the_timer() {
    let (_clock, pwm) = sim(500_000);
    let result = PwmChannel::configure(pwm.clone());
    assert!(matches!(result, Err(Error::ClockDivider { .. })));
    assert!(pwm.events().is_empty());
}

#[test]
fn period_is_20_ms_on_both_boards() {
    for base_clock_hz in [PICO1_CLOCK_HZ, PICO2_CLOCK_HZ] {
        let (_clock, pwm) = sim(base_clock_hz);
        let _channel = PwmChannel::configure(pwm.clone()).unwrap();
        assert_eq!(pwm.period_ns(), Some(20_000_000), "{base_clock_hz} Hz");
    }
}

#[test]
fn period_does_not_change_with_duty() {
    let (clock, pwm) = sim(PICO1_CLOCK_HZ);
    let mut channel = PwmChannel::configure(pwm.clone()).unwrap();
    for micros in [500, 1_470, 2_400, 0, 19_999] {
        clock.advance_ns(7_000_000);
        channel.set_duty_us(PulseWidth::from_micros(micros));
        assert_eq!(pwm.period_ns(), Some(20_000_000));
    }
    assert_eq!(channel.config().period_ticks, PERIOD_TICKS);
}

#[test]
fn line_is_low_until_the_first_duty_update() {
    let (_clock, pwm) = sim(PICO1_CLOCK_HZ);
    let _channel = PwmChannel::configure(pwm.clone()).unwrap();
    let start = pwm.started_at_ns().unwrap();
    assert_eq!(pwm.high_time_ns(start), Some(0));
    assert_eq!(pwm.high_time_ns(start + 20_000_000), Some(0));
}

#[test]
fn next_full_period_reflects_each_write() {
    let (clock, pwm) = sim(PICO1_CLOCK_HZ);
    let mut channel = PwmChannel::configure(pwm.clone()).unwrap();

    // Mid-period writes show up at the following boundary, whatever came before.
    for micros in [1_500, 2_400, 500, 501, 1_470] {
        clock.advance_ns(3_000_000);
        let written_at = clock.now_ns();
        channel.set_duty_us(PulseWidth::from_micros(micros));

        let boundary = pwm.next_period_start_ns(written_at).unwrap();
        assert!(boundary - written_at <= 20_000_000);
        assert_eq!(
            pwm.high_time_ns(boundary),
            Some(u64::from(micros) * 1_000),
            "{micros} us"
        );
        clock.advance_ns(boundary - written_at + 20_000_000);
    }
}

#[test]
fn write_before_a_boundary_does_not_change_the_running_period() {
    let (clock, pwm) = sim(PICO1_CLOCK_HZ);
    let mut channel = PwmChannel::configure(pwm.clone()).unwrap();
    channel.set_duty_us(PulseWidth::DEGREES_0);

    clock.advance_ns(25_000_000);
    channel.set_duty_us(PulseWidth::DEGREES_180);

    // Period 1 (20..40 ms) latched 500 us at 20 ms; period 2 latches 2400 us.
    assert_eq!(pwm.high_time_ns(20_000_000), Some(500_000));
    assert_eq!(pwm.high_time_ns(40_000_000), Some(2_400_000));
}

#[test]
fn out_of_range_duty_is_written_unchanged_and_saturates() {
    let (clock, pwm) = sim(PICO1_CLOCK_HZ);
    let mut channel = PwmChannel::configure(pwm.clone()).unwrap();
    clock.advance_ns(1_000);
    channel.set_duty_us(PulseWidth::from_micros(25_000));

    assert_eq!(pwm.duty_writes().last(), Some(&25_000));
    assert_eq!(channel.duty().as_micros(), 25_000);
    assert_eq!(pwm.high_time_ns(20_000_000), Some(20_000_000));
}

#[test]
fn reconfigure_matches_a_single_configure() {
    let (_clock, once_pwm) = sim(PICO1_CLOCK_HZ);
    let once = PwmChannel::configure(once_pwm.clone()).unwrap();

    let (clock, twice_pwm) = sim(PICO1_CLOCK_HZ);
    let mut twice = PwmChannel::configure(twice_pwm.clone()).unwrap();
    twice.set_duty_us(PulseWidth::DEGREES_90);
    clock.advance_ns(1_000_000);
    twice.reconfigure().unwrap();

    assert_eq!(twice.config(), once.config());
    assert_eq!(twice.duty(), once.duty());
    assert!(twice_pwm.is_enabled());
    assert_eq!(twice_pwm.period_ns(), once_pwm.period_ns());
    assert_eq!(twice_pwm.duty_writes(), [0, 1_470, 0]);

    // Still usable afterwards.
    twice.set_duty_us(PulseWidth::DEGREES_180);
    assert_eq!(twice_pwm.duty_writes().last(), Some(&2_400));
}

#[test]
fn set_duty_cycle_maps_to_microseconds() {
    let (_clock, pwm) = sim(PICO1_CLOCK_HZ);
    let mut channel = PwmChannel::configure(pwm.clone()).unwrap();

    assert_eq!(channel.max_duty_cycle(), 20_000);
    channel.set_duty_cycle_percent(50).unwrap();
    assert_eq!(channel.duty(), PulseWidth::from_micros(10_000));
    channel.set_duty_cycle(1_470).unwrap();
    assert_eq!(pwm.duty_writes().last(), Some(&1_470));
}

#[test]
fn pulse_width_displays_microseconds() {
    assert_eq!(PulseWidth::DEGREES_0.to_string(), "500 us");
    assert_eq!(PulseWidth::DEGREES_90.as_micros(), 1_470);
    assert_eq!(PulseWidth::DEGREES_180.as_micros(), 2_400);
    assert_eq!(PulseWidth::from_micros(u16::MAX).checked_add(1), None);
    assert_eq!(PulseWidth::from_micros(0).checked_sub(1), None);
}
