//! Hold a servo on GPIO 22 at 180°, 90° and 0° for 5 s each, then sweep it back and forth forever.
#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use embassy_executor::Spawner;
use embassy_time::Delay;
use pico_servo_sweep::{
    Result,
    rp_pwm::RpPwm,
    servo_controller::{DefmtDiagnostics, MotionProfile, ServoController},
};
use {defmt::info, defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    // GPIO 22 -> (22 / 2) % 8 = slice 3, channel A
    info!("Starting servo sweep (GPIO 22)");
    let pwm = RpPwm::new(p.PIN_22, p.PWM_SLICE3);
    let controller = ServoController::start(pwm, Delay, DefmtDiagnostics, MotionProfile::DEMO)?;

    controller.run().await
}
