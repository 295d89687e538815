//! Same motion as `servo_sweep`, without progress output.
#![no_std]
#![no_main]
#![cfg(not(feature = "host"))]

use core::{convert::Infallible, panic};
use embassy_executor::Spawner;
use embassy_time::Delay;
use pico_servo_sweep::{
    Result,
    rp_pwm::RpPwm,
    servo_controller::{MotionProfile, ServoController},
};
use {defmt_rtt as _, panic_probe as _};

#[embassy_executor::main]
async fn main(spawner: Spawner) -> ! {
    let err = inner_main(spawner).await.unwrap_err();
    panic!("{err}");
}

async fn inner_main(_spawner: Spawner) -> Result<Infallible> {
    let p = embassy_rp::init(Default::default());

    let pwm = RpPwm::new(p.PIN_22, p.PWM_SLICE3);
    let controller = ServoController::start(pwm, Delay, (), MotionProfile::DEMO)?;

    controller.run().await
}
