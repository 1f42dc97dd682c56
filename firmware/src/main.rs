#![no_std]
#![no_main]

use defmt::info;
use embassy_executor::Spawner;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

mod config;
mod config_resources;
mod led_pwm;
mod usb_pd;

use crate::config_resources::{
    AssignedResources, LedPwmResources, PdControllerResources, VoltageSwitchResources,
};

/// Terminal failure state: leave the board inert.
///
/// Nothing retries and no outputs are ever armed. A controller that cannot
/// be confirmed must not request power or light LEDs; recovery takes a
/// power cycle.
pub async fn halt() -> ! {
    loop {
        core::future::pending::<()>().await;
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let r = split_resources!(p);

    info!("Starting up...");

    // Give the STUSB4500 time to come out of power-on reset before probing.
    Timer::after_millis(500).await;

    // All configuration is sequential and one-shot: the PD profile first,
    // then the LED outputs. `configure` halts internally on failure, so the
    // outputs below are only ever armed with a confirmed controller.
    let _pd = usb_pd::configure(r.pd_controller, r.voltage_switch).await;

    let _leds = led_pwm::init(r.led_pwm);

    info!("Boot configuration complete.");

    // Nothing left to do until the next power cycle.
    loop {
        Timer::after_secs(1).await;
    }
}
