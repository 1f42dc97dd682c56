//! LED rail PWM outputs.
//!
//! The five strip channels are brought up at a fixed frequency and parked
//! at zero duty. No modulation happens after boot.

use embassy_rp::pwm::{Config, Pwm};
use fixed::traits::ToFixed;

use crate::config::{PWM_CLOCK_DIVIDER, PWM_TOP};
use crate::config_resources::LedPwmResources;

/// The five strip channels. Dropping these would release the slices, so the
/// caller keeps the struct alive for as long as the rail is powered.
pub struct LedChannels<'d> {
    pub red: Pwm<'d>,
    pub green: Pwm<'d>,
    pub blue: Pwm<'d>,
    pub warm_white: Pwm<'d>,
    pub cold_white: Pwm<'d>,
}

pub fn init(r: LedPwmResources) -> LedChannels<'static> {
    let config = channel_config();

    LedChannels {
        red: Pwm::new_output_a(r.red_slice, r.red_pin, config.clone()),
        green: Pwm::new_output_a(r.green_slice, r.green_pin, config.clone()),
        blue: Pwm::new_output_a(r.blue_slice, r.blue_pin, config.clone()),
        warm_white: Pwm::new_output_a(r.warm_white_slice, r.warm_white_pin, config.clone()),
        cold_white: Pwm::new_output_a(r.cold_white_slice, r.cold_white_pin, config.clone()),
    }
}

fn channel_config() -> Config {
    let mut config = Config::default();
    config.divider = PWM_CLOCK_DIVIDER.to_fixed();
    config.top = PWM_TOP;
    // Zero duty on both outputs, the channels start dark.
    config.compare_a = 0;
    config.compare_b = 0;
    config
}
