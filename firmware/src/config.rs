// Build-time settings for the LED strip controller.

/// Voltage requested from the charger when the rail-select switch is high.
pub const ELEVATED_RAIL_VOLTAGE: f32 = 12.0; // V

/// Operating current advertised for either rail.
pub const CURRENT_LIMIT_A: f32 = 3.0; // A

/// Hard ceiling for the configurable rail; the strip does not tolerate more.
pub const MAX_RAIL_VOLTAGE: f32 = 15.0; // V

// The rail voltage is fixed at build time, so the safety check is too.
const _: () = assert!(ELEVATED_RAIL_VOLTAGE <= MAX_RAIL_VOLTAGE);

pub const I2C_FREQUENCY_HZ: u32 = 100_000;

// 8-bit PWM at 5 kHz: 125 MHz / (97.65625 * 256).
pub const PWM_TOP: u16 = 255;
pub const PWM_CLOCK_DIVIDER: f32 = 97.656_25;
