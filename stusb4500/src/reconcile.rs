//! One-shot reconciliation of the stored sink profile against a boot-time
//! target.
//!
//! Runs once at startup: derive the desired PDO2 voltage from a rail-select
//! input, compare it against what the controller already stores, and only
//! rewrite the configuration when they differ. A rewrite commits the whole
//! image and soft-resets the controller so the source renegotiates
//! immediately.

use embedded_hal_async::i2c::I2c;

use crate::nvm::{ConfigOkMode, GpioMode, PdoChannel};
use crate::{Error, Stusb4500};

/// Target voltage when the rail-select input is low.
pub const DEFAULT_VOLTAGE: f32 = 5.0;

// Fixed auxiliary fields of the committed profile.
const UPPER_VOLTAGE_LIMIT_PCT: u8 = 10;
const LOWER_VOLTAGE_LIMIT_PCT: u8 = 10;
const FLEX_CURRENT_A: f32 = 1.0;
const ADVERTISED_PDO_COUNT: u8 = 2;

/// Reconciler options.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReconcileConfig {
    /// Voltage requested when the rail-select input is high.
    pub elevated_rail_voltage: f32,
    /// Operating current advertised for either target.
    pub current_limit: f32,
    /// Mirror the chosen rail on the controller's software GPIO pin.
    pub drive_auxiliary_gpio: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            elevated_rail_voltage: 12.0,
            current_limit: 3.0,
            drive_auxiliary_gpio: true,
        }
    }
}

/// What a reconciliation pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The stored profile already matched; nothing was written.
    AlreadyConfigured,
    /// A new profile was committed and the controller reset.
    Updated,
}

/// Compare the cached PDO2 against the desired target and rewrite the
/// controller configuration if they differ.
///
/// The comparison is exact. Controller-reported values come from the same
/// fixed-point encoding the setters use, so a matching profile reads back
/// bit-identical; a tolerance band would only mask real mismatches.
pub async fn reconcile<I2C: I2c>(
    device: &mut Stusb4500<I2C>,
    config: &ReconcileConfig,
    switch_high: bool,
) -> Result<Outcome, Error<I2C::Error>> {
    let voltage = if switch_high {
        config.elevated_rail_voltage
    } else {
        DEFAULT_VOLTAGE
    };
    info!("Switch set to {}V", voltage);

    if config.drive_auxiliary_gpio {
        // Status indication on the controller's own GPIO pin, regardless of
        // whether the profile needs a rewrite.
        device.set_gpio(voltage == config.elevated_rail_voltage).await?;
    }

    let update = if device.config().voltage(PdoChannel::Pdo2) != voltage {
        info!("Voltage needs to be updated.");
        true
    } else if device.config().current(PdoChannel::Pdo2) != config.current_limit {
        info!("Current needs to be updated.");
        true
    } else {
        false
    };

    if !update {
        info!("STUSB4500 already configured.");
        return Ok(Outcome::AlreadyConfigured);
    }

    info!("Setting PDO2 to {}V, {}A", voltage, config.current_limit);
    let image = device.config_mut();
    image.set_pdo_count(ADVERTISED_PDO_COUNT);
    image.set_voltage(PdoChannel::Pdo2, voltage);
    image.set_upper_voltage_limit(PdoChannel::Pdo2, UPPER_VOLTAGE_LIMIT_PCT);
    image.set_lower_voltage_limit(PdoChannel::Pdo2, LOWER_VOLTAGE_LIMIT_PCT);
    image.set_current(PdoChannel::Pdo2, config.current_limit);
    image.set_flex_current(FLEX_CURRENT_A);
    image.set_external_power(true);
    image.set_config_ok_gpio(ConfigOkMode::Configuration2);
    image.set_gpio_mode(GpioMode::SwCtrl);
    image.set_power_above_5v_only(false);
    image.set_request_source_current(true);

    device.write_nvm().await?;
    device.soft_reset().await?;
    info!("STUSB4500 configured.");

    Ok(Outcome::Updated)
}
