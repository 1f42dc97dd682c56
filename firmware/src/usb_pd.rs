//! Boot-time STUSB4500 profile setup.

use defmt::{error, info};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{self, I2c, InterruptHandler};
use embassy_rp::peripherals::I2C0;
use stusb4500::{Outcome, ReconcileConfig, Stusb4500, reconcile};

use crate::config::{CURRENT_LIMIT_A, ELEVATED_RAIL_VOLTAGE, I2C_FREQUENCY_HZ};
use crate::config_resources::{PdControllerResources, VoltageSwitchResources};
use crate::halt;

bind_interrupts!(struct Irqs {
    I2C0_IRQ => InterruptHandler<I2C0>;
});

/// Pins and the controller session that must stay alive after setup.
pub struct PdController<'d> {
    _session: Stusb4500<I2c<'d, I2C0, i2c::Async>>,
    _reset: Output<'d>,
}

/// Connect to the STUSB4500 and reconcile its stored PDO2 against the rail
/// selected by the switch. Halts the system if the controller does not
/// answer or the commit fails; no outputs are armed in that case.
pub async fn configure(
    r: PdControllerResources,
    sw: VoltageSwitchResources,
) -> PdController<'static> {
    // Sampled once per boot; there is no debouncing and no re-sampling.
    let switch = Input::new(sw.pin, Pull::Up);
    let switch_high = switch.is_high();

    // Keep the controller's reset line low so it stays enabled.
    let reset = Output::new(r.reset, Level::Low);

    let mut bus_config = i2c::Config::default();
    bus_config.frequency = I2C_FREQUENCY_HZ;
    let bus = I2c::new_async(r.i2c, r.scl, r.sda, Irqs, bus_config);

    info!("Configuring STUSB4500...");
    let mut session = match Stusb4500::connect(bus).await {
        Ok(session) => session,
        Err(e) => {
            error!("Cannot connect to STUSB4500: {}", e);
            halt().await
        }
    };

    let options = ReconcileConfig {
        elevated_rail_voltage: ELEVATED_RAIL_VOLTAGE,
        current_limit: CURRENT_LIMIT_A,
        drive_auxiliary_gpio: true,
    };
    match reconcile(&mut session, &options, switch_high).await {
        Ok(Outcome::Updated) => info!("New profile committed, renegotiating."),
        Ok(Outcome::AlreadyConfigured) => {}
        Err(e) => {
            error!("STUSB4500 configuration failed: {}", e);
            halt().await
        }
    }

    PdController {
        _session: session,
        _reset: reset,
    }
}
