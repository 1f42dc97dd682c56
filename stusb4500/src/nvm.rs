//! Cached image of the STUSB4500 customer configuration.
//!
//! The chip keeps its sink profiles and option bits in five 8-byte NVM
//! sectors. [`NvmImage`] is an in-memory copy of those sectors with typed
//! accessors for the fields this driver edits. Setters only touch the
//! cache; nothing reaches the chip until the whole image is committed with
//! [`Stusb4500::write_nvm`](crate::Stusb4500::write_nvm).

/// Number of customer-configuration sectors.
pub const SECTOR_COUNT: usize = 5;

/// Bytes per sector.
pub const SECTOR_SIZE: usize = 8;

/// One of the three programmable sink profiles (PDOs).
///
/// PDO1 is fixed at 5 V by the chip. The highest advertised profile wins
/// the negotiation when the source can supply it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PdoChannel {
    /// Profile 1, fixed at 5 V.
    Pdo1,
    /// Profile 2.
    Pdo2,
    /// Profile 3.
    Pdo3,
}

/// GPIO pin function selection (GPIO_CFG).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioMode {
    /// Software controlled through the GPIO_SW_GPIO register.
    SwCtrl = 0,
    /// Asserted during USB-C error recovery.
    ErrorRecovery = 1,
    /// Debug output.
    Debug = 2,
    /// Asserted when the negotiated current exceeds 1.5 A.
    SinkPower = 3,
}

/// POWER_OK pin behavior (POWER_OK_CFG).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigOkMode {
    /// Configuration 1: not used.
    Configuration1 = 0,
    /// Configuration 2: asserted when PDO2 has been negotiated.
    Configuration2 = 2,
    /// Configuration 3: asserted when PDO3 has been negotiated.
    Configuration3 = 3,
}

/// In-memory copy of the five customer-configuration sectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NvmImage {
    sectors: [[u8; SECTOR_SIZE]; SECTOR_COUNT],
}

impl NvmImage {
    /// An all-zero image, the state of a fresh cache before the first read.
    pub const fn zeroed() -> Self {
        Self {
            sectors: [[0; SECTOR_SIZE]; SECTOR_COUNT],
        }
    }

    /// Wrap raw sector contents, e.g. read back from a device.
    pub const fn from_sectors(sectors: [[u8; SECTOR_SIZE]; SECTOR_COUNT]) -> Self {
        Self { sectors }
    }

    /// Raw contents of one sector.
    pub fn sector(&self, index: usize) -> &[u8; SECTOR_SIZE] {
        &self.sectors[index]
    }

    pub(crate) fn sector_mut(&mut self, index: usize) -> &mut [u8; SECTOR_SIZE] {
        &mut self.sectors[index]
    }

    fn byte(&self, sector: usize, offset: usize) -> u8 {
        self.sectors[sector][offset]
    }

    fn update(&mut self, sector: usize, offset: usize, keep_mask: u8, bits: u8) {
        let byte = &mut self.sectors[sector][offset];
        *byte = (*byte & keep_mask) | bits;
    }

    /// Voltage of a sink profile in volts. PDO1 always reports 5 V.
    pub fn voltage(&self, channel: PdoChannel) -> f32 {
        let raw = match channel {
            PdoChannel::Pdo1 => return 5.0,
            PdoChannel::Pdo2 => u16::from(self.byte(4, 1) >> 6) | (u16::from(self.byte(4, 2)) << 2),
            PdoChannel::Pdo3 => (u16::from(self.byte(4, 4) & 0x03) << 8) | u16::from(self.byte(4, 3)),
        };
        f32::from(raw) / 20.0
    }

    /// Set the voltage of a sink profile, in 50 mV steps, clamped to the
    /// chip's 5..20 V range. PDO1 is fixed; setting it is a no-op.
    pub fn set_voltage(&mut self, channel: PdoChannel, volts: f32) {
        let raw = (volts.clamp(5.0, 20.0) * 20.0) as u16;
        match channel {
            PdoChannel::Pdo1 => {}
            PdoChannel::Pdo2 => {
                self.update(4, 1, 0x3F, ((raw & 0x03) as u8) << 6);
                self.sectors[4][2] = (raw >> 2) as u8;
            }
            PdoChannel::Pdo3 => {
                self.sectors[4][3] = raw as u8;
                self.update(4, 4, 0xFC, (raw >> 8) as u8 & 0x03);
            }
        }
    }

    /// Operating current of a sink profile in amps.
    pub fn current(&self, channel: PdoChannel) -> f32 {
        let code = match channel {
            PdoChannel::Pdo1 => self.byte(3, 2) >> 4,
            PdoChannel::Pdo2 => self.byte(3, 4) & 0x0F,
            PdoChannel::Pdo3 => self.byte(3, 5) >> 4,
        };
        decode_current(code)
    }

    /// Set the operating current of a sink profile.
    ///
    /// The chip stores current as a 4-bit code: 0.25 A steps from 0.5 A to
    /// 3.0 A, then 0.5 A steps up to 5.0 A. Values below 0.5 A encode as
    /// "flexible" (code 0), meaning the flex current applies instead.
    pub fn set_current(&mut self, channel: PdoChannel, amps: f32) {
        let code = encode_current(amps);
        match channel {
            PdoChannel::Pdo1 => self.update(3, 2, 0x0F, code << 4),
            PdoChannel::Pdo2 => self.update(3, 4, 0xF0, code),
            PdoChannel::Pdo3 => self.update(3, 5, 0x0F, code << 4),
        }
    }

    /// Upper voltage lockout in percent above nominal (5..20).
    pub fn upper_voltage_limit(&self, channel: PdoChannel) -> u8 {
        let field = match channel {
            PdoChannel::Pdo1 => self.byte(3, 3) >> 4,
            PdoChannel::Pdo2 => self.byte(3, 5) & 0x0F,
            PdoChannel::Pdo3 => self.byte(3, 6) >> 4,
        };
        field + 5
    }

    /// Set the upper voltage lockout in percent above nominal.
    pub fn set_upper_voltage_limit(&mut self, channel: PdoChannel, percent: u8) {
        let field = limit_field(percent);
        match channel {
            PdoChannel::Pdo1 => self.update(3, 3, 0x0F, field << 4),
            PdoChannel::Pdo2 => self.update(3, 5, 0xF0, field),
            PdoChannel::Pdo3 => self.update(3, 6, 0x0F, field << 4),
        }
    }

    /// Lower voltage lockout in percent below nominal. Fixed for PDO1.
    pub fn lower_voltage_limit(&self, channel: PdoChannel) -> u8 {
        let field = match channel {
            PdoChannel::Pdo1 => return 0,
            PdoChannel::Pdo2 => self.byte(3, 4) >> 4,
            PdoChannel::Pdo3 => self.byte(3, 6) & 0x0F,
        };
        field + 5
    }

    /// Set the lower voltage lockout in percent below nominal.
    /// PDO1 is fixed by hardware; setting it is a no-op.
    pub fn set_lower_voltage_limit(&mut self, channel: PdoChannel, percent: u8) {
        let field = limit_field(percent);
        match channel {
            PdoChannel::Pdo1 => {}
            PdoChannel::Pdo2 => self.update(3, 4, 0x0F, field << 4),
            PdoChannel::Pdo3 => self.update(3, 6, 0xF0, field),
        }
    }

    /// Flexible current in amps, used by profiles whose current code is 0.
    pub fn flex_current(&self) -> f32 {
        let raw = (u16::from(self.byte(4, 5) & 0x0F) << 6) | u16::from(self.byte(4, 4) >> 2);
        f32::from(raw) / 100.0
    }

    /// Set the flexible current, in 10 mA steps up to 5 A.
    pub fn set_flex_current(&mut self, amps: f32) {
        let raw = (amps.clamp(0.0, 5.0) * 100.0) as u16;
        self.update(4, 4, 0x03, ((raw & 0x3F) as u8) << 2);
        self.update(4, 5, 0xF0, (raw >> 6) as u8 & 0x0F);
    }

    /// Number of advertised sink profiles (1..3).
    pub fn pdo_count(&self) -> u8 {
        (self.byte(3, 2) >> 1) & 0x03
    }

    /// Set the number of advertised sink profiles, clamped to 1..3.
    pub fn set_pdo_count(&mut self, count: u8) {
        self.update(3, 2, !0x06, (count.clamp(1, 3) & 0x03) << 1);
    }

    /// SNK_UNCONS_POWER: an external power source is available.
    pub fn external_power(&self) -> bool {
        self.byte(3, 2) & 0x08 != 0
    }

    /// Set the external-power flag.
    pub fn set_external_power(&mut self, enabled: bool) {
        self.update(3, 2, !0x08, u8::from(enabled) << 3);
    }

    /// POWER_ONLY_ABOVE_5V: only enable VBUS after negotiating above 5 V.
    pub fn power_above_5v_only(&self) -> bool {
        self.byte(4, 6) & 0x08 != 0
    }

    /// Set the power-only-above-5V flag.
    pub fn set_power_above_5v_only(&mut self, enabled: bool) {
        self.update(4, 6, !0x08, u8::from(enabled) << 3);
    }

    /// REQ_SRC_CURRENT: request the source's advertised current instead of
    /// the sink's own operating current.
    pub fn request_source_current(&self) -> bool {
        self.byte(4, 6) & 0x10 != 0
    }

    /// Set the request-source-current flag.
    pub fn set_request_source_current(&mut self, enabled: bool) {
        self.update(4, 6, !0x10, u8::from(enabled) << 4);
    }

    /// Function of the GPIO pin.
    pub fn gpio_mode(&self) -> GpioMode {
        match (self.byte(1, 0) >> 4) & 0x03 {
            0 => GpioMode::SwCtrl,
            1 => GpioMode::ErrorRecovery,
            2 => GpioMode::Debug,
            _ => GpioMode::SinkPower,
        }
    }

    /// Select the function of the GPIO pin.
    pub fn set_gpio_mode(&mut self, mode: GpioMode) {
        self.update(1, 0, !0x30, (mode as u8) << 4);
    }

    /// Behavior of the POWER_OK pin.
    pub fn config_ok_gpio(&self) -> ConfigOkMode {
        match (self.byte(4, 6) >> 5) & 0x03 {
            2 => ConfigOkMode::Configuration2,
            3 => ConfigOkMode::Configuration3,
            _ => ConfigOkMode::Configuration1,
        }
    }

    /// Select the behavior of the POWER_OK pin.
    pub fn set_config_ok_gpio(&mut self, mode: ConfigOkMode) {
        self.update(4, 6, !0x60, (mode as u8) << 5);
    }
}

impl Default for NvmImage {
    fn default() -> Self {
        Self::zeroed()
    }
}

fn decode_current(code: u8) -> f32 {
    if code == 0 {
        0.0
    } else if code < 11 {
        f32::from(code) * 0.25 + 0.25
    } else {
        f32::from(code) * 0.50 - 2.50
    }
}

fn encode_current(amps: f32) -> u8 {
    if amps < 0.5 {
        0
    } else if amps <= 3.0 {
        (amps * 4.0) as u8 - 1
    } else {
        (amps * 2.0) as u8 + 5
    }
}

// Voltage lockout percentages are stored with a +5 % offset in a nibble.
fn limit_field(percent: u8) -> u8 {
    percent.clamp(5, 20) - 5
}
