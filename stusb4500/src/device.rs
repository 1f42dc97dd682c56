//! Register-level access to the STUSB4500.

use embedded_hal_async::i2c::I2c;

use crate::Error;
use crate::nvm::{NvmImage, SECTOR_COUNT, SECTOR_SIZE};

/// Default 7-bit I2C address of the STUSB4500.
pub const DEFAULT_ADDRESS: u8 = 0x28;

// Register map (the subset this driver touches).
const REG_PD_COMMAND_CTRL: u8 = 0x1A;
const REG_GPIO_SW_GPIO: u8 = 0x2D;
const REG_DEVICE_ID: u8 = 0x2F;
const REG_TX_HEADER_LOW: u8 = 0x51;
const REG_RW_BUFFER: u8 = 0x53;
const REG_FTP_CUST_PASSWORD: u8 = 0x95;
const REG_FTP_CTRL_0: u8 = 0x96;
const REG_FTP_CTRL_1: u8 = 0x97;

const DEVICE_ID: u8 = 0x25;
const FTP_CUST_PASSWORD: u8 = 0x47;

// FTP_CTRL_0 bits.
const FTP_CUST_PWR: u8 = 0x80;
const FTP_CUST_RST_N: u8 = 0x40;
const FTP_CUST_REQ: u8 = 0x10;
const FTP_CUST_SECT: u8 = 0x07;

// FTP_CTRL_1 opcodes.
const OPCODE_READ: u8 = 0x00;
const OPCODE_WRITE_PL: u8 = 0x01;
const OPCODE_WRITE_SER: u8 = 0x02;
const OPCODE_ERASE_SECTOR: u8 = 0x05;
const OPCODE_PROG_SECTOR: u8 = 0x06;
const OPCODE_SOFT_PROG_SECTOR: u8 = 0x07;

// All five customer sectors, as a WRITE_SER bit mask.
const ERASE_SECTOR_MASK: u8 = 0x1F;

// Low byte of a USB-PD soft reset message header.
const SOFT_RESET_HEADER: u8 = 0x0D;
const CMD_SEND_COMMAND: u8 = 0x26;

// The FTP controller answers within a few bus transactions; this budget is
// orders of magnitude above what hardware needs.
const NVM_POLL_ATTEMPTS: u32 = 1000;

/// An open session with an STUSB4500.
///
/// Constructing a session through [`Stusb4500::connect`] performs the
/// device-ID handshake and the initial NVM read, so holding a value of this
/// type proves the controller answered. All profile edits go through the
/// cached [`NvmImage`] and reach the chip only on [`Stusb4500::write_nvm`].
pub struct Stusb4500<I2C> {
    bus: I2C,
    address: u8,
    nvm: NvmImage,
}

impl<I2C: I2c> Stusb4500<I2C> {
    /// Connect at the default I2C address.
    pub async fn connect(bus: I2C) -> Result<Self, Error<I2C::Error>> {
        Self::connect_with_address(bus, DEFAULT_ADDRESS).await
    }

    /// Connect at a non-default address (ADDR pins strapped high).
    ///
    /// Verifies the device ID and reads the customer configuration into the
    /// local cache. Fails with [`Error::BadDeviceId`] if something other
    /// than an STUSB4500 answers.
    pub async fn connect_with_address(bus: I2C, address: u8) -> Result<Self, Error<I2C::Error>> {
        let mut device = Self {
            bus,
            address,
            nvm: NvmImage::zeroed(),
        };

        let id = device.read_register(REG_DEVICE_ID).await?;
        if id != DEVICE_ID {
            return Err(Error::BadDeviceId(id));
        }

        device.read_nvm().await?;
        Ok(device)
    }

    /// The cached customer configuration.
    pub fn config(&self) -> &NvmImage {
        &self.nvm
    }

    /// Mutable access to the cached customer configuration.
    pub fn config_mut(&mut self) -> &mut NvmImage {
        &mut self.nvm
    }

    /// Give the bus back, dropping the session.
    pub fn release(self) -> I2C {
        self.bus
    }

    /// Re-read the customer configuration from the chip into the cache,
    /// discarding any uncommitted edits.
    pub async fn read_nvm(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REG_FTP_CUST_PASSWORD, FTP_CUST_PASSWORD).await?;
        // Power-cycle the FTP controller.
        self.write_register(REG_FTP_CTRL_0, 0x00).await?;
        self.write_register(REG_FTP_CTRL_0, FTP_CUST_PWR | FTP_CUST_RST_N).await?;

        for sector in 0..SECTOR_COUNT as u8 {
            let data = self.read_sector(sector).await?;
            *self.nvm.sector_mut(usize::from(sector)) = data;
        }

        self.exit_test_mode().await
    }

    /// Commit the cached configuration: erase all five sectors, program the
    /// cache back, and leave test mode.
    ///
    /// Individual register writes inside the batch are not verified; the
    /// chip either takes the whole image or keeps its previous one.
    pub async fn write_nvm(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REG_FTP_CUST_PASSWORD, FTP_CUST_PASSWORD).await?;
        self.write_register(REG_RW_BUFFER, 0x00).await?;
        self.write_register(REG_FTP_CTRL_0, FTP_CUST_PWR | FTP_CUST_RST_N).await?;

        // Load the sector-erase mask, then soft-program and erase.
        self.write_register(REG_FTP_CTRL_1, (ERASE_SECTOR_MASK << 3) | OPCODE_WRITE_SER)
            .await?;
        self.request_operation(0).await?;
        self.write_register(REG_FTP_CTRL_1, OPCODE_SOFT_PROG_SECTOR).await?;
        self.request_operation(0).await?;
        self.write_register(REG_FTP_CTRL_1, OPCODE_ERASE_SECTOR).await?;
        self.request_operation(0).await?;

        for sector in 0..SECTOR_COUNT as u8 {
            self.write_sector(sector).await?;
        }

        self.exit_test_mode().await
    }

    /// Send a USB-PD soft reset, forcing renegotiation with the source
    /// using the currently stored profiles.
    pub async fn soft_reset(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REG_TX_HEADER_LOW, SOFT_RESET_HEADER).await?;
        self.write_register(REG_PD_COMMAND_CTRL, CMD_SEND_COMMAND).await
    }

    /// Drive the controller's GPIO pin. Only effective when the pin is in
    /// [`GpioMode::SwCtrl`](crate::GpioMode::SwCtrl).
    pub async fn set_gpio(&mut self, asserted: bool) -> Result<(), Error<I2C::Error>> {
        self.write_register(REG_GPIO_SW_GPIO, u8::from(asserted)).await
    }

    async fn read_sector(&mut self, sector: u8) -> Result<[u8; SECTOR_SIZE], Error<I2C::Error>> {
        self.write_register(REG_FTP_CTRL_0, FTP_CUST_PWR | FTP_CUST_RST_N).await?;
        self.write_register(REG_FTP_CTRL_1, OPCODE_READ).await?;
        self.request_operation(sector).await?;

        let mut data = [0; SECTOR_SIZE];
        self.bus
            .write_read(self.address, &[REG_RW_BUFFER], &mut data)
            .await?;
        Ok(data)
    }

    async fn write_sector(&mut self, sector: u8) -> Result<(), Error<I2C::Error>> {
        let mut frame = [0; SECTOR_SIZE + 1];
        frame[0] = REG_RW_BUFFER;
        frame[1..].copy_from_slice(self.nvm.sector(usize::from(sector)));
        self.bus.write(self.address, &frame).await?;

        self.write_register(REG_FTP_CTRL_0, FTP_CUST_PWR | FTP_CUST_RST_N).await?;
        self.write_register(REG_FTP_CTRL_1, OPCODE_WRITE_PL).await?;
        self.request_operation(0).await?;
        self.write_register(REG_FTP_CTRL_1, OPCODE_PROG_SECTOR).await?;
        self.request_operation(sector).await
    }

    // Kick off the loaded opcode for the given sector and wait for the FTP
    // controller to clear the request bit.
    async fn request_operation(&mut self, sector: u8) -> Result<(), Error<I2C::Error>> {
        self.write_register(
            REG_FTP_CTRL_0,
            FTP_CUST_PWR | FTP_CUST_RST_N | FTP_CUST_REQ | (sector & FTP_CUST_SECT),
        )
        .await?;

        for _ in 0..NVM_POLL_ATTEMPTS {
            if self.read_register(REG_FTP_CTRL_0).await? & FTP_CUST_REQ == 0 {
                return Ok(());
            }
        }
        Err(Error::NvmTimeout)
    }

    async fn exit_test_mode(&mut self) -> Result<(), Error<I2C::Error>> {
        self.write_register(REG_FTP_CTRL_0, FTP_CUST_RST_N).await?;
        self.write_register(REG_FTP_CTRL_1, 0x00).await?;
        self.write_register(REG_FTP_CUST_PASSWORD, 0x00).await
    }

    async fn read_register(&mut self, register: u8) -> Result<u8, Error<I2C::Error>> {
        let mut data = [0];
        self.bus
            .write_read(self.address, &[register], &mut data)
            .await?;
        Ok(data[0])
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), Error<I2C::Error>> {
        self.bus.write(self.address, &[register, value]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_bus::MockBus;
    use crate::nvm::PdoChannel;

    #[tokio::test]
    async fn connect_reads_stored_profile_into_cache() {
        let bus = MockBus::with_profile(9.0, 2.0);
        let device = Stusb4500::connect(bus).await.unwrap();

        assert_eq!(device.config().voltage(PdoChannel::Pdo2), 9.0);
        assert_eq!(device.config().current(PdoChannel::Pdo2), 2.0);
    }

    #[tokio::test]
    async fn connect_rejects_unknown_device() {
        let bus = MockBus::with_profile(5.0, 3.0);
        bus.set_device_id(0x90);

        let error = match Stusb4500::connect(bus.clone()).await {
            Err(error) => error,
            Ok(_) => panic!("handshake should have failed"),
        };
        assert_eq!(error, Error::BadDeviceId(0x90));

        // The NVM is never unlocked when the handshake fails.
        assert_eq!(bus.password_writes(), 0);
    }

    #[tokio::test]
    async fn write_nvm_erases_and_programs_all_sectors() {
        let bus = MockBus::with_profile(5.0, 3.0);
        let mut device = Stusb4500::connect(bus.clone()).await.unwrap();

        device.config_mut().set_voltage(PdoChannel::Pdo2, 15.0);
        device.write_nvm().await.unwrap();

        assert!(bus.erased());
        assert_eq!(bus.programmed_sectors(), SECTOR_COUNT);
        assert_eq!(bus.image().voltage(PdoChannel::Pdo2), 15.0);
        // Test mode left and password cleared after the batch.
        assert!(bus.locked());
    }

    #[tokio::test]
    async fn soft_reset_sends_header_then_command() {
        let bus = MockBus::with_profile(5.0, 3.0);
        let mut device = Stusb4500::connect(bus.clone()).await.unwrap();
        device.soft_reset().await.unwrap();

        assert_eq!(bus.tx_header_writes(), vec![SOFT_RESET_HEADER]);
        assert_eq!(bus.command_writes(), vec![CMD_SEND_COMMAND]);
    }
}
