//! A scripted stand-in for the chip, used by the unit tests.
//!
//! Emulates just enough of the STUSB4500 register interface for the driver
//! to run against: device ID probe, FTP sector reads and writes, the soft
//! reset command registers and the software-controlled GPIO register. The
//! state sits behind a shared handle so tests can inspect bus traffic after
//! the driver has taken ownership of the bus.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal_async::i2c::{ErrorKind, ErrorType, I2c, Operation};

use crate::nvm::{NvmImage, PdoChannel, SECTOR_COUNT, SECTOR_SIZE};

const DEVICE_ID: u8 = 0x25;

const REG_PD_COMMAND_CTRL: u8 = 0x1A;
const REG_GPIO_SW_GPIO: u8 = 0x2D;
const REG_DEVICE_ID: u8 = 0x2F;
const REG_TX_HEADER_LOW: u8 = 0x51;
const REG_RW_BUFFER: u8 = 0x53;
const REG_FTP_CUST_PASSWORD: u8 = 0x95;
const REG_FTP_CTRL_0: u8 = 0x96;
const REG_FTP_CTRL_1: u8 = 0x97;

const FTP_CUST_REQ: u8 = 0x10;
const FTP_CUST_SECT: u8 = 0x07;

const OPCODE_READ: u8 = 0x00;
const OPCODE_WRITE_PL: u8 = 0x01;
const OPCODE_ERASE_SECTOR: u8 = 0x05;
const OPCODE_PROG_SECTOR: u8 = 0x06;

struct Chip {
    device_id: u8,
    nvm: [[u8; SECTOR_SIZE]; SECTOR_COUNT],
    password: u8,
    ctrl0: u8,
    ctrl1: u8,
    selected_sector: usize,
    rw_buffer: [u8; SECTOR_SIZE],
    load_buffer: [u8; SECTOR_SIZE],
    pointer: u8,

    erased: bool,
    programmed_sectors: usize,
    password_writes: usize,
    gpio_writes: Vec<u8>,
    tx_header_writes: Vec<u8>,
    command_writes: Vec<u8>,
}

impl Chip {
    fn write(&mut self, bytes: &[u8]) {
        let register = bytes[0];
        self.pointer = register;
        let Some(&value) = bytes.get(1) else {
            // Bare register pointer write, e.g. the address phase of a
            // write-read. Nothing to latch.
            return;
        };

        match register {
            REG_FTP_CUST_PASSWORD => {
                self.password = value;
                self.password_writes += 1;
            }
            REG_FTP_CTRL_0 => {
                self.ctrl0 = value;
                if value & FTP_CUST_REQ != 0 {
                    self.execute();
                }
            }
            REG_FTP_CTRL_1 => self.ctrl1 = value,
            REG_RW_BUFFER => {
                let data = &bytes[1..];
                self.rw_buffer[..data.len()].copy_from_slice(data);
            }
            REG_GPIO_SW_GPIO => self.gpio_writes.push(value),
            REG_TX_HEADER_LOW => self.tx_header_writes.push(value),
            REG_PD_COMMAND_CTRL => self.command_writes.push(value),
            _ => {}
        }
    }

    // An FTP request was posted: run the loaded opcode and clear REQ.
    fn execute(&mut self) {
        let sector = usize::from(self.ctrl0 & FTP_CUST_SECT);
        match self.ctrl1 & 0x07 {
            OPCODE_READ => self.selected_sector = sector,
            OPCODE_WRITE_PL => self.load_buffer = self.rw_buffer,
            OPCODE_ERASE_SECTOR => {
                let mask = self.ctrl1 >> 3;
                for (index, data) in self.nvm.iter_mut().enumerate() {
                    if mask & (1 << index) != 0 {
                        *data = [0xFF; SECTOR_SIZE];
                    }
                }
                self.erased = true;
            }
            OPCODE_PROG_SECTOR => {
                self.nvm[sector] = self.load_buffer;
                self.programmed_sectors += 1;
            }
            _ => {}
        }
        self.ctrl0 &= !FTP_CUST_REQ;
    }

    fn read(&mut self, buffer: &mut [u8]) {
        match self.pointer {
            REG_DEVICE_ID => buffer[0] = self.device_id,
            REG_FTP_CTRL_0 => buffer[0] = self.ctrl0,
            REG_RW_BUFFER => {
                buffer.copy_from_slice(&self.nvm[self.selected_sector][..buffer.len()]);
            }
            _ => buffer.fill(0),
        }
    }
}

/// Shared-handle mock I2C bus with an emulated STUSB4500 behind it.
#[derive(Clone)]
pub struct MockBus {
    chip: Rc<RefCell<Chip>>,
}

impl MockBus {
    /// A mock chip whose NVM holds the given image.
    pub fn new(image: NvmImage) -> Self {
        let mut nvm = [[0; SECTOR_SIZE]; SECTOR_COUNT];
        for (index, sector) in nvm.iter_mut().enumerate() {
            *sector = *image.sector(index);
        }
        Self {
            chip: Rc::new(RefCell::new(Chip {
                device_id: DEVICE_ID,
                nvm,
                password: 0,
                ctrl0: 0,
                ctrl1: 0,
                selected_sector: 0,
                rw_buffer: [0; SECTOR_SIZE],
                load_buffer: [0; SECTOR_SIZE],
                pointer: 0,
                erased: false,
                programmed_sectors: 0,
                password_writes: 0,
                gpio_writes: Vec::new(),
                tx_header_writes: Vec::new(),
                command_writes: Vec::new(),
            })),
        }
    }

    /// A mock chip storing the given PDO2 voltage and current.
    pub fn with_profile(voltage: f32, current: f32) -> Self {
        let mut image = NvmImage::zeroed();
        image.set_pdo_count(2);
        image.set_voltage(PdoChannel::Pdo2, voltage);
        image.set_current(PdoChannel::Pdo2, current);
        Self::new(image)
    }

    /// Change the ID the chip answers the handshake with.
    pub fn set_device_id(&self, id: u8) {
        self.chip.borrow_mut().device_id = id;
    }

    /// Decoded view of the NVM as the chip now stores it.
    pub fn image(&self) -> NvmImage {
        NvmImage::from_sectors(self.chip.borrow().nvm)
    }

    /// Whether an NVM erase cycle happened.
    pub fn erased(&self) -> bool {
        self.chip.borrow().erased
    }

    /// Number of sector program operations performed.
    pub fn programmed_sectors(&self) -> usize {
        self.chip.borrow().programmed_sectors
    }

    /// Number of writes to the customer password register.
    pub fn password_writes(&self) -> usize {
        self.chip.borrow().password_writes
    }

    /// True when the NVM password has been cleared again.
    pub fn locked(&self) -> bool {
        self.chip.borrow().password == 0
    }

    /// Values written to the software GPIO register, in order.
    pub fn gpio_writes(&self) -> Vec<u8> {
        self.chip.borrow().gpio_writes.clone()
    }

    /// Values written to the PD message header register, in order.
    pub fn tx_header_writes(&self) -> Vec<u8> {
        self.chip.borrow().tx_header_writes.clone()
    }

    /// Values written to the PD command register, in order.
    pub fn command_writes(&self) -> Vec<u8> {
        self.chip.borrow().command_writes.clone()
    }
}

impl ErrorType for MockBus {
    type Error = ErrorKind;
}

impl I2c for MockBus {
    async fn transaction(
        &mut self,
        _address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut chip = self.chip.borrow_mut();
        for operation in operations {
            match operation {
                Operation::Write(bytes) => chip.write(bytes),
                Operation::Read(buffer) => chip.read(buffer),
            }
        }
        Ok(())
    }
}
