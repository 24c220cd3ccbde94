//! TWI (I2C) master for the link to the MCP23018 on the left half.

use avr_device::atmega32u4::TWI;
use lightcycle_matrix::{BusError, I2cBus};

/// TWI (I2C) clock prescaler and bit rate for ~100kHz at 16MHz CPU.
/// SCL freq = CPU_FREQ / (16 + 2 * TWBR * prescaler)
/// 100kHz = 16MHz / (16 + 2 * 72 * 1) => TWBR = 72
const TWBR_VALUE: u8 = 72;

/// TWI status codes
const TW_START: u8 = 0x08;
const TW_REP_START: u8 = 0x10;
const TW_MT_SLA_ACK: u8 = 0x18;
const TW_MT_DATA_ACK: u8 = 0x28;
const TW_MR_SLA_ACK: u8 = 0x40;

/// Spins on TWINT before giving up on a step. A missing left half leaves
/// the bus idle, so every step must be bounded.
const TWINT_SPINS: u16 = 0xFFFF;

pub struct Twi {
    twi: TWI,
}

impl Twi {
    /// Set the bit rate and enable the TWI peripheral.
    pub fn new(twi: TWI) -> Self {
        twi.twbr.write(|w| unsafe { w.bits(TWBR_VALUE) });
        // Prescaler = 1 (TWPS = 0)
        twi.twsr.write(|w| w.twps().prescaler_1());
        twi.twcr.write(|w| w.twen().set_bit());
        Self { twi }
    }

    fn status(&self) -> u8 {
        // TWS holds bits 7:3 of TWSR
        self.twi.twsr.read().tws().bits() << 3
    }

    fn wait_twint(&self) -> Result<(), BusError> {
        let mut spins = TWINT_SPINS;
        while self.twi.twcr.read().twint().bit_is_clear() {
            spins -= 1;
            if spins == 0 {
                return Err(BusError::Timeout);
            }
        }
        Ok(())
    }

    fn send(&mut self, byte: u8) -> Result<u8, BusError> {
        self.twi.twdr.write(|w| unsafe { w.bits(byte) });
        self.twi.twcr.write(|w| w.twint().set_bit().twen().set_bit());
        self.wait_twint()?;
        Ok(self.status())
    }
}

impl I2cBus for Twi {
    fn start(&mut self, address: u8) -> Result<(), BusError> {
        self.twi
            .twcr
            .write(|w| w.twint().set_bit().twsta().set_bit().twen().set_bit());
        self.wait_twint()?;
        let status = self.status();
        if status != TW_START && status != TW_REP_START {
            return Err(BusError::Start);
        }

        match self.send(address)? {
            TW_MT_SLA_ACK | TW_MR_SLA_ACK => Ok(()),
            _ => Err(BusError::AddressNack),
        }
    }

    fn write(&mut self, byte: u8) -> Result<(), BusError> {
        match self.send(byte)? {
            TW_MT_DATA_ACK => Ok(()),
            _ => Err(BusError::DataNack),
        }
    }

    fn read_nak(&mut self) -> u8 {
        // TWEA clear: answer the byte with NACK
        self.twi.twcr.write(|w| w.twint().set_bit().twen().set_bit());
        if self.wait_twint().is_err() {
            return 0xFF;
        }
        self.twi.twdr.read().bits()
    }

    fn stop(&mut self) {
        self.twi
            .twcr
            .write(|w| w.twint().set_bit().twsto().set_bit().twen().set_bit());
        // TWSTO clears itself once STOP is on the wire
        let mut spins = TWINT_SPINS;
        while self.twi.twcr.read().twsto().bit_is_set() && spins > 0 {
            spins -= 1;
        }
    }
}
