//! Two-wire bus primitives used to talk to the expander.

use core::fmt;

/// A failed bus step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError {
    /// START or repeated START was not acknowledged by the controller.
    Start,
    /// The addressed device did not acknowledge its address.
    AddressNack,
    /// The device did not acknowledge a data byte.
    DataNack,
    /// The bus did not finish a step in time.
    Timeout,
}

impl BusError {
    /// Nonzero status byte for this error.
    pub const fn code(self) -> u8 {
        match self {
            BusError::Start => 1,
            BusError::AddressNack => 2,
            BusError::DataNack => 3,
            BusError::Timeout => 4,
        }
    }
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            BusError::Start => "bus start failed",
            BusError::AddressNack => "address not acknowledged",
            BusError::DataNack => "data not acknowledged",
            BusError::Timeout => "bus timeout",
        };
        write!(f, "{} (status {})", msg, self.code())
    }
}

/// Byte-level I2C master.
///
/// Callers must issue [`stop`](I2cBus::stop) after every `start`, even when
/// a step in between failed.
pub trait I2cBus {
    /// Send START (or repeated START) followed by the 8-bit address byte.
    fn start(&mut self, address: u8) -> Result<(), BusError>;

    /// Send one data byte.
    fn write(&mut self, byte: u8) -> Result<(), BusError>;

    /// Read one byte and answer with NACK.
    fn read_nak(&mut self) -> u8;

    /// Send STOP.
    fn stop(&mut self);
}

impl<B: I2cBus + ?Sized> I2cBus for &mut B {
    fn start(&mut self, address: u8) -> Result<(), BusError> {
        (**self).start(address)
    }

    fn write(&mut self, byte: u8) -> Result<(), BusError> {
        (**self).write(byte)
    }

    fn read_nak(&mut self) -> u8 {
        (**self).read_nak()
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}
