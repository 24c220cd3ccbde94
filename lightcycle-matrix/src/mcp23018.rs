//! MCP23018 driver for the Lightcycle left half.
//!
//! The left half uses an MCP23018 I/O expander connected via I2C.
//! GPIOB pins 0-4 drive the rows (active low) and GPIOA pins 1-6 read the
//! columns with internal pull-ups.

use crate::bus::{BusError, I2cBus};
use crate::port::HalfPort;
use crate::HALF_MASK;

/// MCP23018 I2C address (all address pins grounded).
pub const I2C_ADDR: u8 = 0b010_0000;
pub const I2C_ADDR_WRITE: u8 = I2C_ADDR << 1;
pub const I2C_ADDR_READ: u8 = (I2C_ADDR << 1) | 1;

// MCP23018 register addresses (IOCON.BANK = 0, default)
pub const IODIRA: u8 = 0x00; // I/O direction register A (columns)
pub const IODIRB: u8 = 0x01; // I/O direction register B (rows)
pub const GPPUA: u8 = 0x0C; // Pull-up resistor register A
pub const GPPUB: u8 = 0x0D; // Pull-up resistor register B
pub const GPIOA: u8 = 0x12; // Port A register
pub const GPIOB: u8 = 0x13; // Port B register (write modifies OLATB)
pub const OLATA: u8 = 0x14; // Output latch A
pub const OLATB: u8 = 0x15; // Output latch B

/// GPIOB pins wired to rows 0-4.
pub const ROW_PINS: u8 = 0b0001_1111;
/// GPIOA pins wired to columns 0-5.
pub const COLUMN_PINS: u8 = 0b0111_1110;
/// Position of column 0 within GPIOA.
pub const COLUMN_SHIFT: u8 = 1;

pub struct Mcp23018<B> {
    bus: B,
}

impl<B: I2cBus> Mcp23018<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Configure MCP23018 I/O direction, pull-ups and row latches.
    pub fn configure(&mut self) -> Result<(), BusError> {
        // Port A all inputs; only pins 1-6 carry columns
        self.write_register(IODIRA, 0xFF)?;
        // Port B rows are outputs, the rest stay inputs
        self.write_register(IODIRB, !ROW_PINS)?;
        // Pull-ups on every input
        self.write_register(GPPUA, 0xFF)?;
        self.write_register(GPPUB, !ROW_PINS)?;
        // Drive all rows high initially (inactive)
        self.write_register(OLATB, 0xFF)?;
        Ok(())
    }

    /// Write one register. STOP is sent even if a step fails.
    pub fn write_register(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        let result = self.write_steps(reg, value);
        self.bus.stop();
        result
    }

    /// Read the raw level of the column port (GPIOA).
    pub fn read_gpio_port(&mut self) -> Result<u8, BusError> {
        let result = self.read_steps(GPIOA);
        self.bus.stop();
        result
    }

    fn write_steps(&mut self, reg: u8, value: u8) -> Result<(), BusError> {
        self.bus.start(I2C_ADDR_WRITE)?;
        self.bus.write(reg)?;
        self.bus.write(value)
    }

    fn read_steps(&mut self, reg: u8) -> Result<u8, BusError> {
        self.bus.start(I2C_ADDR_WRITE)?;
        self.bus.write(reg)?;
        // Repeated start for read
        self.bus.start(I2C_ADDR_READ)?;
        Ok(self.bus.read_nak())
    }
}

impl<B: I2cBus> HalfPort for Mcp23018<B> {
    type Error = BusError;

    fn init(&mut self) -> Result<(), BusError> {
        self.configure()
    }

    fn select_row(&mut self, row: usize) -> Result<(), BusError> {
        // Set active row low and all other rows high
        let latch = match row {
            r if r < 8 => 0xFF & !(1u8 << r),
            _ => 0xFF,
        };
        self.write_register(GPIOB, latch)
    }

    fn unselect_rows(&mut self) -> Result<(), BusError> {
        self.write_register(GPIOB, 0xFF)
    }

    fn read_columns(&mut self) -> Result<u8, BusError> {
        let pins = self.read_gpio_port()?;
        Ok((!pins >> COLUMN_SHIFT) & HALF_MASK)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Op {
        Start(u8),
        Write(u8),
        Read,
        Stop,
    }

    /// Records every bus step and fails the `fail_at`-th one.
    struct Recorder {
        ops: Vec<Op>,
        fail_at: Option<usize>,
        read_value: u8,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                ops: Vec::new(),
                fail_at: None,
                read_value: 0xFF,
            }
        }

        fn step(&mut self, op: Op) -> Result<(), BusError> {
            let index = self.ops.len();
            self.ops.push(op);
            if self.fail_at == Some(index) {
                Err(BusError::AddressNack)
            } else {
                Ok(())
            }
        }
    }

    impl I2cBus for Recorder {
        fn start(&mut self, address: u8) -> Result<(), BusError> {
            self.step(Op::Start(address))
        }

        fn write(&mut self, byte: u8) -> Result<(), BusError> {
            self.step(Op::Write(byte))
        }

        fn read_nak(&mut self) -> u8 {
            self.ops.push(Op::Read);
            self.read_value
        }

        fn stop(&mut self) {
            self.ops.push(Op::Stop);
        }
    }

    #[test]
    fn test_write_register_sequence() {
        let mut mcp = Mcp23018::new(Recorder::new());
        assert_eq!(mcp.write_register(GPIOB, 0xFB), Ok(()));
        assert_eq!(
            mcp.bus().ops,
            [Op::Start(0x40), Op::Write(GPIOB), Op::Write(0xFB), Op::Stop]
        );
    }

    #[test]
    fn test_failed_step_skips_rest_but_stops() {
        let mut bus = Recorder::new();
        bus.fail_at = Some(1);
        let mut mcp = Mcp23018::new(bus);
        assert_eq!(mcp.write_register(IODIRA, 0xFF), Err(BusError::AddressNack));
        assert_eq!(mcp.bus().ops, [Op::Start(0x40), Op::Write(IODIRA), Op::Stop]);
    }

    #[test]
    fn test_read_gpio_sequence() {
        let mut bus = Recorder::new();
        bus.read_value = 0xA5;
        let mut mcp = Mcp23018::new(bus);
        assert_eq!(mcp.read_gpio_port(), Ok(0xA5));
        assert_eq!(
            mcp.bus().ops,
            [
                Op::Start(0x40),
                Op::Write(GPIOA),
                Op::Start(0x41),
                Op::Read,
                Op::Stop
            ]
        );
    }

    #[test]
    fn test_read_fails_before_data() {
        let mut bus = Recorder::new();
        bus.fail_at = Some(2);
        let mut mcp = Mcp23018::new(bus);
        assert_eq!(mcp.read_gpio_port(), Err(BusError::AddressNack));
        assert!(!mcp.bus().ops.contains(&Op::Read));
        assert_eq!(mcp.bus().ops.last(), Some(&Op::Stop));
    }

    #[test]
    fn test_configure_registers() {
        let mut mcp = Mcp23018::new(Recorder::new());
        mcp.configure().unwrap();
        let writes: Vec<(u8, u8)> = mcp
            .bus()
            .ops
            .chunks(4)
            .map(|c| match (&c[1], &c[2]) {
                (Op::Write(reg), Op::Write(value)) => (*reg, *value),
                other => panic!("unexpected ops {:?}", other),
            })
            .collect();
        assert_eq!(
            writes,
            [
                (IODIRA, 0xFF),
                (IODIRB, 0xE0),
                (GPPUA, 0xFF),
                (GPPUB, 0xE0),
                (OLATB, 0xFF)
            ]
        );
    }

    #[test]
    fn test_configure_stops_at_first_failure() {
        let mut bus = Recorder::new();
        bus.fail_at = Some(0);
        let mut mcp = Mcp23018::new(bus);
        assert!(mcp.configure().is_err());
        assert_eq!(mcp.bus().ops, [Op::Start(0x40), Op::Stop]);
    }

    #[test]
    fn test_select_row_latch() {
        let mut mcp = Mcp23018::new(Recorder::new());
        mcp.select_row(2).unwrap();
        mcp.unselect_rows().unwrap();
        assert_eq!(mcp.bus().ops[2], Op::Write(0b1111_1011));
        assert_eq!(mcp.bus().ops[6], Op::Write(0xFF));
    }

    #[test]
    fn test_read_columns_inverts_and_shifts() {
        let mut bus = Recorder::new();
        // GPIOA1 and GPIOA6 pulled low: columns 0 and 5 pressed
        bus.read_value = !0b0100_0010;
        let mut mcp = Mcp23018::new(bus);
        assert_eq!(mcp.read_columns(), Ok(0b10_0001));
    }
}
