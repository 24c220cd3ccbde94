//! Teensy 2.0 side of the matrix (right half).
//!
//! Pin mapping on Teensy 2.0 (ATmega32U4):
//!   Row pins (active-low outputs):  PF0, PF1, PF4, PF5, PF6
//!   Column pins (inputs w/ pull-up): PB0, PB1, PB2, PB3, PD2, PD3
//!
//! Columns land in bits 6-11 of a row value: PB0-PB3 are columns 6-9 and
//! PD2-PD3 are columns 10-11.

use core::convert::Infallible;

use crate::port::HalfPort;
use crate::HALF_MASK;

/// PORTF pins wired to rows 0-4.
pub const ROW_PINS_F: u8 = 0b0111_0011;
/// PORTB pins wired to columns 6-9.
pub const COLUMN_PINS_B: u8 = 0x0F;
/// PORTD pins wired to columns 10-11.
pub const COLUMN_PINS_D: u8 = 0x0C;

/// AVR port registers touched by the matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reg {
    DdrB,
    PortB,
    PinB,
    DdrD,
    PortD,
    PinD,
    DdrF,
    PortF,
}

/// Raw access to the port registers.
pub trait PortRegisters {
    fn read(&mut self, reg: Reg) -> u8;
    fn write(&mut self, reg: Reg, value: u8);

    fn modify(&mut self, reg: Reg, f: impl FnOnce(u8) -> u8) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }
}

/// PORTF bit driving `row`.
///
/// Rows 0-1 sit on PF0-PF1, rows 2-4 skip the JTAG pins and sit on PF4-PF6.
#[inline]
pub const fn row_bit(row: usize) -> u8 {
    match row {
        0 | 1 => 1 << row,
        2..=4 => 1 << (row + 2),
        _ => 0,
    }
}

/// Decode the pin registers into active-high columns 0-5 of this half.
#[inline]
pub const fn decode_columns(pinb: u8, pind: u8) -> u8 {
    let levels = (pinb & COLUMN_PINS_B) | ((pind & COLUMN_PINS_D) << 2);
    !levels & HALF_MASK
}

pub struct Teensy<P> {
    ports: P,
}

impl<P: PortRegisters> Teensy<P> {
    pub const fn new(ports: P) -> Self {
        Self { ports }
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}

impl<P: PortRegisters> HalfPort for Teensy<P> {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        // Row pins as outputs, initially high (inactive)
        self.ports.modify(Reg::DdrF, |r| r | ROW_PINS_F);
        self.ports.modify(Reg::PortF, |r| r | ROW_PINS_F);

        // Column pins as inputs with pull-ups
        self.ports.modify(Reg::DdrB, |r| r & !COLUMN_PINS_B);
        self.ports.modify(Reg::PortB, |r| r | COLUMN_PINS_B);
        self.ports.modify(Reg::DdrD, |r| r & !COLUMN_PINS_D);
        self.ports.modify(Reg::PortD, |r| r | COLUMN_PINS_D);
        Ok(())
    }

    fn select_row(&mut self, row: usize) -> Result<(), Infallible> {
        let bit = row_bit(row);
        self.ports.modify(Reg::PortF, |r| (r | ROW_PINS_F) & !bit);
        Ok(())
    }

    fn unselect_rows(&mut self) -> Result<(), Infallible> {
        self.ports.modify(Reg::PortF, |r| r | ROW_PINS_F);
        Ok(())
    }

    fn read_columns(&mut self) -> Result<u8, Infallible> {
        let pinb = self.ports.read(Reg::PinB);
        let pind = self.ports.read(Reg::PinD);
        Ok(decode_columns(pinb, pind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Regs {
        ddrb: u8,
        portb: u8,
        pinb: u8,
        ddrd: u8,
        portd: u8,
        pind: u8,
        ddrf: u8,
        portf: u8,
    }

    impl PortRegisters for Regs {
        fn read(&mut self, reg: Reg) -> u8 {
            match reg {
                Reg::DdrB => self.ddrb,
                Reg::PortB => self.portb,
                Reg::PinB => self.pinb,
                Reg::DdrD => self.ddrd,
                Reg::PortD => self.portd,
                Reg::PinD => self.pind,
                Reg::DdrF => self.ddrf,
                Reg::PortF => self.portf,
            }
        }

        fn write(&mut self, reg: Reg, value: u8) {
            match reg {
                Reg::DdrB => self.ddrb = value,
                Reg::PortB => self.portb = value,
                Reg::PinB => self.pinb = value,
                Reg::DdrD => self.ddrd = value,
                Reg::PortD => self.portd = value,
                Reg::PinD => self.pind = value,
                Reg::DdrF => self.ddrf = value,
                Reg::PortF => self.portf = value,
            }
        }
    }

    #[test]
    fn test_row_bits() {
        let bits: [u8; 5] = core::array::from_fn(row_bit);
        assert_eq!(bits, [0x01, 0x02, 0x10, 0x20, 0x40]);
        assert_eq!(bits.iter().fold(0, |acc, b| acc | b), ROW_PINS_F);
    }

    #[test]
    fn test_init_leaves_other_pins_alone() {
        let mut teensy = Teensy::new(Regs {
            ddrb: 0xFF,
            ddrd: 0x40,
            portf: 0x80,
            ..Default::default()
        });
        teensy.init().unwrap();
        let regs = teensy.ports();
        assert_eq!(regs.ddrf, ROW_PINS_F);
        assert_eq!(regs.portf, 0x80 | ROW_PINS_F);
        assert_eq!(regs.ddrb, 0xF0);
        assert_eq!(regs.portb, 0x0F);
        assert_eq!(regs.ddrd, 0x40);
        assert_eq!(regs.portd, 0x0C);
    }

    #[test]
    fn test_select_one_row_low() {
        let mut teensy = Teensy::new(Regs::default());
        teensy.init().unwrap();
        teensy.select_row(1).unwrap();
        assert_eq!(teensy.ports().portf & ROW_PINS_F, ROW_PINS_F & !0x02);
        teensy.select_row(3).unwrap();
        assert_eq!(teensy.ports().portf & ROW_PINS_F, ROW_PINS_F & !0x20);
        teensy.unselect_rows().unwrap();
        assert_eq!(teensy.ports().portf & ROW_PINS_F, ROW_PINS_F);
    }

    #[test]
    fn test_decode_columns() {
        // Nothing pulled low
        assert_eq!(decode_columns(0xFF, 0xFF), 0);
        // PB0 low: column 6, the first on this half
        assert_eq!(decode_columns(0xFE, 0xFF), 0b00_0001);
        // PD3 low: column 11
        assert_eq!(decode_columns(0xFF, 0xF7), 0b10_0000);
        // Unrelated pins don't leak in
        assert_eq!(decode_columns(0x0F, 0x0C), 0);
    }
}
