//! Port register access for the Teensy (right) half.

use avr_device::atmega32u4::{PORTB, PORTD, PORTF};
use lightcycle_matrix::{PortRegisters, Reg};

pub struct Ports {
    portb: PORTB,
    portd: PORTD,
    portf: PORTF,
}

impl Ports {
    pub fn new(portb: PORTB, portd: PORTD, portf: PORTF) -> Self {
        Self {
            portb,
            portd,
            portf,
        }
    }
}

impl PortRegisters for Ports {
    fn read(&mut self, reg: Reg) -> u8 {
        match reg {
            Reg::DdrB => self.portb.ddrb.read().bits(),
            Reg::PortB => self.portb.portb.read().bits(),
            Reg::PinB => self.portb.pinb.read().bits(),
            Reg::DdrD => self.portd.ddrd.read().bits(),
            Reg::PortD => self.portd.portd.read().bits(),
            Reg::PinD => self.portd.pind.read().bits(),
            Reg::DdrF => self.portf.ddrf.read().bits(),
            Reg::PortF => self.portf.portf.read().bits(),
        }
    }

    fn write(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::DdrB => self.portb.ddrb.write(|w| unsafe { w.bits(value) }),
            Reg::PortB => self.portb.portb.write(|w| unsafe { w.bits(value) }),
            Reg::PinB => self.portb.pinb.write(|w| unsafe { w.bits(value) }),
            Reg::DdrD => self.portd.ddrd.write(|w| unsafe { w.bits(value) }),
            Reg::PortD => self.portd.portd.write(|w| unsafe { w.bits(value) }),
            Reg::PinD => self.portd.pind.write(|w| unsafe { w.bits(value) }),
            Reg::DdrF => self.portf.ddrf.write(|w| unsafe { w.bits(value) }),
            Reg::PortF => self.portf.portf.write(|w| unsafe { w.bits(value) }),
        }
    }

    fn modify(&mut self, reg: Reg, f: impl FnOnce(u8) -> u8) {
        match reg {
            Reg::PortF => self.portf.portf.modify(|r, w| unsafe { w.bits(f(r.bits())) }),
            _ => {
                let value = self.read(reg);
                self.write(reg, f(value));
            }
        }
    }
}
