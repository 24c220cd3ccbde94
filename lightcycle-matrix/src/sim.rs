//! Simulated Lightcycle hardware for host-side tools and tests.
//!
//! [`SimExpander`] models the MCP23018 at the bus level, including its
//! power-on register defaults and the electrical effect of a pressed key
//! between a driven row and a pulled-up column. [`SimPorts`] does the same
//! for the Teensy port registers. Keys are set by matrix position and each
//! model works out its own pin levels, so the drivers' pin maps get checked
//! end to end.

use embedded_hal::delay::DelayNs;

use crate::bus::{BusError, I2cBus};
use crate::matrix::{Config, Matrix};
use crate::mcp23018::{self, Mcp23018, COLUMN_SHIFT, I2C_ADDR};
use crate::teensy::{row_bit, PortRegisters, Reg, Teensy};
use crate::{COLS, COLS_PER_HALF, ROWS};

pub type SimMatrix = Matrix<Teensy<SimPorts>, Mcp23018<SimExpander>, SimDelay>;

const REGISTERS: usize = 0x16;

/// MCP23018 register file after power-on reset.
const POR_REGISTERS: [u8; REGISTERS] = {
    let mut regs = [0; REGISTERS];
    regs[mcp23018::IODIRA as usize] = 0xFF;
    regs[mcp23018::IODIRB as usize] = 0xFF;
    regs
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    /// Addressed for writing; the first byte sets the register pointer.
    Write { pointer_set: bool },
    Read,
}

/// Bus-level model of an MCP23018 wired as the left half.
pub struct SimExpander {
    regs: [u8; REGISTERS],
    pointer: u8,
    phase: Phase,
    online: bool,
    /// Successful STARTs left before the device drops off the bus.
    drop_after: Option<u32>,
    /// Pressed keys, bit `c` = column `c` of this half.
    keys: [u8; ROWS],
    starts: u32,
}

impl SimExpander {
    pub const fn new() -> Self {
        Self {
            regs: POR_REGISTERS,
            pointer: 0,
            phase: Phase::Idle,
            online: true,
            drop_after: None,
            keys: [0; ROWS],
            starts: 0,
        }
    }

    /// Plug or unplug the half. Plugging it back in power-cycles the chip.
    pub fn set_online(&mut self, online: bool) {
        if online && !self.online {
            self.regs = POR_REGISTERS;
            self.phase = Phase::Idle;
        }
        self.online = online;
        self.drop_after = None;
    }

    /// Unplug the half after `starts` more successful STARTs.
    pub fn drop_after(&mut self, starts: u32) {
        self.drop_after = Some(starts);
    }

    pub fn set_key(&mut self, row: usize, col: usize, pressed: bool) {
        if row >= ROWS || col >= COLS_PER_HALF {
            return;
        }
        if pressed {
            self.keys[row] |= 1 << col;
        } else {
            self.keys[row] &= !(1 << col);
        }
    }

    pub fn register(&self, reg: u8) -> u8 {
        self.regs.get(reg as usize).copied().unwrap_or(0)
    }

    /// STARTs seen, failed or not.
    pub fn starts(&self) -> u32 {
        self.starts
    }

    fn fail(&mut self, error: BusError) -> Result<(), BusError> {
        self.phase = Phase::Idle;
        Err(error)
    }

    fn bit(reg: u8, pin: usize) -> bool {
        reg & (1 << pin) != 0
    }

    /// Row lines currently pulled low by the output latch.
    fn driven_rows(&self) -> impl Iterator<Item = usize> + '_ {
        let iodirb = self.regs[mcp23018::IODIRB as usize];
        let olatb = self.regs[mcp23018::OLATB as usize];
        (0..ROWS).filter(move |&r| !Self::bit(iodirb, r) && !Self::bit(olatb, r))
    }

    fn port_a_levels(&self) -> u8 {
        let iodira = self.regs[mcp23018::IODIRA as usize];
        let gppua = self.regs[mcp23018::GPPUA as usize];
        let olata = self.regs[mcp23018::OLATA as usize];
        let mut levels = 0;
        for pin in 0..8 {
            let high = if Self::bit(iodira, pin) {
                // Floating inputs read low on this board
                Self::bit(gppua, pin) && !self.column_pulled_low(pin)
            } else {
                Self::bit(olata, pin)
            };
            if high {
                levels |= 1 << pin;
            }
        }
        levels
    }

    fn column_pulled_low(&self, pin: usize) -> bool {
        let Some(col) = pin.checked_sub(COLUMN_SHIFT as usize) else {
            return false;
        };
        col < COLS_PER_HALF && self.driven_rows().any(|r| Self::bit(self.keys[r], col))
    }

    fn port_b_levels(&self) -> u8 {
        let iodirb = self.regs[mcp23018::IODIRB as usize];
        let gppub = self.regs[mcp23018::GPPUB as usize];
        let olatb = self.regs[mcp23018::OLATB as usize];
        (olatb & !iodirb) | (gppub & iodirb)
    }

    fn read_register(&self, reg: u8) -> u8 {
        match reg {
            mcp23018::GPIOA => self.port_a_levels(),
            mcp23018::GPIOB => self.port_b_levels(),
            _ => self.register(reg),
        }
    }

    fn write_register(&mut self, reg: u8, value: u8) {
        let target = match reg {
            mcp23018::GPIOA => mcp23018::OLATA,
            mcp23018::GPIOB => mcp23018::OLATB,
            other => other,
        };
        if let Some(slot) = self.regs.get_mut(target as usize) {
            *slot = value;
        }
    }
}

impl Default for SimExpander {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cBus for SimExpander {
    fn start(&mut self, address: u8) -> Result<(), BusError> {
        self.starts += 1;
        if let Some(left) = self.drop_after {
            if left == 0 {
                self.online = false;
                self.drop_after = None;
            } else {
                self.drop_after = Some(left - 1);
            }
        }
        if !self.online || address >> 1 != I2C_ADDR {
            return self.fail(BusError::AddressNack);
        }
        self.phase = if address & 1 == 0 {
            Phase::Write { pointer_set: false }
        } else {
            Phase::Read
        };
        Ok(())
    }

    fn write(&mut self, byte: u8) -> Result<(), BusError> {
        if !self.online {
            return self.fail(BusError::DataNack);
        }
        match self.phase {
            Phase::Write { pointer_set: false } => {
                self.pointer = byte;
                self.phase = Phase::Write { pointer_set: true };
                Ok(())
            }
            Phase::Write { pointer_set: true } => {
                self.write_register(self.pointer, byte);
                // Sequential mode advances the pointer
                self.pointer = self.pointer.wrapping_add(1);
                Ok(())
            }
            Phase::Idle | Phase::Read => self.fail(BusError::DataNack),
        }
    }

    fn read_nak(&mut self) -> u8 {
        if !self.online || self.phase != Phase::Read {
            // Released bus floats high
            return 0xFF;
        }
        self.read_register(self.pointer)
    }

    fn stop(&mut self) {
        self.phase = Phase::Idle;
    }
}

/// Register-level model of the Teensy ports used by the right half.
pub struct SimPorts {
    ddrb: u8,
    portb: u8,
    ddrd: u8,
    portd: u8,
    ddrf: u8,
    portf: u8,
    /// Pressed keys, bit `c` = column `c` of this half.
    keys: [u8; ROWS],
}

impl SimPorts {
    pub const fn new() -> Self {
        Self {
            ddrb: 0,
            portb: 0,
            ddrd: 0,
            portd: 0,
            ddrf: 0,
            portf: 0,
            keys: [0; ROWS],
        }
    }

    pub fn set_key(&mut self, row: usize, col: usize, pressed: bool) {
        if row >= ROWS || col >= COLS_PER_HALF {
            return;
        }
        if pressed {
            self.keys[row] |= 1 << col;
        } else {
            self.keys[row] &= !(1 << col);
        }
    }

    fn driven_rows(&self) -> impl Iterator<Item = usize> + '_ {
        (0..ROWS).filter(move |&r| {
            let bit = row_bit(r);
            self.ddrf & bit != 0 && self.portf & bit == 0
        })
    }

    /// Pin levels of a port. Outputs read back their latch and inputs read
    /// their pull-up, unless a pressed key connects them to a driven row.
    fn levels(&self, ddr: u8, port: u8, columns: &[(u8, usize)]) -> u8 {
        let mut levels = port;
        for &(pin, col) in columns {
            let mask = 1 << pin;
            if ddr & mask == 0 && self.driven_rows().any(|r| self.keys[r] & (1 << col) != 0) {
                levels &= !mask;
            }
        }
        levels
    }
}

impl Default for SimPorts {
    fn default() -> Self {
        Self::new()
    }
}

impl PortRegisters for SimPorts {
    fn read(&mut self, reg: Reg) -> u8 {
        match reg {
            Reg::DdrB => self.ddrb,
            Reg::PortB => self.portb,
            // PB0-PB3 carry columns 0-3 of this half
            Reg::PinB => self.levels(self.ddrb, self.portb, &[(0, 0), (1, 1), (2, 2), (3, 3)]),
            Reg::DdrD => self.ddrd,
            Reg::PortD => self.portd,
            // PD2-PD3 carry columns 4-5
            Reg::PinD => self.levels(self.ddrd, self.portd, &[(2, 4), (3, 5)]),
            Reg::DdrF => self.ddrf,
            Reg::PortF => self.portf,
        }
    }

    fn write(&mut self, reg: Reg, value: u8) {
        match reg {
            Reg::DdrB => self.ddrb = value,
            Reg::PortB => self.portb = value,
            // Writing a one to PINx toggles PORTx
            Reg::PinB => self.portb ^= value,
            Reg::DdrD => self.ddrd = value,
            Reg::PortD => self.portd = value,
            Reg::PinD => self.portd ^= value,
            Reg::DdrF => self.ddrf = value,
            Reg::PortF => self.portf = value,
        }
    }
}

/// Delay that only adds up the time asked for.
#[derive(Default)]
pub struct SimDelay {
    elapsed_ns: u64,
}

impl SimDelay {
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_ns / 1_000
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }
}

impl Matrix<Teensy<SimPorts>, Mcp23018<SimExpander>, SimDelay> {
    /// A matrix wired to simulated hardware with nothing pressed.
    pub fn simulated(config: Config) -> Self {
        Matrix::new(
            Teensy::new(SimPorts::new()),
            Mcp23018::new(SimExpander::new()),
            SimDelay::default(),
            config,
        )
    }

    /// Press or release the physical key at (`row`, `col`).
    pub fn set_key(&mut self, row: usize, col: usize, pressed: bool) {
        if col < COLS_PER_HALF {
            self.remote_mut().bus_mut().set_key(row, col, pressed);
        } else if col < COLS {
            self.local_mut().ports_mut().set_key(row, col - COLS_PER_HALF, pressed);
        }
    }

    pub fn expander(&mut self) -> &mut SimExpander {
        self.remote_mut().bus_mut()
    }

    pub fn elapsed_us(&self) -> u64 {
        self.delay().elapsed_us()
    }
}
