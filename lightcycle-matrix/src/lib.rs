//! Matrix scanning core for the Lightcycle split keyboard.
//!
//! The Lightcycle has a 5×12 matrix split across two devices:
//! - Columns 0-5: MCP23018 I/O expander on I2C (left half)
//! - Columns 6-11: wired directly to Teensy 2.0 GPIO (right half)
//!
//! Both halves share the five row lines. The [`Matrix`] engine drives one
//! row low at a time on both halves, samples their columns and merges them
//! into one `u16` per row. Losing the expander only takes out its columns.
//!
//! This crate is `no_std` so it can be used by both the AVR firmware and
//! the native CLI tool.

#![no_std]

pub mod bus;
pub mod debounce;
pub mod matrix;
pub mod mcp23018;
pub mod port;
#[cfg(any(test, feature = "sim"))]
pub mod sim;
pub mod teensy;

pub use bus::{BusError, I2cBus};
pub use debounce::Debouncer;
pub use matrix::{Config, Dump, Matrix, ScanState, ScanStats, ScanStatus};
pub use mcp23018::Mcp23018;
pub use port::HalfPort;
pub use teensy::{PortRegisters, Reg, Teensy};

/// Number of rows in the matrix.
pub const ROWS: usize = 5;
/// Number of columns per half.
pub const COLS_PER_HALF: usize = 6;
/// Total number of columns.
pub const COLS: usize = COLS_PER_HALF * 2;

/// Bits of a row value that carry columns.
pub const ROW_MASK: u16 = (1 << COLS) - 1;
/// Bits of a half's column sample that carry columns.
pub const HALF_MASK: u8 = (1 << COLS_PER_HALF) - 1;

/// Combine two half samples into one row value.
///
/// The expander's columns take bits 0-5 and the Teensy's take bits 6-11.
/// Anything above a half's six columns is dropped.
#[inline]
pub const fn merge_columns(remote: u8, local: u8) -> u16 {
    (((local & HALF_MASK) as u16) << COLS_PER_HALF) | (remote & HALF_MASK) as u16
}
