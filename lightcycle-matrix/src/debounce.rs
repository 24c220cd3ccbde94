//! Per-key debounce logic.
//!
//! Each key has a countdown of scans during which it may not change again.
//! A change is accepted as soon as the key is eligible, then the key is
//! locked for `window` scans. Bounces shorter than the window never reach
//! the committed matrix.

use crate::{COLS, ROWS};

/// Number of scan cycles a key stays locked after a committed change.
/// A full scan takes a few ms because of the I2C half, so this spans well
/// over the 5 ms contact bounce of Cherry switches.
pub const DEBOUNCE: u8 = 5;

pub struct Debouncer {
    window: u8,
    /// Scans left until each key may change again.
    countdown: [[u8; COLS]; ROWS],
}

impl Debouncer {
    pub const fn new(window: u8) -> Self {
        Self {
            window,
            countdown: [[0; COLS]; ROWS],
        }
    }

    /// Scans left before the key at (`row`, `col`) may change.
    pub fn countdown(&self, row: usize, col: usize) -> u8 {
        self.countdown[row][col]
    }

    pub fn reset(&mut self) {
        self.countdown = [[0; COLS]; ROWS];
    }

    /// Filter one row's raw sample against its committed value.
    /// Returns the new committed value.
    pub fn filter(&mut self, row: usize, raw: u16, committed: u16) -> u16 {
        let mask = self.eligible(row);
        let next = (raw & mask) | (committed & !mask);
        self.report(row, next ^ committed);
        next
    }

    /// Bits set for keys allowed to change in this scan. Ticks down the
    /// countdown of every other key.
    fn eligible(&mut self, row: usize) -> u16 {
        let mut mask = 0;
        for (col, count) in self.countdown[row].iter_mut().enumerate() {
            if *count > 0 {
                *count -= 1;
            } else {
                mask |= 1 << col;
            }
        }
        mask
    }

    /// Lock every key in `change` for a full window.
    fn report(&mut self, row: usize, change: u16) {
        for (col, count) in self.countdown[row].iter_mut().enumerate() {
            if change & (1 << col) != 0 {
                *count = self.window;
            }
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE)
    }
}
