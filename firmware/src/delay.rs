//! Busy-wait delays calibrated for a 16MHz ATmega32U4.

use embedded_hal::delay::DelayNs;

/// Inner spin passes per microsecond. A pass (nop, u8 increment, compare,
/// branch) is about five cycles. With the outer u32 loop around it one
/// microsecond costs roughly 25 cycles, so delays err long, never short.
const SPINS_PER_US: u8 = 3;

pub struct Spin;

impl DelayNs for Spin {
    fn delay_ns(&mut self, ns: u32) {
        for _ in 0..ns.div_ceil(1_000) {
            for _ in 0..SPINS_PER_US {
                unsafe { core::arch::asm!("nop") };
            }
        }
    }
}
