//! Lightcycle keyboard firmware for ATmega32U4 (Teensy 2.0).
//!
//! Brings up both halves of the matrix and scans them forever:
//! - Right half on Teensy GPIO, left half via MCP23018 over I2C
//! - Left half hot-plug: lost and re-attached without a reset
//! - Status LED on PD6 driven by the log sink

#![no_std]
#![no_main]
#![feature(asm_experimental_arch)]

mod delay;
mod i2c;
mod logging;
mod ports;

use avr_device::atmega32u4::Peripherals;
use embedded_hal::delay::DelayNs;
use lightcycle_matrix::{Config, Matrix, Mcp23018, Teensy};

use delay::Spin;
use i2c::Twi;
use ports::Ports;

/// Panic handler — on AVR we just loop forever.
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    loop {}
}

/// Main entry point.
#[no_mangle]
pub extern "C" fn main() -> ! {
    let dp = unsafe { Peripherals::steal() };

    // Configure system clock (should already be 16MHz from Teensy bootloader fuses)
    // Disable clock prescaler (CLKPR)
    dp.CPU.clkpr.write(|w| w.clkpce().set_bit());
    dp.CPU.clkpr.write(|w| unsafe { w.bits(0) }); // Prescaler = 1

    logging::init();

    let mut matrix = Matrix::new(
        Teensy::new(Ports::new(dp.PORTB, dp.PORTD, dp.PORTF)),
        Mcp23018::new(Twi::new(dp.TWI)),
        Spin,
        Config::default(),
    );
    matrix.initialize();

    let mut pause = Spin;
    loop {
        matrix.scan();

        // ~1ms between scans
        pause.delay_ms(1);
    }
}
