//! Log sink that reports through the Teensy LED on PD6.
//!
//! There is no spare serial pin on this board, so records only set the LED:
//! info lights it, warnings and errors turn it off. The LED starts lit, goes
//! dark when the left half is lost and blinks once per retry until it is
//! back.

use avr_device::atmega32u4::Peripherals;
use log::{Level, LevelFilter, Log, Metadata, Record};

const LED: u8 = 0x40;

struct StatusLed;

static LOGGER: StatusLed = StatusLed;

impl Log for StatusLed {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // PD6 is not a matrix pin; the scanner only touches PD2/PD3
        let portd = unsafe { Peripherals::steal() }.PORTD;
        match record.level() {
            Level::Info => portd.portd.modify(|r, w| unsafe { w.bits(r.bits() | LED) }),
            _ => portd.portd.modify(|r, w| unsafe { w.bits(r.bits() & !LED) }),
        }
    }

    fn flush(&self) {}
}

/// Light the LED and install the logger.
pub fn init() {
    let portd = unsafe { Peripherals::steal() }.PORTD;
    portd.ddrd.modify(|r, w| unsafe { w.bits(r.bits() | LED) });
    portd.portd.modify(|r, w| unsafe { w.bits(r.bits() | LED) });

    // No pointer-sized atomics on AVR; this runs before anything logs
    unsafe {
        let _ = log::set_logger_racy(&LOGGER);
        log::set_max_level_racy(LevelFilter::Info);
    }
}
