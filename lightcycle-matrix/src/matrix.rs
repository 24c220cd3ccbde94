//! Key matrix scanning for the Lightcycle keyboard.
//!
//! [`Matrix`] owns both halves and the committed key state. Every call to
//! [`Matrix::scan`] sweeps all rows and then replaces the whole snapshot, so
//! readers never see a half-finished sweep.
//!
//! The expander half can drop off the bus at any time (loose TRRS cable,
//! half unplugged). The first failed transfer marks it faulted; from then on
//! its rows are left alone and its columns read as released, while the
//! Teensy half keeps working. Re-attaching is attempted once every 256
//! degraded scans so a missing half does not flood the bus.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::bus::BusError;
use crate::debounce::Debouncer;
use crate::port::HalfPort;
use crate::{merge_columns, COLS, ROWS};

/// Settle time between selecting a row and reading the columns.
pub const SETTLE_US: u32 = 30;

/// Runtime scanning options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Delay after selecting a row, in microseconds.
    pub settle_us: u32,
    /// Debounce window in scans. `None` commits raw samples.
    pub debounce: Option<u8>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settle_us: SETTLE_US,
            debounce: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanState {
    /// [`Matrix::initialize`] has not run yet.
    Uninitialized,
    /// Both halves respond.
    Healthy,
    /// The expander is faulted; only the Teensy half is scanned.
    Degraded,
}

/// Outcome of one scan. Both variants mean every row was swept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanStatus {
    Full,
    LocalOnly,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Completed scans.
    pub scans: u32,
    /// Scans done without the expander.
    pub degraded_scans: u32,
    /// Expander re-initialization attempts.
    pub reset_attempts: u16,
    /// Attempts that brought the expander back.
    pub recoveries: u16,
    /// Times a working expander stopped responding.
    pub faults: u16,
}

pub struct Matrix<L, R, D> {
    local: L,
    remote: R,
    delay: D,
    config: Config,
    initialized: bool,
    /// Sticky expander fault, cleared only by a successful re-init.
    fault: Option<BusError>,
    /// Paces re-init attempts; one per wrap.
    reset_loop: u8,
    rows: [u16; ROWS],
    debouncer: Option<Debouncer>,
    stats: ScanStats,
}

impl<L, R, D> Matrix<L, R, D>
where
    L: HalfPort<Error = Infallible>,
    R: HalfPort<Error = BusError>,
    D: DelayNs,
{
    pub fn new(local: L, remote: R, delay: D, config: Config) -> Self {
        Self {
            local,
            remote,
            delay,
            config,
            initialized: false,
            fault: None,
            reset_loop: 0,
            rows: [0; ROWS],
            debouncer: config.debounce.map(Debouncer::new),
            stats: ScanStats::default(),
        }
    }

    /// Configure both halves and clear all key state.
    ///
    /// The expander's result becomes the fault status, so a missing left
    /// half starts the matrix degraded rather than failing.
    pub fn initialize(&mut self) {
        into_ok(self.local.init());
        self.fault = self.remote.init().err();
        match self.fault {
            Some(e) => warn!("left side not responding: {}", e),
            None => debug!("left side attached"),
        }

        self.unselect_rows();

        self.rows = [0; ROWS];
        if let Some(debouncer) = &mut self.debouncer {
            debouncer.reset();
        }
        self.initialized = true;
    }

    /// Sweep every row once and commit the result.
    pub fn scan(&mut self) -> ScanStatus {
        if !self.initialized {
            self.initialize();
        }

        if self.fault.is_some() {
            // Since reset_loop is 8 bit, this retries once in 256 scans
            self.reset_loop = self.reset_loop.wrapping_add(1);
            if self.reset_loop == 0 {
                self.try_reinit();
            }
        }

        let mut next = self.rows;
        for (row, value) in next.iter_mut().enumerate() {
            self.select_row(row);
            self.delay.delay_us(self.config.settle_us);
            let raw = self.read_cols();
            *value = match &mut self.debouncer {
                Some(debouncer) => debouncer.filter(row, raw, *value),
                None => raw,
            };
            self.unselect_rows();
        }
        self.rows = next;

        self.stats.scans = self.stats.scans.wrapping_add(1);
        if self.fault.is_some() {
            self.stats.degraded_scans = self.stats.degraded_scans.wrapping_add(1);
            ScanStatus::LocalOnly
        } else {
            ScanStatus::Full
        }
    }

    fn try_reinit(&mut self) {
        info!("trying to reset mcp23018");
        self.stats.reset_attempts = self.stats.reset_attempts.wrapping_add(1);
        match self.remote.init() {
            Ok(()) => {
                info!("left side attached");
                self.fault = None;
                self.stats.recoveries = self.stats.recoveries.wrapping_add(1);
            }
            Err(e) => {
                warn!("left side not responding: {}", e);
                self.fault = Some(e);
            }
        }
    }

    /// Run `op` on the expander unless it is faulted. A failure latches the
    /// fault.
    fn with_remote<T>(&mut self, op: impl FnOnce(&mut R) -> Result<T, BusError>) -> Option<T> {
        if self.fault.is_some() {
            return None;
        }
        match op(&mut self.remote) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("left side lost: {}", e);
                self.fault = Some(e);
                self.stats.faults = self.stats.faults.wrapping_add(1);
                None
            }
        }
    }

    fn select_row(&mut self, row: usize) {
        self.with_remote(|r| r.select_row(row));
        into_ok(self.local.select_row(row));
    }

    fn unselect_rows(&mut self) {
        self.with_remote(|r| r.unselect_rows());
        into_ok(self.local.unselect_rows());
    }

    fn read_cols(&mut self) -> u16 {
        let remote = self.with_remote(|r| r.read_columns()).unwrap_or(0);
        let local = into_ok(self.local.read_columns());
        merge_columns(remote, local)
    }

    pub const fn rows(&self) -> usize {
        ROWS
    }

    pub const fn cols(&self) -> usize {
        COLS
    }

    /// Whether the key at (`row`, `col`) is pressed. Out of range keys are
    /// never pressed.
    pub fn is_on(&self, row: usize, col: usize) -> bool {
        col < COLS && self.row(row) & (1 << col) != 0
    }

    /// Column bits of `row`, or 0 for a row that doesn't exist.
    pub fn row(&self, row: usize) -> u16 {
        self.rows.get(row).copied().unwrap_or(0)
    }

    /// The committed snapshot.
    pub fn snapshot(&self) -> &[u16; ROWS] {
        &self.rows
    }

    /// Number of keys currently pressed.
    pub fn key_count(&self) -> u32 {
        self.rows.iter().map(|r| r.count_ones()).sum()
    }

    pub fn state(&self) -> ScanState {
        match (self.initialized, self.fault) {
            (false, _) => ScanState::Uninitialized,
            (true, None) => ScanState::Healthy,
            (true, Some(_)) => ScanState::Degraded,
        }
    }

    /// The sticky expander fault, if any.
    pub fn fault(&self) -> Option<BusError> {
        self.fault
    }

    pub fn stats(&self) -> ScanStats {
        self.stats
    }

    pub fn debouncer(&self) -> Option<&Debouncer> {
        self.debouncer.as_ref()
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn local_mut(&mut self) -> &mut L {
        &mut self.local
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// Printable view of the snapshot.
    pub fn dump(&self) -> Dump<'_> {
        Dump(&self.rows)
    }
}

/// Matrix snapshot formatted one row per line, column 0 first.
pub struct Dump<'a>(&'a [u16; ROWS]);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "r/c 0123456789ABCDEF")?;
        for (row, bits) in self.0.iter().enumerate() {
            write!(f, "{:02X}: ", row)?;
            for col in 0..16 {
                let c = if bits & (1 << col) != 0 { '1' } else { '0' };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[inline]
fn into_ok<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}
