mod keys;
mod pins;

use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use lightcycle_matrix::matrix::SETTLE_US;
use lightcycle_matrix::sim::SimMatrix;
use lightcycle_matrix::{Config, ScanStatus};
use log::info;

#[derive(Parser)]
#[command(name = "lightcycle-cli")]
#[command(about = "Lightcycle matrix scanner bench")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scanner against a simulated board and dump the matrix
    Scan {
        /// Key to hold down, as ROW,COL (repeatable)
        #[arg(short, long = "press", value_name = "ROW,COL")]
        press: Vec<String>,
        /// Number of scans to run
        #[arg(short = 'n', long, default_value_t = 1)]
        scans: u32,
        /// Keep the left half unplugged for this many scans
        #[arg(long, default_value_t = 0)]
        offline: u32,
        /// Never plug in the left half
        #[arg(long, conflicts_with = "offline")]
        detached: bool,
        /// Debounce window in scans (raw samples if omitted)
        #[arg(long)]
        debounce: Option<u8>,
        /// Row settle delay in microseconds
        #[arg(long, default_value_t = SETTLE_US)]
        settle_us: u32,
    },
    /// Print the row and column pin map
    Pins,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            press,
            scans,
            offline,
            detached,
            debounce,
            settle_us,
        } => {
            if scans == 0 {
                bail!("need at least one scan");
            }
            let keys = press
                .iter()
                .map(|k| keys::parse_key(k).with_context(|| format!("parsing --press {}", k)))
                .collect::<Result<Vec<_>>>()?;

            let mut matrix = SimMatrix::simulated(Config {
                settle_us,
                debounce,
            });
            for &(row, col) in &keys {
                matrix.set_key(row, col, true);
            }
            if detached || offline > 0 {
                matrix.expander().set_online(false);
            }

            let pb = ProgressBar::new(u64::from(scans));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} scans")
                    .unwrap()
                    .progress_chars("=> "),
            );
            pb.set_message("Scanning");

            let plug_in = plug_in_scan(offline, detached);
            let started = Instant::now();
            let mut last = ScanStatus::Full;
            for scan in 0..scans {
                if Some(scan) == plug_in {
                    pb.suspend(|| info!("plugging in left half after {} scans", offline));
                    matrix.expander().set_online(true);
                }
                last = matrix.scan();
                pb.inc(1);
            }
            let elapsed = started.elapsed();
            pb.finish_with_message("Scanned");

            let stats = matrix.stats();
            println!("State: {:?} (last scan {:?})", matrix.state(), last);
            if let Some(fault) = matrix.fault() {
                println!("Left half fault: {}", fault);
            }
            println!(
                "Scans: {} ({} degraded), reset attempts: {}, recoveries: {}, faults: {}",
                stats.scans,
                stats.degraded_scans,
                stats.reset_attempts,
                stats.recoveries,
                stats.faults
            );
            println!(
                "Host scan rate: {:.0} scans/s, simulated settle time {} us",
                f64::from(stats.scans) / elapsed.as_secs_f64().max(f64::EPSILON),
                matrix.elapsed_us()
            );
            println!("Keys pressed: {}", matrix.key_count());
            println!();
            print!("{}", matrix.dump());
        }
        Command::Pins => pins::print(),
    }

    Ok(())
}

/// Scan before which the simulated left half gets plugged in, if ever.
fn plug_in_scan(offline: u32, detached: bool) -> Option<u32> {
    (!detached && offline > 0).then_some(offline)
}
