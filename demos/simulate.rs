// Simulated acquisition example
//
// Runs the simulated photoino and sweeps the trigger level across the
// low-trigger threshold to show the dark-count floor switching on.

use clap::Parser;
use photoino_rs::{Instrument, PhotonCounter, Setting, SimulationConfig};

#[derive(Parser)]
#[command(name = "simulate")]
#[command(version = "1.0")]
#[command(about = "Simulated photoino acquisition")]
#[command(long_about = "Reads count rates from the simulated photoino while sweeping the trigger level, printing the average counts per level.")]
struct Args {
    /// Nominal photon count rate
    #[arg(short, long, default_value_t = 100, help = "Mean count rate of the Poisson source")]
    mean_count_rate: i64,

    /// Extra dark counts at low trigger levels
    #[arg(short = 'd', long, default_value_t = 1000, help = "Dark-count mean added at or below the low trigger level")]
    low_dark: i64,

    /// Trigger level threshold
    #[arg(short = 't', long, default_value_t = 0.1, help = "Trigger level at or below which dark counts appear")]
    low_trigger: f64,

    /// Samples per trigger level
    #[arg(short, long, default_value_t = 1000)]
    samples: u32,

    /// Fixed RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let mut config = SimulationConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    let mut counter = PhotonCounter::simulated(config);
    counter.apply_setting(Setting::MeanCountRate(args.mean_count_rate))?;
    counter.apply_setting(Setting::LowDark(args.low_dark))?;
    counter.apply_setting(Setting::LowTrigger(args.low_trigger))?;

    println!("Simulated Photoino");
    println!("==================");
    println!("Mean count rate: {}", args.mean_count_rate);
    println!("Dark counts:     {} at trigger <= {}", args.low_dark, args.low_trigger);
    println!();

    counter.open_configured()?;
    counter.start()?;

    for level in [0.0, args.low_trigger, args.low_trigger + 0.05, 0.5, 1.0] {
        counter.set_trigger_level(level)?;
        let mut total = 0u64;
        for _ in 0..args.samples {
            total += counter.grab()?;
        }
        println!(
            "trigger {:>6.3} -> mean {:>10.2} counts",
            level,
            total as f64 / f64::from(args.samples.max(1))
        );
    }

    counter.stop()?;
    counter.close();
    Ok(())
}
