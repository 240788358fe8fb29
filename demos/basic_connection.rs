// Basic device discovery and connection example
//
// This example shows how to discover photoino devices, open the first one and
// read a few count rates.

use photoino_rs::{discovery, HardwareConfig, Instrument, PhotonCounter};
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (optional)
    env_logger::init();

    println!("Photoino Device Discovery Example");
    println!("=================================\n");

    // Step 1: List candidate serial ports
    println!("1. Discovering candidate serial ports...");
    let candidates = discovery::available_candidates()?;

    if candidates.is_empty() {
        println!("No candidate devices found. Please connect a photoino and try again.");
        return Ok(());
    }

    println!("Found {} candidate(s):", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}. {} ({})", i + 1, candidate.port, candidate.description);
    }
    println!();

    // Step 2: Connect to the first candidate at the default baud rate
    println!("2. Connecting to first candidate...");
    let ports = candidates.into_iter().map(|c| c.port).collect();
    let mut counter = PhotonCounter::hardware(HardwareConfig::default().with_candidate_ports(ports));
    counter.open("", 0)?;
    println!("Successfully connected!");

    // Step 3: Read the current settings
    println!("\n3. Device settings:");
    println!("  time base:     {}", counter.time_base()?);
    println!("  trigger level: {}", counter.trigger_level()?);

    // Step 4: Acquire
    println!("\n4. Reading count rates...");
    counter.start()?;
    let result = (0..5).try_for_each(|_| {
        thread::sleep(Duration::from_millis(500));
        let counts = counter.count_rate()?;
        println!("  {counts} counts");
        Ok::<(), photoino_rs::PhotoinoError>(())
    });

    // Close on every path, including a failed read
    counter.close();
    result?;

    println!("\n5. Connection test completed successfully!");

    Ok(())
}
