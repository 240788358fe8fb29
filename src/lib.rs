//! # Photoino RS
//!
//! A Rust driver for the photoino single-photon counting module.
//!
//! The instrument is reached either over a serial link or through a
//! simulator that reproduces its count statistics, behind one capability
//! set: open/close, start/stop acquisition, read the count rate, and get or
//! set the time base and trigger level.
//!
//! ## Features
//!
//! - **Line protocol codec**: terminated ASCII commands, tolerant integer reply parsing
//! - **Hardware backend**: talks to the device through `serialport`
//! - **Simulated backend**: Poisson counts with a trigger-dependent dark-count floor
//! - **Single facade**: [`PhotonCounter`] picks a backend once and dispatches to it
//! - **Device discovery**: lists candidate serial ports without caching them
//!
//! ## Examples
//!
//! ### Hardware
//!
//! ```rust,no_run
//! use photoino_rs::{discovery, HardwareConfig, Instrument, PhotonCounter};
//!
//! let config = HardwareConfig::default().with_candidate_ports(discovery::candidate_ports()?);
//! let mut counter = PhotonCounter::hardware(config);
//!
//! // Empty port and zero baud rate select the first candidate at 115200 baud
//! counter.open("", 0)?;
//! counter.set_trigger_level(0.5)?;
//! counter.start()?;
//! println!("{} counts", counter.count_rate()?);
//! counter.close();
//! # Ok::<(), photoino_rs::PhotoinoError>(())
//! ```
//!
//! ### Simulation
//!
//! ```rust
//! use photoino_rs::{Instrument, PhotonCounter, SimulationConfig};
//!
//! let mut counter = PhotonCounter::simulated(
//!     SimulationConfig::default()
//!         .with_mean_count_rate(100)
//!         .with_dark_counts(0.1, 1000)
//!         .with_seed(1),
//! );
//! counter.open("", 0)?;
//!
//! // Above the low trigger threshold only the photon counts remain
//! counter.set_trigger_level(1.0)?;
//! let counts = counter.count_rate()?;
//! println!("{counts} counts");
//! # Ok::<(), photoino_rs::PhotoinoError>(())
//! ```
//!
//! ### Configuration from TOML
//!
//! ```rust
//! use photoino_rs::{InstrumentConfig, PhotonCounter};
//!
//! let config = InstrumentConfig::from_toml_str(r#"
//!     backend = "simulated"
//!     mean_count_rate = 250
//!     low_dark = 0
//! "#)?;
//! let counter = PhotonCounter::from_config(config);
//! assert_eq!(counter.backend_name(), "simulated");
//! # Ok::<(), photoino_rs::PhotoinoError>(())
//! ```

pub mod discovery;
pub mod error;
pub mod hardware;
pub mod instrument;
pub mod line_protocol;
pub mod simulation;
pub mod transport;

// Re-export the main types for convenience
pub use error::PhotoinoError;

pub use line_protocol::{decode_reply, encode_command, Command, ProtocolError};

pub use transport::{PortOpener, SerialPortOpener, SerialTransport};

pub use discovery::CandidatePort;

pub use hardware::{HardwareConfig, HardwareDriver, DEFAULT_BAUD_RATE};

pub use simulation::{SimulatedDriver, SimulationConfig};

pub use instrument::{Instrument, InstrumentConfig, PhotonCounter, Setting};
