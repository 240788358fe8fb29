use crate::error::PhotoinoError;
use crate::hardware::{HardwareConfig, HardwareDriver};
use crate::simulation::{SimulatedDriver, SimulationConfig};
use serde::{Deserialize, Serialize};

/// Capability set shared by every photoino backend.
///
/// All calls block until the backend answers. Hardware errors are passed
/// through unchanged; nothing here retries.
pub trait Instrument {
    /// Connect to `port` at `baud_rate`. An empty port selects the first
    /// candidate device, a zero baud rate selects the default. Reopening
    /// closes the previous connection first.
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<(), PhotoinoError>;

    /// Stop acquisition and release the connection. Safe to call twice.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    fn start(&mut self) -> Result<(), PhotoinoError>;

    fn stop(&mut self) -> Result<(), PhotoinoError>;

    /// One count sample. Samples are independent; nothing is buffered.
    fn count_rate(&mut self) -> Result<u64, PhotoinoError>;

    fn time_base(&mut self) -> Result<f64, PhotoinoError>;

    fn set_time_base(&mut self, value: f64) -> Result<(), PhotoinoError>;

    fn trigger_level(&mut self) -> Result<f64, PhotoinoError>;

    fn set_trigger_level(&mut self, value: f64) -> Result<(), PhotoinoError>;
}

/// Which backend to build, with its static configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum InstrumentConfig {
    Hardware(HardwareConfig),
    Simulated(SimulationConfig),
}

impl InstrumentConfig {
    /// Parse a configuration such as
    ///
    /// ```toml
    /// backend = "simulated"
    /// mean_count_rate = 250
    /// low_dark = 0
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, PhotoinoError> {
        Ok(toml::from_str(text)?)
    }
}

/// A single host-adjustable parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setting {
    TimeBase(f64),
    TriggerLevel(f64),
    MeanCountRate(i64),
    LowDark(i64),
    LowTrigger(f64),
}

impl Setting {
    pub fn name(&self) -> &'static str {
        match self {
            Setting::TimeBase(_) => "time_base",
            Setting::TriggerLevel(_) => "trigger_level",
            Setting::MeanCountRate(_) => "mean_count_rate",
            Setting::LowDark(_) => "low_dark",
            Setting::LowTrigger(_) => "low_trigger",
        }
    }
}

/// A photoino, backed either by the serial device or by the simulator.
/// The backend is chosen at construction and never changes.
#[derive(Debug)]
pub enum PhotonCounter {
    Hardware(HardwareDriver),
    Simulated(SimulatedDriver),
}

impl PhotonCounter {
    pub fn hardware(config: HardwareConfig) -> Self {
        Self::Hardware(HardwareDriver::new(config))
    }

    pub fn simulated(config: SimulationConfig) -> Self {
        Self::Simulated(SimulatedDriver::new(config))
    }

    pub fn from_config(config: InstrumentConfig) -> Self {
        match config {
            InstrumentConfig::Hardware(config) => Self::hardware(config),
            InstrumentConfig::Simulated(config) => Self::simulated(config),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            PhotonCounter::Hardware(_) => "hardware",
            PhotonCounter::Simulated(_) => "simulated",
        }
    }

    fn inner(&self) -> &dyn Instrument {
        match self {
            PhotonCounter::Hardware(driver) => driver,
            PhotonCounter::Simulated(driver) => driver,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Instrument {
        match self {
            PhotonCounter::Hardware(driver) => driver,
            PhotonCounter::Simulated(driver) => driver,
        }
    }

    /// Open with the port and baud rate given at construction.
    pub fn open_configured(&mut self) -> Result<(), PhotoinoError> {
        match self {
            PhotonCounter::Hardware(driver) => driver.open_configured(),
            PhotonCounter::Simulated(driver) => driver.open("", 0),
        }
    }

    pub fn as_simulated_mut(&mut self) -> Option<&mut SimulatedDriver> {
        match self {
            PhotonCounter::Simulated(driver) => Some(driver),
            PhotonCounter::Hardware(_) => None,
        }
    }

    /// Read one sample, as the host does once per grab.
    pub fn grab(&mut self) -> Result<u64, PhotoinoError> {
        let counts = self.count_rate()?;
        log::trace!("Grabbed {} counts from {} backend", counts, self.backend_name());
        Ok(counts)
    }

    /// Forward one parameter change to the active backend. Simulation model
    /// parameters are rejected by the hardware backend.
    pub fn apply_setting(&mut self, setting: Setting) -> Result<(), PhotoinoError> {
        log::debug!("Applying {:?} to {} backend", setting, self.backend_name());
        match (self, setting) {
            (this, Setting::TimeBase(value)) => this.set_time_base(value),
            (this, Setting::TriggerLevel(value)) => this.set_trigger_level(value),
            (PhotonCounter::Simulated(driver), Setting::MeanCountRate(value)) => {
                driver.set_mean_count_rate(value)
            }
            (PhotonCounter::Simulated(driver), Setting::LowDark(value)) => {
                driver.set_low_dark(value)
            }
            (PhotonCounter::Simulated(driver), Setting::LowTrigger(value)) => {
                driver.set_low_trigger(value);
                Ok(())
            }
            (PhotonCounter::Hardware(_), setting) => Err(PhotoinoError::UnsupportedSetting {
                name: setting.name(),
                backend: "hardware",
            }),
        }
    }
}

impl Instrument for PhotonCounter {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<(), PhotoinoError> {
        self.inner_mut().open(port, baud_rate)
    }

    fn close(&mut self) {
        self.inner_mut().close();
    }

    fn is_open(&self) -> bool {
        self.inner().is_open()
    }

    fn start(&mut self) -> Result<(), PhotoinoError> {
        self.inner_mut().start()
    }

    fn stop(&mut self) -> Result<(), PhotoinoError> {
        self.inner_mut().stop()
    }

    fn count_rate(&mut self) -> Result<u64, PhotoinoError> {
        self.inner_mut().count_rate()
    }

    fn time_base(&mut self) -> Result<f64, PhotoinoError> {
        self.inner_mut().time_base()
    }

    fn set_time_base(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.inner_mut().set_time_base(value)
    }

    fn trigger_level(&mut self) -> Result<f64, PhotoinoError> {
        self.inner_mut().trigger_level()
    }

    fn set_trigger_level(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.inner_mut().set_trigger_level(value)
    }
}
