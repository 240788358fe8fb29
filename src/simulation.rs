//! Simulated photoino.
//!
//! Counts are Poisson distributed. Lowering the trigger level to or below
//! `low_trigger` lets baseline noise through the discriminator, which adds a
//! dark-count term of mean `low_dark` on top of `mean_count_rate`. With
//! `low_dark = 0` the trigger level has no effect on the counts.

use crate::error::PhotoinoError;
use crate::instrument::Instrument;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

/// Static configuration of the simulated backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub time_base: f64,
    pub trigger_level: f64,
    pub mean_count_rate: u64,
    pub low_dark: u64,
    pub low_trigger: f64,
    /// Fixed RNG seed for reproducible runs. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_base: 1.0,
            trigger_level: 1.0,
            mean_count_rate: 100,
            low_dark: 1000,
            low_trigger: 0.1,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_mean_count_rate(mut self, mean_count_rate: u64) -> Self {
        self.mean_count_rate = mean_count_rate;
        self
    }

    pub fn with_dark_counts(mut self, low_trigger: f64, low_dark: u64) -> Self {
        self.low_trigger = low_trigger;
        self.low_dark = low_dark;
        self
    }

    pub fn with_trigger_level(mut self, trigger_level: f64) -> Self {
        self.trigger_level = trigger_level;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

fn non_negative(name: &'static str, value: i64) -> Result<u64, PhotoinoError> {
    u64::try_from(value).map_err(|_| PhotoinoError::InvalidParameter {
        name,
        reason: format!("must not be negative (got {value})"),
    })
}

pub struct SimulatedDriver {
    time_base: f64,
    trigger_level: f64,
    mean_count_rate: u64,
    low_dark: u64,
    low_trigger: f64,
    rng: ChaCha8Rng,
}

impl std::fmt::Debug for SimulatedDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDriver")
            .field("time_base", &self.time_base)
            .field("trigger_level", &self.trigger_level)
            .field("mean_count_rate", &self.mean_count_rate)
            .field("low_dark", &self.low_dark)
            .field("low_trigger", &self.low_trigger)
            .finish_non_exhaustive()
    }
}

impl Default for SimulatedDriver {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulatedDriver {
    pub fn new(config: SimulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            time_base: config.time_base,
            trigger_level: config.trigger_level,
            mean_count_rate: config.mean_count_rate,
            low_dark: config.low_dark,
            low_trigger: config.low_trigger,
            rng,
        }
    }

    pub fn mean_count_rate(&self) -> u64 {
        self.mean_count_rate
    }

    /// Fails with `InvalidParameter` on a negative rate and keeps the old one.
    pub fn set_mean_count_rate(&mut self, value: i64) -> Result<(), PhotoinoError> {
        self.mean_count_rate = non_negative("mean_count_rate", value)?;
        Ok(())
    }

    pub fn low_dark(&self) -> u64 {
        self.low_dark
    }

    pub fn set_low_dark(&mut self, value: i64) -> Result<(), PhotoinoError> {
        self.low_dark = non_negative("low_dark", value)?;
        Ok(())
    }

    pub fn low_trigger(&self) -> f64 {
        self.low_trigger
    }

    pub fn set_low_trigger(&mut self, value: f64) {
        self.low_trigger = value;
    }

    /// Poisson mean used for the next sample at the current trigger level.
    pub fn effective_mean(&self) -> u64 {
        if self.trigger_level > self.low_trigger {
            self.mean_count_rate
        } else {
            self.mean_count_rate.saturating_add(self.low_dark)
        }
    }

    fn sample(&mut self, mean: u64) -> u64 {
        if mean == 0 {
            return 0;
        }
        match Poisson::new(mean as f64) {
            Ok(poisson) => poisson.sample(&mut self.rng) as u64,
            Err(e) => {
                log::warn!("Cannot sample Poisson({}): {}", mean, e);
                mean
            }
        }
    }
}

impl Instrument for SimulatedDriver {
    fn open(&mut self, port: &str, baud_rate: u32) -> Result<(), PhotoinoError> {
        log::debug!(
            "Simulated photoino ignores port '{}' and baud rate {}",
            port,
            baud_rate
        );
        Ok(())
    }

    fn close(&mut self) {}

    fn is_open(&self) -> bool {
        true
    }

    fn start(&mut self) -> Result<(), PhotoinoError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), PhotoinoError> {
        Ok(())
    }

    fn count_rate(&mut self) -> Result<u64, PhotoinoError> {
        let mean = self.effective_mean();
        Ok(self.sample(mean))
    }

    fn time_base(&mut self) -> Result<f64, PhotoinoError> {
        Ok(self.time_base)
    }

    fn set_time_base(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.time_base = value;
        Ok(())
    }

    fn trigger_level(&mut self) -> Result<f64, PhotoinoError> {
        Ok(self.trigger_level)
    }

    fn set_trigger_level(&mut self, value: f64) -> Result<(), PhotoinoError> {
        self.trigger_level = value;
        Ok(())
    }
}
