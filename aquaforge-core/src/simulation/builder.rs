use crate::{error::AquaforgeError, simulation::engine::LiveSimulator};
use aquaforge_schemas::{
    profile::{Baseline, LiveProfile},
    reading::Parameter,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// A fluent builder for constructing a `LiveSimulator`.
///
/// Baselines are kept in insertion order; adding the same parameter twice replaces the
/// earlier value.
#[derive(Debug, Default)]
pub struct LiveSimulatorBuilder {
    baselines: Vec<Baseline>,
    noise_level: Option<f64>,
    seed: Option<u64>,
}

impl LiveSimulatorBuilder {
    /// Creates a new, empty `LiveSimulatorBuilder`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the baselines and noise level of a `LiveProfile`.
    pub fn from_profile(profile: &LiveProfile) -> Self {
        Self {
            baselines: profile.baselines.clone(),
            noise_level: Some(profile.noise_level),
            seed: None,
        }
    }

    pub fn with_baseline(mut self, parameter: Parameter, value: f64) -> Self {
        match self.baselines.iter_mut().find(|b| b.parameter == parameter) {
            Some(existing) => existing.value = value,
            None => self.baselines.push(Baseline { parameter, value }),
        }
        self
    }

    /// Relative noise: the standard deviation of each channel is this fraction of its baseline.
    pub fn with_noise_level(mut self, noise_level: f64) -> Self {
        self.noise_level = Some(noise_level);
        self
    }

    /// Seeds the random source so a run can be replayed exactly.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Consumes the builder and returns a simulator over a `StdRng`.
    ///
    /// # Errors
    ///
    /// Returns an `AquaforgeError` if no baselines were given or the noise level is
    /// negative or not finite.
    pub fn build(self) -> Result<LiveSimulator<StdRng>, AquaforgeError> {
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.build_with_rng(rng)
    }

    /// Like [`build`](Self::build) but with a caller-provided random source.
    pub fn build_with_rng<R: Rng>(self, rng: R) -> Result<LiveSimulator<R>, AquaforgeError> {
        if self.baselines.is_empty() {
            return Err(AquaforgeError::NoBaselinesProvided);
        }
        let noise_level = self.noise_level.unwrap_or(LiveProfile::default().noise_level);
        if !noise_level.is_finite() || noise_level < 0.0 {
            return Err(AquaforgeError::InvalidNoiseLevel(noise_level));
        }

        Ok(LiveSimulator {
            baselines: self.baselines,
            noise_level,
            rng,
            tick: 0,
        })
    }
}
