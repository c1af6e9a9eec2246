use aquaforge_schemas::{
    profile::Baseline,
    reading::{Parameter, Reading},
};
use chrono::NaiveDateTime;
use rand::{rngs::StdRng, Rng};
use rand_distr::StandardNormal;

/// Live telemetry source: every call perturbs each baseline with Gaussian noise whose
/// standard deviation is `noise_level * |baseline|`.
///
/// Built through [`super::builder::LiveSimulatorBuilder`], which validates the inputs.
pub struct LiveSimulator<R: Rng = StdRng> {
    pub(super) baselines: Vec<Baseline>,
    pub(super) noise_level: f64,
    pub(super) rng: R,
    pub(super) tick: u64,
}

impl<R: Rng> LiveSimulator<R> {
    pub fn next_reading(&mut self, timestamp: NaiveDateTime) -> Reading {
        self.tick += 1;
        let mut reading = Reading::new(timestamp);
        for baseline in &self.baselines {
            let std_dev = self.noise_level * baseline.value.abs();
            let z: f64 = self.rng.sample(StandardNormal);
            reading.values.insert(baseline.parameter, baseline.value + std_dev * z);
        }
        tracing::trace!(tick = self.tick, "generated live reading");
        reading
    }

    pub fn get_tick(&self) -> u64 {
        self.tick
    }

    pub fn baseline(&self, parameter: Parameter) -> Option<f64> {
        self.baselines
            .iter()
            .find(|b| b.parameter == parameter)
            .map(|b| b.value)
    }

    pub fn noise_level(&self) -> f64 {
        self.noise_level
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::builder::LiveSimulatorBuilder;
    use aquaforge_schemas::profile::LiveProfile;
    use chrono::NaiveDate;

    fn at(second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, second)
            .unwrap()
    }

    #[test]
    fn same_seed_reproduces_the_same_stream() {
        let profile = LiveProfile::default();
        let mut a = LiveSimulatorBuilder::from_profile(&profile).with_seed(42).build().unwrap();
        let mut b = LiveSimulatorBuilder::from_profile(&profile).with_seed(42).build().unwrap();
        for s in 0..10 {
            assert_eq!(a.next_reading(at(s)), b.next_reading(at(s)));
        }
        assert_eq!(a.get_tick(), 10);
    }

    #[test]
    fn emits_exactly_the_baseline_parameters() {
        let mut sim = LiveSimulatorBuilder::from_profile(&LiveProfile::default())
            .with_seed(1)
            .build()
            .unwrap();
        let reading = sim.next_reading(at(0));
        assert_eq!(reading.values.len(), 7);
        assert!(reading.value(Parameter::Ph).is_some());
        assert!(reading.value(Parameter::WaterFlow).is_none());
        assert!(reading.filter_state.is_none());
        assert_eq!(reading.timestamp, at(0));
    }

    #[test]
    fn zero_noise_returns_baselines_unchanged() {
        let mut sim = LiveSimulatorBuilder::new()
            .with_baseline(Parameter::Ph, 7.0)
            .with_baseline(Parameter::WaterLevel, 50.0)
            .with_noise_level(0.0)
            .with_seed(9)
            .build()
            .unwrap();
        let reading = sim.next_reading(at(0));
        assert_eq!(reading.value(Parameter::Ph), Some(7.0));
        assert_eq!(reading.value(Parameter::WaterLevel), Some(50.0));
    }

    #[test]
    fn noise_scales_with_baseline_magnitude() {
        let mut sim = LiveSimulatorBuilder::new()
            .with_baseline(Parameter::Ph, 7.0)
            .with_baseline(Parameter::FeedQuantity, 100.0)
            .with_noise_level(0.1)
            .with_seed(2024)
            .build()
            .unwrap();

        let n = 4000;
        let mut ph = Vec::with_capacity(n);
        let mut feed = Vec::with_capacity(n);
        for s in 0..n {
            let r = sim.next_reading(at((s % 60) as u32));
            ph.push(r.value(Parameter::Ph).unwrap());
            feed.push(r.value(Parameter::FeedQuantity).unwrap());
        }
        let std = |xs: &[f64]| {
            let mean = xs.iter().sum::<f64>() / xs.len() as f64;
            (xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / xs.len() as f64).sqrt()
        };
        // Expected standard deviations: 0.7 and 10.0.
        assert!((std(&ph) - 0.7).abs() < 0.07);
        assert!((std(&feed) - 10.0).abs() < 1.0);
    }
}
