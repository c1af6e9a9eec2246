use crate::error::AquaforgeError;
use aquaforge_schemas::{
    profile::BatchProfile,
    reading::Reading,
};
use chrono::{Duration, NaiveDateTime, Timelike};
use rand::{seq::SliceRandom, Rng};

/// Beyond this `10^decimals` stops being a usable rounding scale.
const MAX_DECIMALS: u32 = 15;
/// One hundred years.
const MAX_BACKDATE_MINUTES: i64 = 100 * 365 * 24 * 60;

/// Fabricates a historical dataset by drawing every column independently from a fixed
/// uniform range. Unlike the live simulator there is no baseline and no correlation
/// between consecutive readings.
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    profile: BatchProfile,
}

impl BatchGenerator {
    /// # Errors
    ///
    /// Returns an `AquaforgeError` if a uniform range is inverted, non-finite or too wide
    /// to sample, if no filter states are configured, if the backdate window is negative
    /// or longer than a century, or if more than 15 decimals are requested.
    pub fn new(profile: BatchProfile) -> Result<Self, AquaforgeError> {
        for spec in &profile.uniform_ranges {
            let width = spec.range.high - spec.range.low;
            if !spec.range.is_consistent() || !width.is_finite() {
                return Err(AquaforgeError::InvalidUniformRange {
                    parameter: spec.parameter,
                    low: spec.range.low,
                    high: spec.range.high,
                });
            }
        }
        if profile.filter_states.is_empty() {
            return Err(AquaforgeError::NoFilterStates);
        }
        if !(0..=MAX_BACKDATE_MINUTES).contains(&profile.backdate_window_minutes) {
            return Err(AquaforgeError::ConfigError(format!(
                "backdate window must be between 0 and {} minutes (got {})",
                MAX_BACKDATE_MINUTES, profile.backdate_window_minutes
            )));
        }
        if profile.decimals > MAX_DECIMALS {
            return Err(AquaforgeError::ConfigError(format!(
                "at most {} decimals are supported (got {})",
                MAX_DECIMALS, profile.decimals
            )));
        }
        Ok(Self { profile })
    }

    /// Generates `count` readings backdated from `anchor`. Timestamps are truncated to
    /// whole seconds and are not sorted.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        count: usize,
        anchor: NaiveDateTime,
        rng: &mut R,
    ) -> Vec<Reading> {
        let anchor = anchor.with_nanosecond(0).unwrap_or(anchor);
        let scale = 10f64.powi(self.profile.decimals as i32);

        let readings: Vec<Reading> = (0..count)
            .map(|_| {
                let minutes_back = rng.gen_range(0..=self.profile.backdate_window_minutes);
                let timestamp = anchor
                    .checked_sub_signed(Duration::minutes(minutes_back))
                    .unwrap_or(NaiveDateTime::MIN);
                let mut reading = Reading::new(timestamp);
                for spec in &self.profile.uniform_ranges {
                    let (low, high) = (spec.range.low, spec.range.high);
                    let raw = rng.gen_range(low..=high);
                    let rounded = ((raw * scale).round() / scale).clamp(low, high);
                    reading.values.insert(spec.parameter, rounded);
                }
                reading.filter_state = self.profile.filter_states.choose(rng).copied();
                reading
            })
            .collect();

        tracing::debug!(count = readings.len(), "generated batch readings");
        readings
    }
}

impl Default for BatchGenerator {
    fn default() -> Self {
        Self {
            profile: BatchProfile::default(),
        }
    }
}
