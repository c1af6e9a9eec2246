use crate::{
    range::UniformRange,
    reading::{FilterState, Parameter},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub parameter: Parameter,
    pub value: f64,
}

/// Nominal operating point the live simulator perturbs every tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveProfile {
    pub noise_level: f64,
    pub baselines: Vec<Baseline>,
}

impl Default for LiveProfile {
    fn default() -> Self {
        let baseline = |parameter, value| Baseline { parameter, value };
        Self {
            noise_level: 0.1,
            baselines: vec![
                baseline(Parameter::Ph, 7.0),
                baseline(Parameter::DissolvedOxygen, 6.5),
                baseline(Parameter::WaterTemperature, 25.0),
                baseline(Parameter::AmbientTemperature, 22.0),
                baseline(Parameter::AmbientHumidity, 65.0),
                baseline(Parameter::FeedQuantity, 100.0),
                baseline(Parameter::WaterLevel, 50.0),
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformSpec {
    pub parameter: Parameter,
    #[serde(flatten)]
    pub range: UniformRange,
}

/// Independent uniform draws used to fabricate a historical dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProfile {
    pub uniform_ranges: Vec<UniformSpec>,
    pub filter_states: Vec<FilterState>,
    /// Readings are backdated by up to this many minutes from the anchor time.
    pub backdate_window_minutes: i64,
    pub decimals: u32,
}

impl Default for BatchProfile {
    fn default() -> Self {
        use Parameter::*;
        let spec = |parameter, low, high| UniformSpec {
            parameter,
            range: UniformRange::new(low, high),
        };
        Self {
            uniform_ranges: vec![
                spec(DissolvedOxygen, 4.0, 12.0),
                spec(Ph, 6.0, 8.5),
                spec(Nitrate, 0.0, 50.0),
                spec(Nitrite, 0.0, 5.0),
                spec(WaterTemperature, 15.0, 30.0),
                spec(AmbientTemperature, 10.0, 40.0),
                spec(AmbientHumidity, 30.0, 100.0),
                spec(FeedQuantity, 0.0, 100.0),
                spec(WaterFlow, 0.0, 20.0),
                spec(LightIntensity, 0.0, 100000.0),
                spec(WaterLevel, 0.0, 100.0),
                spec(EnergyConsumption, 0.0, 10.0),
            ],
            filter_states: vec![FilterState::Clean, FilterState::NeedsCleaning],
            backdate_window_minutes: 10_000,
            decimals: 2,
        }
    }
}
