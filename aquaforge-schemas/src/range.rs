use crate::reading::Parameter;
use serde::{Deserialize, Serialize};

/// The acceptable band for a parameter, with the value to steer back to and the
/// corrective action an operator should take when the band is left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub parameter: Parameter,
    pub min: f64,
    pub max: f64,
    pub target: f64,
    pub adjustment: String,
}

impl ParameterRange {
    pub fn new(parameter: Parameter, min: f64, max: f64, target: f64, adjustment: &str) -> Self {
        Self {
            parameter,
            min,
            max,
            target,
            adjustment: adjustment.to_string(),
        }
    }

    /// `min <= target <= max`, with every bound a real number.
    pub fn is_consistent(&self) -> bool {
        [self.min, self.target, self.max].iter().all(|v| v.is_finite())
            && self.min <= self.target
            && self.target <= self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        !(value < self.min || value > self.max)
    }
}

/// Ordered set of evaluation ranges. Order decides the order of reported violations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeTable {
    pub ranges: Vec<ParameterRange>,
}

impl RangeTable {
    pub fn new(ranges: Vec<ParameterRange>) -> Self {
        Self { ranges }
    }

    pub fn get(&self, parameter: Parameter) -> Option<&ParameterRange> {
        self.ranges.iter().find(|r| r.parameter == parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterRange> {
        self.ranges.iter()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl Default for RangeTable {
    fn default() -> Self {
        use Parameter::*;
        let range = ParameterRange::new;
        Self::new(vec![
            range(DissolvedOxygen, 5.0, 8.5, 7.5, "Increase aeration if low, decrease if high"),
            range(Ph, 6.5, 7.5, 7.0, "Add acid to lower pH, base to increase"),
            range(Nitrate, 10.0, 40.0, 30.0, "Adjust feeding or filtration to regulate"),
            range(Nitrite, 0.0, 1.0, 0.5, "Increase filtration efficiency"),
            range(WaterTemperature, 20.0, 28.0, 24.0, "Use heaters or coolers to maintain"),
            range(AmbientTemperature, 18.0, 30.0, 25.0, "Adjust greenhouse temperature"),
            range(AmbientHumidity, 40.0, 70.0, 55.0, "Use humidifiers or dehumidifiers"),
            range(FeedQuantity, 50.0, 100.0, 75.0, "Feed more if low, reduce if high"),
            range(WaterFlow, 5.0, 10.0, 7.5, "Adjust pump speed to maintain flow"),
            range(LightIntensity, 10000.0, 50000.0, 30000.0, "Increase or decrease lighting"),
            range(WaterLevel, 20.0, 80.0, 50.0, "Add or remove water to maintain level"),
        ])
    }
}

/// Closed interval a batch generator draws a parameter from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UniformRange {
    pub low: f64,
    pub high: f64,
}

impl UniformRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn is_consistent(&self) -> bool {
        self.low.is_finite() && self.high.is_finite() && self.low <= self.high
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// A row of the operator reference sheet. Bounds are optional because some channels
/// (the filter state) are categorical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRow {
    pub label: String,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub action: String,
}

impl DecisionRow {
    fn new(label: &str, min: Option<f64>, max: Option<f64>, action: &str) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
            action: action.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTable {
    pub rows: Vec<DecisionRow>,
}

impl Default for DecisionTable {
    fn default() -> Self {
        let row = |label, min, max, action| DecisionRow::new(label, Some(min), Some(max), action);
        Self {
            rows: vec![
                row("Nivel de Oxígeno en Agua (mg/L)", 5.0, 8.0, "Ajustar bomba de oxígeno"),
                row("Nivel de pH", 6.5, 7.5, "Ajustar sistema de pH"),
                row("Nivel de Nitratos (ppm)", 10.0, 50.0, "Revisar nivel de filtrado"),
                row("Nivel de Nitritos (ppm)", 0.5, 1.0, "Ajustar control de nitritos"),
                row("Temperatura del Agua (°C)", 18.0, 28.0, "Ajustar temperatura"),
                row("Temperatura Ambiente (°C)", 10.0, 35.0, "Ajustar ventilación"),
                row("Humedad Ambiente (%)", 40.0, 70.0, "Ajustar humedad"),
                row("Cantidad de Alimento (g)", 50.0, 100.0, "Revisar nivel de alimentación"),
                row("Flujo de Agua (L/min)", 5.0, 10.0, "Ajustar flujo de agua"),
                row("Intensidad de Luz (lux)", 5000.0, 80000.0, "Ajustar intensidad de luz"),
                row("Nivel de Agua (cm)", 20.0, 80.0, "Ajustar nivel de agua"),
                DecisionRow::new("Estado del Filtro", None, None, "Cambiar filtro si está sucio"),
                row("Consumo de Energía (kWh)", 1.0, 10.0, "Revisar consumo de energía"),
            ],
        }
    }
}
