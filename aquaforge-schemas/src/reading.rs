use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Timestamp layout of the `marca_de_tiempo` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Name of the timestamp column in every telemetry file.
pub const TIMESTAMP_COLUMN: &str = "marca_de_tiempo";

/// A numeric sensor channel of the aquaponic system.
///
/// The serde names are the column names used by the telemetry CSV files and by the
/// YAML tables, so a parameter round-trips through both without a mapping layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Parameter {
    #[serde(rename = "nivel_de_oxigeno_agua_mg_L")]
    DissolvedOxygen,
    #[serde(rename = "nivel_de_ph")]
    Ph,
    #[serde(rename = "nivel_de_nitratos_ppm")]
    Nitrate,
    #[serde(rename = "nivel_de_nitritos_ppm")]
    Nitrite,
    #[serde(rename = "temperatura_agua_C")]
    WaterTemperature,
    #[serde(rename = "temperatura_ambiente_C")]
    AmbientTemperature,
    #[serde(rename = "humedad_ambiente_%")]
    AmbientHumidity,
    #[serde(rename = "cantidad_alimento_g")]
    FeedQuantity,
    #[serde(rename = "flujo_de_agua_L_min")]
    WaterFlow,
    #[serde(rename = "intensidad_de_luz_lux")]
    LightIntensity,
    #[serde(rename = "nivel_de_agua_cm")]
    WaterLevel,
    #[serde(rename = "consumo_energia_kWh")]
    EnergyConsumption,
}

impl Parameter {
    /// Every numeric parameter, in CSV column order.
    pub const ALL: [Parameter; 12] = [
        Parameter::DissolvedOxygen,
        Parameter::Ph,
        Parameter::Nitrate,
        Parameter::Nitrite,
        Parameter::WaterTemperature,
        Parameter::AmbientTemperature,
        Parameter::AmbientHumidity,
        Parameter::FeedQuantity,
        Parameter::WaterFlow,
        Parameter::LightIntensity,
        Parameter::WaterLevel,
        Parameter::EnergyConsumption,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Parameter::DissolvedOxygen => "nivel_de_oxigeno_agua_mg_L",
            Parameter::Ph => "nivel_de_ph",
            Parameter::Nitrate => "nivel_de_nitratos_ppm",
            Parameter::Nitrite => "nivel_de_nitritos_ppm",
            Parameter::WaterTemperature => "temperatura_agua_C",
            Parameter::AmbientTemperature => "temperatura_ambiente_C",
            Parameter::AmbientHumidity => "humedad_ambiente_%",
            Parameter::FeedQuantity => "cantidad_alimento_g",
            Parameter::WaterFlow => "flujo_de_agua_L_min",
            Parameter::LightIntensity => "intensidad_de_luz_lux",
            Parameter::WaterLevel => "nivel_de_agua_cm",
            Parameter::EnergyConsumption => "consumo_energia_kWh",
        }
    }

    /// Human-readable label with unit, used on the dashboard.
    pub fn label(&self) -> &'static str {
        match self {
            Parameter::DissolvedOxygen => "Oxygen (mg/L)",
            Parameter::Ph => "pH Level",
            Parameter::Nitrate => "Nitrate (ppm)",
            Parameter::Nitrite => "Nitrite (ppm)",
            Parameter::WaterTemperature => "Water Temperature (°C)",
            Parameter::AmbientTemperature => "Ambient Temperature (°C)",
            Parameter::AmbientHumidity => "Humidity (%)",
            Parameter::FeedQuantity => "Feed Quantity (g)",
            Parameter::WaterFlow => "Water Flow (L/min)",
            Parameter::LightIntensity => "Light Intensity (lux)",
            Parameter::WaterLevel => "Water Level (cm)",
            Parameter::EnergyConsumption => "Energy Consumption (kWh)",
        }
    }

    pub fn from_column(column: &str) -> Option<Parameter> {
        Parameter::ALL.into_iter().find(|p| p.column() == column)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterState {
    #[serde(rename = "Limpio")]
    Clean,
    #[serde(rename = "Necesita limpieza")]
    NeedsCleaning,
}

/// One timestamped snapshot of the sensor channels.
///
/// A reading only carries the parameters its producer knows about; the live simulator
/// emits a subset while the batch generator fills every column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<Parameter, f64>,
    pub filter_state: Option<FilterState>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
            filter_state: None,
        }
    }

    pub fn with_value(mut self, parameter: Parameter, value: f64) -> Self {
        self.values.insert(parameter, value);
        self
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(&parameter).copied()
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_map_back_to_parameters() {
        for parameter in Parameter::ALL {
            assert_eq!(Parameter::from_column(parameter.column()), Some(parameter));
        }
        assert_eq!(Parameter::from_column("estado_filtro"), None);
    }

    #[test]
    fn serde_names_match_csv_columns() {
        let yaml = serde_yaml::to_string(&Parameter::AmbientHumidity).unwrap();
        assert_eq!(yaml.trim(), "humedad_ambiente_%");
        let parsed: Parameter = serde_yaml::from_str("nivel_de_ph").unwrap();
        assert_eq!(parsed, Parameter::Ph);
    }

    #[test]
    fn filter_state_uses_spanish_labels() {
        let parsed: FilterState = serde_yaml::from_str("Necesita limpieza").unwrap();
        assert_eq!(parsed, FilterState::NeedsCleaning);
        assert_eq!(serde_yaml::to_string(&FilterState::Clean).unwrap().trim(), "Limpio");
        assert!(serde_yaml::from_str::<FilterState>("dirty").is_err());
    }
}
