use crate::error::AquaforgeError;
use aquaforge_schemas::reading::{
    FilterState, Parameter, Reading, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT,
};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim, Writer};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Column holding the categorical filter state.
pub const FILTER_STATE_COLUMN: &str = "estado_filtro";

/// One CSV row of the telemetry file, in column order.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub marca_de_tiempo: String,
    #[serde(rename = "nivel_de_oxigeno_agua_mg_L")]
    pub nivel_de_oxigeno_agua_mg_l: Option<f64>,
    pub nivel_de_ph: Option<f64>,
    pub nivel_de_nitratos_ppm: Option<f64>,
    pub nivel_de_nitritos_ppm: Option<f64>,
    #[serde(rename = "temperatura_agua_C")]
    pub temperatura_agua_c: Option<f64>,
    #[serde(rename = "temperatura_ambiente_C")]
    pub temperatura_ambiente_c: Option<f64>,
    #[serde(rename = "humedad_ambiente_%")]
    pub humedad_ambiente: Option<f64>,
    pub cantidad_alimento_g: Option<f64>,
    #[serde(rename = "flujo_de_agua_L_min")]
    pub flujo_de_agua_l_min: Option<f64>,
    pub intensidad_de_luz_lux: Option<f64>,
    pub nivel_de_agua_cm: Option<f64>,
    pub estado_filtro: Option<FilterState>,
    #[serde(rename = "consumo_energia_kWh")]
    pub consumo_energia_kwh: Option<f64>,
}

impl ReadingRecord {
    fn slot(&mut self, parameter: Parameter) -> &mut Option<f64> {
        match parameter {
            Parameter::DissolvedOxygen => &mut self.nivel_de_oxigeno_agua_mg_l,
            Parameter::Ph => &mut self.nivel_de_ph,
            Parameter::Nitrate => &mut self.nivel_de_nitratos_ppm,
            Parameter::Nitrite => &mut self.nivel_de_nitritos_ppm,
            Parameter::WaterTemperature => &mut self.temperatura_agua_c,
            Parameter::AmbientTemperature => &mut self.temperatura_ambiente_c,
            Parameter::AmbientHumidity => &mut self.humedad_ambiente,
            Parameter::FeedQuantity => &mut self.cantidad_alimento_g,
            Parameter::WaterFlow => &mut self.flujo_de_agua_l_min,
            Parameter::LightIntensity => &mut self.intensidad_de_luz_lux,
            Parameter::WaterLevel => &mut self.nivel_de_agua_cm,
            Parameter::EnergyConsumption => &mut self.consumo_energia_kwh,
        }
    }

    pub fn from_reading(reading: &Reading) -> Self {
        let mut record = ReadingRecord {
            marca_de_tiempo: reading.formatted_timestamp(),
            nivel_de_oxigeno_agua_mg_l: None,
            nivel_de_ph: None,
            nivel_de_nitratos_ppm: None,
            nivel_de_nitritos_ppm: None,
            temperatura_agua_c: None,
            temperatura_ambiente_c: None,
            humedad_ambiente: None,
            cantidad_alimento_g: None,
            flujo_de_agua_l_min: None,
            intensidad_de_luz_lux: None,
            nivel_de_agua_cm: None,
            estado_filtro: reading.filter_state,
            consumo_energia_kwh: None,
        };
        for (parameter, value) in &reading.values {
            *record.slot(*parameter) = Some(*value);
        }
        record
    }

    pub fn into_reading(mut self) -> Result<Reading, AquaforgeError> {
        let timestamp = parse_timestamp(&self.marca_de_tiempo)?;
        let mut reading = Reading::new(timestamp);
        for parameter in Parameter::ALL {
            if let Some(value) = self.slot(parameter).take() {
                reading.values.insert(parameter, value);
            }
        }
        reading.filter_state = self.estado_filtro;
        Ok(reading)
    }
}

pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, AquaforgeError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).map_err(|source| {
        AquaforgeError::InvalidTimestamp {
            value: value.to_string(),
            source,
        }
    })
}

/// Every column a telemetry CSV must carry, in file order.
pub fn expected_columns() -> Vec<&'static str> {
    let mut columns = vec![TIMESTAMP_COLUMN];
    columns.extend(
        Parameter::ALL
            .iter()
            .filter(|p| **p != Parameter::EnergyConsumption)
            .map(Parameter::column),
    );
    columns.push(FILTER_STATE_COLUMN);
    columns.push(Parameter::EnergyConsumption.column());
    columns
}

/// Writes readings to a telemetry CSV, one row per call.
pub struct TimeSeriesLogger {
    path: String,
    writer: Writer<fs::File>,
    rows: u64,
}

impl TimeSeriesLogger {
    pub fn new(path: &str) -> Result<Self, AquaforgeError> {
        if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AquaforgeError::FileIO(path.to_string(), e))?;
        }
        let writer =
            Writer::from_path(path).map_err(|e| AquaforgeError::CsvError(path.to_string(), e))?;
        Ok(Self {
            path: path.to_string(),
            writer,
            rows: 0,
        })
    }

    pub fn log_reading(&mut self, reading: &Reading) -> Result<(), AquaforgeError> {
        self.writer
            .serialize(ReadingRecord::from_reading(reading))
            .map_err(|e| AquaforgeError::CsvError(self.path.clone(), e))?;
        self.rows += 1;
        Ok(())
    }

    pub fn log_all<'a, I>(&mut self, readings: I) -> Result<(), AquaforgeError>
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        for reading in readings {
            self.log_reading(reading)?;
        }
        self.flush()
    }

    pub fn flush(&mut self) -> Result<(), AquaforgeError> {
        self.writer
            .flush()
            .map_err(|e| AquaforgeError::FileIO(self.path.clone(), e))?;
        tracing::debug!(path = %self.path, rows = self.rows, "telemetry flushed");
        Ok(())
    }

    pub fn rows_written(&self) -> u64 {
        self.rows
    }
}

/// Loads a telemetry CSV written by [`TimeSeriesLogger`] (or by hand with the same schema).
///
/// The header must carry every expected column; cells may be empty. Whitespace around
/// header names is ignored.
pub fn load_readings(path: &str) -> Result<Vec<Reading>, AquaforgeError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(|e| AquaforgeError::CsvError(path.to_string(), e))?;
    let headers = reader
        .headers()
        .map_err(|e| AquaforgeError::CsvError(path.to_string(), e))?
        .clone();
    for column in expected_columns() {
        if !headers.iter().any(|h| h == column) {
            return Err(AquaforgeError::MissingColumn {
                path: path.to_string(),
                column: column.to_string(),
            });
        }
    }

    let mut readings = Vec::new();
    for result in reader.deserialize() {
        let record: ReadingRecord =
            result.map_err(|e| AquaforgeError::CsvError(path.to_string(), e))?;
        readings.push(record.into_reading()?);
    }
    tracing::info!(path, readings = readings.len(), "telemetry loaded");
    Ok(readings)
}
