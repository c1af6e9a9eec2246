use anyhow::{bail, Context, Result};
use aquaforge_schemas::{
    file_formats::{DecisionFile, ProfileFile, RangeFile},
    profile::{BatchProfile, LiveProfile},
    range::{DecisionTable, RangeTable},
};
use serde::Deserialize;
use std::{fs, path::Path};

/// Runtime settings. Every field has a default so an empty (or absent) file is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding optional YAML overrides for the static tables.
    pub tables_dir: String,
    /// Seed for every random source; `None` draws from the OS.
    pub seed: Option<u64>,
    pub batch: BatchSettings,
    pub report: ReportSettings,
    pub live: LiveSettings,
    pub production: ProductionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub records: usize,
    pub output: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub adjustments_path: String,
    pub decisions_path: String,
    pub logo_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LiveSettings {
    pub interval_secs: u64,
    pub history_capacity: usize,
    pub output_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProductionSettings {
    pub workbook: String,
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tables_dir: "data/tables".to_string(),
            seed: None,
            batch: BatchSettings::default(),
            report: ReportSettings::default(),
            live: LiveSettings::default(),
            production: ProductionSettings::default(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            records: 1000,
            output: "data/datos_simulados_sistema_acuaponico.csv".to_string(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            adjustments_path: "data/ajustes_sistema_acuaponico.xlsx".to_string(),
            decisions_path: "data/decision_de_parametros_Sistema_Acuaponico.xlsx".to_string(),
            logo_path: "logo.jpg".to_string(),
        }
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            interval_secs: 3,
            history_capacity: 100,
            output_dir: "data/live".to_string(),
        }
    }
}

impl Default for ProductionSettings {
    fn default() -> Self {
        Self {
            workbook: "proceso_de_produccion.xlsx".to_string(),
            output_dir: "data/production".to_string(),
        }
    }
}

impl Settings {
    /// Reads settings from `path`, or returns the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path))?;
        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path))?;
        if settings.live.interval_secs == 0 {
            bail!("live.interval_secs must be at least 1");
        }
        Ok(settings)
    }
}

/// The static tables a run works from: evaluation ranges, the operator reference table
/// and the two simulation profiles.
#[derive(Debug, Clone, Default)]
pub struct FarmTables {
    pub ranges: RangeTable,
    pub decisions: DecisionTable,
    pub live: LiveProfile,
    pub batch: BatchProfile,
}

impl FarmTables {
    /// Loads every table from `base_path`, falling back to the built-in table for any
    /// file that does not exist.
    pub fn load(base_path: &str) -> Result<Self> {
        tracing::info!(base_path, "loading farm tables");
        let base = Path::new(base_path);

        let ranges = load_yaml_or_default(base.join("parameter_ranges.yaml"), |file: RangeFile| {
            RangeTable::new(file.ranges)
        })?;
        let decisions =
            load_yaml_or_default(base.join("decision_table.yaml"), |file: DecisionFile| {
                DecisionTable { rows: file.decisions }
            })?;
        if let Some(bad) = ranges.iter().find(|r| !r.is_consistent()) {
            bail!(
                "Range for '{}' is inconsistent: expected min {} <= target {} <= max {}",
                bad.parameter,
                bad.min,
                bad.target,
                bad.max
            );
        }
        let profiles: Option<ProfileFile> = load_yaml_file(base.join("simulation_profile.yaml"))?;
        let (live, batch) = match profiles {
            Some(file) => (file.live.unwrap_or_default(), file.batch.unwrap_or_default()),
            None => (LiveProfile::default(), BatchProfile::default()),
        };

        Ok(Self {
            ranges,
            decisions,
            live,
            batch,
        })
    }
}

/// Parses a YAML file if it exists.
fn load_yaml_file<P, F>(path: P) -> Result<Option<F>>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>,
{
    let path = path.as_ref();
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "no override file, using built-in table");
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;
    let parsed = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
    Ok(Some(parsed))
}

/// Generic helper: load a file wrapper and extract its table, or use `T::default()`.
fn load_yaml_or_default<P, F, E, T>(path: P, extract: E) -> Result<T>
where
    P: AsRef<Path>,
    F: for<'de> serde::Deserialize<'de>, // The file wrapper struct (e.g., RangeFile)
    E: Fn(F) -> T,
    T: Default,
{
    Ok(load_yaml_file(path)?.map(extract).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquaforge_schemas::reading::Parameter;

    #[test]
    fn missing_directory_yields_builtin_tables() {
        let tables = FarmTables::load("/nonexistent/tables").unwrap();
        assert_eq!(tables.ranges, RangeTable::default());
        assert_eq!(tables.decisions.rows.len(), 13);
        assert_eq!(tables.live.baselines.len(), 7);
    }

    #[test]
    fn range_override_replaces_the_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("parameter_ranges.yaml"),
            "schema_version: \"1.0\"\nranges:\n  - parameter: nivel_de_ph\n    min: 6.8\n    max: 7.2\n    target: 7.0\n    adjustment: Dose buffer\n",
        )
        .unwrap();
        let tables = FarmTables::load(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(tables.ranges.len(), 1);
        let ph = tables.ranges.get(Parameter::Ph).unwrap();
        assert_eq!((ph.min, ph.max), (6.8, 7.2));
    }

    #[test]
    fn shipped_tables_match_the_builtin_ones() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../data/tables");
        let tables = FarmTables::load(dir.to_str().unwrap()).unwrap();
        assert_eq!(tables.ranges, RangeTable::default());
        assert_eq!(tables.decisions, DecisionTable::default());
        assert_eq!(tables.live, LiveProfile::default());
        assert_eq!(tables.batch, BatchProfile::default());
    }

    #[test]
    fn inconsistent_range_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("parameter_ranges.yaml"),
            "schema_version: \"1.0\"\nranges:\n  - parameter: nivel_de_ph\n    min: 7.5\n    max: 6.5\n    target: 7.0\n    adjustment: x\n",
        )
        .unwrap();
        assert!(FarmTables::load(dir.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aquaforge.yaml");
        fs::write(&path, "seed: 7\nlive:\n  interval_secs: 1\n").unwrap();
        let settings = Settings::load(path.to_str()).unwrap();
        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.live.interval_secs, 1);
        assert_eq!(settings.live.history_capacity, 100);
        assert_eq!(settings.batch.records, 1000);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aquaforge.yaml");
        fs::write(&path, "live:\n  interval_secs: 0\n").unwrap();
        assert!(Settings::load(path.to_str()).is_err());
    }
}
