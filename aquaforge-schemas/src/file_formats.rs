use crate::{
    profile::{BatchProfile, LiveProfile},
    range::{DecisionRow, ParameterRange},
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RangeFile {
    pub schema_version: String,
    pub ranges: Vec<ParameterRange>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionFile {
    pub schema_version: String,
    pub decisions: Vec<DecisionRow>,
}

#[derive(Debug, Deserialize)]
pub struct ProfileFile {
    pub schema_version: String,
    #[serde(default)]
    pub live: Option<LiveProfile>,
    #[serde(default)]
    pub batch: Option<BatchProfile>,
}
