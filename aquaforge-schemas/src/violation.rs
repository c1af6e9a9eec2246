use crate::reading::Parameter;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A reading value found outside its configured band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub timestamp: NaiveDateTime,
    pub parameter: Parameter,
    pub current_value: f64,
    pub target_value: f64,
    pub adjustment: String,
}
