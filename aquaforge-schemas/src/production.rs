use serde::{Deserialize, Serialize};

/// One row of the historical production workbook.
///
/// Numeric fields are optional because the workbook is hand-maintained and a cell that
/// does not parse as a number is treated as missing rather than rejected.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub year: i64,
    pub month: i64,
    pub kind: String,
    pub harvest_quantity: Option<f64>,
    pub sales_kg: Option<f64>,
    pub production_cost: Option<f64>,
    pub profit: Option<f64>,
    pub production_income: Option<f64>,
    pub mortality: Option<f64>,
    pub weight: Option<f64>,
    pub production_quantity: Option<f64>,
}

/// Workbook column names, in the order the detail table shows them.
pub mod columns {
    pub const YEAR: &str = "fecha_año";
    pub const MONTH: &str = "fecha_mes";
    pub const KIND: &str = "tipo";
    pub const HARVEST_QUANTITY: &str = "cantidad_cosecha";
    pub const SALES_KG: &str = "venta_kg";
    pub const PRODUCTION_COST: &str = "costo_produccion";
    pub const PRODUCTION_INCOME: &str = "ingreso_produccion";
    pub const PROFIT: &str = "ganancia";
    pub const MORTALITY: &str = "mortalidad_produccion";
    pub const WEIGHT: &str = "Peso_produccion";
    pub const PRODUCTION_QUANTITY: &str = "cantidad_produccion";
}
