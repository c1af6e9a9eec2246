//! Historical production view over the hand-maintained production workbook.

use crate::plotting::{self, KindTotals};
use crate::report::{cell_f64, cell_string};
use anyhow::{anyhow, Context, Result};
use aquaforge_schemas::production::{columns, ProductionRecord};
use calamine::{open_workbook_auto, Reader};
use std::fs;

/// User-supplied filters; `None`/empty fields fall back to the defaults.
#[derive(Debug, Clone, Default)]
pub struct ProductionFilter {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub kinds: Vec<String>,
}

/// The filter actually applied once defaults are filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFilter {
    pub year: i64,
    pub month: i64,
    pub kinds: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductionSummary {
    pub total_production: f64,
    pub total_income: f64,
    pub total_profit: f64,
    pub mean_weight: Option<f64>,
    pub mean_mortality: Option<f64>,
    pub total_sales_kg: f64,
}

/// Loads the first sheet of the workbook. Numeric cells that do not parse become `None`;
/// rows without a year or month are dropped.
pub fn load_production(path: &str) -> Result<Vec<ProductionRecord>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open production workbook: {}", path))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {} has no sheets", path))?
        .with_context(|| format!("Failed to read first sheet of {}", path))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("Workbook {} is empty", path))?
        .iter()
        .map(|c| cell_string(c).unwrap_or_default().trim().to_string())
        .collect();
    let index = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in {}", name, path))
    };

    let year = index(columns::YEAR)?;
    let month = index(columns::MONTH)?;
    let kind = index(columns::KIND)?;
    let harvest = index(columns::HARVEST_QUANTITY)?;
    let sales = index(columns::SALES_KG)?;
    let cost = index(columns::PRODUCTION_COST)?;
    let profit = index(columns::PROFIT)?;
    let income = index(columns::PRODUCTION_INCOME)?;
    let mortality = index(columns::MORTALITY)?;
    let weight = index(columns::WEIGHT)?;
    let quantity = index(columns::PRODUCTION_QUANTITY)?;

    let mut records = Vec::new();
    for row in rows {
        let number = |col: usize| row.get(col).and_then(cell_f64);
        let (Some(y), Some(m)) = (number(year), number(month)) else {
            tracing::debug!("skipping production row without year or month");
            continue;
        };
        records.push(ProductionRecord {
            year: y as i64,
            month: m as i64,
            kind: row.get(kind).and_then(cell_string).unwrap_or_default(),
            harvest_quantity: number(harvest),
            sales_kg: number(sales),
            production_cost: number(cost),
            profit: number(profit),
            production_income: number(income),
            mortality: number(mortality),
            weight: number(weight),
            production_quantity: number(quantity),
        });
    }
    tracing::info!(path, records = records.len(), "production workbook loaded");
    Ok(records)
}

/// Distinct kinds in order of first appearance.
pub fn kinds(records: &[ProductionRecord]) -> Vec<String> {
    let mut kinds: Vec<String> = Vec::new();
    for record in records {
        if !kinds.contains(&record.kind) {
            kinds.push(record.kind.clone());
        }
    }
    kinds
}

/// Fills in the defaults: latest year, smallest month, every kind.
/// Returns `None` when there are no records to pick defaults from.
pub fn resolve_filter(
    records: &[ProductionRecord],
    filter: &ProductionFilter,
) -> Option<ResolvedFilter> {
    let year = filter.year.or_else(|| records.iter().map(|r| r.year).max())?;
    let month = filter.month.or_else(|| records.iter().map(|r| r.month).min())?;
    let kinds = if filter.kinds.is_empty() {
        kinds(records)
    } else {
        filter.kinds.clone()
    };
    Some(ResolvedFilter { year, month, kinds })
}

pub fn apply_filter(
    records: &[ProductionRecord],
    filter: &ResolvedFilter,
) -> Vec<ProductionRecord> {
    records
        .iter()
        .filter(|r| r.year == filter.year && r.month == filter.month)
        .filter(|r| filter.kinds.contains(&r.kind))
        .cloned()
        .collect()
}

pub fn summarize(records: &[ProductionRecord]) -> ProductionSummary {
    let sum = |f: fn(&ProductionRecord) -> Option<f64>| records.iter().filter_map(f).sum::<f64>();
    let mean = |f: fn(&ProductionRecord) -> Option<f64>| {
        let values: Vec<f64> = records.iter().filter_map(f).collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    ProductionSummary {
        total_production: sum(|r| r.production_quantity),
        total_income: sum(|r| r.production_income),
        total_profit: sum(|r| r.profit),
        mean_weight: mean(|r| r.weight),
        mean_mortality: mean(|r| r.mortality),
        total_sales_kg: sum(|r| r.sales_kg),
    }
}

/// Per-kind sums for the charts, in order of first appearance.
pub fn kind_totals(records: &[ProductionRecord]) -> Vec<KindTotals> {
    kinds(records)
        .into_iter()
        .map(|kind| {
            let of_kind = records.iter().filter(|r| r.kind == kind);
            let mut totals = KindTotals {
                kind: kind.clone(),
                harvest: 0.0,
                sales: 0.0,
                cost: 0.0,
                profit: 0.0,
            };
            for r in of_kind {
                totals.harvest += r.harvest_quantity.unwrap_or(0.0);
                totals.sales += r.sales_kg.unwrap_or(0.0);
                totals.cost += r.production_cost.unwrap_or(0.0);
                totals.profit += r.profit.unwrap_or(0.0);
            }
            totals
        })
        .collect()
}

/// Rows for the detail table, latest month first.
pub fn detail_rows(records: &[ProductionRecord]) -> Vec<ProductionRecord> {
    let mut rows = records.to_vec();
    rows.sort_by(|a, b| b.month.cmp(&a.month));
    rows
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

/// Loads, filters and prints the production view, then renders its two charts.
pub fn run_production_view(
    workbook: &str,
    output_dir: &str,
    filter: &ProductionFilter,
) -> Result<()> {
    println!("\n--- [Production] Historical view of '{}' ---", workbook);
    let records = load_production(workbook)
        .context("Error loading production data")?;
    let Some(resolved) = resolve_filter(&records, filter) else {
        println!("No production records found.");
        return Ok(());
    };
    let selected = apply_filter(&records, &resolved);
    println!(
        "Year {} | Month {} | Types: {}",
        resolved.year,
        resolved.month,
        resolved.kinds.join(", ")
    );

    let summary = summarize(&selected);
    println!("Total Production:   {:.2} kg", summary.total_production);
    println!("Total Income:       S/. {:.2}", summary.total_income);
    println!("Total Profit:       S/. {:.2}", summary.total_profit);
    println!("Average Weight:     {} kg", fmt_opt(summary.mean_weight));
    println!("Average Mortality:  {} %", fmt_opt(summary.mean_mortality));
    println!("Total Sales:        {:.2} kg", summary.total_sales_kg);

    println!(
        "\n{:>5} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "month", "type", "harvest", "sales_kg", "cost", "income", "profit", "mortality", "weight"
    );
    for r in detail_rows(&selected) {
        println!(
            "{:>5} {:<14} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            r.month,
            r.kind,
            fmt_opt(r.harvest_quantity),
            fmt_opt(r.sales_kg),
            fmt_opt(r.production_cost),
            fmt_opt(r.production_income),
            fmt_opt(r.profit),
            fmt_opt(r.mortality),
            fmt_opt(r.weight),
        );
    }

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;
    let totals = kind_totals(&selected);
    plotting::plot_harvest_vs_sales(output_dir, &totals)?;
    plotting::plot_cost_and_profit(output_dir, &totals)?;
    println!("\nCharts written to '{}'", output_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    const HEADER: [&str; 11] = [
        columns::YEAR,
        columns::MONTH,
        columns::KIND,
        columns::HARVEST_QUANTITY,
        columns::SALES_KG,
        columns::PRODUCTION_COST,
        columns::PRODUCTION_INCOME,
        columns::PROFIT,
        columns::MORTALITY,
        columns::WEIGHT,
        columns::PRODUCTION_QUANTITY,
    ];

    fn write_workbook(path: &str) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (c, h) in HEADER.iter().enumerate() {
            sheet.write_string(0, c as u16, *h).unwrap();
        }
        let rows: [(f64, f64, &str, [f64; 8]); 4] = [
            (2023.0, 12.0, "Tilapia", [100.0, 90.0, 500.0, 900.0, 400.0, 2.0, 0.5, 120.0]),
            (2024.0, 2.0, "Tilapia", [110.0, 95.0, 520.0, 950.0, 430.0, 4.0, 0.6, 130.0]),
            (2024.0, 1.0, "Lechuga", [50.0, 45.0, 100.0, 300.0, 200.0, 1.0, 0.2, 60.0]),
            (2024.0, 1.0, "Tilapia", [105.0, 92.0, 510.0, 940.0, 430.0, 3.0, 0.55, 125.0]),
        ];
        for (i, (year, month, kind, values)) in rows.iter().enumerate() {
            let r = i as u32 + 1;
            sheet.write_number(r, 0, *year).unwrap();
            sheet.write_number(r, 1, *month).unwrap();
            sheet.write_string(r, 2, *kind).unwrap();
            for (j, v) in values.iter().enumerate() {
                sheet.write_number(r, j as u16 + 3, *v).unwrap();
            }
        }
        // A text cell in a numeric column becomes missing.
        sheet.write_string(3, 9, "n/a").unwrap();
        workbook.save(path).unwrap();
    }

    fn loaded() -> Vec<ProductionRecord> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proceso_de_produccion.xlsx");
        let path = path.to_str().unwrap();
        write_workbook(path);
        load_production(path).unwrap()
    }

    #[test]
    fn loads_rows_and_coerces_numbers() {
        let records = loaded();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].year, 2023);
        assert_eq!(records[2].kind, "Lechuga");
        assert_eq!(records[2].weight, None);
        assert_eq!(records[1].sales_kg, Some(95.0));
    }

    #[test]
    fn defaults_pick_latest_year_and_smallest_month() {
        let records = loaded();
        let resolved = resolve_filter(&records, &ProductionFilter::default()).unwrap();
        assert_eq!(resolved.year, 2024);
        assert_eq!(resolved.month, 1);
        assert_eq!(resolved.kinds, vec!["Tilapia".to_string(), "Lechuga".to_string()]);

        let selected = apply_filter(&records, &resolved);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn summary_sums_and_skips_missing_in_means() {
        let records = loaded();
        let resolved = resolve_filter(&records, &ProductionFilter::default()).unwrap();
        let summary = summarize(&apply_filter(&records, &resolved));
        assert_eq!(summary.total_production, 185.0);
        assert_eq!(summary.total_income, 1240.0);
        assert_eq!(summary.total_profit, 630.0);
        assert_eq!(summary.total_sales_kg, 137.0);
        assert_eq!(summary.mean_weight, Some(0.55));
        assert_eq!(summary.mean_mortality, Some(2.0));
    }

    #[test]
    fn kind_filter_and_totals() {
        let records = loaded();
        let filter = ProductionFilter {
            year: Some(2024),
            month: Some(1),
            kinds: vec!["Lechuga".to_string()],
        };
        let resolved = resolve_filter(&records, &filter).unwrap();
        let totals = kind_totals(&apply_filter(&records, &resolved));
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].kind, "Lechuga");
        assert_eq!(totals[0].harvest, 50.0);
        assert_eq!(totals[0].profit, 200.0);
    }

    #[test]
    fn detail_rows_are_sorted_by_month_descending() {
        let records = loaded();
        let months: Vec<i64> = detail_rows(&records).iter().map(|r| r.month).collect();
        assert_eq!(months, vec![12, 2, 1, 1]);
    }

    #[test]
    fn empty_input_has_no_default_filter() {
        assert_eq!(resolve_filter(&[], &ProductionFilter::default()), None);
    }

    #[test]
    fn missing_workbook_is_an_error() {
        assert!(load_production("/no/such/proceso_de_produccion.xlsx").is_err());
    }
}
