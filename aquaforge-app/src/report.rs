//! Spreadsheet output: the per-reading adjustments sheet and the operator reference sheet,
//! plus a reader for the adjustments sheet.

use anyhow::{anyhow, bail, Context, Result};
use aquaforge_core::logger::parse_timestamp;
use aquaforge_schemas::{
    range::DecisionTable,
    reading::{Parameter, TIMESTAMP_COLUMN, TIMESTAMP_FORMAT},
    violation::Violation,
};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Image, Workbook, Worksheet};
use std::{fs, path::Path};

pub const ADJUSTMENTS_SHEET: &str = "Ajustes";
pub const DECISIONS_SHEET: &str = "Parametros y Ajustes";

const ADJUSTMENT_HEADERS: [&str; 5] = [
    TIMESTAMP_COLUMN,
    "parameter",
    "current_value",
    "target_value",
    "adjustment",
];
const DECISION_HEADERS: [&str; 4] = ["Parametro", "Valor Minimo", "Valor Maximo", "Accion a Tomar"];
const DECISION_TITLE: &str = "Parámetros del Sistema Acuapónico y Acciones";

/// Writes one row per violation to the `Ajustes` sheet.
pub fn write_adjustments_report(
    path: &str,
    violations: &[Violation],
    logo: Option<&Path>,
) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(ADJUSTMENTS_SHEET)?;

    for (col, header) in ADJUSTMENT_HEADERS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for (i, violation) in violations.iter().enumerate() {
        let row = i as u32 + 1;
        worksheet.write_string(row, 0, violation.timestamp.format(TIMESTAMP_FORMAT).to_string())?;
        worksheet.write_string(row, 1, violation.parameter.column())?;
        worksheet.write_number(row, 2, violation.current_value)?;
        worksheet.write_number(row, 3, violation.target_value)?;
        worksheet.write_string(row, 4, violation.adjustment.as_str())?;
    }

    worksheet.autofilter(0, 0, violations.len() as u32, ADJUSTMENT_HEADERS.len() as u16 - 1)?;

    if let Some(image) = load_logo(logo, 0.3)? {
        worksheet.insert_image_with_offset(0, 5, &image, 15, 10)?;
    }

    worksheet.set_column_width(0, 20)?;
    worksheet.set_column_width(1, 25)?;
    worksheet.set_column_width(2, 15)?;
    worksheet.set_column_width(3, 15)?;
    worksheet.set_column_width(4, 30)?;

    save(&mut workbook, path)?;
    tracing::info!(path, rows = violations.len(), "adjustments report written");
    Ok(())
}

/// Writes the static parameter/action reference table with a merged title row.
pub fn write_decision_report(path: &str, table: &DecisionTable, logo: Option<&Path>) -> Result<()> {
    let border = Format::new().set_border(FormatBorder::Thin);
    let title = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_align(FormatAlign::Center);
    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4F81BD))
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DECISIONS_SHEET)?;

    worksheet.merge_range(0, 0, 0, 3, DECISION_TITLE, &title)?;
    for (col, text) in DECISION_HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(1, col as u16, *text, &header)?;
    }

    for (i, decision) in table.rows.iter().enumerate() {
        let row = i as u32 + 2;
        worksheet.write_string_with_format(row, 0, decision.label.as_str(), &border)?;
        write_optional_number(worksheet, row, 1, decision.min, &border)?;
        write_optional_number(worksheet, row, 2, decision.max, &border)?;
        worksheet.write_string_with_format(row, 3, decision.action.as_str(), &border)?;
    }

    let last_row = (table.rows.len() as u32 + 1).max(1);
    worksheet.autofilter(1, 0, last_row, 3)?;

    if let Some(image) = load_logo(logo, 1.0)? {
        worksheet.insert_image(0, 4, &image)?;
    }

    worksheet.set_column_width(0, 34)?;
    worksheet.set_column_width(1, 14)?;
    worksheet.set_column_width(2, 14)?;
    worksheet.set_column_width(3, 32)?;

    save(&mut workbook, path)?;
    tracing::info!(path, rows = table.rows.len(), "decision table written");
    Ok(())
}

/// Reads the `Ajustes` sheet back into violations.
pub fn read_adjustments_report(path: &str) -> Result<Vec<Violation>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open workbook: {}", path))?;
    let range = workbook
        .worksheet_range(ADJUSTMENTS_SHEET)
        .with_context(|| format!("Sheet '{}' not found in {}", ADJUSTMENTS_SHEET, path))?;

    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| anyhow!("Sheet '{}' in {} is empty", ADJUSTMENTS_SHEET, path))?
        .iter()
        .map(|c| cell_string(c).unwrap_or_default())
        .collect();
    if header.iter().map(String::as_str).ne(ADJUSTMENT_HEADERS.iter().copied()) {
        bail!("Unexpected header in {}: {:?}", path, header);
    }

    rows.enumerate()
        .map(|(i, row)| -> Result<Violation> {
            let line = i + 2;
            let text = |col: usize| row.get(col).and_then(cell_string);
            let number = |col: usize| {
                row.get(col)
                    .and_then(cell_f64)
                    .ok_or_else(|| anyhow!("Row {} column {} is not a number", line, col + 1))
            };

            let timestamp = text(0).ok_or_else(|| anyhow!("Row {} has no timestamp", line))?;
            let column = text(1).ok_or_else(|| anyhow!("Row {} has no parameter", line))?;
            Ok(Violation {
                timestamp: parse_timestamp(&timestamp)?,
                parameter: Parameter::from_column(&column)
                    .ok_or_else(|| anyhow!("Row {} names unknown parameter '{}'", line, column))?,
                current_value: number(2)?,
                target_value: number(3)?,
                adjustment: text(4).unwrap_or_default(),
            })
        })
        .collect()
}

/// Numeric view of a cell; numeric strings are accepted, anything else is `None`.
pub(crate) fn cell_f64(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        Data::String(s) => s.trim().parse().ok(),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

pub(crate) fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => Some(s.clone()),
        Data::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
        _ => None,
    }
}

fn write_optional_number(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: Option<f64>,
    format: &Format,
) -> Result<()> {
    match value {
        Some(v) => worksheet.write_number_with_format(row, col, v, format)?,
        None => worksheet.write_blank(row, col, format)?,
    };
    Ok(())
}

/// The logo is optional: a missing file is skipped without complaint.
fn load_logo(logo: Option<&Path>, scale: f64) -> Result<Option<Image>> {
    let Some(path) = logo else {
        return Ok(None);
    };
    if !path.is_file() {
        tracing::debug!(path = %path.display(), "logo not found, skipping");
        return Ok(None);
    }
    let image = Image::new(path)
        .with_context(|| format!("Failed to load logo image {:?}", path))?
        .set_scale_width(scale)
        .set_scale_height(scale);
    Ok(Some(image))
}

fn save(workbook: &mut Workbook, path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook: {}", path))
}
