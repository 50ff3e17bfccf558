use crate::config::{ReportConfig, METERING_FIELD_COUNT};
use crate::error::{ReportError, Result};
use crate::types::{Cell, DebtRecord, MeteringRecord, RawSheet, RecordSet, SchemaKind};
use crate::util::{parse_f64_cell, parse_i64_cell};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub blank_identity_rows: usize,
    pub reserved_total_rows: usize,
    pub missing_cells: usize,
}

/// Read one sheet of a workbook into a `RawSheet`.
///
/// `sheet = None` selects the first sheet. Row and column positions are
/// absolute: leading blank rows/columns that calamine trims from the used
/// range are restored as empty cells so positional schemas line up.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<RawSheet> {
    let mut workbook = open_workbook_auto(path)?;
    let names = workbook.sheet_names().to_vec();
    let name = match sheet {
        Some(wanted) => {
            if !names.iter().any(|n| n == wanted) {
                return Err(ReportError::Schema(format!(
                    "sheet '{}' not found (available: {})",
                    wanted,
                    names.join(", ")
                )));
            }
            wanted.to_string()
        }
        None => names
            .first()
            .cloned()
            .ok_or_else(|| ReportError::Schema("workbook has no sheets".to_string()))?,
    };

    let range = workbook.worksheet_range(&name)?;
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row_offset];
    for r in range.rows() {
        let mut row = vec![Cell::Empty; col_offset];
        row.extend(r.iter().map(cell_from_data));
        rows.push(row);
    }
    info!(path = %path.display(), sheet = %name, rows = rows.len(), "Read sheet");
    Ok(RawSheet::new(rows))
}

fn cell_from_data(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(v) => Cell::Number(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("{:?}", e)),
    }
}

/// Turn a raw sheet into typed records for `kind`.
pub fn normalize(raw: &RawSheet, kind: SchemaKind, config: &ReportConfig) -> Result<(RecordSet, LoadReport)> {
    let (records, report) = match kind {
        SchemaKind::Metering => {
            let (v, rep) = normalize_metering(raw, config)?;
            (RecordSet::Metering(v), rep)
        }
        SchemaKind::Debt => {
            let (v, rep) = normalize_debt(raw, config)?;
            (RecordSet::Debt(v), rep)
        }
    };
    info!(
        schema = %kind,
        total = report.total_rows,
        kept = report.kept_rows,
        blank_identity = report.blank_identity_rows,
        reserved_total = report.reserved_total_rows,
        missing_cells = report.missing_cells,
        "Normalized sheet"
    );
    Ok((records, report))
}

/// Positional layout: skip the title block, then read the first N columns.
/// Record field `k` comes from column `k`; `metering_fields` only names them.
/// Unparsable numbers become missing; the row is kept.
pub fn normalize_metering(raw: &RawSheet, config: &ReportConfig) -> Result<(Vec<MeteringRecord>, LoadReport)> {
    let fields = &config.metering_fields;
    if fields.len() != METERING_FIELD_COUNT {
        return Err(ReportError::Schema(format!(
            "metering field list has {} names, expected {}",
            fields.len(),
            METERING_FIELD_COUNT
        )));
    }
    let width = raw.width();
    if width < fields.len() {
        return Err(ReportError::Schema(format!(
            "sheet has {} columns, metering layout needs {}",
            width,
            fields.len()
        )));
    }

    let mut report = LoadReport::default();
    let mut out = Vec::new();
    for row in raw.rows.iter().skip(config.metering_header_rows) {
        report.total_rows += 1;
        let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);

        let Some(unit) = cell(1).as_label() else {
            report.blank_identity_rows += 1;
            continue;
        };

        let mut missing = 0usize;
        let mut num = |idx: usize| -> Option<f64> {
            let v = parse_f64_cell(cell(idx));
            if v.is_none() {
                missing += 1;
            }
            v
        };

        let record = MeteringRecord {
            stt: cell(0).as_label(),
            unit,
            single_phase_indirect: num(2),
            single_phase_direct: num(3),
            three_phase_indirect: num(4),
            three_phase_direct: num(5),
            voltage_transformers: num(6),
            current_transformers: num(7),
            total_meters: num(8),
            plan: num(9),
            ratio_pct: num(10).map(|fraction| fraction * 100.0),
        };
        report.missing_cells += missing;
        out.push(record);
    }
    report.kept_rows = out.len();
    debug!(kept = out.len(), "Metering rows normalized");
    Ok((out, report))
}

/// Header-row layout: the first row names the columns. Count and amount
/// are mandatory; a bad value fails the whole sheet.
pub fn normalize_debt(raw: &RawSheet, config: &ReportConfig) -> Result<(Vec<DebtRecord>, LoadReport)> {
    let Some(header) = raw.rows.first() else {
        return Err(ReportError::Schema("sheet is empty, no header row".to_string()));
    };
    let header: Vec<String> = header
        .iter()
        .map(|c| c.as_label().unwrap_or_default())
        .collect();
    let column = |name: &str| -> Result<usize> {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ReportError::Schema(format!("missing required column '{}'", name)))
    };
    let identity_idx = column(&config.debt_identity_column)?;
    let count_idx = column(&config.debt_count_column)?;
    let amount_idx = column(&config.debt_amount_column)?;

    let mut report = LoadReport::default();
    let mut out = Vec::new();
    for (offset, row) in raw.rows.iter().enumerate().skip(1) {
        report.total_rows += 1;
        let sheet_row = offset + 1;
        let cell = |idx: usize| row.get(idx).unwrap_or(&Cell::Empty);

        let Some(unit) = cell(identity_idx).as_label() else {
            report.blank_identity_rows += 1;
            continue;
        };
        if config.is_reserved_total(&unit) {
            report.reserved_total_rows += 1;
            continue;
        }

        let overdue_customers = parse_i64_cell(cell(count_idx)).ok_or_else(|| ReportError::Coercion {
            row: sheet_row,
            column: config.debt_count_column.clone(),
            value: cell(count_idx).to_string(),
        })?;
        let amount = parse_f64_cell(cell(amount_idx)).ok_or_else(|| ReportError::Coercion {
            row: sheet_row,
            column: config.debt_amount_column.clone(),
            value: cell(amount_idx).to_string(),
        })?;

        out.push(DebtRecord { unit, overdue_customers, amount });
    }
    report.kept_rows = out.len();
    debug!(kept = out.len(), "Debt rows normalized");
    Ok((out, report))
}
