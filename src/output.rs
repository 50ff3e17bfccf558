use crate::error::Result;
use crate::types::{DebtTableRow, MeteringTableRow, RecordSet};
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export the normalized records under the sheet column names.
pub fn write_records_csv(path: &Path, records: &RecordSet) -> Result<()> {
    match records {
        RecordSet::Metering(rows) => write_csv(path, rows),
        RecordSet::Debt(rows) => write_csv(path, rows),
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_records(records: &RecordSet, max_rows: usize) {
    match records {
        RecordSet::Metering(rows) => {
            let rows: Vec<MeteringTableRow> = rows.iter().map(MeteringTableRow::from).collect();
            preview_table_rows(&rows, max_rows);
        }
        RecordSet::Debt(rows) => {
            let rows: Vec<DebtTableRow> = rows.iter().map(DebtTableRow::from).collect();
            preview_table_rows(&rows, max_rows);
        }
    }
}
