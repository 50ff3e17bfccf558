// One report request: load → normalize → metrics → rank → assemble.
//
// Nothing here outlives the call; every request gets its own records and
// its own output.
use crate::config::ReportConfig;
use crate::error::Result;
use crate::loader::{normalize, read_sheet, LoadReport};
use crate::metrics::{debt_totals, forecast};
use crate::ranker::{bottom, top};
use crate::report::{assemble_debt, assemble_metering, ReportDocument};
use crate::types::{RecordSet, ReportSummary, SchemaKind};
use crate::util::format_date_vn;
use chrono::NaiveDate;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone)]
pub struct ReportOutput {
    pub as_of: NaiveDate,
    pub summary: ReportSummary,
    pub records: RecordSet,
    pub top: RecordSet,
    pub bottom: RecordSet,
    pub document: ReportDocument,
}

impl ReportOutput {
    pub fn kind(&self) -> SchemaKind {
        self.records.kind()
    }

    /// Human-readable label used when archiving the document.
    pub fn label(&self) -> String {
        match self.kind() {
            SchemaKind::Metering => format!("Báo cáo Hệ thống đo đếm {}", format_date_vn(self.as_of)),
            SchemaKind::Debt => format!("Báo cáo nợ quá hạn chưa cắt điện {}", format_date_vn(self.as_of)),
        }
    }

    pub fn file_stem(&self) -> &'static str {
        match self.kind() {
            SchemaKind::Metering => "Bao_cao_HeThongDoDem",
            SchemaKind::Debt => "Bao_cao_NoQuaHan",
        }
    }
}

/// Read and normalize a workbook for `kind`. Metering workbooks are read
/// from the configured sheet; debt workbooks from the first sheet.
pub fn load(path: &Path, kind: SchemaKind, config: &ReportConfig) -> Result<(RecordSet, LoadReport)> {
    let sheet = match kind {
        SchemaKind::Metering => Some(config.metering_sheet.as_str()),
        SchemaKind::Debt => None,
    };
    let raw = read_sheet(path, sheet)?;
    normalize(&raw, kind, config)
}

pub fn build_report(records: &RecordSet, config: &ReportConfig, as_of: NaiveDate) -> Result<ReportOutput> {
    let n = config.top_n;
    let output = match records {
        RecordSet::Metering(rows) => {
            let field = config.metering_rank_field;
            let f = forecast(rows, as_of, config.period_start, config.period_end)?;
            let top_rows = top(rows, n, field);
            let bottom_rows = bottom(rows, n, field);
            let document = assemble_metering(rows, &f, &top_rows, &bottom_rows, field);
            ReportOutput {
                as_of,
                summary: ReportSummary::Metering(f),
                records: records.clone(),
                top: RecordSet::Metering(top_rows),
                bottom: RecordSet::Metering(bottom_rows),
                document,
            }
        }
        RecordSet::Debt(rows) => {
            let field = config.debt_rank_field;
            let totals = debt_totals(rows);
            let top_rows = top(rows, n, field);
            let bottom_rows = bottom(rows, n, field);
            let document = assemble_debt(rows, &totals, &top_rows, &bottom_rows, field, as_of);
            ReportOutput {
                as_of,
                summary: ReportSummary::Debt(totals),
                records: records.clone(),
                top: RecordSet::Debt(top_rows),
                bottom: RecordSet::Debt(bottom_rows),
                document,
            }
        }
    };
    info!(schema = %output.kind(), records = output.records.len(), %as_of, "Built report");
    Ok(output)
}

/// Full pass over one workbook.
pub fn run(path: &Path, kind: SchemaKind, config: &ReportConfig) -> Result<(ReportOutput, LoadReport)> {
    config.validate()?;
    let (records, load_report) = load(path, kind, config)?;
    let output = build_report(&records, config, config.resolved_as_of())?;
    Ok((output, load_report))
}
