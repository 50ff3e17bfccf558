//! Report document assembly.
//!
//! A `ReportDocument` always has the same sections in the same order:
//! overview key/values, a one-sentence commentary, the full table, the
//! top-N and bottom-N tables, then the charts. Renderers turn the document
//! into bytes; `MarkdownRenderer` is the one shipped here.
use crate::error::Result;
use crate::ranker::rank;
use crate::types::{
    DebtField, DebtRecord, DebtTableRow, DebtTotals, ForecastResult, MeteringField,
    MeteringRecord, MeteringTableRow, Rankable, SortOrder,
};
use crate::util::{format_date_vn, format_int, format_number, format_percent};
use chrono::NaiveDate;
use tabled::{settings::Style, Table, Tabled};

/// A bar chart as data. Bars with no value are drawn as "N/A".
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub bars: Vec<(String, Option<f64>)>,
}

impl Chart {
    pub fn from_records<R: Rankable>(title: &str, records: &[R], field: R::Field) -> Self {
        Self {
            title: title.to_string(),
            bars: records
                .iter()
                .map(|r| (r.unit().to_string(), r.metric(field)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum TableRows {
    Metering(Vec<MeteringTableRow>),
    Debt(Vec<DebtTableRow>),
}

#[derive(Debug, Clone)]
pub struct TableSection {
    pub heading: String,
    pub rows: TableRows,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub overview: Vec<(String, String)>,
    pub commentary: String,
    pub full: TableSection,
    pub top: TableSection,
    pub bottom: TableSection,
    pub charts: Vec<Chart>,
}

pub trait DocumentRenderer {
    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>>;

    /// File extension for rendered output, without the dot.
    fn extension(&self) -> &'static str;
}

fn ratio_text(ratio: Option<f64>) -> String {
    ratio.map(|r| format_percent(r * 100.0)).unwrap_or_else(|| "N/A".to_string())
}

pub fn metering_commentary(f: &ForecastResult) -> String {
    format!(
        "Dự kiến đến {} sẽ hoàn thành khoảng {} thiết bị, tương đương {}. {}",
        format_date_vn(f.period_end),
        format_number(f.forecast_total, 0),
        ratio_text(f.forecast_ratio),
        f.verdict.label()
    )
}

pub fn assemble_metering(
    records: &[MeteringRecord],
    forecast: &ForecastResult,
    top: &[MeteringRecord],
    bottom: &[MeteringRecord],
    field: MeteringField,
) -> ReportDocument {
    let n = top.len().max(bottom.len());
    let overview = vec![
        ("Tổng công tơ đã thực hiện".to_string(), format_number(forecast.total_current, 0)),
        ("Kế hoạch giao".to_string(), format_number(forecast.total_plan, 0)),
        ("Số ngày đã thực hiện".to_string(), format!("{} ngày", forecast.days_passed)),
        ("Tốc độ TB/ngày".to_string(), format!("{:.2}", forecast.avg_per_day)),
        (
            format!("Dự báo đến {}", format_date_vn(forecast.period_end)),
            format_number(forecast.forecast_total.trunc(), 0),
        ),
        ("Tỷ lệ dự báo".to_string(), ratio_text(forecast.forecast_ratio)),
        ("Đánh giá".to_string(), forecast.verdict.label().to_string()),
    ];
    let rows = |rs: &[MeteringRecord]| TableRows::Metering(rs.iter().map(MeteringTableRow::from).collect());
    let overall = rank(records, field, SortOrder::Descending);

    ReportDocument {
        title: format!(
            "BÁO CÁO PHÂN TÍCH KẾT QUẢ KIỂM TRA HỆ THỐNG ĐO ĐẾM ĐẾN NGÀY {}",
            format_date_vn(forecast.as_of)
        ),
        overview,
        commentary: metering_commentary(forecast),
        full: TableSection { heading: "III. SỐ LIỆU CHI TIẾT".to_string(), rows: rows(records) },
        top: TableSection { heading: format!("IV. TOP {} ĐIỆN LỰC", n), rows: rows(top) },
        bottom: TableSection { heading: format!("V. BOTTOM {} ĐIỆN LỰC", n), rows: rows(bottom) },
        charts: vec![
            Chart::from_records(&format!("Top {} {} cao", top.len(), field.label()), top, field),
            Chart::from_records(&format!("Bottom {} {} thấp", bottom.len(), field.label()), bottom, field),
            Chart::from_records(&format!("Tổng hợp {} theo Điện lực", field.label()), &overall, field),
        ],
    }
}

pub fn debt_commentary(totals: &DebtTotals, top: &[DebtRecord]) -> String {
    let mut s = format!(
        "Toàn đơn vị có {} khách hàng nợ quá hạn chưa cắt điện với tổng số tiền {} đồng tại {} Điện lực.",
        format_int(totals.total_count),
        format_number(totals.total_amount, 0),
        totals.unit_count
    );
    if let Some(first) = top.first() {
        s.push_str(&format!(
            " Cao nhất: {} ({} khách hàng, {} đồng).",
            first.unit,
            format_int(first.overdue_customers),
            format_number(first.amount, 0)
        ));
    }
    s
}

pub fn assemble_debt(
    records: &[DebtRecord],
    totals: &DebtTotals,
    top: &[DebtRecord],
    bottom: &[DebtRecord],
    field: DebtField,
    as_of: NaiveDate,
) -> ReportDocument {
    let n = top.len().max(bottom.len());
    let overview = vec![
        ("Số Điện lực".to_string(), totals.unit_count.to_string()),
        ("Tổng khách hàng nợ quá hạn chưa cắt điện".to_string(), format_int(totals.total_count)),
        ("Tổng số tiền".to_string(), format_number(totals.total_amount, 0)),
    ];
    let rows = |rs: &[DebtRecord]| TableRows::Debt(rs.iter().map(DebtTableRow::from).collect());
    let overall = rank(records, field, SortOrder::Descending);

    ReportDocument {
        title: format!(
            "BÁO CÁO KHÁCH HÀNG NỢ QUÁ HẠN CHƯA CẮT ĐIỆN NGÀY {}",
            format_date_vn(as_of)
        ),
        overview,
        commentary: debt_commentary(totals, top),
        full: TableSection { heading: "III. SỐ LIỆU CHI TIẾT".to_string(), rows: rows(records) },
        top: TableSection { heading: format!("IV. TOP {} ĐIỆN LỰC", n), rows: rows(top) },
        bottom: TableSection { heading: format!("V. BOTTOM {} ĐIỆN LỰC", n), rows: rows(bottom) },
        charts: vec![
            Chart::from_records(&format!("Top {} {} cao", top.len(), field.label()), top, field),
            Chart::from_records(&format!("Bottom {} {} thấp", bottom.len(), field.label()), bottom, field),
            Chart::from_records(&format!("Tổng hợp {} theo Điện lực", field.label()), &overall, field),
        ],
    }
}

/// Renders a document as Markdown with pipe tables and text bar charts.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    pub bar_width: usize,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { bar_width: 40 }
    }
}

impl MarkdownRenderer {
    fn table<T: Tabled + Clone>(rows: &[T]) -> String {
        if rows.is_empty() {
            return "_(không có dữ liệu)_".to_string();
        }
        Table::new(rows.iter().cloned()).with(Style::markdown()).to_string()
    }

    fn section(out: &mut String, section: &TableSection) {
        out.push_str(&format!("## {}\n\n", section.heading));
        let body = match &section.rows {
            TableRows::Metering(rows) => Self::table(rows),
            TableRows::Debt(rows) => Self::table(rows),
        };
        out.push_str(&body);
        out.push_str("\n\n");
    }

    pub fn chart(&self, chart: &Chart) -> String {
        let max = chart
            .bars
            .iter()
            .filter_map(|(_, v)| *v)
            .fold(0.0_f64, f64::max);
        let label_width = chart.bars.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
        let mut out = format!("{}\n", chart.title);
        for (label, value) in &chart.bars {
            let pad = " ".repeat(label_width - label.chars().count());
            match value {
                Some(v) => {
                    let len = if max > 0.0 && *v > 0.0 {
                        ((v / max) * self.bar_width as f64).round() as usize
                    } else {
                        0
                    };
                    out.push_str(&format!("{}{} | {} {}\n", label, pad, "█".repeat(len), format_number(*v, 2)));
                }
                None => out.push_str(&format!("{}{} | N/A\n", label, pad)),
            }
        }
        out
    }
}

impl DocumentRenderer for MarkdownRenderer {
    fn render(&self, doc: &ReportDocument) -> Result<Vec<u8>> {
        let mut out = format!("# {}\n\n", doc.title);

        out.push_str("## I. ĐÁNH GIÁ TỔNG QUÁT\n\n");
        for (key, value) in &doc.overview {
            out.push_str(&format!("- **{}**: {}\n", key, value));
        }
        out.push('\n');

        out.push_str("## II. NHẬN XÉT\n\n");
        out.push_str(&doc.commentary);
        out.push_str("\n\n");

        Self::section(&mut out, &doc.full);
        Self::section(&mut out, &doc.top);
        Self::section(&mut out, &doc.bottom);

        out.push_str("## VI. BIỂU ĐỒ\n\n");
        for chart in &doc.charts {
            out.push_str("```text\n");
            out.push_str(&self.chart(chart));
            out.push_str("```\n\n");
        }
        Ok(out.into_bytes())
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}
