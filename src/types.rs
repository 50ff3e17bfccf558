use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

use crate::util::{format_int, format_number, format_opt_number, format_percent};

/// A single untyped cell as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        Cell::Text(s.to_string())
    }

    /// Cell rendered as a trimmed string, `None` when blank.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let t = s.trim();
                if t.is_empty() { None } else { Some(t.to_string()) }
            }
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(format!("{}", *n as i64)),
            Cell::Number(n) => Some(n.to_string()),
            Cell::Bool(b) => Some(b.to_string()),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_label().unwrap_or_default())
    }
}

/// Rows exactly as read from one sheet; rows may differ in length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub rows: Vec<Vec<Cell>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Number of physical columns: the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Metering,
    Debt,
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKind::Metering => write!(f, "metering"),
            SchemaKind::Debt => write!(f, "debt"),
        }
    }
}

/// One organization unit's metering progress. Numeric fields are `None`
/// when the source cell could not be read as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeteringRecord {
    #[serde(rename = "STT")]
    pub stt: Option<String>,
    #[serde(rename = "Điện lực")]
    pub unit: String,
    #[serde(rename = "1P_GT")]
    pub single_phase_indirect: Option<f64>,
    #[serde(rename = "1P_TT")]
    pub single_phase_direct: Option<f64>,
    #[serde(rename = "3P_GT")]
    pub three_phase_indirect: Option<f64>,
    #[serde(rename = "3P_TT")]
    pub three_phase_direct: Option<f64>,
    #[serde(rename = "TU")]
    pub voltage_transformers: Option<f64>,
    #[serde(rename = "TI")]
    pub current_transformers: Option<f64>,
    #[serde(rename = "Tổng công tơ")]
    pub total_meters: Option<f64>,
    #[serde(rename = "Kế hoạch")]
    pub plan: Option<f64>,
    /// Completion ratio as a percentage (source fraction × 100).
    #[serde(rename = "Tỷ lệ")]
    pub ratio_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtRecord {
    #[serde(rename = "Điện lực")]
    pub unit: String,
    #[serde(rename = "Khách hàng nợ quá hạn chưa cắt điện")]
    pub overdue_customers: i64,
    #[serde(rename = "Số tiền")]
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeteringField {
    SinglePhaseIndirect,
    SinglePhaseDirect,
    ThreePhaseIndirect,
    ThreePhaseDirect,
    VoltageTransformers,
    CurrentTransformers,
    TotalMeters,
    Plan,
    RatioPct,
}

impl MeteringField {
    pub fn label(&self) -> &'static str {
        match self {
            MeteringField::SinglePhaseIndirect => "1P_GT",
            MeteringField::SinglePhaseDirect => "1P_TT",
            MeteringField::ThreePhaseIndirect => "3P_GT",
            MeteringField::ThreePhaseDirect => "3P_TT",
            MeteringField::VoltageTransformers => "TU",
            MeteringField::CurrentTransformers => "TI",
            MeteringField::TotalMeters => "Tổng công tơ",
            MeteringField::Plan => "Kế hoạch",
            MeteringField::RatioPct => "Tỷ lệ (%)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtField {
    OverdueCustomers,
    Amount,
}

impl DebtField {
    pub fn label(&self) -> &'static str {
        match self {
            DebtField::OverdueCustomers => "Khách hàng nợ quá hạn chưa cắt điện",
            DebtField::Amount => "Số tiền",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// A record that can be ordered by one of its numeric fields.
pub trait Rankable {
    type Field: Copy;

    fn metric(&self, field: Self::Field) -> Option<f64>;
    fn unit(&self) -> &str;
}

impl Rankable for MeteringRecord {
    type Field = MeteringField;

    fn metric(&self, field: MeteringField) -> Option<f64> {
        match field {
            MeteringField::SinglePhaseIndirect => self.single_phase_indirect,
            MeteringField::SinglePhaseDirect => self.single_phase_direct,
            MeteringField::ThreePhaseIndirect => self.three_phase_indirect,
            MeteringField::ThreePhaseDirect => self.three_phase_direct,
            MeteringField::VoltageTransformers => self.voltage_transformers,
            MeteringField::CurrentTransformers => self.current_transformers,
            MeteringField::TotalMeters => self.total_meters,
            MeteringField::Plan => self.plan,
            MeteringField::RatioPct => self.ratio_pct,
        }
    }

    fn unit(&self) -> &str {
        &self.unit
    }
}

impl Rankable for DebtRecord {
    type Field = DebtField;

    fn metric(&self, field: DebtField) -> Option<f64> {
        match field {
            DebtField::OverdueCustomers => Some(self.overdue_customers as f64),
            DebtField::Amount => Some(self.amount),
        }
    }

    fn unit(&self) -> &str {
        &self.unit
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordSet {
    Metering(Vec<MeteringRecord>),
    Debt(Vec<DebtRecord>),
}

impl RecordSet {
    pub fn kind(&self) -> SchemaKind {
        match self {
            RecordSet::Metering(_) => SchemaKind::Metering,
            RecordSet::Debt(_) => SchemaKind::Debt,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordSet::Metering(v) => v.len(),
            RecordSet::Debt(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    MeetsPlan,
    BelowPlan,
    /// Plan total is zero, so no ratio exists to judge.
    Undetermined,
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::MeetsPlan => "✅ ĐẠT kế hoạch",
            Verdict::BelowPlan => "❌ CHƯA ĐẠT kế hoạch",
            Verdict::Undetermined => "không xác định",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub total_current: f64,
    pub total_plan: f64,
    pub as_of: NaiveDate,
    pub period_end: NaiveDate,
    pub days_passed: i64,
    pub days_total: i64,
    pub avg_per_day: f64,
    pub forecast_total: f64,
    /// `None` when the plan total is zero.
    pub forecast_ratio: Option<f64>,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebtTotals {
    pub unit_count: usize,
    pub total_count: i64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportSummary {
    Metering(ForecastResult),
    Debt(DebtTotals),
}

/// Metering row as shown in document tables.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MeteringTableRow {
    #[tabled(rename = "Điện lực")]
    pub unit: String,
    #[tabled(rename = "Tổng công tơ")]
    pub total_meters: String,
    #[tabled(rename = "Kế hoạch")]
    pub plan: String,
    #[tabled(rename = "Tỷ lệ")]
    pub ratio: String,
}

impl From<&MeteringRecord> for MeteringTableRow {
    fn from(r: &MeteringRecord) -> Self {
        Self {
            unit: r.unit.clone(),
            total_meters: format_opt_number(r.total_meters, 0),
            plan: format_opt_number(r.plan, 0),
            ratio: r.ratio_pct.map(format_percent).unwrap_or_else(|| "N/A".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Tabled)]
pub struct DebtTableRow {
    #[tabled(rename = "Điện lực")]
    pub unit: String,
    #[tabled(rename = "KH nợ quá hạn chưa cắt điện")]
    pub overdue_customers: String,
    #[tabled(rename = "Số tiền")]
    pub amount: String,
}

impl From<&DebtRecord> for DebtTableRow {
    fn from(r: &DebtRecord) -> Self {
        Self {
            unit: r.unit.clone(),
            overdue_customers: format_int(r.overdue_customers),
            amount: format_number(r.amount, 0),
        }
    }
}
