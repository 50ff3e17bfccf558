// Report configuration.
//
// Every constant the dashboard used to hard-code (forecast window, sheet
// name, positional column list, reserved total label) lives here so a run
// can be reproduced for any reporting year.
use crate::error::{ReportError, Result};
use crate::types::{DebtField, MeteringField};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const IDENTITY_FIELD: &str = "Điện lực";
pub const TOTAL_METERS_FIELD: &str = "Tổng công tơ";
pub const PLAN_FIELD: &str = "Kế hoạch";
pub const RATIO_FIELD: &str = "Tỷ lệ";

pub const METERING_FIELD_COUNT: usize = 11;

/// Column names of the metering sheet, in sheet order.
pub const DEFAULT_METERING_FIELDS: [&str; METERING_FIELD_COUNT] = [
    "STT",
    IDENTITY_FIELD,
    "1P_GT",
    "1P_TT",
    "3P_GT",
    "3P_TT",
    "TU",
    "TI",
    TOTAL_METERS_FIELD,
    PLAN_FIELD,
    RATIO_FIELD,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// `None` means "today" in local time, resolved once per request.
    pub as_of: Option<NaiveDate>,
    pub reserved_total_labels: Vec<String>,
    pub metering_sheet: String,
    pub metering_header_rows: usize,
    pub metering_fields: Vec<String>,
    pub debt_identity_column: String,
    pub debt_count_column: String,
    pub debt_amount_column: String,
    pub top_n: usize,
    pub metering_rank_field: MeteringField,
    pub debt_rank_field: DebtField,
    pub archive_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            period_start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN),
            period_end: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap_or(NaiveDate::MIN),
            as_of: None,
            reserved_total_labels: vec!["TỔNG".to_string(), "TOTAL".to_string()],
            metering_sheet: "Tong hop luy ke".to_string(),
            metering_header_rows: 4,
            metering_fields: DEFAULT_METERING_FIELDS.iter().map(|s| s.to_string()).collect(),
            debt_identity_column: IDENTITY_FIELD.to_string(),
            debt_count_column: "Khách hàng nợ quá hạn chưa cắt điện".to_string(),
            debt_amount_column: "Số tiền".to_string(),
            top_n: 3,
            metering_rank_field: MeteringField::RatioPct,
            debt_rank_field: DebtField::Amount,
            archive_path: PathBuf::from("report_archive.json"),
        }
    }
}

impl ReportConfig {
    /// Load from a TOML file. Keys that are absent keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: ReportConfig = toml::from_str(&text)?;
        Ok(cfg)
    }

    /// Apply `REPORT_*` environment overrides on top of `self`.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(d) = env_date("REPORT_AS_OF")? {
            self.as_of = Some(d);
        }
        if let Some(d) = env_date("REPORT_PERIOD_START")? {
            self.period_start = d;
        }
        if let Some(d) = env_date("REPORT_PERIOD_END")? {
            self.period_end = d;
        }
        if let Ok(p) = std::env::var("REPORT_ARCHIVE") {
            if !p.trim().is_empty() {
                self.archive_path = PathBuf::from(p.trim());
            }
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.period_end <= self.period_start {
            return Err(ReportError::InvalidWindow(format!(
                "period_end {} is not after period_start {}",
                self.period_end, self.period_start
            )));
        }
        if self.metering_fields.len() != METERING_FIELD_COUNT {
            return Err(ReportError::Schema(format!(
                "metering field list has {} names, expected {}",
                self.metering_fields.len(),
                METERING_FIELD_COUNT
            )));
        }
        if let Some(blank) = self.metering_fields.iter().position(|f| f.trim().is_empty()) {
            return Err(ReportError::Schema(format!("metering field {} has no name", blank + 1)));
        }
        Ok(())
    }

    pub fn resolved_as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }

    /// True when `identity` is one of the reserved grand-total labels,
    /// compared after uppercasing both sides.
    pub fn is_reserved_total(&self, identity: &str) -> bool {
        let upper = identity.trim().to_uppercase();
        self.reserved_total_labels
            .iter()
            .any(|label| label.trim().to_uppercase() == upper)
    }
}

fn env_date(key: &str) -> Result<Option<NaiveDate>> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|e| ReportError::InvalidWindow(format!("{}='{}': {}", key, v, e))),
        _ => Ok(None),
    }
}
