use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use dienluc_report::loader::normalize;
use dienluc_report::metrics::{debt_totals, forecast};
use dienluc_report::ranker::{bottom, rank, top};
use dienluc_report::report::{DocumentRenderer, MarkdownRenderer};
use dienluc_report::types::{
    Cell, DebtField, DebtRecord, MeteringField, MeteringRecord, RawSheet, ReportSummary, SortOrder,
    Verdict,
};
use dienluc_report::{build_report, RecordSet, ReportConfig, ReportError, SchemaKind};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn n(v: f64) -> Cell {
    Cell::Number(v)
}

fn t(s: &str) -> Cell {
    Cell::text(s)
}

fn metering_sheet(rows: Vec<(Cell, Cell, Cell, Cell)>) -> RawSheet {
    let mut sheet = vec![
        vec![t("TỔNG HỢP LŨY KẾ KIỂM TRA HỆ THỐNG ĐO ĐẾM")],
        vec![t("Từ 01/01/2025")],
        vec![t("STT"), t("Điện lực"), t("Công tơ 1 pha"), Cell::Empty, t("Công tơ 3 pha")],
        vec![Cell::Empty, Cell::Empty, t("GT"), t("TT"), t("GT"), t("TT"), t("TU"), t("TI")],
    ];
    for (i, (unit, total, plan, ratio)) in rows.into_iter().enumerate() {
        sheet.push(vec![
            n(i as f64 + 1.0),
            unit,
            n(10.0),
            n(20.0),
            n(3.0),
            n(4.0),
            n(1.0),
            n(2.0),
            total,
            plan,
            ratio,
        ]);
    }
    RawSheet::new(sheet)
}

fn debt_sheet(rows: Vec<(&str, Cell, Cell)>) -> RawSheet {
    let mut sheet = vec![vec![
        t("Điện lực"),
        t("Khách hàng nợ quá hạn chưa cắt điện"),
        t("Số tiền"),
    ]];
    for (unit, count, amount) in rows {
        sheet.push(vec![t(unit), count, amount]);
    }
    RawSheet::new(sheet)
}

fn metering(records: RecordSet) -> Vec<MeteringRecord> {
    match records {
        RecordSet::Metering(v) => v,
        other => panic!("expected metering records, got {:?}", other.kind()),
    }
}

fn debt(records: RecordSet) -> Vec<DebtRecord> {
    match records {
        RecordSet::Debt(v) => v,
        other => panic!("expected debt records, got {:?}", other.kind()),
    }
}

#[test]
fn blank_identity_row_is_dropped_from_metering_sheet() {
    let sheet = metering_sheet(vec![
        (t("ĐL Hải Châu"), n(100.0), n(200.0), n(0.5)),
        (t("ĐL Thanh Khê"), n(80.0), n(100.0), n(0.8)),
        (Cell::Empty, n(5.0), n(5.0), n(1.0)),
        (t("ĐL Sơn Trà"), n(60.0), n(120.0), n(0.5)),
        (t("ĐL Cẩm Lệ"), n(90.0), n(100.0), n(0.9)),
    ]);
    let (records, report) = normalize(&sheet, SchemaKind::Metering, &ReportConfig::default()).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.blank_identity_rows, 1);
    let units: Vec<String> = metering(records).into_iter().map(|r| r.unit).collect();
    assert_eq!(units, vec!["ĐL Hải Châu", "ĐL Thanh Khê", "ĐL Sơn Trà", "ĐL Cẩm Lệ"]);
}

#[test]
fn unparsable_metering_cells_are_excluded_from_totals() {
    let sheet = metering_sheet(vec![
        (t("ĐL A"), n(100.0), n(200.0), n(0.5)),
        (t("ĐL B"), t("chưa báo cáo"), n(100.0), t("#N/A")),
        (t("ĐL C"), n(50.0), t(""), n(0.25)),
    ]);
    let (records, report) = normalize(&sheet, SchemaKind::Metering, &ReportConfig::default()).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(report.missing_cells, 3);

    let rows = metering(records);
    let f = forecast(&rows, d(2025, 2, 1), d(2025, 1, 1), d(2025, 9, 30)).unwrap();
    assert_eq!(f.total_current, 150.0);
    assert_eq!(f.total_plan, 300.0);
}

#[test]
fn forecast_extrapolates_linearly() {
    let rows = vec![MeteringRecord {
        stt: Some("1".into()),
        unit: "ĐL A".into(),
        single_phase_indirect: None,
        single_phase_direct: None,
        three_phase_indirect: None,
        three_phase_direct: None,
        voltage_transformers: None,
        current_transformers: None,
        total_meters: Some(1000.0),
        plan: Some(4000.0),
        ratio_pct: Some(25.0),
    }];
    let f = forecast(&rows, d(2025, 4, 1), d(2025, 1, 1), d(2025, 9, 30)).unwrap();
    assert_eq!(f.days_passed, 90);
    assert_eq!(f.days_total, 272);
    assert!((f.avg_per_day - 11.111).abs() < 1e-3);
    assert!((f.forecast_total - 3022.2).abs() < 0.1);
    assert!((f.require_ratio().unwrap() - 0.75556).abs() < 1e-4);
    assert_eq!(f.verdict, Verdict::BelowPlan);
}

#[test]
fn zero_plan_flags_division_undefined() {
    let sheet = metering_sheet(vec![(t("ĐL A"), n(100.0), n(0.0), n(0.0))]);
    let (records, _) = normalize(&sheet, SchemaKind::Metering, &ReportConfig::default()).unwrap();
    let rows = metering(records);
    let f = forecast(&rows, d(2025, 4, 1), d(2025, 1, 1), d(2025, 9, 30)).unwrap();

    assert_eq!(f.forecast_ratio, None);
    assert_eq!(f.verdict, Verdict::Undetermined);
    assert!(matches!(
        f.require_ratio(),
        Err(ReportError::DivisionUndefined { divisor: "total_plan" })
    ));
}

#[test]
fn reserved_total_rows_are_dropped_in_any_case() {
    let sheet = debt_sheet(vec![
        ("ĐL Hải Châu", n(12.0), n(3_500_000.0)),
        ("tổng", n(1.0), n(1.0)),
        ("ĐL Sơn Trà", n(8.0), n(1_200_000.0)),
        ("Tổng", n(1.0), n(1.0)),
        ("TỔNG", n(20.0), n(999_999.0)),
    ]);
    let (records, report) = normalize(&sheet, SchemaKind::Debt, &ReportConfig::default()).unwrap();
    assert_eq!(report.reserved_total_rows, 3);

    let rows = debt(records);
    assert!(rows.iter().all(|r| r.unit.to_uppercase() != "TỔNG"));
    let totals = debt_totals(&rows);
    assert_eq!(totals.total_count, 20);
    assert_eq!(totals.total_amount, 4_700_000.0);
}

#[test]
fn debt_sheet_missing_amount_column_is_schema_error() {
    let sheet = RawSheet::new(vec![
        vec![t("Điện lực"), t("Khách hàng nợ quá hạn chưa cắt điện")],
        vec![t("ĐL A"), n(1.0)],
    ]);
    let err = normalize(&sheet, SchemaKind::Debt, &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::Schema(msg) if msg.contains("Số tiền")));
}

#[test]
fn debt_blank_amount_fails_closed() {
    let sheet = debt_sheet(vec![("ĐL A", n(2.0), n(10.0)), ("ĐL B", n(3.0), Cell::Empty)]);
    let err = normalize(&sheet, SchemaKind::Debt, &ReportConfig::default()).unwrap_err();
    assert!(matches!(err, ReportError::Coercion { row: 3, .. }));
}

#[test]
fn top_three_of_two_returns_both() {
    let rows = vec![
        DebtRecord { unit: "ĐL A".into(), overdue_customers: 1, amount: 10.0 },
        DebtRecord { unit: "ĐL B".into(), overdue_customers: 2, amount: 20.0 },
    ];
    let best = top(&rows, 3, DebtField::Amount);
    assert_eq!(best.len(), 2);
    assert_eq!(best[0].unit, "ĐL B");
    assert_eq!(bottom(&rows, 3, DebtField::Amount).len(), 2);
}

#[test]
fn ranking_is_idempotent_and_a_subset() {
    let sheet = metering_sheet(vec![
        (t("A"), n(1.0), n(2.0), n(0.5)),
        (t("B"), n(1.0), n(2.0), t("x")),
        (t("C"), n(1.0), n(2.0), n(0.9)),
        (t("D"), n(1.0), n(2.0), n(0.5)),
        (t("E"), n(1.0), n(2.0), n(0.1)),
    ]);
    let (records, _) = normalize(&sheet, SchemaKind::Metering, &ReportConfig::default()).unwrap();
    let rows = metering(records);

    for order in [SortOrder::Descending, SortOrder::Ascending] {
        let once = rank(&rows, MeteringField::RatioPct, order);
        let twice = rank(&once, MeteringField::RatioPct, order);
        assert_eq!(once, twice);
        // Missing ratio sorts last either way.
        assert_eq!(once.last().map(|r| r.unit.as_str()), Some("B"));
    }

    let desc: Vec<String> = rank(&rows, MeteringField::RatioPct, SortOrder::Descending)
        .into_iter()
        .map(|r| r.unit)
        .collect();
    assert_eq!(desc, vec!["C", "A", "D", "E", "B"]);

    let best = top(&rows, 3, MeteringField::RatioPct);
    assert_eq!(best.len(), 3);
    assert!(best.iter().all(|r| rows.contains(r)));
}

#[test]
fn metering_report_carries_summary_and_subsets() {
    let sheet = metering_sheet(vec![
        (t("ĐL A"), n(300.0), n(1000.0), n(0.6)),
        (t("ĐL B"), n(200.0), n(1000.0), n(0.4)),
        (t("ĐL C"), n(100.0), n(1000.0), n(0.2)),
        (t("ĐL D"), n(400.0), n(1000.0), n(0.8)),
    ]);
    let config = ReportConfig { as_of: Some(d(2025, 4, 1)), ..ReportConfig::default() };
    let (records, _) = normalize(&sheet, SchemaKind::Metering, &config).unwrap();
    let out = build_report(&records, &config, d(2025, 4, 1)).unwrap();

    let ReportSummary::Metering(f) = &out.summary else {
        panic!("expected a metering summary");
    };
    assert_eq!(f.total_current, 1000.0);
    assert_eq!(f.total_plan, 4000.0);
    assert_eq!(f.verdict, Verdict::BelowPlan);

    let top_units: Vec<String> = metering(out.top.clone()).into_iter().map(|r| r.unit).collect();
    let bottom_units: Vec<String> = metering(out.bottom.clone()).into_iter().map(|r| r.unit).collect();
    assert_eq!(top_units, vec!["ĐL D", "ĐL A", "ĐL B"]);
    assert_eq!(bottom_units, vec!["ĐL A", "ĐL B", "ĐL C"]);

    assert_eq!(out.document.charts.len(), 3);
    assert_eq!(out.label(), "Báo cáo Hệ thống đo đếm 01/04/2025");

    let text = String::from_utf8(MarkdownRenderer::default().render(&out.document).unwrap()).unwrap();
    assert!(text.contains("Dự kiến đến 30/09/2025 sẽ hoàn thành khoảng 3,022 thiết bị"));
    assert!(text.contains("❌ CHƯA ĐẠT kế hoạch"));
    assert!(text.contains("| ĐL D"));
}

#[test]
fn report_on_window_start_is_division_undefined() {
    let sheet = metering_sheet(vec![(t("ĐL A"), n(1.0), n(2.0), n(0.5))]);
    let config = ReportConfig::default();
    let (records, _) = normalize(&sheet, SchemaKind::Metering, &config).unwrap();
    let err = build_report(&records, &config, config.period_start).unwrap_err();
    assert!(matches!(err, ReportError::DivisionUndefined { divisor: "days_passed" }));
}
