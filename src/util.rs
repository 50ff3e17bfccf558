// Utility helpers for cell coercion, date arithmetic and display formatting.
//
// This module centralizes the "dirty" spreadsheet handling so the loader
// and metrics code can assume typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

use crate::types::Cell;

/// Read a cell as `f64`, the way a lenient numeric coercion would.
///
/// - Numbers pass through unchanged; booleans become `1.0`/`0.0`.
/// - Text is trimmed and must parse as a plain number. Values containing
///   letters or thousands separators are rejected.
/// - Empty cells, blank text and non-finite results give `None`.
pub fn parse_f64_cell(cell: &Cell) -> Option<f64> {
    let v = match cell {
        Cell::Empty => return None,
        Cell::Number(n) => *n,
        Cell::Bool(b) => {
            if *b { 1.0 } else { 0.0 }
        }
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() || s.chars().any(|c| c.is_alphabetic() && c != 'e' && c != 'E') {
                return None;
            }
            s.parse::<f64>().ok()?
        }
    };
    if v.is_finite() { Some(v) } else { None }
}

/// Read a cell as a whole number. Floats are accepted only when they carry
/// no fractional part (spreadsheets store every number as a float).
pub fn parse_i64_cell(cell: &Cell) -> Option<i64> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            if let Ok(v) = s.parse::<i64>() {
                return Some(v);
            }
            parse_f64_cell(cell).and_then(whole_number)
        }
        _ => parse_f64_cell(cell).and_then(whole_number),
    }
}

fn whole_number(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    // `NaiveDate` subtraction yields a `TimeDelta`; we only need whole days.
    (end - start).num_days()
}

/// Sum of the present values. An iterator with nothing present sums to 0.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().sum()
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators
    // (e.g. `1,234,567.89`).
    if !n.is_finite() {
        return "N/A".to_string();
    }
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_opt_number(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals)).unwrap_or_else(|| "N/A".to_string())
}

/// A value that is already a percentage, shown with two decimals.
pub fn format_percent(pct: f64) -> String {
    format!("{:.2}%", pct)
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

/// `DD/MM/YYYY`, the date style used in report prose.
pub fn format_date_vn(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cells_coerce_or_go_missing() {
        assert_eq!(parse_f64_cell(&Cell::Number(12.5)), Some(12.5));
        assert_eq!(parse_f64_cell(&Cell::text(" 42 ")), Some(42.0));
        assert_eq!(parse_f64_cell(&Cell::text("1e3")), Some(1000.0));
        assert_eq!(parse_f64_cell(&Cell::text("n/a")), None);
        assert_eq!(parse_f64_cell(&Cell::text("1,200")), None);
        assert_eq!(parse_f64_cell(&Cell::text("   ")), None);
        assert_eq!(parse_f64_cell(&Cell::Empty), None);
        assert_eq!(parse_f64_cell(&Cell::Bool(true)), Some(1.0));
    }

    #[test]
    fn integer_cells_reject_fractions() {
        assert_eq!(parse_i64_cell(&Cell::Number(7.0)), Some(7));
        assert_eq!(parse_i64_cell(&Cell::text("15")), Some(15));
        assert_eq!(parse_i64_cell(&Cell::Number(7.5)), None);
        assert_eq!(parse_i64_cell(&Cell::text("bảy")), None);
        assert_eq!(parse_i64_cell(&Cell::Empty), None);
    }

    #[test]
    fn sum_skips_missing() {
        assert_eq!(sum_present(vec![Some(1.0), None, Some(2.5)]), 3.5);
        assert_eq!(sum_present(vec![None, None]), 0.0);
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1500.0, 0), "-1,500");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_number(f64::NAN, 2), "N/A");
        assert_eq!(format_percent(87.456), "87.46%");
        assert_eq!(format_int(9855i64), "9,855");
    }

    #[test]
    fn day_counts() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(days_between(start, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()), 90);
        assert_eq!(days_between(start, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()), 272);
    }
}
