use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveTime};
use regex::Regex;

use crate::models::{CellValue, Direction};

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Parse a money cell into a strictly positive magnitude. Currency symbols,
/// thousands separators and sign are stripped; zero, NaN and garbage yield None.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '，' | '¥' | '￥' | '$' | '元' | '"' | '+') && !c.is_whitespace())
        .collect();
    let cleaned = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value > 0.0).then_some(value)
}

pub fn amount_from_cell(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) => {
            let n = n.abs();
            (n.is_finite() && n > 0.0).then_some(n)
        }
        CellValue::Text(s) => parse_amount(s),
        CellValue::Empty => None,
    }
}

// ---------------------------------------------------------------------------
// Dates and times
// ---------------------------------------------------------------------------

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-/.年](\d{1,2})[-/.月](\d{1,2})").unwrap());
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2})(?::(\d{2}))?").unwrap());

/// Outcome of reading a combined date/time cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DateCell {
    /// Nothing in the cell; callers substitute today.
    Absent,
    Parsed(NaiveDate, Option<NaiveTime>),
    /// Something was there but it is not a real calendar date.
    Invalid,
}

/// Extract `YYYY-MM-DD` and `HH:MM[:SS]` substrings from free text.
pub fn parse_datetime_text(raw: &str) -> DateCell {
    let raw = raw.trim();
    if raw.is_empty() {
        return DateCell::Absent;
    }
    let Some(caps) = DATE_RE.captures(raw) else {
        return DateCell::Invalid;
    };
    let date = (|| {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(y, m, d)
    })();
    let Some(date) = date else {
        return DateCell::Invalid;
    };
    let rest = &raw[caps.get(0).map_or(0, |m| m.end())..];
    DateCell::Parsed(date, parse_time_text(rest))
}

pub fn parse_time_text(raw: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(raw)?;
    let h: u32 = caps[1].parse().ok()?;
    let m: u32 = caps[2].parse().ok()?;
    let s: u32 = caps.get(3).map_or(Some(0), |s| s.as_str().parse().ok())?;
    NaiveTime::from_hms_opt(h, m, s)
}

/// Serial of 9999-12-31, the last day a spreadsheet can represent.
pub const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// Spreadsheet day-count serial (days since 1899-12-30) to date; the
/// fractional part becomes the time of day when present.
pub fn excel_serial_to_datetime(serial: f64) -> Option<(NaiveDate, Option<NaiveTime>)> {
    if !serial.is_finite() || !(1.0..MAX_EXCEL_SERIAL + 1.0).contains(&serial) {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let days = serial.floor();
    let date = base.checked_add_signed(Duration::try_days(days as i64)?)?;
    let seconds = ((serial - days) * 86_400.0).round() as u32;
    let time = match seconds {
        0 => None,
        s if s >= 86_400 => NaiveTime::from_hms_opt(23, 59, 59),
        s => NaiveTime::from_num_seconds_from_midnight_opt(s, 0),
    };
    Some((date, time))
}

/// Spreadsheet adapter: numeric cells are serials, text goes through the text adapter.
pub fn datetime_from_cell(cell: &CellValue) -> DateCell {
    match cell {
        CellValue::Number(n) => match excel_serial_to_datetime(*n) {
            Some((date, time)) => DateCell::Parsed(date, time),
            None => DateCell::Invalid,
        },
        CellValue::Text(s) => parse_datetime_text(s),
        CellValue::Empty => DateCell::Absent,
    }
}

/// Time-only cells in generic sheets: either a day fraction or `HH:MM[:SS]` text.
pub fn time_from_cell(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::Number(n) if (0.0..1.0).contains(&n.fract()) => {
            let seconds = (n.fract() * 86_400.0).round() as u32;
            NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
        }
        CellValue::Number(_) => None,
        CellValue::Text(s) => parse_time_text(s),
        CellValue::Empty => None,
    }
}

// ---------------------------------------------------------------------------
// Direction and status
// ---------------------------------------------------------------------------

const INCOME_TERMS: &[&str] = &["收入", "income"];
const EXPENSE_TERMS: &[&str] = &["支出", "expense"];

/// Income/expense substrings decide direction; anything else (transfers,
/// "不计收支", "/") means the row is not a transaction.
pub fn classify_direction(raw: &str) -> Option<Direction> {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if INCOME_TERMS.iter().any(|t| lowered.contains(t)) {
        Some(Direction::Income)
    } else if EXPENSE_TERMS.iter().any(|t| lowered.contains(t)) {
        Some(Direction::Expense)
    } else {
        None
    }
}

/// Status substrings that mark a row as cancelled, closed or fully refunded.
pub const DEFAULT_SKIP_STATUSES: &[&str] = &[
    "交易关闭",
    "已关闭",
    "关闭",
    "已取消",
    "取消",
    "退款成功",
    "已全额退款",
    "全额退款",
    "closed",
    "cancelled",
    "canceled",
    "refund succeeded",
    "refunded",
];

/// Non-exhaustive status filter: compiled-in wording plus user additions.
#[derive(Debug, Clone)]
pub struct StatusFilter {
    keywords: Vec<String>,
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_SKIP_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl StatusFilter {
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut filter = Self::default();
        for keyword in extra {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !filter.keywords.contains(&keyword) {
                filter.keywords.push(keyword);
            }
        }
        filter
    }

    pub fn should_skip(&self, status: &str) -> bool {
        let lowered = status.trim().to_lowercase();
        !lowered.is_empty() && self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Text helpers
// ---------------------------------------------------------------------------

const SUMMARY_MARKERS: &[&str] = &["合计", "总计", "小计", "统计", "summary", "total"];

pub fn is_summary_text(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    SUMMARY_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Vendors use "/" or "-" for an empty cell.
pub fn meaningful(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() || s == "/" || s == "-" || s == "--" {
        None
    } else {
        Some(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("¥1,234.56"), Some(1234.56));
        assert_eq!(parse_amount("￥100.50"), Some(100.5));
        assert_eq!(parse_amount(" 42 "), Some(42.0));
        assert_eq!(parse_amount("12.30元"), Some(12.3));
    }

    #[test]
    fn test_parse_amount_is_magnitude() {
        assert_eq!(parse_amount("-50.00"), Some(50.0));
        assert_eq!(parse_amount("+8.8"), Some(8.8));
    }

    #[test]
    fn test_parse_amount_rejects_non_positive_and_garbage() {
        assert_eq!(parse_amount("0"), None);
        assert_eq!(parse_amount("0.00"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("金额"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_amount_from_number_cell() {
        assert_eq!(amount_from_cell(&CellValue::Number(-3.5)), Some(3.5));
        assert_eq!(amount_from_cell(&CellValue::Number(0.0)), None);
        assert_eq!(amount_from_cell(&CellValue::Empty), None);
    }

    #[test]
    fn test_parse_datetime_text() {
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            parse_datetime_text("2024-01-01 12:30:45"),
            DateCell::Parsed(d, NaiveTime::from_hms_opt(12, 30, 45))
        );
        assert_eq!(parse_datetime_text("2024/1/1"), DateCell::Parsed(d, None));
        assert_eq!(
            parse_datetime_text("2024-01-01 09:05"),
            DateCell::Parsed(d, NaiveTime::from_hms_opt(9, 5, 0))
        );
    }

    #[test]
    fn test_parse_datetime_text_absent_and_invalid() {
        assert_eq!(parse_datetime_text("  "), DateCell::Absent);
        assert_eq!(parse_datetime_text("yesterday"), DateCell::Invalid);
        assert_eq!(parse_datetime_text("2024-02-30"), DateCell::Invalid);
        assert_eq!(parse_datetime_text("2024-13-01"), DateCell::Invalid);
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        let (date, time) = excel_serial_to_datetime(45292.0).unwrap();
        assert_eq!(date.to_string(), "2024-01-01");
        assert_eq!(time, None);
        let (date, _) = excel_serial_to_datetime(45266.0).unwrap();
        assert_eq!(date.to_string(), "2023-12-06");
        let (date, _) = excel_serial_to_datetime(45667.0).unwrap();
        assert_eq!(date.to_string(), "2025-01-10");
    }

    #[test]
    fn test_excel_serial_fraction_is_time() {
        let (_, time) = excel_serial_to_datetime(45292.5).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(12, 0, 0));
        assert!(excel_serial_to_datetime(0.0).is_none());
        assert!(excel_serial_to_datetime(f64::NAN).is_none());
    }

    #[test]
    fn test_excel_serial_out_of_range() {
        let (date, _) = excel_serial_to_datetime(MAX_EXCEL_SERIAL).unwrap();
        assert_eq!(date.to_string(), "9999-12-31");
        assert!(excel_serial_to_datetime(MAX_EXCEL_SERIAL + 1.0).is_none());
        assert!(excel_serial_to_datetime(2024010122001.0).is_none());
        assert!(excel_serial_to_datetime(1e300).is_none());
        assert_eq!(datetime_from_cell(&CellValue::Number(2024010122001.0)), DateCell::Invalid);
    }

    #[test]
    fn test_datetime_from_cell_never_stringifies_serials() {
        let cell = CellValue::Number(45292.0);
        assert_eq!(
            datetime_from_cell(&cell),
            DateCell::Parsed(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None)
        );
    }

    #[test]
    fn test_time_from_cell() {
        assert_eq!(time_from_cell(&CellValue::Number(0.25)), NaiveTime::from_hms_opt(6, 0, 0));
        assert_eq!(time_from_cell(&CellValue::from("18:02:03")), NaiveTime::from_hms_opt(18, 2, 3));
        assert_eq!(time_from_cell(&CellValue::Empty), None);
    }

    #[test]
    fn test_classify_direction() {
        assert_eq!(classify_direction("支出"), Some(Direction::Expense));
        assert_eq!(classify_direction("收入"), Some(Direction::Income));
        assert_eq!(classify_direction("Income"), Some(Direction::Income));
        assert_eq!(classify_direction("不计收支"), None);
        assert_eq!(classify_direction("/"), None);
        assert_eq!(classify_direction(""), None);
    }

    #[test]
    fn test_status_filter_defaults() {
        let filter = StatusFilter::default();
        assert!(filter.should_skip("退款成功"));
        assert!(filter.should_skip("交易关闭"));
        assert!(filter.should_skip("已全额退款"));
        assert!(filter.should_skip("Closed"));
        assert!(!filter.should_skip("交易成功"));
        assert!(!filter.should_skip("支付成功"));
        assert!(!filter.should_skip(""));
    }

    #[test]
    fn test_status_filter_extra_keywords() {
        let filter = StatusFilter::with_extra(["对方已退还", " ", "退款成功"]);
        assert!(filter.should_skip("对方已退还"));
        assert!(!StatusFilter::default().should_skip("对方已退还"));
    }

    #[test]
    fn test_summary_and_placeholder_text() {
        assert!(is_summary_text("合计"));
        assert!(is_summary_text("Total:"));
        assert!(!is_summary_text("星巴克"));
        assert_eq!(meaningful("/"), None);
        assert_eq!(meaningful(" 美团 "), Some("美团".to_string()));
    }
}
