use chrono::{Local, NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::columns::{
    ambiguous_headers, resolve_fuzzy, resolve_generic, resolve_sheet, AliasSpec, ColumnMap, Field, ALIPAY_ALIASES,
    ALIPAY_SHEET_LAYOUT, WECHAT_ALIASES, WECHAT_SHEET_LAYOUT,
};
use crate::detector::{detect_header, detect_in_rows, SourceFormat, SHEET_HEADER_SCAN_ROWS};
use crate::error::{PaytrailError, Result};
use crate::fields::{
    amount_from_cell, classify_direction, datetime_from_cell, is_summary_text, meaningful,
    parse_amount, parse_datetime_text, time_from_cell, DateCell, StatusFilter,
};
use crate::models::{CellValue, Direction, ParsedTransaction, Platform, RawRow};
use crate::tokenizer::{table_from_lines, tokenize_lines};

/// Vendor CSV exports put an account summary above the header row.
pub const TEXT_PREAMBLE_LINES: usize = 30;

static EMPTY_CELL: CellValue = CellValue::Empty;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Inputs a parse needs beyond the rows themselves.
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// Substituted when a row carries no date at all.
    pub today: NaiveDate,
    pub status_filter: StatusFilter,
}

impl Default for ParseContext {
    fn default() -> Self {
        Self {
            today: Local::now().date_naive(),
            status_filter: StatusFilter::default(),
        }
    }
}

/// Why a row produced no transaction. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    HeaderRepeat,
    Summary,
    BadAmount,
    BadDate,
    NotIncomeOrExpense,
    FilteredStatus,
}

/// Parser output plus what the caller may want to report.
#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub kind: ImporterKind,
    pub format: SourceFormat,
    pub transactions: Vec<ParsedTransaction>,
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Importer kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Sheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImporterKind {
    AlipayText,
    WeChatText,
    GenericText,
    AlipaySheet,
    WeChatSheet,
    GenericSheet,
}

impl ImporterKind {
    pub fn key(&self) -> &'static str {
        match self {
            Self::AlipayText => "alipay_csv",
            Self::WeChatText => "wechat_csv",
            Self::GenericText => "generic_csv",
            Self::AlipaySheet => "alipay_xlsx",
            Self::WeChatSheet => "wechat_xlsx",
            Self::GenericSheet => "generic_xlsx",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AlipayText => "Alipay CSV",
            Self::WeChatText => "WeChat Pay CSV",
            Self::GenericText => "Generic CSV",
            Self::AlipaySheet => "Alipay workbook",
            Self::WeChatSheet => "WeChat Pay workbook",
            Self::GenericSheet => "Generic workbook",
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            Self::AlipayText | Self::AlipaySheet => Platform::Alipay,
            Self::WeChatText | Self::WeChatSheet => Platform::WeChat,
            Self::GenericText | Self::GenericSheet => Platform::Other,
        }
    }

    pub fn source(&self) -> SourceKind {
        match self {
            Self::AlipayText | Self::WeChatText | Self::GenericText => SourceKind::Text,
            Self::AlipaySheet | Self::WeChatSheet | Self::GenericSheet => SourceKind::Sheet,
        }
    }

    /// Importer for a detected format. Unknown has none; callers decide.
    pub fn for_format(format: SourceFormat, source: SourceKind) -> Option<Self> {
        let kind = match (format, source) {
            (SourceFormat::Alipay, SourceKind::Text) => Self::AlipayText,
            (SourceFormat::WeChat, SourceKind::Text) => Self::WeChatText,
            (SourceFormat::Bank | SourceFormat::GenericTabular, SourceKind::Text) => Self::GenericText,
            (SourceFormat::Alipay, SourceKind::Sheet) => Self::AlipaySheet,
            (SourceFormat::WeChat, SourceKind::Sheet) => Self::WeChatSheet,
            (SourceFormat::Bank | SourceFormat::GenericTabular, SourceKind::Sheet) => Self::GenericSheet,
            (SourceFormat::Unknown, _) => return None,
        };
        Some(kind)
    }

    fn aliases(&self) -> &'static [AliasSpec] {
        match self {
            Self::AlipayText | Self::AlipaySheet => ALIPAY_ALIASES,
            Self::WeChatText | Self::WeChatSheet => WECHAT_ALIASES,
            Self::GenericText | Self::GenericSheet => &[],
        }
    }

    fn default_description(&self) -> &'static str {
        match self.platform() {
            Platform::Alipay => "支付宝交易",
            Platform::WeChat => "微信支付交易",
            Platform::Other => "导入交易",
        }
    }

    /// Resolve column positions for this importer against a header row.
    pub fn resolve_columns(&self, headers: &[String]) -> ColumnMap {
        if !self.is_generic() {
            for (header, fields) in ambiguous_headers(headers, self.aliases()) {
                warn!(importer = self.key(), header = %header, ?fields, "header matches several fields");
            }
        }
        match self {
            Self::AlipayText | Self::WeChatText => resolve_fuzzy(headers, self.aliases()),
            Self::AlipaySheet => resolve_sheet(headers, self.aliases(), ALIPAY_SHEET_LAYOUT),
            Self::WeChatSheet => resolve_sheet(headers, self.aliases(), WECHAT_SHEET_LAYOUT),
            Self::GenericText | Self::GenericSheet => resolve_generic(headers),
        }
    }

    /// Parse data rows that follow `headers`. Bad rows are skipped, never fatal;
    /// only an unusable header is.
    pub fn parse(&self, headers: &[String], rows: &[RawRow], ctx: &ParseContext) -> Result<(Vec<ParsedTransaction>, usize)> {
        let map = self.resolve_columns(headers);
        let date_col = map.get(Field::DateTime).or_else(|| map.get(Field::Time));
        let Some(amount_col) = map.get(Field::Amount) else {
            return Err(PaytrailError::UnrecognizedFormat(format!(
                "{}: no amount column in header",
                self.name()
            )));
        };
        if self.is_generic() && date_col.is_none() {
            return Err(PaytrailError::UnrecognizedFormat(format!(
                "{}: no date column in header",
                self.name()
            )));
        }

        let columns = Columns {
            map: &map,
            amount: amount_col,
            date: date_col,
        };
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for (i, row) in rows.iter().enumerate() {
            let row_id = format!("{}-{}", self.key(), i + 1);
            match self.parse_row(&columns, headers, row, &row_id, ctx) {
                Ok(txn) => out.push(txn),
                Err(reason) => {
                    if reason != SkipReason::Blank {
                        debug!(row = %row_id, ?reason, "skipped row");
                    }
                    skipped += 1;
                }
            }
        }
        Ok((out, skipped))
    }

    fn parse_row(
        &self,
        cols: &Columns<'_>,
        headers: &[String],
        row: &RawRow,
        row_id: &str,
        ctx: &ParseContext,
    ) -> std::result::Result<ParsedTransaction, SkipReason> {
        if row.iter().all(CellValue::is_blank) {
            return Err(SkipReason::Blank);
        }
        if repeats_header(row, headers, &[Some(cols.amount), cols.date]) {
            return Err(SkipReason::HeaderRepeat);
        }
        if row
            .iter()
            .find(|c| !c.is_blank())
            .is_some_and(|c| is_summary_text(&c.as_text()))
        {
            return Err(SkipReason::Summary);
        }

        let amount_cell = cell(row, Some(cols.amount));
        let amount = match self.source() {
            SourceKind::Sheet => amount_from_cell(amount_cell),
            SourceKind::Text => parse_amount(&amount_cell.as_text()),
        }
        .ok_or(SkipReason::BadAmount)?;

        let date_cell = cell(row, cols.date);
        let parsed_date = match self.source() {
            SourceKind::Sheet => datetime_from_cell(date_cell),
            SourceKind::Text => parse_datetime_text(&date_cell.as_text()),
        };
        let (date, mut time) = match parsed_date {
            DateCell::Parsed(date, time) => (date, time),
            DateCell::Absent => (ctx.today, Some(NaiveTime::MIN)),
            DateCell::Invalid => return Err(SkipReason::BadDate),
        };
        let text = |field: Field| meaningful(&cell(row, cols.map.get(field)).as_text());

        let direction = match cols.map.get(Field::Direction) {
            Some(i) => classify_direction(&cell(row, Some(i)).as_text())
                .ok_or(SkipReason::NotIncomeOrExpense)?,
            None if self.is_generic() => Direction::Expense,
            None => return Err(SkipReason::NotIncomeOrExpense),
        };

        let status = text(Field::Status).unwrap_or_default();
        if ctx.status_filter.should_skip(&status) {
            return Err(SkipReason::FilteredStatus);
        }

        if time.is_none() && self.is_generic() {
            time = cols
                .map
                .get(Field::Time)
                .filter(|t| Some(*t) != cols.date)
                .and_then(|t| time_from_cell(cell(row, Some(t))));
        }

        let counterparty = text(Field::Counterparty);
        let description = text(Field::Narrative)
            .or_else(|| counterparty.clone())
            .unwrap_or_else(|| self.default_description().to_string());

        Ok(ParsedTransaction {
            amount,
            direction,
            date,
            time,
            description,
            counterparty,
            platform: self.platform(),
            payment_method: text(Field::PaymentMethod),
            status,
            category_hint: if self.is_generic() { text(Field::Category) } else { None },
            source_row_id: row_id.to_string(),
        })
    }

    fn is_generic(&self) -> bool {
        matches!(self, Self::GenericText | Self::GenericSheet)
    }
}

struct Columns<'a> {
    map: &'a ColumnMap,
    amount: usize,
    date: Option<usize>,
}

fn cell(row: &RawRow, index: Option<usize>) -> &CellValue {
    index.and_then(|i| row.get(i)).unwrap_or(&EMPTY_CELL)
}

/// A data row that repeats a header label in one of its key columns.
fn repeats_header(row: &RawRow, headers: &[String], key_columns: &[Option<usize>]) -> bool {
    key_columns.iter().flatten().any(|&i| {
        let value = cell(row, Some(i)).as_text();
        !value.is_empty() && headers.get(i).is_some_and(|h| h.trim() == value)
    })
}

fn row_headers(row: &RawRow) -> Vec<String> {
    row.iter().map(CellValue::as_text).collect()
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse delimited text. The header is the first line, or the first line
/// within the vendor preamble that classifies. Unknown is terminal for text.
pub fn parse_text(text: &str, ctx: &ParseContext) -> Result<ParsedBatch> {
    let mut lines = tokenize_lines(text);
    if lines.is_empty() {
        return Err(PaytrailError::EmptyInput);
    }
    let found = lines
        .iter()
        .take(TEXT_PREAMBLE_LINES)
        .enumerate()
        .find_map(|(i, fields)| match detect_header(fields.as_slice()) {
            SourceFormat::Unknown => None,
            format => Some((i, format)),
        });
    let Some((header_idx, format)) = found else {
        return Err(PaytrailError::UnrecognizedFormat(
            "no Alipay, WeChat Pay or date/amount header found".to_string(),
        ));
    };
    let kind = ImporterKind::for_format(format, SourceKind::Text)
        .ok_or_else(|| PaytrailError::UnrecognizedFormat(format.key().to_string()))?;

    let table = table_from_lines(lines.split_off(header_idx))?;
    let (transactions, skipped) = kind.parse(&table.headers, &table.rows, ctx)?;
    info!(importer = kind.key(), parsed = transactions.len(), skipped, "parsed text export");
    Ok(ParsedBatch {
        kind,
        format,
        transactions,
        skipped,
    })
}

/// Parse a worksheet grid. Vendor headers are looked for in the leading rows;
/// when none classifies, the generic parser takes over.
pub fn parse_sheet(grid: &[RawRow], ctx: &ParseContext) -> Result<ParsedBatch> {
    let Some(first_used) = grid.iter().position(|r| r.iter().any(|c| !c.is_blank())) else {
        return Err(PaytrailError::EmptyWorkbook);
    };
    let (header_idx, format) = detect_in_rows(grid, SHEET_HEADER_SCAN_ROWS)
        .unwrap_or((first_used, SourceFormat::Unknown));
    let kind = ImporterKind::for_format(format, SourceKind::Sheet).unwrap_or(ImporterKind::GenericSheet);

    let headers = row_headers(&grid[header_idx]);
    let (transactions, skipped) = kind.parse(&headers, &grid[header_idx + 1..], ctx)?;
    info!(importer = kind.key(), parsed = transactions.len(), skipped, "parsed workbook");
    Ok(ParsedBatch {
        kind,
        format,
        transactions,
        skipped,
    })
}
