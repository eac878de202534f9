use chrono::{NaiveDate, NaiveTime};

/// One spreadsheet or text cell. Numbers stay numbers so date serials survive.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Trimmed text form of the cell; integral numbers render without a fraction.
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Self::Number(n) => n.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::Number(_) => false,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// A single source row, addressed by position. Text sources keep the header
/// alongside so cells can be looked up by header name.
pub type RawRow = Vec<CellValue>;

/// Header + rows produced by the tokenizer for delimited text.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Alipay,
    WeChat,
    Other,
}

impl Platform {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Alipay => "alipay",
            Self::WeChat => "wechat",
            Self::Other => "other",
        }
    }

    pub fn from_key(key: &str) -> Self {
        match key {
            "alipay" => Self::Alipay,
            "wechat" => Self::WeChat,
            _ => Self::Other,
        }
    }
}

/// Platform-neutral intermediate produced by the parsers. Never stored as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTransaction {
    /// Always strictly positive; the sign lives in `direction`.
    pub amount: f64,
    pub direction: Direction,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub description: String,
    pub counterparty: Option<String>,
    pub platform: Platform,
    pub payment_method: Option<String>,
    pub status: String,
    /// Raw free-text category from generic sheets; advisory only.
    pub category_hint: Option<String>,
    pub source_row_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryType {
    Income,
    Expense,
}

impl CategoryType {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn from_key(key: &str) -> Self {
        if key.eq_ignore_ascii_case("income") {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: CategoryType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportMetadata {
    pub is_imported: bool,
    pub import_source: Platform,
}

/// Storage-ready transaction. Persistence assigns the durable id.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    pub amount: f64,
    pub direction: Direction,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub description: String,
    pub counterparty: Option<String>,
    pub platform: Platform,
    pub payment_method: Option<String>,
    pub status: String,
    pub source_row_id: String,
    pub category_id: Option<i64>,
    pub import_metadata: ImportMetadata,
    pub owner_user_id: String,
}

/// A transaction already in the store, as returned by duplicate lookups.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTransaction {
    pub id: i64,
    pub amount: f64,
    pub date: NaiveDate,
    pub description: String,
    pub import_source: Option<Platform>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportFailure {
    pub record: CanonicalTransaction,
    pub reason: String,
}

/// `success_count + duplicate_count + failure_count` always equals the batch length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchImportResult {
    pub success_count: usize,
    pub duplicate_count: usize,
    pub failure_count: usize,
    pub failures: Vec<ImportFailure>,
}

impl BatchImportResult {
    pub fn total(&self) -> usize {
        self.success_count + self.duplicate_count + self.failure_count
    }
}
