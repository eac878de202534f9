//! Header-alias dictionaries and column resolution.
//!
//! Vendor headers are matched fuzzily: a header cell matches an alias when
//! either contains the other after normalization. Aliases are tried in order
//! per field, so the most specific alias goes first.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    DateTime,
    Time,
    Amount,
    Direction,
    Counterparty,
    Narrative,
    PaymentMethod,
    Status,
    Category,
}

pub struct AliasSpec {
    pub field: Field,
    pub aliases: &'static [&'static str],
}

pub const ALIPAY_ALIASES: &[AliasSpec] = &[
    AliasSpec {
        field: Field::Amount,
        aliases: &["金额（元）", "金额(元)", "金额", "amount"],
    },
    AliasSpec {
        field: Field::Direction,
        aliases: &["收/支", "收支", "income/expense"],
    },
    AliasSpec {
        field: Field::DateTime,
        aliases: &["交易创建时间", "交易时间", "创建时间", "付款时间", "transaction time"],
    },
    AliasSpec {
        field: Field::Counterparty,
        aliases: &["交易对方", "对方", "counterparty"],
    },
    AliasSpec {
        field: Field::Narrative,
        aliases: &["商品名称", "商品说明", "商品", "product"],
    },
    AliasSpec {
        field: Field::PaymentMethod,
        aliases: &["收/付款方式", "付款方式", "支付方式", "payment method"],
    },
    AliasSpec {
        field: Field::Status,
        aliases: &["交易状态", "状态", "status"],
    },
];

pub const WECHAT_ALIASES: &[AliasSpec] = &[
    AliasSpec {
        field: Field::Amount,
        aliases: &["金额(元)", "金额（元）", "金额", "amount"],
    },
    AliasSpec {
        field: Field::Direction,
        aliases: &["收/支", "收支", "income/expense"],
    },
    AliasSpec {
        field: Field::DateTime,
        aliases: &["交易时间", "时间", "transaction time"],
    },
    AliasSpec {
        field: Field::Counterparty,
        aliases: &["交易对方", "counterparty"],
    },
    AliasSpec {
        field: Field::Narrative,
        aliases: &["商品", "product"],
    },
    AliasSpec {
        field: Field::PaymentMethod,
        aliases: &["支付方式", "payment method"],
    },
    AliasSpec {
        field: Field::Status,
        aliases: &["当前状态", "交易状态", "status"],
    },
];

/// Generic sheets: one-directional substring match, no vendor vocabulary.
pub const GENERIC_TERMS: &[AliasSpec] = &[
    AliasSpec {
        field: Field::DateTime,
        aliases: &["日期", "date"],
    },
    AliasSpec {
        field: Field::Time,
        aliases: &["时间", "time"],
    },
    AliasSpec {
        field: Field::Amount,
        aliases: &["金额", "amount"],
    },
    AliasSpec {
        field: Field::Direction,
        aliases: &["收/支", "收支", "direction"],
    },
    AliasSpec {
        field: Field::Counterparty,
        aliases: &["对方", "商户", "counterparty", "payee"],
    },
    AliasSpec {
        field: Field::Narrative,
        aliases: &["备注", "说明", "描述", "description", "memo"],
    },
    AliasSpec {
        field: Field::PaymentMethod,
        aliases: &["账户", "支付方式", "account"],
    },
    AliasSpec {
        field: Field::Status,
        aliases: &["状态", "status"],
    },
    AliasSpec {
        field: Field::Category,
        aliases: &["分类", "类别", "category"],
    },
];

/// Fixed sheet layouts: `(field, column index)` for vendor workbook exports.
pub const ALIPAY_SHEET_LAYOUT: &[(Field, usize)] = &[
    (Field::DateTime, 0),
    (Field::Counterparty, 2),
    (Field::Narrative, 4),
    (Field::Direction, 5),
    (Field::Amount, 6),
    (Field::PaymentMethod, 7),
    (Field::Status, 8),
];

pub const WECHAT_SHEET_LAYOUT: &[(Field, usize)] = &[
    (Field::DateTime, 0),
    (Field::Counterparty, 2),
    (Field::Narrative, 3),
    (Field::Direction, 4),
    (Field::Amount, 5),
    (Field::PaymentMethod, 6),
    (Field::Status, 7),
];

pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

fn fuzzy_match(header: &str, alias: &str) -> bool {
    let h = normalize_header(header);
    let a = normalize_header(alias);
    !h.is_empty() && !a.is_empty() && (h.contains(&a) || a.contains(&h))
}

fn substring_match(header: &str, term: &str) -> bool {
    normalize_header(header).contains(&normalize_header(term))
}

/// Resolved positions of the logical fields within a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnMap {
    columns: Vec<(Field, usize)>,
}

impl ColumnMap {
    pub fn get(&self, field: Field) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, i)| *i)
    }

    pub fn has(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    fn set(&mut self, field: Field, index: usize) {
        match self.columns.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = index,
            None => self.columns.push((field, index)),
        }
    }

    fn is_taken(&self, index: usize) -> bool {
        self.columns.iter().any(|(_, i)| *i == index)
    }

    /// Start from a fixed layout; header matches override positions.
    pub fn from_layout(layout: &[(Field, usize)]) -> Self {
        let mut map = Self::default();
        for (field, index) in layout {
            map.set(*field, *index);
        }
        map
    }

    fn overlay(&mut self, other: &ColumnMap) {
        for (field, index) in &other.columns {
            self.set(*field, *index);
        }
    }
}

/// Resolve vendor fields by fuzzy alias matching, field by field, alias by alias.
pub fn resolve_fuzzy<S: AsRef<str>>(headers: &[S], specs: &[AliasSpec]) -> ColumnMap {
    let mut map = ColumnMap::default();
    for spec in specs {
        let found = spec.aliases.iter().find_map(|alias| {
            headers
                .iter()
                .position(|h| fuzzy_match(h.as_ref(), alias))
        });
        if let Some(index) = found {
            map.set(spec.field, index);
        }
    }
    map
}

/// Resolve a vendor sheet: fixed layout first, overridden by whatever the
/// header row names explicitly.
pub fn resolve_sheet<S: AsRef<str>>(
    headers: &[S],
    specs: &[AliasSpec],
    layout: &[(Field, usize)],
) -> ColumnMap {
    let mut map = ColumnMap::from_layout(layout);
    map.overlay(&resolve_fuzzy(headers, specs));
    map
}

/// Resolve generic headers with plain substring matching. A column already
/// claimed by an earlier field is not reused.
pub fn resolve_generic<S: AsRef<str>>(headers: &[S]) -> ColumnMap {
    let mut map = ColumnMap::default();
    for spec in GENERIC_TERMS {
        let found = spec.aliases.iter().find_map(|term| {
            headers
                .iter()
                .enumerate()
                .position(|(i, h)| !map.is_taken(i) && substring_match(h.as_ref(), term))
        });
        if let Some(index) = found {
            map.set(spec.field, index);
        }
    }
    map
}

/// Headers that fuzzily match aliases of more than one logical field.
pub fn ambiguous_headers<S: AsRef<str>>(headers: &[S], specs: &[AliasSpec]) -> Vec<(String, Vec<Field>)> {
    headers
        .iter()
        .filter_map(|h| {
            let fields: Vec<Field> = specs
                .iter()
                .filter(|spec| spec.aliases.iter().any(|a| fuzzy_match(h.as_ref(), a)))
                .map(|spec| spec.field)
                .collect();
            (fields.len() > 1).then(|| (h.as_ref().to_string(), fields))
        })
        .collect()
}
