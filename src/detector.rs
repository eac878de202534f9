use crate::models::RawRow;

/// Number of leading spreadsheet rows tried as a header.
pub const SHEET_HEADER_SCAN_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Alipay,
    WeChat,
    Bank,
    GenericTabular,
    Unknown,
}

impl SourceFormat {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Alipay => "alipay",
            Self::WeChat => "wechat",
            Self::Bank => "bank",
            Self::GenericTabular => "generic",
            Self::Unknown => "unknown",
        }
    }
}

// Vendor fingerprints. A format matches when every group has at least one
// term present as a substring of some header cell.
const ALIPAY_TXN_NO: &[&str] = &["交易号", "交易订单号", "alipay transaction"];
const ALIPAY_MERCHANT_NO: &[&str] = &["商家订单号", "merchant order"];
const WECHAT_TXN_NO: &[&str] = &["交易单号", "wechat transaction"];
const WECHAT_MERCHANT_NO: &[&str] = &["商户单号", "merchant number", "merchant no"];
const BANK_ACCOUNT: &[&str] = &["卡号", "账号", "account number", "card number"];
const BANK_BALANCE: &[&str] = &["余额", "balance"];
pub(crate) const DATE_LIKE: &[&str] = &["日期", "时间", "date", "time"];
pub(crate) const AMOUNT_LIKE: &[&str] = &["金额", "amount", "价格", "price", "money"];

fn has_any(lowered: &[String], terms: &[&str]) -> bool {
    lowered
        .iter()
        .any(|cell| terms.iter().any(|t| cell.contains(&t.to_lowercase())))
}

/// Classify a candidate header row by case-insensitive substring matching.
pub fn detect_header<S: AsRef<str>>(header: &[S]) -> SourceFormat {
    let lowered: Vec<String> = header
        .iter()
        .map(|h| h.as_ref().trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();
    if lowered.is_empty() {
        return SourceFormat::Unknown;
    }

    if has_any(&lowered, ALIPAY_TXN_NO) && has_any(&lowered, ALIPAY_MERCHANT_NO) {
        return SourceFormat::Alipay;
    }
    if has_any(&lowered, WECHAT_TXN_NO) && has_any(&lowered, WECHAT_MERCHANT_NO) {
        return SourceFormat::WeChat;
    }
    // Trimmed exports keep only the transaction number column.
    if has_any(&lowered, &["交易号"]) {
        return SourceFormat::Alipay;
    }
    if has_any(&lowered, &["交易单号"]) {
        return SourceFormat::WeChat;
    }
    let dated = has_any(&lowered, DATE_LIKE);
    let priced = has_any(&lowered, AMOUNT_LIKE);
    if dated && priced && has_any(&lowered, BANK_ACCOUNT) && has_any(&lowered, BANK_BALANCE) {
        return SourceFormat::Bank;
    }
    if dated && priced {
        return SourceFormat::GenericTabular;
    }
    SourceFormat::Unknown
}

/// Try up to `limit` leading rows as a header; returns the first non-Unknown
/// classification with its row index.
pub fn detect_in_rows(rows: &[RawRow], limit: usize) -> Option<(usize, SourceFormat)> {
    rows.iter().take(limit).enumerate().find_map(|(i, row)| {
        let header: Vec<String> = row.iter().map(|c| c.as_text()).collect();
        match detect_header(&header) {
            SourceFormat::Unknown => None,
            format => Some((i, format)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellValue;

    const ALIPAY_HEADER: &[&str] = &[
        "交易时间", "交易分类", "交易对方", "对方账号", "商品说明", "收/支", "金额",
        "收/付款方式", "交易状态", "交易订单号", "商家订单号", "备注",
    ];
    const WECHAT_HEADER: &[&str] = &[
        "交易时间", "交易类型", "交易对方", "商品", "收/支", "金额(元)", "支付方式",
        "当前状态", "交易单号", "商户单号", "备注",
    ];

    #[test]
    fn test_detect_alipay() {
        assert_eq!(detect_header(ALIPAY_HEADER), SourceFormat::Alipay);
        assert_eq!(
            detect_header(&["交易号", "商家订单号", "交易创建时间", "金额（元）"]),
            SourceFormat::Alipay
        );
    }

    #[test]
    fn test_detect_wechat() {
        assert_eq!(detect_header(WECHAT_HEADER), SourceFormat::WeChat);
    }

    #[test]
    fn test_detect_minimal_alipay_header() {
        assert_eq!(
            detect_header(&["交易号", "创建时间", "金额", "收/支", "交易状态"]),
            SourceFormat::Alipay
        );
    }

    #[test]
    fn test_detect_is_case_insensitive() {
        assert_eq!(
            detect_header(&["Alipay Transaction No", "Merchant Order No", "Amount"]),
            SourceFormat::Alipay
        );
        assert_eq!(detect_header(&["DATE", "AMOUNT", "Memo"]), SourceFormat::GenericTabular);
    }

    #[test]
    fn test_detect_bank() {
        assert_eq!(
            detect_header(&["交易日期", "卡号", "交易金额", "余额", "摘要"]),
            SourceFormat::Bank
        );
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_header(&["name", "email"]), SourceFormat::Unknown);
        assert_eq!(detect_header::<&str>(&[]), SourceFormat::Unknown);
        assert_eq!(detect_header(&["", "  "]), SourceFormat::Unknown);
    }

    #[test]
    fn test_detect_in_rows_skips_preamble() {
        let rows: Vec<RawRow> = vec![
            vec![CellValue::from("微信支付账单明细")],
            vec![CellValue::from("微信昵称：[someone]")],
            WECHAT_HEADER.iter().map(|h| CellValue::from(*h)).collect(),
        ];
        assert_eq!(detect_in_rows(&rows, 5), Some((2, SourceFormat::WeChat)));
    }

    #[test]
    fn test_detect_in_rows_respects_limit() {
        let mut rows: Vec<RawRow> = (0..5).map(|_| vec![CellValue::from("说明")]).collect();
        rows.push(vec![CellValue::from("日期"), CellValue::from("金额")]);
        assert_eq!(detect_in_rows(&rows, SHEET_HEADER_SCAN_ROWS), None);
        assert_eq!(detect_in_rows(&rows, 6), Some((5, SourceFormat::GenericTabular)));
    }
}
