use crate::models::{Category, ParsedTransaction};

/// One keyword rule: caller categories are matched by any of `labels`,
/// transactions by any of `keywords`.
pub struct KeywordRule {
    pub labels: &'static [&'static str],
    pub keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first rule with a hit wins.
pub const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        labels: &["餐饮", "Dining"],
        keywords: &[
            "餐", "饭", "美团", "饿了么", "外卖", "咖啡", "星巴克", "瑞幸", "麦当劳", "肯德基",
            "奶茶", "喜茶", "食堂", "小吃", "火锅", "烧烤", "面包", "restaurant", "coffee", "food",
        ],
    },
    KeywordRule {
        labels: &["交通", "Transport"],
        keywords: &[
            "滴滴", "出行", "地铁", "公交", "打车", "出租", "加油", "停车", "高铁", "火车", "12306",
            "航空", "机票", "高速", "uber", "taxi", "metro",
        ],
    },
    KeywordRule {
        labels: &["购物", "Shopping"],
        keywords: &[
            "淘宝", "天猫", "京东", "拼多多", "超市", "商城", "购物", "便利店", "百货", "唯品会",
            "amazon", "shop",
        ],
    },
    KeywordRule {
        labels: &["娱乐", "Entertainment"],
        keywords: &[
            "电影", "影城", "游戏", "视频", "音乐", "会员", "ktv", "演出", "门票", "steam",
            "netflix", "spotify",
        ],
    },
    KeywordRule {
        labels: &["医疗", "Medical"],
        keywords: &["医院", "药", "诊所", "医疗", "体检", "挂号", "牙科", "pharmacy", "hospital", "clinic"],
    },
    KeywordRule {
        labels: &["教育", "Education"],
        keywords: &["学费", "培训", "课程", "书店", "教育", "图书", "考试", "school", "course", "tuition"],
    },
    KeywordRule {
        labels: &["通讯", "Communications"],
        keywords: &["话费", "移动", "联通", "电信", "流量", "宽带", "充值", "phone", "mobile"],
    },
    KeywordRule {
        labels: &["住房", "Housing"],
        keywords: &["房租", "租金", "物业", "水费", "电费", "燃气", "自如", "贝壳", "rent", "mortgage"],
    },
];

/// Category names that receive anything no rule claims.
pub const FALLBACK_LABELS: &[&str] = &["其他", "Other"];

fn search_text(txn: &ParsedTransaction) -> String {
    let mut text = txn.description.to_lowercase();
    if let Some(cp) = &txn.counterparty {
        text.push(' ');
        text.push_str(&cp.to_lowercase());
    }
    text
}

/// Category name contains the label or the label contains the name.
fn name_matches(name: &str, label: &str) -> bool {
    let name = name.trim().to_lowercase();
    let label = label.trim().to_lowercase();
    !name.is_empty() && (name.contains(&label) || label.contains(&name))
}

fn find_category(categories: &[Category], labels: &[&str]) -> Option<i64> {
    categories
        .iter()
        .find(|c| labels.iter().any(|l| name_matches(&c.name, l)))
        .map(|c| c.id)
}

/// First keyword rule that hits the description or counterparty.
pub fn matching_rule(txn: &ParsedTransaction) -> Option<&'static KeywordRule> {
    let text = search_text(txn);
    KEYWORD_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| text.contains(&k.to_lowercase())))
}

/// Resolve a category id for one transaction against the caller's categories.
pub fn categorize(txn: &ParsedTransaction, categories: &[Category]) -> Option<i64> {
    if let Some(rule) = matching_rule(txn) {
        return find_category(categories, rule.labels);
    }
    if let Some(hint) = txn.category_hint.as_deref().filter(|h| !h.trim().is_empty()) {
        if let Some(id) = find_category(categories, &[hint]) {
            return Some(id);
        }
    }
    categories
        .iter()
        .find(|c| {
            FALLBACK_LABELS
                .iter()
                .any(|l| c.name.trim().eq_ignore_ascii_case(l))
        })
        .map(|c| c.id)
}
