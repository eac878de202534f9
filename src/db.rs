use std::path::Path;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, OptionalExtension};

use crate::batch::TransactionStore;
use crate::error::Result;
use crate::models::{CanonicalTransaction, Category, CategoryType, Platform, StoredTransaction};

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    category_type TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    filename TEXT NOT NULL,
    owner_user_id TEXT NOT NULL,
    import_date TEXT DEFAULT (datetime('now')),
    importer TEXT,
    record_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    owner_user_id TEXT NOT NULL,
    amount REAL NOT NULL CHECK (amount > 0),
    direction TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT,
    description TEXT NOT NULL,
    counterparty TEXT,
    platform TEXT NOT NULL,
    payment_method TEXT,
    status TEXT,
    category_id INTEGER,
    is_imported INTEGER DEFAULT 0,
    import_source TEXT,
    source_row_id TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_dedup
    ON transactions (owner_user_id, date, amount);
";

// (name, category_type)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    // Income
    ("工资", "income"),
    ("奖金", "income"),
    ("理财收益", "income"),
    ("其他收入", "income"),
    // Expenses
    ("餐饮", "expense"),
    ("交通", "expense"),
    ("购物", "expense"),
    ("娱乐", "expense"),
    ("医疗", "expense"),
    ("教育", "expense"),
    ("通讯", "expense"),
    ("住房", "expense"),
    ("其他", "expense"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM categories", [], |row| row.get(0))?;
    if count == 0 {
        for (name, category_type) in DEFAULT_CATEGORIES {
            conn.execute(
                "INSERT INTO categories (name, category_type) VALUES (?1, ?2)",
                rusqlite::params![name, category_type],
            )?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Category store
// ---------------------------------------------------------------------------

pub fn get_categories(conn: &Connection) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_type FROM categories ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                category_type: CategoryType::from_key(&row.get::<_, String>(2)?),
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Transaction store
// ---------------------------------------------------------------------------

impl TransactionStore for Connection {
    fn begin(&self) -> Result<()> {
        self.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn find_possible_duplicates(
        &self,
        owner_user_id: &str,
        amount: f64,
        date: NaiveDate,
        description: &str,
        import_source: Platform,
    ) -> Result<Vec<StoredTransaction>> {
        let mut stmt = self.prepare_cached(
            "SELECT id, amount, date, description, import_source FROM transactions \
             WHERE owner_user_id = ?1 AND amount = ?2 AND date = ?3 \
             AND (description = ?4 OR import_source = ?5)",
        )?;
        let rows = stmt
            .query_map(
                rusqlite::params![
                    owner_user_id,
                    amount,
                    date.format("%Y-%m-%d").to_string(),
                    description,
                    import_source.key()
                ],
                |row| {
                    let date: String = row.get(2)?;
                    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
                    })?;
                    let source: Option<String> = row.get(4)?;
                    Ok(StoredTransaction {
                        id: row.get(0)?,
                        amount: row.get(1)?,
                        date,
                        description: row.get(3)?,
                        import_source: source.as_deref().map(Platform::from_key),
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&self, record: &CanonicalTransaction) -> Result<i64> {
        self.execute(
            "INSERT INTO transactions (owner_user_id, amount, direction, date, time, description, \
             counterparty, platform, payment_method, status, category_id, is_imported, import_source, \
             source_row_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            rusqlite::params![
                record.owner_user_id,
                record.amount,
                record.direction.key(),
                record.date.format("%Y-%m-%d").to_string(),
                record.time.map(|t: NaiveTime| t.format("%H:%M:%S").to_string()),
                record.description,
                record.counterparty,
                record.platform.key(),
                record.payment_method,
                record.status,
                record.category_id,
                record.import_metadata.is_imported,
                record.import_metadata.import_source.key(),
                record.source_row_id,
            ],
        )?;
        Ok(self.last_insert_rowid())
    }

    fn commit(&self) -> Result<()> {
        self.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.is_autocommit() {
            self.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Import log
// ---------------------------------------------------------------------------

pub struct ImportLogEntry<'a> {
    pub filename: &'a str,
    pub owner_user_id: &'a str,
    pub importer: &'a str,
    pub record_count: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub checksum: &'a str,
}

pub fn file_already_imported(conn: &Connection, checksum: &str, owner_user_id: &str) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT 1 FROM imports WHERE checksum = ?1 AND owner_user_id = ?2")?;
    Ok(stmt.exists(rusqlite::params![checksum, owner_user_id])?)
}

pub fn record_import(conn: &Connection, entry: &ImportLogEntry<'_>) -> Result<i64> {
    let (start, end) = match entry.date_range {
        Some((start, end)) => (Some(start.to_string()), Some(end.to_string())),
        None => (None, None),
    };
    conn.execute(
        "INSERT INTO imports (filename, owner_user_id, importer, record_count, date_range_start, date_range_end, checksum) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            entry.filename,
            entry.owner_user_id,
            entry.importer,
            entry.record_count as i64,
            start,
            end,
            entry.checksum,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn last_import_date(conn: &Connection, owner_user_id: &str) -> Result<Option<String>> {
    Ok(conn
        .query_row(
            "SELECT import_date FROM imports WHERE owner_user_id = ?1 ORDER BY id DESC LIMIT 1",
            [owner_user_id],
            |r| r.get(0),
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::insert_batch;
    use crate::models::{Direction, ImportMetadata};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn record(description: &str, amount: f64) -> CanonicalTransaction {
        CanonicalTransaction {
            amount,
            direction: Direction::Expense,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            time: NaiveTime::from_hms_opt(12, 30, 45),
            description: description.to_string(),
            counterparty: Some("商户".to_string()),
            platform: Platform::Alipay,
            payment_method: None,
            status: "交易成功".to_string(),
            source_row_id: "alipay_csv-1".to_string(),
            category_id: Some(5),
            import_metadata: ImportMetadata {
                is_imported: true,
                import_source: Platform::Alipay,
            },
            owner_user_id: "u1".to_string(),
        }
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn test_init_db_creates_tables() {
        let (_dir, conn) = test_db();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["categories", "transactions", "imports"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let (_dir, conn) = test_db();
        init_db(&conn).unwrap();
        assert_eq!(get_categories(&conn).unwrap().len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn test_seeded_categories_include_fallback() {
        let (_dir, conn) = test_db();
        let cats = get_categories(&conn).unwrap();
        assert!(cats.iter().any(|c| c.name == "其他"));
        assert!(cats.iter().any(|c| c.category_type == CategoryType::Income));
    }

    #[test]
    fn test_insert_and_find_duplicates() {
        let (_dir, conn) = test_db();
        let id = conn.insert(&record("咖啡", 28.0)).unwrap();
        assert!(id > 0);
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let by_desc = conn
            .find_possible_duplicates("u1", 28.0, date, "咖啡", Platform::WeChat)
            .unwrap();
        assert_eq!(by_desc.len(), 1);
        assert_eq!(by_desc[0].import_source, Some(Platform::Alipay));
        let by_source = conn
            .find_possible_duplicates("u1", 28.0, date, "别的", Platform::Alipay)
            .unwrap();
        assert_eq!(by_source.len(), 1);
        let other_owner = conn
            .find_possible_duplicates("u2", 28.0, date, "咖啡", Platform::Alipay)
            .unwrap();
        assert!(other_owner.is_empty());
        let other_amount = conn
            .find_possible_duplicates("u1", 28.5, date, "咖啡", Platform::Alipay)
            .unwrap();
        assert!(other_amount.is_empty());
    }

    #[test]
    fn test_batch_reimport_against_sqlite() {
        let (_dir, conn) = test_db();
        let batch = vec![record("a", 1.0), record("b", 2.0), record("c", 3.0)];
        let first = insert_batch(&conn, &batch).unwrap();
        assert_eq!(first.success_count, 3);
        let second = insert_batch(&conn, &batch).unwrap();
        assert_eq!(second.duplicate_count, 3);
        assert_eq!(second.success_count, 0);
        assert_eq!(count(&conn), 3);
    }

    #[test]
    fn test_constraint_violation_is_per_record() {
        let (_dir, conn) = test_db();
        let mut bad = record("bad", 5.0);
        bad.amount = -5.0;
        let batch = vec![record("ok", 1.0), bad, record("ok2", 2.0)];
        let result = insert_batch(&conn, &batch).unwrap();
        assert_eq!(result.success_count, 2);
        assert_eq!(result.failure_count, 1);
        assert_eq!(count(&conn), 2);
    }

    #[test]
    fn test_rollback_discards_unit_of_work() {
        let (_dir, conn) = test_db();
        conn.begin().unwrap();
        conn.insert(&record("a", 1.0)).unwrap();
        conn.rollback().unwrap();
        assert_eq!(count(&conn), 0);
        // Rolling back outside a unit of work is a no-op.
        conn.rollback().unwrap();
    }

    #[test]
    fn test_import_log() {
        let (_dir, conn) = test_db();
        assert!(!file_already_imported(&conn, "abc", "u1").unwrap());
        assert_eq!(last_import_date(&conn, "u1").unwrap(), None);
        let d = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        record_import(
            &conn,
            &ImportLogEntry {
                filename: "alipay.csv",
                owner_user_id: "u1",
                importer: "alipay_csv",
                record_count: 2,
                date_range: Some((d, d)),
                checksum: "abc",
            },
        )
        .unwrap();
        assert!(file_already_imported(&conn, "abc", "u1").unwrap());
        assert!(!file_already_imported(&conn, "abc", "u2").unwrap());
        assert!(last_import_date(&conn, "u1").unwrap().is_some());
    }
}
