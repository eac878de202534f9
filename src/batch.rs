use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::{BatchImportResult, CanonicalTransaction, ImportFailure, Platform, StoredTransaction};

/// Persistence collaborator for batch imports. One `begin`..`commit` pair is
/// one unit of work; `rollback` discards everything inserted since `begin`.
pub trait TransactionStore {
    fn begin(&self) -> Result<()>;

    /// Stored records for `owner_user_id` with the same amount and date whose
    /// description or import source also matches.
    fn find_possible_duplicates(
        &self,
        owner_user_id: &str,
        amount: f64,
        date: NaiveDate,
        description: &str,
        import_source: Platform,
    ) -> Result<Vec<StoredTransaction>>;

    fn insert(&self, record: &CanonicalTransaction) -> Result<i64>;

    fn commit(&self) -> Result<()>;

    fn rollback(&self) -> Result<()>;
}

/// Insert a batch inside one unit of work, skipping records that already
/// exist. Per-record failures are collected; a failed commit rolls back the
/// whole batch and is returned as the error.
pub fn insert_batch<S: TransactionStore + ?Sized>(
    store: &S,
    records: &[CanonicalTransaction],
) -> Result<BatchImportResult> {
    let mut result = BatchImportResult::default();
    if records.is_empty() {
        return Ok(result);
    }

    store.begin()?;
    for record in records {
        let duplicates = store.find_possible_duplicates(
            &record.owner_user_id,
            record.amount,
            record.date,
            &record.description,
            record.import_metadata.import_source,
        );
        match duplicates {
            Ok(found) if !found.is_empty() => {
                debug!(row = %record.source_row_id, existing = found[0].id, "duplicate skipped");
                result.duplicate_count += 1;
                continue;
            }
            Ok(_) => {}
            Err(e) => {
                result.failure_count += 1;
                result.failures.push(ImportFailure {
                    record: record.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        }
        match store.insert(record) {
            Ok(_) => result.success_count += 1,
            Err(e) => {
                debug!(row = %record.source_row_id, error = %e, "insert failed");
                result.failure_count += 1;
                result.failures.push(ImportFailure {
                    record: record.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = store.commit() {
        warn!(error = %e, "commit failed, rolling back import batch");
        if let Err(rollback_err) = store.rollback() {
            warn!(error = %rollback_err, "rollback failed");
        }
        return Err(e);
    }

    info!(
        imported = result.success_count,
        duplicates = result.duplicate_count,
        failed = result.failure_count,
        "import batch committed"
    );
    Ok(result)
}
