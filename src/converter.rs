use crate::categorizer::categorize;
use crate::models::{CanonicalTransaction, Category, ImportMetadata, ParsedTransaction};

/// Attach category, import metadata and owner to each parsed transaction.
pub fn to_canonical(
    parsed: &[ParsedTransaction],
    categories: &[Category],
    owner_user_id: &str,
) -> Vec<CanonicalTransaction> {
    parsed
        .iter()
        .map(|txn| CanonicalTransaction {
            amount: txn.amount,
            direction: txn.direction,
            date: txn.date,
            time: txn.time,
            description: txn.description.clone(),
            counterparty: txn.counterparty.clone(),
            platform: txn.platform,
            payment_method: txn.payment_method.clone(),
            status: txn.status.clone(),
            source_row_id: txn.source_row_id.clone(),
            category_id: categorize(txn, categories),
            import_metadata: ImportMetadata {
                is_imported: true,
                import_source: txn.platform,
            },
            owner_user_id: owner_user_id.to_string(),
        })
        .collect()
}
