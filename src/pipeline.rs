//! End-to-end import: raw file bytes to stored, categorized transactions.

use rusqlite::Connection;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::batch::insert_batch;
use crate::converter::to_canonical;
use crate::db::{file_already_imported, get_categories, record_import, ImportLogEntry};
use crate::detector::SourceFormat;
use crate::error::{PaytrailError, Result};
use crate::importer::{parse_sheet, parse_text, ImporterKind, ParseContext, ParsedBatch};
use crate::models::BatchImportResult;
use crate::workbook::extract_rows;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Text,
    Workbook,
}

/// Sniff ZIP (xlsx/ods) and OLE2 (xls) magic; everything else is text.
pub fn sniff_container(bytes: &[u8]) -> Container {
    const ZIP: &[u8] = b"PK\x03\x04";
    const OLE2: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    if bytes.starts_with(ZIP) || bytes.starts_with(OLE2) {
        Container::Workbook
    } else {
        Container::Text
    }
}

/// Decode exported text: UTF-8 (BOM stripped) or, failing that, GBK.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::GBK.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Parse raw file bytes without touching storage.
pub fn parse_source(bytes: &[u8], ctx: &ParseContext) -> Result<ParsedBatch> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(PaytrailError::EmptyInput);
    }
    match sniff_container(bytes) {
        Container::Workbook => parse_sheet(&extract_rows(bytes)?, ctx),
        Container::Text => parse_text(&decode_text(bytes), ctx),
    }
}

pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub result: BatchImportResult,
    pub importer: Option<ImporterKind>,
    pub format: Option<SourceFormat>,
    pub parsed: usize,
    pub skipped_rows: usize,
    pub duplicate_file: bool,
}

/// Parse, categorize and store one exported file for `owner_user_id`.
/// A byte-identical file already imported by the same owner is not parsed again.
/// The file is only logged as imported when no record failed, so a partial
/// import can be retried.
#[tracing::instrument(name = "Import file", skip(conn, bytes, ctx))]
pub fn import_bytes(
    conn: &Connection,
    filename: &str,
    bytes: &[u8],
    owner_user_id: &str,
    ctx: &ParseContext,
) -> Result<ImportOutcome> {
    let checksum = checksum(bytes);
    if file_already_imported(conn, &checksum, owner_user_id)? {
        info!(file = filename, "file already imported");
        return Ok(ImportOutcome {
            result: BatchImportResult::default(),
            importer: None,
            format: None,
            parsed: 0,
            skipped_rows: 0,
            duplicate_file: true,
        });
    }

    let batch = parse_source(bytes, ctx)?;
    let categories = get_categories(conn)?;
    let records = to_canonical(&batch.transactions, &categories, owner_user_id);
    let result = insert_batch(conn, &records)?;

    if result.failure_count == 0 {
        let date_range = batch
            .transactions
            .iter()
            .map(|t| t.date)
            .min()
            .zip(batch.transactions.iter().map(|t| t.date).max());
        record_import(
            conn,
            &ImportLogEntry {
                filename,
                owner_user_id,
                importer: batch.kind.key(),
                record_count: batch.transactions.len(),
                date_range,
                checksum: &checksum,
            },
        )?;
    } else {
        warn!(file = filename, failed = result.failure_count, "import incomplete, file left open for retry");
    }

    Ok(ImportOutcome {
        result,
        importer: Some(batch.kind),
        format: Some(batch.format),
        parsed: batch.transactions.len(),
        skipped_rows: batch.skipped,
        duplicate_file: false,
    })
}
