use std::path::Path;

use colored::Colorize;

use paytrail::db::{get_connection, init_db, last_import_date};
use paytrail::error::Result;
use paytrail::fmt::signed_money;
use paytrail::pipeline::import_bytes;
use paytrail::settings::load_settings;

pub fn run(file: &str, user: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let path = Path::new(file);
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string());

    std::fs::create_dir_all(&settings.data_dir)?;
    let conn = get_connection(&settings.db_path())?;
    init_db(&conn)?;

    let owner = user.unwrap_or(settings.owner_user_id.as_str());
    let outcome = import_bytes(&conn, &filename, &bytes, owner, &settings.parse_context())?;

    if outcome.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        if let Some(when) = last_import_date(&conn, owner)? {
            println!("Last import for {owner}: {when}");
        }
        return Ok(());
    }

    if let Some(kind) = outcome.importer {
        println!("Detected {}", kind.name());
    }
    let result = &outcome.result;
    println!(
        "{} imported, {} duplicates, {} failed ({} rows skipped)",
        result.success_count.to_string().green(),
        result.duplicate_count.to_string().yellow(),
        result.failure_count.to_string().red(),
        outcome.skipped_rows
    );
    for failure in &result.failures {
        println!(
            "  {} {} {} {}",
            "failed:".red(),
            failure.record.date,
            signed_money(failure.record.amount, failure.record.direction),
            failure.record.description
        );
        println!("    {}", failure.reason.dimmed());
    }
    Ok(())
}
