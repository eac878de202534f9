use paytrail::error::Result;
use paytrail::pipeline::parse_source;
use paytrail::settings::load_settings;

const COLUMNS: [&str; 10] = [
    "date",
    "time",
    "direction",
    "amount",
    "description",
    "counterparty",
    "platform",
    "payment_method",
    "status",
    "source_row_id",
];

pub fn run(file: &str) -> Result<()> {
    let settings = load_settings();
    let bytes = std::fs::read(file)?;
    let batch = parse_source(&bytes, &settings.parse_context())?;

    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    wtr.write_record(COLUMNS)?;
    for txn in &batch.transactions {
        wtr.write_record([
            txn.date.format("%Y-%m-%d").to_string(),
            txn.time.map(|t| t.format("%H:%M:%S").to_string()).unwrap_or_default(),
            txn.direction.key().to_string(),
            format!("{:.2}", txn.amount),
            txn.description.clone(),
            txn.counterparty.clone().unwrap_or_default(),
            txn.platform.key().to_string(),
            txn.payment_method.clone().unwrap_or_default(),
            txn.status.clone(),
            txn.source_row_id.clone(),
        ])?;
    }
    wtr.flush()?;

    eprintln!(
        "{}: {} transactions, {} rows skipped",
        batch.kind.name(),
        batch.transactions.len(),
        batch.skipped
    );
    Ok(())
}
