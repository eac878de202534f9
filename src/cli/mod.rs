pub mod categories;
pub mod import;
pub mod init;
pub mod preview;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "paytrail", about = "Import Alipay, WeChat Pay and bank exports into a local ledger.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for paytrail data (default: ~/Documents/paytrail)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Import a CSV/XLS/XLSX export, categorize and store its transactions.
    Import {
        /// Path to the exported file
        file: String,
        /// Owner to import for (default: owner_user_id from settings)
        #[arg(long)]
        user: Option<String>,
    },
    /// Parse an export and print the recognized transactions as CSV without storing them.
    Preview {
        /// Path to the exported file
        file: String,
    },
    /// List categories.
    Categories,
}
