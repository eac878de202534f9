mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Import { file, user } => cli::import::run(&file, user.as_deref()),
        Commands::Preview { file } => cli::preview::run(&file),
        Commands::Categories => cli::categories::list(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if e.is_structural() {
            eprintln!("Only Alipay, WeChat Pay and date/amount spreadsheet exports can be imported.");
        }
        std::process::exit(1);
    }
}
