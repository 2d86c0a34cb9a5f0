mod budget;
mod config;
mod db;
mod logging;
mod models;
mod run;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config = config::Config::load()?;
    logging::init(&config.log_path, &config.log_level)?;

    let mut db = db::Database::open(&config.db_path)?;
    tracing::debug!("Using database {}", config.db_path.display());

    match args.len() {
        1 => run::as_tui(&mut db, &config),
        2.. => run::as_cli(&args, &mut db, &config),
        _ => {
            eprintln!("Usage: budgetpie [command]");
            Ok(())
        }
    }
}
