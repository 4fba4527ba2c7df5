use clap::Parser;
use log::LevelFilter;
use std::process;

use leonardo::cli::{self, Cli, Commands};
use leonardo::config::ConfigStore;
use leonardo::{logger, shell};

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment.
    let _ = dotenv::dotenv();

    let args = Cli::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = logger::init(level) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    let mut store = match ConfigStore::load() {
        Ok(store) => store,
        Err(e) => {
            log::error!("Could not load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match args.command {
        Commands::Shell => shell::run(&mut store).await,
        command => cli::execute(command, &mut store).await,
    };

    if let Err(e) = result {
        log::error!("{}", e);
        process::exit(1);
    }
}
