mod cli;
mod error;
mod fmt;
mod loader;
mod logging;
mod models;
mod reports;
mod settings;
mod table;
mod tui;

use std::io::IsTerminal;

use clap::{CommandFactory, Parser};

use cli::{Cli, Commands, FilterArgs};

fn main() {
    let cli = Cli::parse();
    logging::setup_logging(&cli.global.log_level);
    let global = cli.global;

    let result = match cli.command {
        None => {
            if std::io::stdout().is_terminal() {
                cli::dashboard::run(&global)
            } else {
                cli::report::summary(&global, &FilterArgs::default(), None)
            }
        }
        Some(command) => match command {
            Commands::Init => cli::init::run(&global),
            Commands::Sources => cli::sources::run(&global),
            Commands::Summary { filter, top } => cli::report::summary(&global, &filter, top),
            Commands::Rank {
                by,
                bottom,
                top,
                filter,
            } => cli::report::rank(&global, by, bottom, top, &filter),
            Commands::Trend { filter } => cli::report::trend(&global, &filter),
            Commands::Categories { category } => {
                cli::report::categories(&global, category.as_deref())
            }
            Commands::Export { output, filter } => {
                cli::export::run(&global, output.as_deref(), &filter)
            }
            Commands::Dashboard => cli::dashboard::run(&global),
            Commands::Completions { shell } => {
                clap_complete::generate(shell, &mut Cli::command(), "catsales", &mut std::io::stdout());
                Ok(())
            }
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
