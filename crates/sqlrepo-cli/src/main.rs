//! sqlrepo CLI
//!
//! Inspect a sqlrepo database file and run predicates against its tables

use clap::{Parser, Subcommand};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "sqlrepo")]
#[command(about = "sqlrepo - inspect and query repository databases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List registered entity tables
    Tables(commands::tables::TablesArgs),
    /// Print rows of a table matching a JSON predicate
    Query(commands::query::QueryArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Tables(args) => commands::tables::execute(args),
        Commands::Query(args) => commands::query::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
