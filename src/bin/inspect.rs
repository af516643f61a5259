//! btreedb Inspector Binary
//!
//! Prints the layout constants, the tree structure or the rows of an
//! existing table file. Table files are opened read-only.

use std::path::PathBuf;

use btreedb::btree::LayoutConstants;
use btreedb::config::DEFAULT_MAX_PAGES;
use btreedb::{Config, Result, Table};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// btreedb Inspector
#[derive(Parser, Debug)]
#[command(name = "btreedb-inspect")]
#[command(about = "Inspect btreedb table files")]
#[command(version)]
struct Args {
    /// Page cache ceiling used when opening a table file
    #[arg(short, long, default_value_t = DEFAULT_MAX_PAGES)]
    max_pages: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the on-disk layout constants
    Constants,

    /// Print the tree structure of a table file
    Tree {
        /// Table file to read
        file: PathBuf,
    },

    /// Print every row of a table file in key order
    Scan {
        /// Table file to read
        file: PathBuf,
    },

    /// Check the structural invariants of a table file
    Verify {
        /// Table file to read
        file: PathBuf,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,btreedb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Commands::Constants => {
            println!("{}", LayoutConstants::current());
        }
        Commands::Tree { file } => {
            let mut table = open_existing(file, args.max_pages)?;
            print!("{}", table.tree_dump()?);
            table.close()?;
        }
        Commands::Scan { file } => {
            let mut table = open_existing(file, args.max_pages)?;
            let mut count = 0usize;
            for row in table.select()? {
                println!("{}", row?);
                count += 1;
            }
            tracing::info!("{} rows", count);
            table.close()?;
        }
        Commands::Verify { file } => {
            let mut table = open_existing(file, args.max_pages)?;
            let stats = table.tree_mut().verify()?;
            println!(
                "ok: height {}, {} internal nodes, {} leaves, {} rows",
                stats.height, stats.internal_nodes, stats.leaf_nodes, stats.rows
            );
            table.close()?;
        }
    }
    Ok(())
}

/// Open a table file for reading; the file is never created or written
fn open_existing(file: PathBuf, max_pages: u32) -> Result<Table> {
    Table::open_read_only(Config::builder().db_path(file).max_pages(max_pages).build())
}
