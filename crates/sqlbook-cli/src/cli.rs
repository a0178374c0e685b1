//! CLI argument parsing using clap.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sqlbook - run SQL exercises and inspect their autocomplete
#[derive(Parser, Debug)]
#[command(name = "sqlbook")]
#[command(about = "Run SQLite exercises and inspect completion suggestions", long_about = None)]
#[command(version)]
pub struct Args {
    /// Session configuration file (TOML)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Override the engine request timeout in milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute every statement of an exercise file and print the results
    Run(RunArgs),
    /// Print ranked completion suggestions for a cursor in a file
    Complete(CompleteArgs),
    /// List tables and views, or describe one with a data preview
    Schema(SchemaArgs),
}

#[derive(ClapArgs, Debug)]
pub struct RunArgs {
    /// Exercise SQL file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Seed database: a SQL script or a SQLite database file
    #[arg(short, long, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Maximum rows printed per result
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

#[derive(ClapArgs, Debug)]
pub struct CompleteArgs {
    /// SQL file holding the editor buffer
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Cursor line (1-based)
    #[arg(long)]
    pub line: usize,

    /// Cursor column (1-based, in characters)
    #[arg(long)]
    pub column: usize,

    /// Seed database: a SQL script or a SQLite database file
    #[arg(short, long, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

#[derive(ClapArgs, Debug)]
pub struct SchemaArgs {
    /// Table or view to describe; lists every object when omitted
    #[arg(value_name = "OBJECT")]
    pub object: Option<String>,

    /// Seed database: a SQL script or a SQLite database file
    #[arg(short, long, value_name = "PATH")]
    pub seed: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    Table,
    /// JSON
    Json,
}
