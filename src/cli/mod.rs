//! Command-line interface for `softdel`.
//!
//! This module provides the CLI parsing and command routing using clap.

pub mod commands;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use softdel_core::Value;

use crate::config::{DEFAULT_CONFIG_FILE, Workspace, WorkspaceConfig};
use crate::logging;
use crate::storage::Database;

/// `sd` - inspect and soft-delete rows of a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "sd")]
#[command(
    author,
    version,
    about = "Soft delete, undelete and hard delete rows of a SQLite database",
    long_about = None,
    after_help = "Tables are described in a YAML workspace config (softdel.yaml by default)."
)]
pub struct Cli {
    /// Workspace config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Database file (overrides `database` in the config)
    #[arg(long, global = true, env = "SOFTDEL_DB")]
    pub db: Option<PathBuf>,

    /// Output format: text (default) or json
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit log events as JSON on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List rows of a table (active rows by default)
    List(ListArgs),

    /// Show one row with optional relations
    Show(ShowArgs),

    /// Soft delete rows (plain delete for tables without soft delete)
    Delete(MutateArgs),

    /// Restore soft-deleted rows
    Undelete(MutateArgs),

    /// Permanently remove rows
    HardDelete(MutateArgs),

    /// Check the database against the workspace config
    Doctor,

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Table to list
    pub table: String,

    /// Only soft-deleted rows
    #[arg(long, conflicts_with = "all")]
    pub deleted: bool,

    /// Active and deleted rows
    #[arg(long)]
    pub all: bool,

    /// Eager-load relations, e.g. `testObjects(notDeleted)`
    #[arg(long = "with", value_name = "EXPR")]
    pub with: Option<String>,

    /// Column equality filter (repeatable)
    #[arg(long = "where", value_name = "COLUMN=VALUE")]
    pub filters: Vec<String>,

    /// Apply a named filter from the config, or `deleted`/`notDeleted` (repeatable)
    #[arg(long = "filter", value_name = "NAME")]
    pub named: Vec<String>,

    /// Maximum number of rows
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    pub table: String,

    /// Primary key value
    pub id: String,

    /// Eager-load relations
    #[arg(long = "with", value_name = "EXPR")]
    pub with: Option<String>,
}

#[derive(Args, Debug)]
pub struct MutateArgs {
    pub table: String,

    /// Primary key values
    #[arg(required = true)]
    pub ids: Vec<String>,
}

/// Parse a command-line value: `null`, `true`/`false`, an integer, or text.
#[must_use]
pub fn parse_value(input: &str) -> Value {
    match input {
        "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => input
            .parse::<i64>()
            .map_or_else(|_| Value::Text(input.to_string()), Value::Integer),
    }
}

/// Loaded config plus an open database.
pub struct Session {
    pub workspace: Workspace,
    pub db: Database,
    pub json: bool,
}

impl Session {
    /// Load the workspace config and open its database.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is missing or invalid, or the database
    /// cannot be opened.
    pub fn open(config_path: &Path, db_override: Option<&Path>, json: bool) -> crate::Result<Self> {
        let config = WorkspaceConfig::load(config_path)?;
        let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let db_path = config.database_path(db_override, base_dir)?;
        let db = Database::open(&db_path)?;
        Ok(Self {
            workspace: Workspace::new(config),
            db,
            json,
        })
    }
}

/// Run the CLI.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet, cli.log_json)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    if matches!(cli.command, Commands::Version) {
        commands::version::execute(cli.json)?;
        return Ok(());
    }

    let session = Session::open(&cli.config, cli.db.as_deref(), cli.json)?;
    match &cli.command {
        Commands::List(args) => commands::list::execute(&session, args)?,
        Commands::Show(args) => commands::show::execute(&session, args)?,
        Commands::Delete(args) => commands::delete::execute(&session, args)?,
        Commands::Undelete(args) => commands::undelete::execute(&session, args)?,
        Commands::HardDelete(args) => commands::hard_delete::execute(&session, args)?,
        Commands::Doctor => commands::doctor::execute(&session)?,
        Commands::Version => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12"), Value::Integer(12));
        assert_eq!(parse_value("null"), Value::Null);
        assert_eq!(parse_value("true"), Value::Bool(true));
        assert_eq!(parse_value("abc"), Value::Text("abc".to_string()));
        assert_eq!(parse_value("-3"), Value::Integer(-3));
    }

    #[test]
    fn test_list_flags_conflict() {
        let parsed = Cli::try_parse_from(["sd", "list", "Items", "--deleted", "--all"]);
        assert!(parsed.is_err());
        let parsed =
            Cli::try_parse_from(["sd", "list", "Items", "--with", "items(notDeleted)"]).unwrap();
        match parsed.command {
            Commands::List(args) => assert_eq!(args.with.as_deref(), Some("items(notDeleted)")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_mutations_require_ids() {
        assert!(Cli::try_parse_from(["sd", "delete", "Items"]).is_err());
        assert!(Cli::try_parse_from(["sd", "hard-delete", "Items", "1", "2"]).is_ok());
    }
}
