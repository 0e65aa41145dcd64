use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dbx_exec::Language;

#[derive(Parser, Debug, Clone)]
#[command(name = "dbx-exec", about = "Run commands in remote cluster execution contexts", version)]
pub struct Cli {
    /// Workspace URL, e.g. https://adb-123.4.azuredatabricks.net.
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Cluster to run commands on.
    #[arg(long = "cluster-id", global = true)]
    pub cluster_id: Option<String>,

    /// Bearer access token.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Deadline for each statement applied with `apply`, in milliseconds.
    #[arg(long = "apply-timeout-ms", global = true)]
    pub apply_timeout_ms: Option<u64>,

    /// Log filter used when RUST_LOG is not set (error|warn|info|debug|trace).
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Execute one command and print its result rows.
    Exec {
        /// Command text.
        #[arg(value_name = "COMMAND")]
        text: String,
        /// Context language (scala|sql).
        #[arg(long, default_value_t = Language::Scala, value_parser = parse_language)]
        language: Language,
    },
    /// Print the cluster descriptor.
    Cluster,
    /// List databases.
    Databases,
    /// List tables of a database.
    Tables { db: String },
    /// List views of a database.
    Views { db: String },
    /// Print the DDL of a table.
    ShowCreate { entity: String },
    /// Describe databases concurrently.
    Describe {
        #[arg(required = true)]
        dbs: Vec<String>,
    },
    /// Fetch tables metadata and database properties.
    ClusterData {
        /// Tables as db.table; a bare db name requests the database only.
        #[arg(required = true)]
        entities: Vec<String>,
    },
    /// Sample rows from a table (never fails, prints [] instead).
    Sample {
        db: String,
        table: String,
        /// Columns to select.
        #[arg(long = "field", required = true, action = clap::ArgAction::Append)]
        fields: Vec<String>,
        /// Absolute number of rows.
        #[arg(long, conflicts_with = "percent")]
        limit: Option<u64>,
        /// Percentage of the table's rows.
        #[arg(long)]
        percent: Option<f64>,
    },
    /// Apply a ;-separated SQL script statement by statement.
    Apply {
        /// Script file; read from stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

fn parse_language(s: &str) -> Result<Language, String> {
    match s.to_ascii_lowercase().as_str() {
        "scala" => Ok(Language::Scala),
        "sql" => Ok(Language::Sql),
        other => Err(format!("unknown language `{}`, expected scala or sql", other)),
    }
}
