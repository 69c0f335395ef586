use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sheet_clean_core::row::EntityType;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a JSON array of rows and print the diagnostics
    Validate {
        /// Entity type: client, worker or task
        entity: EntityType,

        /// JSON file holding an array of row objects
        input: PathBuf,

        /// Print messages grouped by row instead of a flat list
        #[arg(short, long)]
        grouped: bool,
    },

    /// Check one candidate cell value
    Field {
        entity: EntityType,

        /// Canonical field name, e.g. PriorityLevel
        field: String,

        /// Candidate value; parsed as JSON when possible, otherwise taken as text
        value: String,

        /// The rest of the row as a JSON object
        #[arg(short, long, default_value = "{}")]
        row: String,
    },

    /// Filter rows with a natural-language query or a boolean expression
    Filter {
        entity: EntityType,

        input: PathBuf,

        /// Natural-language query, e.g. "duration greater than 3"
        #[arg(required_unless_present = "expression")]
        query: Option<String>,

        /// Boolean expression over `row`, e.g. "row.Duration > 3"
        #[arg(short, long, conflicts_with = "query")]
        expression: Option<String>,
    },

    /// List the quick-filter presets of an entity type
    Presets { entity: EntityType },

    /// Print the canonical schema of an entity type
    Schema { entity: EntityType },

    /// Check a JSON array of rules and print the export bundle
    Rules { input: PathBuf },
}
