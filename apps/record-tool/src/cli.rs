use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file (naming rules, decimal separator, error limit)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the fields, offsets and sizes of a schema
    Inspect {
        /// Schema XML file containing a <RecordInfo> element
        schema: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a schema as canonical <RecordInfo> XML
    Normalize {
        /// Schema XML file
        schema: PathBuf,

        /// Leave out source attributes
        #[arg(long)]
        no_source: bool,
    },

    /// Build one record from name=value pairs
    BuildRecord {
        /// Schema XML file
        schema: PathBuf,

        /// Field values as name=value; unset fields are null
        #[arg(short, long = "set")]
        values: Vec<String>,

        /// Append the record to this file instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print every record in a record file as JSON lines
    Dump {
        /// Schema XML file
        schema: PathBuf,

        /// Record file written by build-record or convert
        input: PathBuf,
    },

    /// Convert a record file to another schema, matching fields by name
    Convert {
        /// Schema of the input records
        #[arg(long)]
        from: PathBuf,

        /// Schema of the output records
        #[arg(long)]
        to: PathBuf,

        /// Input record file
        input: PathBuf,

        /// Output record file
        output: PathBuf,
    },
}
