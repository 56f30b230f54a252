use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Filter JSON records with LDAP-style filter expressions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "LDAP_PREDICATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Treat the store as case-insensitive: compare equality without lower-casing fields
    #[arg(long, global = true)]
    pub case_insensitive_store: bool,

    /// Locale of the phonetic coder (e.g. "fr-FR"); defaults to the process locale
    #[arg(long, global = true)]
    pub locale: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the records of a JSON file matching a filter
    Filter {
        /// Filter expression, e.g. "(&(sn=doe)(!(version<=5)))"
        filter: String,

        /// JSON lines or JSON array of objects; reads stdin when omitted
        file: Option<PathBuf>,

        /// Extra field names allowed in the filter besides those found in the records
        #[arg(long, value_delimiter = ',')]
        fields: Vec<String>,

        /// Output format
        #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// What to do with records whose like match runs out of time
        #[arg(long, value_enum, default_value_t = TimeoutPolicy::Fail)]
        on_timeout: TimeoutPolicy,
    },
    /// Validate a filter and print the predicate it compiles to
    Check {
        /// Filter expression
        filter: String,

        /// Field names of the target records
        #[arg(long, value_delimiter = ',', required = true)]
        fields: Vec<String>,
    },
    /// Print the phonetic code of each word
    Approx {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per line
    Json,
    /// Table with one column per field
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimeoutPolicy {
    /// Abort with an error
    Fail,
    /// Treat the record as not matching
    Skip,
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
