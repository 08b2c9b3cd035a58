use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::filename::SearchQuery;

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Readable text
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
}

/// Store customer XML documents as JSON and search them by filename
#[derive(Parser, Debug, Clone)]
#[command(name = "echovox")]
#[command(about = "Convert customer XML documents to JSON and manage them by filename")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML or JSON)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the stored documents
    #[arg(long = "storage-dir", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// Output format
    #[arg(long = "format", value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Emit logs as JSON lines
    #[arg(long = "json-logs", global = true)]
    pub json_logs: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert an XML file and store it; fails if it already exists
    Upload(UploadArgs),
    /// Convert an XML file and store it, overwriting any previous version
    Replace(UploadArgs),
    /// Delete a stored document
    Delete {
        /// Original filename, e.g. acme_invoice_2024-01-05.xml
        filename: String,
    },
    /// Print a stored document
    Get {
        /// Original filename, e.g. acme_invoice_2024-01-05.xml
        filename: String,
    },
    /// Find stored documents by a filename field
    Search(SearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// XML file to read
    pub path: PathBuf,

    /// Filename to store under (defaults to the file's own name)
    #[arg(long = "name")]
    pub name: Option<String>,
}

impl UploadArgs {
    pub fn original_filename(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SearchArgs {
    /// Date segment, YYYY-MM-DD
    #[arg(long = "date")]
    pub date: Option<NaiveDate>,

    /// Customer segment
    #[arg(long = "customer")]
    pub customer: Option<String>,

    /// Document type segment
    #[arg(long = "type")]
    pub doc_type: Option<String>,
}

impl SearchArgs {
    pub fn query(&self) -> Option<SearchQuery> {
        if let Some(date) = self.date {
            return Some(SearchQuery::Date(date));
        }
        if let Some(customer) = &self.customer {
            return Some(SearchQuery::Customer(customer.clone()));
        }
        self.doc_type.clone().map(SearchQuery::DocType)
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level implied by `--verbose` / `--quiet`, if either is set
    pub fn log_level_override(&self) -> Option<&'static str> {
        if self.quiet {
            Some("error")
        } else if self.verbose {
            Some("debug")
        } else {
            None
        }
    }
}
