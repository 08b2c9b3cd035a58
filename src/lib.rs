//! # echovox Library
//!
//! Converts uploaded customer XML documents to JSON, stores them on disk under
//! a name derived from the upload's `<customer>_<type>_<date>.xml` filename,
//! and answers searches on those three filename fields.

pub mod cli;
pub mod config;
pub mod converter;
pub mod error;
pub mod filename;
pub mod output;
pub mod service;
pub mod store;
pub mod telemetry;

pub use cli::{Cli, Command, OutputFormat, SearchArgs, UploadArgs};
pub use config::{Config, ConfigError, ConfigManager};
pub use converter::{CanonicalDocument, CustomerRecord, DocumentConverter};
pub use error::{ErrorKind, Result, StoreError};
pub use filename::{FilenameCodec, FilenameKey, SearchField, SearchQuery};
pub use output::Output;
pub use service::{DocumentEntry, DocumentService};
pub use store::{ArtifactStore, FsArtifactStore, KeyStream};
