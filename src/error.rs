use thiserror::Error;

/// Failure categories surfaced by every store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad or missing filename, or an empty upload
    Validation,
    /// Unparseable XML or a stored artifact that is not valid JSON
    InvalidFormat,
    /// The operation targets an artifact that does not exist
    NotFound,
    /// A non-overwriting upload collides with an existing artifact
    AlreadyExists,
    /// Underlying storage access failure
    Io,
}

impl ErrorKind {
    /// Stable error code, shared with any outer transport that reports it
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "400-003",
            ErrorKind::InvalidFormat => "400-002",
            ErrorKind::NotFound => "404-000",
            ErrorKind::AlreadyExists => "409-001",
            ErrorKind::Io => "400-006",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ErrorKind::Validation => "Validation failed",
            ErrorKind::InvalidFormat => "Invalid data format",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::AlreadyExists => "Resource already exists",
            ErrorKind::Io => "I/O Error",
        }
    }

    /// Process exit status used by the command line front end
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Validation => 2,
            ErrorKind::InvalidFormat => 3,
            ErrorKind::NotFound => 4,
            ErrorKind::AlreadyExists => 5,
            ErrorKind::Io => 6,
        }
    }
}

/// Main error type for filename handling, conversion, and storage
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("File not found: {filename}")]
    NotFound { filename: String },

    #[error("File {filename} already exists")]
    AlreadyExists { filename: String },

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
        }
    }

    pub fn invalid_format<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::InvalidFormat {
            message: message.into(),
            source: Box::new(source),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            message: message.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation { .. } => ErrorKind::Validation,
            StoreError::InvalidFormat { .. } => ErrorKind::InvalidFormat,
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            StoreError::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, StoreError>;
