//! Error types and Result aliases for replbridge

use std::fmt;
use std::path::PathBuf;

/// Result type alias for replbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for replbridge
#[derive(Debug)]
pub enum Error {
    // === Engine errors ===
    /// The interpreter runtime could not be established
    EngineInit {
        kind: String,
        reason: String,
    },

    /// The engine communication channel has been closed
    EngineClosed,

    /// A worker request could not be delivered or answered
    WorkerUnreachable {
        reason: String,
    },

    /// An extension package failed to install
    PackageInstall {
        package: String,
        reason: String,
    },

    // === Terminal errors ===
    /// The terminal surface rejected a pending read
    TerminalReadFailed {
        reason: String,
    },

    /// A read was requested while another read was still outstanding
    ReadInProgress,

    // === Session errors ===
    /// Operation attempted against a session in the wrong lifecycle state
    InvalidSessionState {
        expected: String,
        actual: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to parse configuration
    ConfigParseFailed {
        format: String,
        reason: String,
    },

    /// Unknown engine kind tag in configuration
    UnknownEngineKind {
        tag: String,
    },

    // === I/O and serialization errors (kept for compatibility) ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Engine errors
            Error::EngineInit { kind, reason } => {
                write!(f, "Failed to initialize '{}' engine: {}", kind, reason)
            }
            Error::EngineClosed => {
                write!(f, "The engine communication channel has been closed")
            }
            Error::WorkerUnreachable { reason } => {
                write!(f, "Engine worker is unreachable: {}", reason)
            }
            Error::PackageInstall { package, reason } => {
                write!(f, "Failed to install package '{}': {}", package, reason)
            }

            // Terminal errors
            Error::TerminalReadFailed { reason } => {
                write!(f, "Failed to read from the console terminal: {}", reason)
            }
            Error::ReadInProgress => {
                write!(f, "A terminal read is already outstanding")
            }

            // Session errors
            Error::InvalidSessionState { expected, actual } => {
                write!(
                    f,
                    "Invalid session state: expected {}, got {}",
                    expected, actual
                )
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(
                    f,
                    "Failed to load config from '{}': {}",
                    path.display(),
                    reason
                )
            }
            Error::ConfigParseFailed { format, reason } => {
                write!(f, "Failed to parse {} config: {}", format, reason)
            }
            Error::UnknownEngineKind { tag } => {
                write!(f, "Unknown engine kind: '{}'", tag)
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
