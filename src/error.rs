use thiserror::Error;

/// Everything that can go wrong while asking the telemetry server for driver data.
///
/// All variants travel through the same error channel; the display text is
/// what distinguishes them for a human reader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Failed to connect to {url}. Is the server running? ({reason})")]
    Connection { url: String, reason: String },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The endpoint answered successfully but reported its own failure.
    #[error("{message}")]
    Application { message: String },

    #[error("Malformed driver data from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnimatorError {
    #[error("cycle animator requires at least one slot")]
    NoSlots,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse yaml: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("invalid config: {0}")]
    Invalid(String),
}
