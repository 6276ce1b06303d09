use std::fmt;

/// Main error type for transfer statistics tracking
#[derive(Debug)]
pub enum TransferStatsError {
    // Lifecycle Errors
    InvalidState(String),

    // Configuration Errors
    InvalidConfigValue(String),
    Config(::config::ConfigError),

    // IO Errors
    Io(std::io::Error),
}

impl fmt::Display for TransferStatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidState(msg) => write!(f, "Invalid state: {}", msg),

            Self::InvalidConfigValue(msg) => write!(f, "Invalid config value: {}", msg),
            Self::Config(err) => write!(f, "Configuration error: {}", err),

            Self::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for TransferStatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransferStatsError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<::config::ConfigError> for TransferStatsError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TransferStatsError>;
