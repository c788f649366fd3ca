use std::io;

/// Custom error type for deploy_relay operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("no signature information: {0}")]
    NoSignatureInfo(String),

    #[error("signature not validated")]
    InvalidSignature,

    #[error("unknown repository: {0}")]
    UnknownRepo(String),

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("broker error: {0}")]
    BrokerError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
