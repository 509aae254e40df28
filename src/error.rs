use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Malformed leaf {leaf}: {message}")]
    MalformedLeaf { leaf: String, message: String },
    #[error("Unknown field '{field}' on model '{model}'")]
    UnknownField { model: String, field: String },
    #[error("Unknown model '{0}'")]
    UnknownModel(String),
    #[error("Malformed domain: {0}")]
    MalformedDomain(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;

// Helper conversions
impl From<rusqlite::Error> for DomainError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<::config::ConfigError> for DomainError {
    fn from(e: ::config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
