use thiserror::Error;

#[derive(Error, Debug)]
pub enum CkpiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Required column '{0}' not found")]
    MissingColumn(String),

    #[error("Could not parse any dates")]
    NoParsableDates,

    #[error("Input is empty")]
    EmptyInput,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CkpiError>;
