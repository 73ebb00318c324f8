use thiserror::Error;

#[derive(Error, Debug)]
pub enum ErpError {
    #[error("Input file not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Malformed EDF file: {0}")]
    FormatError(String),

    #[error("Channel not found: {0}")]
    MissingChannel(String),

    #[error("No events matching '{0}'")]
    NoMatchingEvents(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Failed to render plot: {0}")]
    PlotError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ErpError>;
