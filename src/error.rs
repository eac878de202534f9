use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaytrailError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Input is empty")]
    EmptyInput,

    #[error("Could not read workbook: {0}")]
    UnreadableWorkbook(String),

    #[error("Workbook has no rows")]
    EmptyWorkbook,

    #[error("Could not recognize file format: {0}")]
    UnrecognizedFormat(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl PaytrailError {
    /// Structural input problems the user can fix by picking another file.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput
                | Self::UnreadableWorkbook(_)
                | Self::EmptyWorkbook
                | Self::UnrecognizedFormat(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PaytrailError>;
