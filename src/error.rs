#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("'{column}' column not found in sheet '{sheet}'. Columns found: {found:?}. Check for typos or extra spaces in column headers")]
    MissingColumn {
        sheet: String,
        column: String,
        found: Vec<String>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No eligible sheets found with Product set to Sponsored Products, Sponsored Brands or Sponsored Display")]
    NoEligibleSheets,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
