use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Row {row}: column '{column}' has unparsable value '{value}'")]
    Coercion {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Forecast undefined: {divisor} is zero")]
    DivisionUndefined { divisor: &'static str },

    #[error("Invalid forecast window: {0}")]
    InvalidWindow(String),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Archive decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Archive error: {0}")]
    Archive(String),
}

pub type Result<T> = std::result::Result<T, ReportError>;
