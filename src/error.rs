use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Budget validation failed: {}", .errors.join("; "))]
    BudgetValidation { errors: Vec<String> },

    #[error("Invalid forecast horizon: {0}")]
    InvalidHorizon(String),

    #[error("Empty history: {0}")]
    EmptyHistory(String),

    #[error("Unknown emission category: {0}")]
    UnknownCategory(String),

    #[error("Negative emission value {value} for record dated {date}")]
    NegativeEmissions { date: String, value: f64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
