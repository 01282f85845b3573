use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("No transactions to analyze. Add some transactions first.")]
    NoTransactions,

    #[error("Agent request failed: {0}")]
    Agent(String),

    #[error("Unparseable agent response: {0}")]
    UnparseableResponse(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No transaction with id {0}")]
    NotFound(String),

    #[error("Unknown category '{category}' for {kind} transactions")]
    UnknownCategory { category: String, kind: String },

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
