// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

// --- Custom Error Type ---
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Data not found: {0}")]
    DataNotFound(String),
    #[error("Max retries exceeded for URL: {0}")]
    MaxRetriesExceeded(String),
    #[error("Invalid selector `{0}`")]
    Selector(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ScraperError>;
