use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("iCalendar parse error: {0}")]
    Ical(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    InvalidQuery(String),
}

impl Error {
    /// True for errors caused by the caller's input rather than by this process.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
