//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Security error: {0}")]
    Security(String),

    #[error("History index {index} out of range for {len} entries")]
    OutOfRange { index: usize, len: usize },

    #[error("Navigation unavailable: {0}")]
    Unavailable(String),

    #[error("Browser error: {0}")]
    Browser(String),
}
