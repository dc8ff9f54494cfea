use crate::listing::ListingError;
use crate::remote::StoreError;

pub type Result<T> = std::result::Result<T, BucketScoutError>;

#[derive(Debug, thiserror::Error)]
pub enum BucketScoutError {
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Error: {0}")]
    Generic(String),
}

impl From<String> for BucketScoutError {
    fn from(error: String) -> Self {
        BucketScoutError::Generic(error)
    }
}

impl From<&str> for BucketScoutError {
    fn from(error: &str) -> Self {
        BucketScoutError::Generic(error.to_string())
    }
}
