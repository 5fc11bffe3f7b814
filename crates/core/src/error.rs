use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("store query failed: {0}")]
    Store(#[from] StoreError),
    #[error("no successfully published dataset version found")]
    NoSuccessfulDataset,
    #[error("malformed course document: {0}")]
    MalformedDocument(String),
}

pub type WidgetResult<T> = std::result::Result<T, WidgetError>;
