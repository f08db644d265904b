use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("No workspace folders provided")]
    NoWorkspace,

    #[error("Invalid workspace folder URI: {0}")]
    InvalidUri(String),

    #[error("Vector engine not initialized")]
    EngineUnavailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] context_vector_store::VectorStoreError),

    #[error("{0}")]
    Other(String),
}
