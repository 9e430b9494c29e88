use thiserror::Error;

/// Errors surfaced by the document store.
///
/// `Connect` and `Subscribe` are fatal at startup; everything else is local
/// to one query/write and never aborts the surrounding loop.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("subscription failed: {0}")]
    Subscribe(String),
}
