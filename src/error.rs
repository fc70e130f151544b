use aws_sdk_dynamodb::error::BuildError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ChatError>;

/// Errors surfaced by the chat store.
///
/// Remote failures are carried verbatim as the SDK's service error so callers
/// can match on the exact condition (throttling, missing table, ...).
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to marshal chat: {0}")]
    Marshal(#[source] serde_dynamo::Error),

    #[error("key attribute `{0}` must be a non-empty string")]
    InvalidKey(&'static str),

    #[error("failed to unmarshal chat: {0}")]
    Unmarshal(#[source] serde_dynamo::Error),

    #[error("failed to build request: {0}")]
    Request(#[from] BuildError),

    #[error("DynamoDB request failed: {0}")]
    Remote(#[from] aws_sdk_dynamodb::Error),
}

impl ChatError {
    /// Wraps any operation-level SDK failure as a [`ChatError::Remote`].
    pub(crate) fn remote<E>(err: E) -> Self
    where
        aws_sdk_dynamodb::Error: From<E>,
    {
        ChatError::Remote(aws_sdk_dynamodb::Error::from(err))
    }
}
