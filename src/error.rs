//! Error types

use thiserror::Error;

/// Errors raised while registering intents/entities or building a container.
///
/// Query paths never fail; a query that matches nothing yields an
/// [`IntentMatch`](crate::IntentMatch) without a name.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Attempted to re-register existing intent: {0}")]
    DuplicateIntent(String),

    #[error("Attempted to re-register existing entity: {0}")]
    DuplicateEntity(String),

    #[error("Failed to compile pattern {template:?}: {source}")]
    Pattern {
        template: String,
        source: regex::Error,
    },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Failed to parse config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
