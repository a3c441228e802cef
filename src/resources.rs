//! Resource managers built on the shared [`Dispatcher`](crate::Dispatcher).

pub mod datasources;
pub mod minds;

pub use datasources::Datasources;
pub use minds::{CreateMind, MindUpdate, Minds, DEFAULT_MODEL, DEFAULT_PROMPT_TEMPLATE, PROJECT};

use crate::client::ClientError;

/// Turn a not-found failure into `None`, passing every other outcome through.
pub(crate) fn found<T>(result: Result<T, ClientError>) -> Result<Option<T>, ClientError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Percent-encode a resource name for use as a single path segment.
pub(crate) fn segment(name: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(name)
}
