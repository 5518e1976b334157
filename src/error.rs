//! Library-level errors.
use thiserror::Error;

/// A type for results generated by topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for address, configuration and description construction.
///
/// Classifying a cluster never fails; these errors only surface from the
/// narrower boundaries that feed it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A malformed host, connection string, or option value.
    #[error("{0}")]
    ArgumentError(String),
    /// A server description was built without one of its required fields.
    #[error("server description is missing the required `{0}` field")]
    MissingField(&'static str),
}
