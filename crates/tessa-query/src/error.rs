use thiserror::Error;

/// Failure modes of index-backed queries.
///
/// `TreeDiscarded` is a contract violation, not a recoverable runtime error:
/// the caller queried an index whose tree was already dropped and must
/// re-fetch a live tree. `Cancelled` is the cooperative abort signal; no
/// partial results are salvaged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueryError {
    #[error("syntax tree already discarded")]
    TreeDiscarded,
    #[error("cancelled")]
    Cancelled,
}
