use thiserror::Error;

use crate::DocId;

/// A doc-id sequence that violates the posting list ordering invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PostingError {
    #[error("doc ids are not strictly increasing at index {index}: prev={prev}, next={next}")]
    NotStrictlyIncreasing { index: usize, prev: DocId, next: DocId },
}

/// Failure to read a posting list back from the postings store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] bincode::Error),

    #[error("document frequency mismatch: dictionary says {expected}, store holds {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error(transparent)]
    Order(#[from] PostingError),
}

/// Errors raised while evaluating a single query line.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("malformed query: {message}")]
    Malformed { message: String, token_index: Option<usize> },

    #[error("postings store unreadable for term {term:?} at offset {offset}: {source}")]
    StoreRead {
        term: String,
        offset: u64,
        #[source]
        source: StoreError,
    },
}

impl QueryError {
    pub fn malformed(message: impl Into<String>, token_index: Option<usize>) -> Self {
        QueryError::Malformed { message: message.into(), token_index }
    }

    /// Parse errors stem from the query text; store errors from the index.
    pub fn is_malformed(&self) -> bool {
        matches!(self, QueryError::Malformed { .. })
    }
}

/// Errors raised while building an index with the SPIMI builder.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("documents must be added in ascending id order: {doc_id} after {last}")]
    OutOfOrder { doc_id: DocId, last: DocId },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("block size must be at least 1")]
    ZeroBlockSize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display() {
        let err = QueryError::malformed("unmatched ')'", Some(3));
        assert_eq!(err.to_string(), "malformed query: unmatched ')'");
        assert!(err.is_malformed());
    }

    #[test]
    fn store_read_display_names_term() {
        let err = QueryError::StoreRead {
            term: "cat".into(),
            offset: 42,
            source: StoreError::LengthMismatch { expected: 3, actual: 2 },
        };
        let msg = err.to_string();
        assert!(msg.contains("\"cat\""));
        assert!(msg.contains("offset 42"));
        assert!(!err.is_malformed());
    }
}
