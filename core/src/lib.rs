//! Boolean retrieval over a skip-pointer inverted index.
//!
//! Queries such as `cat AND NOT (dog OR mouse)` are tokenized, converted to
//! postfix with the shunting-yard algorithm and evaluated against posting
//! lists pulled from a [`Dictionary`] / [`PostingsStore`] pair.

pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod posting;
pub mod query;
pub mod shunting_yard;
pub mod skip;
pub mod spimi;
pub mod tokenizer;

pub use error::{BuildError, PostingError, QueryError, StoreError};
pub use eval::{evaluate, evaluate_rpn, Evaluator};
pub use index::{DictEntry, Dictionary, IndexHandle, MemoryIndex, PostingsStore};
pub use posting::PostingList;
pub use query::{tokenize_query, Operator, QueryToken};
pub use shunting_yard::{shunting_yard, RpnToken};
pub use skip::SkipDistance;
pub use tokenizer::{IdentityNormalizer, Normalizer, StemmingNormalizer};

pub type TermId = u32;
pub type DocId = u32;

/// Dictionary key of the virtual list holding every indexed document id.
pub const ALL_DOCUMENTS_TERM: &str = "all_documents_combined";
