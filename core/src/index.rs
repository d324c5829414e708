use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PostingError, QueryError, StoreError};
use crate::posting::PostingList;
use crate::skip::SkipDistance;
use crate::{DocId, TermId, ALL_DOCUMENTS_TERM};

/// Dictionary value for one term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictEntry {
    /// Number of distinct documents containing the term.
    pub doc_freq: u32,
    /// Location of the term's posting list in the postings store.
    pub offset: u64,
}

/// Term → id → (document frequency, offset) lookups.
pub trait Dictionary {
    fn term_id(&self, term: &str) -> Option<TermId>;
    fn lookup(&self, term_id: TermId) -> Option<DictEntry>;
}

/// Random-access reads of serialized posting lists.
pub trait PostingsStore {
    fn read_posting_list(&self, offset: u64) -> Result<Vec<DocId>, StoreError>;
}

impl<T: Dictionary + ?Sized> Dictionary for &T {
    fn term_id(&self, term: &str) -> Option<TermId> { (**self).term_id(term) }
    fn lookup(&self, term_id: TermId) -> Option<DictEntry> { (**self).lookup(term_id) }
}

impl<T: PostingsStore + ?Sized> PostingsStore for &T {
    fn read_posting_list(&self, offset: u64) -> Result<Vec<DocId>, StoreError> {
        (**self).read_posting_list(offset)
    }
}

/// Immutable handle every query is evaluated against.
pub struct IndexHandle<D, S> {
    dictionary: D,
    store: S,
    skip: SkipDistance,
}

impl<D: Dictionary, S: PostingsStore> IndexHandle<D, S> {
    pub fn new(dictionary: D, store: S) -> Self {
        Self { dictionary, store, skip: SkipDistance::default() }
    }

    /// Skip policy applied to every list read through this handle.
    pub fn with_skip_distance(mut self, skip: SkipDistance) -> Self {
        self.skip = skip;
        self
    }

    pub fn skip_distance(&self) -> SkipDistance { self.skip }

    /// Skip-augmented posting list of an already-normalized term.
    ///
    /// Terms missing from the dictionary yield the empty list.
    pub fn postings(&self, term: &str) -> Result<PostingList, QueryError> {
        let Some(entry) = self.dictionary.term_id(term).and_then(|id| self.dictionary.lookup(id)) else {
            tracing::trace!(term, "term not in dictionary");
            return Ok(PostingList::empty());
        };
        self.read_entry(entry).map_err(|source| QueryError::StoreRead {
            term: term.to_string(),
            offset: entry.offset,
            source,
        })
    }

    /// Every document id known to the index.
    pub fn all_documents(&self) -> Result<PostingList, QueryError> {
        self.postings(ALL_DOCUMENTS_TERM)
    }

    fn read_entry(&self, entry: DictEntry) -> Result<PostingList, StoreError> {
        let ids = self.store.read_posting_list(entry.offset)?;
        if ids.len() != entry.doc_freq as usize {
            return Err(StoreError::LengthMismatch { expected: entry.doc_freq, actual: ids.len() });
        }
        Ok(PostingList::new(ids)?.with_skips(self.skip))
    }
}

/// Index held entirely in memory; offsets are slots in `lists`.
#[derive(Debug, Default, Clone)]
pub struct MemoryIndex {
    terms: HashMap<String, TermId>,
    entries: Vec<DictEntry>,
    lists: Vec<Vec<DocId>>,
}

impl MemoryIndex {
    pub fn new() -> Self { Self::default() }

    /// Builds an index from `(term, ascending doc ids)` pairs.
    ///
    /// The `all_documents_combined` list is derived as the union of every
    /// list unless one is supplied explicitly.
    pub fn from_postings<I, T>(postings: I) -> Result<Self, PostingError>
    where
        I: IntoIterator<Item = (T, Vec<DocId>)>,
        T: Into<String>,
    {
        let mut index = Self::new();
        let mut universe = PostingList::empty();
        let mut has_universe = false;
        for (term, ids) in postings {
            let term = term.into();
            let list = PostingList::new(ids)?;
            if term == ALL_DOCUMENTS_TERM {
                has_universe = true;
            } else {
                universe = universe.union(&list);
            }
            index.insert(term, list.into_doc_ids());
        }
        if !has_universe {
            index.insert(ALL_DOCUMENTS_TERM.to_string(), universe.into_doc_ids());
        }
        Ok(index)
    }

    /// Replaces the `all_documents_combined` list.
    pub fn with_universe(mut self, ids: Vec<DocId>) -> Result<Self, PostingError> {
        let list = PostingList::new(ids)?;
        self.insert(ALL_DOCUMENTS_TERM.to_string(), list.into_doc_ids());
        Ok(self)
    }

    fn insert(&mut self, term: String, ids: Vec<DocId>) {
        let entry = DictEntry { doc_freq: ids.len() as u32, offset: self.lists.len() as u64 };
        self.lists.push(ids);
        match self.terms.get(&term) {
            Some(&id) => self.entries[id as usize] = entry,
            None => {
                self.terms.insert(term, self.entries.len() as TermId);
                self.entries.push(entry);
            }
        }
    }

    pub fn num_terms(&self) -> usize { self.terms.len() }

    pub fn handle(&self) -> IndexHandle<&Self, &Self> { IndexHandle::new(self, self) }
}

impl Dictionary for MemoryIndex {
    fn term_id(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    fn lookup(&self, term_id: TermId) -> Option<DictEntry> { self.entries.get(term_id as usize).copied() }
}

impl PostingsStore for MemoryIndex {
    fn read_posting_list(&self, offset: u64) -> Result<Vec<DocId>, StoreError> {
        self.lists
            .get(offset as usize)
            .cloned()
            .ok_or_else(|| StoreError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, format!("no posting list at slot {offset}"))))
    }
}
