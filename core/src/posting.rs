use std::cmp::Ordering;
use std::fmt;

use crate::error::PostingError;
use crate::skip::{skip_targets, SkipDistance};
use crate::DocId;

/// Strictly ascending doc ids with optional same-list skip links.
///
/// `skips[i]` is the index a skip link at position `i` jumps to. Links only
/// point forward and never leave the list. Merge results carry no links.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    doc_ids: Vec<DocId>,
    skips: Vec<Option<usize>>,
}

impl PostingList {
    /// Builds a list from deserialized doc ids, rejecting unsorted or duplicate input.
    pub fn new(doc_ids: Vec<DocId>) -> Result<Self, PostingError> {
        for (index, pair) in doc_ids.windows(2).enumerate() {
            if pair[1] <= pair[0] {
                return Err(PostingError::NotStrictlyIncreasing {
                    index: index + 1,
                    prev: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self::from_sorted_unchecked(doc_ids))
    }

    pub fn empty() -> Self {
        Self::default()
    }

    fn from_sorted_unchecked(doc_ids: Vec<DocId>) -> Self {
        debug_assert!(doc_ids.windows(2).all(|w| w[0] < w[1]));
        let skips = vec![None; doc_ids.len()];
        Self { doc_ids, skips }
    }

    /// Adds skip links according to `distance`, replacing any existing ones.
    pub fn with_skips(mut self, distance: SkipDistance) -> Self {
        self.skips = match distance.resolve(self.doc_ids.len()) {
            Some(d) => skip_targets(self.doc_ids.len(), d),
            None => vec![None; self.doc_ids.len()],
        };
        self
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn doc_ids(&self) -> &[DocId] {
        &self.doc_ids
    }

    pub fn into_doc_ids(self) -> Vec<DocId> {
        self.doc_ids
    }

    /// Skip target of position `index`, if it carries a link.
    pub fn skip(&self, index: usize) -> Option<usize> {
        self.skips.get(index).copied().flatten()
    }

    pub fn skip_count(&self) -> usize {
        self.skips.iter().filter(|s| s.is_some()).count()
    }

    /// Next position to inspect when the current one is below `target`.
    ///
    /// Follows skip links while they do not overshoot `target`, otherwise
    /// steps by one. Every position jumped over holds an id below `target`.
    fn advance_towards(&self, index: usize, target: DocId) -> usize {
        let mut current = index;
        while let Some(next) = self.skip(current) {
            if self.doc_ids[next] > target {
                break;
            }
            current = next;
        }
        if current == index {
            index + 1
        } else {
            current
        }
    }

    /// OR: sorted union without duplicates.
    pub fn union(&self, other: &PostingList) -> PostingList {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (a, b) = (&self.doc_ids, &other.doc_ids);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        PostingList::from_sorted_unchecked(out)
    }

    /// AND: ids present in both lists.
    pub fn intersect(&self, other: &PostingList) -> PostingList {
        if self.is_empty() || other.is_empty() {
            return PostingList::empty();
        }
        let (a, b) = (&self.doc_ids, &other.doc_ids);
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i = self.advance_towards(i, b[j]),
                Ordering::Greater => j = other.advance_towards(j, a[i]),
            }
        }
        PostingList::from_sorted_unchecked(out)
    }

    /// ANDNOT: ids of `self` absent from `other`.
    pub fn difference(&self, other: &PostingList) -> PostingList {
        if self.is_empty() {
            return PostingList::empty();
        }
        if other.is_empty() {
            return self.clone();
        }
        let (a, b) = (&self.doc_ids, &other.doc_ids);
        let mut out = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    // everything jumped over sits strictly between b[j - 1] and b[j]
                    let next = self.advance_towards(i, b[j]);
                    out.extend_from_slice(&a[i..next]);
                    i = next;
                }
                Ordering::Greater => j = other.advance_towards(j, a[i]),
            }
        }
        out.extend_from_slice(&a[i..]);
        PostingList::from_sorted_unchecked(out)
    }
}

impl PartialEq for PostingList {
    /// Lists compare by membership; skip links are an access path only.
    fn eq(&self, other: &Self) -> bool {
        self.doc_ids == other.doc_ids
    }
}

impl Eq for PostingList {}

impl fmt::Display for PostingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for id in &self.doc_ids {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}
