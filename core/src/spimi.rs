//! Single-pass in-memory index construction.
//!
//! Documents are accumulated into a block of `term -> doc ids` until
//! `block_size` documents have been seen; the block is then spilled to disk
//! in term order. `finish` k-way merges the blocks into one postings file and
//! returns the dictionary describing it.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::index::DictEntry;
use crate::persist::{DictionaryFile, PostingsWriter};
use crate::{DocId, TermId, ALL_DOCUMENTS_TERM};

type BlockEntry = (String, Vec<DocId>);

pub struct SpimiBuilder {
    work_dir: PathBuf,
    block_size: usize,
    block: BTreeMap<String, Vec<DocId>>,
    docs_in_block: usize,
    blocks: Vec<PathBuf>,
    all_docs: Vec<DocId>,
}

impl SpimiBuilder {
    /// Block files are written under `work_dir`, which is created if missing.
    pub fn new(work_dir: impl Into<PathBuf>, block_size: usize) -> Result<Self, BuildError> {
        if block_size == 0 {
            return Err(BuildError::ZeroBlockSize);
        }
        let work_dir = work_dir.into();
        fs::create_dir_all(&work_dir)?;
        Ok(Self {
            work_dir,
            block_size,
            block: BTreeMap::new(),
            docs_in_block: 0,
            blocks: Vec::new(),
            all_docs: Vec::new(),
        })
    }

    pub fn num_docs(&self) -> usize {
        self.all_docs.len()
    }

    /// Adds one document's normalized terms. Ids must be strictly ascending.
    pub fn add_document<I, T>(&mut self, doc_id: DocId, terms: I) -> Result<(), BuildError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if let Some(&last) = self.all_docs.last() {
            if doc_id <= last {
                return Err(BuildError::OutOfOrder { doc_id, last });
            }
        }
        for term in terms {
            let term = term.into();
            if term == ALL_DOCUMENTS_TERM {
                continue;
            }
            let list = self.block.entry(term).or_default();
            if list.last() != Some(&doc_id) {
                list.push(doc_id);
            }
        }
        self.all_docs.push(doc_id);
        self.docs_in_block += 1;
        if self.docs_in_block >= self.block_size {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<(), BuildError> {
        if self.docs_in_block == 0 {
            return Ok(());
        }
        let path = self.work_dir.join(format!("block-{:04}.bin", self.blocks.len()));
        let mut out = BufWriter::new(File::create(&path)?);
        bincode::serialize_into(&mut out, &(self.block.len() as u64))?;
        for entry in std::mem::take(&mut self.block) {
            bincode::serialize_into(&mut out, &entry)?;
        }
        out.flush()?;
        tracing::debug!(block = self.blocks.len(), docs = self.docs_in_block, path = %path.display(), "spilled block");
        self.blocks.push(path);
        self.docs_in_block = 0;
        Ok(())
    }

    /// Merges every block into `postings_path`, appending `all_documents_combined`.
    ///
    /// Term ids follow lexicographic term order. Block files are removed.
    pub fn finish(mut self, postings_path: &Path) -> Result<DictionaryFile, BuildError> {
        self.flush_block()?;

        let mut readers = self
            .blocks
            .iter()
            .map(|path| BlockReader::open(path))
            .collect::<Result<Vec<_>, _>>()?;
        let mut heads: Vec<Option<Vec<DocId>>> = vec![None; readers.len()];
        let mut heap: BinaryHeap<Reverse<(String, usize)>> = BinaryHeap::new();
        for (i, reader) in readers.iter_mut().enumerate() {
            if let Some((term, ids)) = reader.next_entry()? {
                heads[i] = Some(ids);
                heap.push(Reverse((term, i)));
            }
        }

        let mut writer = PostingsWriter::create(postings_path)?;
        let mut terms: HashMap<String, TermId> = HashMap::new();
        let mut entries: HashMap<TermId, DictEntry> = HashMap::new();
        let mut merged: Vec<DocId> = Vec::new();

        while let Some(Reverse((term, first))) = heap.pop() {
            merged.clear();
            let mut sources = vec![first];
            while matches!(heap.peek(), Some(Reverse((next, _))) if *next == term) {
                if let Some(Reverse((_, i))) = heap.pop() {
                    sources.push(i);
                }
            }
            // blocks hold disjoint, increasing doc ranges: concatenation stays sorted
            for i in sources {
                if let Some(ids) = heads[i].take() {
                    merged.extend(ids);
                }
                if let Some((next_term, ids)) = readers[i].next_entry()? {
                    heads[i] = Some(ids);
                    heap.push(Reverse((next_term, i)));
                }
            }
            let offset = writer.append(&merged)?;
            let id = terms.len() as TermId;
            entries.insert(id, DictEntry { doc_freq: merged.len() as u32, offset });
            terms.insert(term, id);
        }

        let offset = writer.append(&self.all_docs)?;
        let id = terms.len() as TermId;
        entries.insert(id, DictEntry { doc_freq: self.all_docs.len() as u32, offset });
        terms.insert(ALL_DOCUMENTS_TERM.to_string(), id);
        let bytes = writer.finish()?;

        drop(readers);
        for path in &self.blocks {
            fs::remove_file(path)?;
        }
        tracing::info!(
            blocks = self.blocks.len(),
            terms = terms.len(),
            num_docs = self.all_docs.len(),
            bytes,
            "merged blocks"
        );
        Ok(DictionaryFile { terms, entries, num_docs: self.all_docs.len() as u32 })
    }
}

/// Streams the entries of one spilled block in term order.
struct BlockReader {
    input: BufReader<File>,
    remaining: u64,
}

impl BlockReader {
    fn open(path: &Path) -> Result<Self, BuildError> {
        let mut input = BufReader::new(File::open(path)?);
        let remaining: u64 = bincode::deserialize_from(&mut input)?;
        Ok(Self { input, remaining })
    }

    fn next_entry(&mut self) -> Result<Option<BlockEntry>, BuildError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(bincode::deserialize_from(&mut self.input)?))
    }
}
