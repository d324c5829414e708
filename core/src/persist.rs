use crate::error::StoreError;
use crate::index::{DictEntry, Dictionary, IndexHandle, PostingsStore};
use crate::skip::SkipDistance;
use crate::{DocId, TermId};
use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
    pub block_size: usize,
}

/// Where an index lives: a dictionary file and a postings file.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub dictionary: PathBuf,
    pub postings: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(dictionary: P, postings: Q) -> Self {
        Self { dictionary: dictionary.as_ref().to_path_buf(), postings: postings.as_ref().to_path_buf() }
    }

    /// `dictionary.bin` and `postings.bin` inside `root`.
    pub fn in_dir<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self::new(root.join("dictionary.bin"), root.join("postings.bin"))
    }

    pub fn meta(&self) -> PathBuf { self.dictionary.with_extension("meta.json") }
}

/// In-memory form of the dictionary file.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct DictionaryFile {
    pub terms: HashMap<String, TermId>,
    pub entries: HashMap<TermId, DictEntry>,
    pub num_docs: u32,
}

impl Dictionary for DictionaryFile {
    fn term_id(&self, term: &str) -> Option<TermId> { self.terms.get(term).copied() }

    fn lookup(&self, term_id: TermId) -> Option<DictEntry> { self.entries.get(&term_id).copied() }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    Ok(())
}

pub fn save_dictionary(paths: &IndexPaths, dict: &DictionaryFile) -> Result<()> {
    ensure_parent(&paths.dictionary)?;
    let mut f = File::create(&paths.dictionary)?;
    let bytes = bincode::serialize(dict)?;
    f.write_all(&bytes)?;
    Ok(())
}

pub fn load_dictionary(paths: &IndexPaths) -> Result<DictionaryFile> {
    let mut f = File::open(&paths.dictionary)
        .with_context(|| format!("opening dictionary {}", paths.dictionary.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let dict = bincode::deserialize(&buf)?;
    Ok(dict)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    ensure_parent(&paths.meta())?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening metadata {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Appends bincode-encoded posting lists, reporting each record's offset.
pub struct PostingsWriter {
    out: BufWriter<File>,
    offset: u64,
}

impl PostingsWriter {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir_all(parent)?;
        }
        Ok(Self { out: BufWriter::new(File::create(path)?), offset: 0 })
    }

    /// Writes one list and returns the offset it starts at.
    pub fn append(&mut self, ids: &[DocId]) -> Result<u64, bincode::Error> {
        let start = self.offset;
        bincode::serialize_into(&mut self.out, ids)?;
        self.offset += bincode::serialized_size(ids)?;
        Ok(start)
    }

    pub fn finish(mut self) -> std::io::Result<u64> {
        self.out.flush()?;
        Ok(self.offset)
    }
}

/// Read-only postings file; seek + decode pairs are serialized by a lock.
pub struct PostingsFile {
    reader: Mutex<BufReader<File>>,
}

impl PostingsFile {
    pub fn open(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("opening postings {}", path.display()))?;
        Ok(Self { reader: Mutex::new(BufReader::new(f)) })
    }
}

impl PostingsStore for PostingsFile {
    fn read_posting_list(&self, offset: u64) -> Result<Vec<DocId>, StoreError> {
        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(offset))?;
        let ids = bincode::deserialize_from(&mut *reader)?;
        Ok(ids)
    }
}

pub type DiskIndex = IndexHandle<DictionaryFile, PostingsFile>;

/// Loads the dictionary into memory and opens the postings file.
///
/// The metadata file is optional; when present its format version must match.
pub fn open_index(paths: &IndexPaths, skip: SkipDistance) -> Result<DiskIndex> {
    let dictionary = load_dictionary(paths)?;
    if paths.meta().exists() {
        let meta = load_meta(paths)?;
        anyhow::ensure!(
            meta.version == FORMAT_VERSION,
            "index format version {} is not supported (expected {FORMAT_VERSION})",
            meta.version
        );
        if meta.num_docs != dictionary.num_docs {
            tracing::warn!(meta = meta.num_docs, dictionary = dictionary.num_docs, "document counts disagree");
        }
        tracing::info!(version = meta.version, created_at = %meta.created_at, block_size = meta.block_size, "index metadata");
    } else {
        tracing::debug!(path = %paths.meta().display(), "no index metadata");
    }
    let postings = PostingsFile::open(&paths.postings)?;
    tracing::info!(
        terms = dictionary.terms.len(),
        num_docs = dictionary.num_docs,
        %skip,
        "index opened"
    );
    Ok(IndexHandle::new(dictionary, postings).with_skip_distance(skip))
}
