use anyhow::{Context, Result};
use boolsearch_core::persist::{open_index, IndexPaths};
use boolsearch_core::{evaluate, Dictionary, IndexHandle, Normalizer, PostingsStore, QueryError, SkipDistance, StemmingNormalizer};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Everything a batch run needs to know.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub dictionary: PathBuf,
    pub postings: PathBuf,
    pub queries: PathBuf,
    pub output: PathBuf,
    pub skip: SkipDistance,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub queries: usize,
    pub failed: usize,
    pub empty: usize,
}

/// Evaluates every line of `queries` and writes one result line per query.
///
/// A failed query produces an empty line and is logged; the batch carries on.
pub fn run_batch<D, S, N, R, W>(index: &IndexHandle<D, S>, normalizer: &N, mut queries: R, mut results: W) -> Result<BatchSummary>
where
    D: Dictionary,
    S: PostingsStore,
    N: Normalizer + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut summary = BatchSummary::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if queries.read_until(b'\n', &mut buf).context("reading queries")? == 0 {
            break;
        }
        summary.queries += 1;
        let line_no = summary.queries;
        let rendered = match std::str::from_utf8(trim_line_ending(&buf)) {
            Ok(line) => match evaluate(index, normalizer, line) {
                Ok(list) => {
                    if list.is_empty() { summary.empty += 1; }
                    list.to_string()
                }
                Err(err) => {
                    summary.failed += 1;
                    report_failure(line_no, line, &err);
                    String::new()
                }
            },
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(line = line_no, error = %err, "skipping query that is not valid UTF-8");
                String::new()
            }
        };
        writeln!(results, "{rendered}").context("writing results")?;
    }
    results.flush()?;
    tracing::info!(
        queries = summary.queries,
        failed = summary.failed,
        empty = summary.empty,
        skip = %index.skip_distance(),
        "batch complete"
    );
    Ok(summary)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn report_failure(line: usize, query: &str, err: &QueryError) {
    let query = query.trim();
    match err {
        QueryError::Malformed { token_index, .. } => {
            tracing::warn!(line, query, ?token_index, error = %err, "skipping malformed query")
        }
        QueryError::StoreRead { .. } => tracing::error!(line, query, error = %err, "postings store read failed"),
    }
}

/// Opens the index described by `config` and runs the whole query file.
pub fn run(config: &SearchConfig) -> Result<BatchSummary> {
    let paths = IndexPaths::new(&config.dictionary, &config.postings);
    let index = open_index(&paths, config.skip)?;
    let queries = File::open(&config.queries)
        .with_context(|| format!("opening queries {}", config.queries.display()))?;
    let results = File::create(&config.output)
        .with_context(|| format!("creating results {}", config.output.display()))?;
    run_batch(&index, &StemmingNormalizer, BufReader::new(queries), BufWriter::new(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use boolsearch_core::{DocId, IdentityNormalizer, MemoryIndex, StoreError};

    fn pets() -> MemoryIndex {
        MemoryIndex::from_postings([("cat", vec![1, 3, 5]), ("dog", vec![2, 3, 4])]).unwrap()
    }

    fn batch(input: impl AsRef<[u8]>) -> (String, BatchSummary) {
        let index = pets();
        let mut out = Vec::new();
        let summary = run_batch(&index.handle(), &IdentityNormalizer, input.as_ref(), &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn one_line_per_query_in_order() {
        let (out, summary) = batch("cat AND dog\ncat OR dog\nNOT cat\n");
        assert_eq!(out, "3\n1 2 3 4 5\n2 4\n");
        assert_eq!(summary, BatchSummary { queries: 3, failed: 0, empty: 0 });
    }

    #[test]
    fn failed_lines_do_not_stop_the_batch() {
        let (out, summary) = batch("( cat AND dog\ncat AND NOT dog\nzebra\n\n");
        assert_eq!(out, "\n1 5\n\n\n");
        assert_eq!(summary.queries, 4);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.empty, 2);
    }

    #[test]
    fn crlf_and_missing_final_newline() {
        let (out, summary) = batch("cat AND dog\r\ncat OR dog");
        assert_eq!(out, "3\n1 2 3 4 5\n");
        assert_eq!(summary.queries, 2);
    }

    #[test]
    fn invalid_utf8_fails_only_its_line() {
        let (out, summary) = batch(&b"cat AND dog\ncaf\xff AND cat\ncat OR dog\n"[..]);
        assert_eq!(out, "3\n\n1 2 3 4 5\n");
        assert_eq!(summary, BatchSummary { queries: 3, failed: 1, empty: 0 });
    }

    /// Fails every read at one offset and defers the rest to `inner`.
    struct BrokenAt<'a> {
        inner: &'a MemoryIndex,
        offset: u64,
    }

    impl PostingsStore for BrokenAt<'_> {
        fn read_posting_list(&self, offset: u64) -> Result<Vec<DocId>, StoreError> {
            if offset == self.offset {
                return Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated")));
            }
            self.inner.read_posting_list(offset)
        }
    }

    #[test]
    fn store_read_failure_fails_only_its_line() {
        let index = pets();
        let dog = index.lookup(index.term_id("dog").unwrap()).unwrap();
        let handle = IndexHandle::new(&index, BrokenAt { inner: &index, offset: dog.offset });
        let mut out = Vec::new();
        let summary = run_batch(
            &handle,
            &IdentityNormalizer,
            "cat OR fish\ndog AND cat\ncat\nNOT cat\ncat AND NOT dog\n".as_bytes(),
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 3 5\n\n1 3 5\n2 4\n\n");
        assert_eq!(summary, BatchSummary { queries: 5, failed: 2, empty: 0 });
    }
}
