use anyhow::{Context, Result};
use boolsearch_core::persist::{save_dictionary, save_meta, IndexPaths, MetaFile, FORMAT_VERSION};
use boolsearch_core::spimi::SpimiBuilder;
use boolsearch_core::tokenizer::tokenize;
use boolsearch_core::DocId;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};
use walkdir::WalkDir;

use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build a Boolean retrieval index with skip-pointer postings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of documents named by numeric id
    Build {
        /// Input directory
        #[arg(short = 'i', long)]
        input: PathBuf,
        /// Output dictionary file
        #[arg(short = 'd', long)]
        dictionary: PathBuf,
        /// Output postings file
        #[arg(short = 'p', long)]
        postings: PathBuf,
        /// Documents per in-memory block before spilling to disk
        #[arg(long, default_value_t = 1000)]
        block_size: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, dictionary, postings, block_size } => {
            build_index(&input, &IndexPaths::new(dictionary, postings), block_size)
        }
    }
}

fn build_index(input: &Path, paths: &IndexPaths, block_size: usize) -> Result<()> {
    let files = collect_documents(input)?;
    tracing::info!(documents = files.len(), input = %input.display(), "collected documents");

    let work_dir = paths.postings.with_extension("blocks");
    let mut builder = SpimiBuilder::new(&work_dir, block_size)?;
    for (doc_id, path) in files {
        let text = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let text = String::from_utf8_lossy(&text);
        builder.add_document(doc_id, tokenize(&text).into_iter().map(|(term, _pos)| term))?;
    }
    let num_docs = builder.num_docs() as u32;

    let dict = builder.finish(&paths.postings)?;
    remove_work_dir(&work_dir);
    save_dictionary(paths, &dict)?;

    let meta = MetaFile {
        num_docs,
        num_terms: dict.terms.len() as u32,
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        version: FORMAT_VERSION,
        block_size,
    };
    save_meta(paths, &meta)?;

    tracing::info!(num_docs, num_terms = meta.num_terms, dictionary = %paths.dictionary.display(), "index build complete");
    Ok(())
}

/// Removes the emptied block directory, warning when it cannot.
fn remove_work_dir(work_dir: &Path) -> bool {
    match fs::remove_dir(work_dir) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(path = %work_dir.display(), error = %err, "could not remove block directory");
            false
        }
    }
}

/// Files directly under `input` whose names parse as doc ids, in ascending id order.
fn collect_documents(input: &Path) -> Result<Vec<(DocId, PathBuf)>> {
    anyhow::ensure!(input.is_dir(), "input {} is not a directory", input.display());
    let mut files = Vec::new();
    for entry in WalkDir::new(input).min_depth(1).max_depth(1).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if !p.is_file() { continue; }
        match p.file_name().and_then(|s| s.to_str()).and_then(|s| s.parse::<DocId>().ok()) {
            Some(doc_id) => files.push((doc_id, p.to_path_buf())),
            None => tracing::warn!(path = %p.display(), "skipping file without a numeric name"),
        }
    }
    files.sort_by_key(|(doc_id, _)| *doc_id);
    Ok(files)
}
