use anyhow::Result;
use boolsearch_core::SkipDistance;
use clap::Parser;
use search::{run, SearchConfig};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "Evaluate Boolean queries against an inverted index", long_about = None)]
struct Args {
    /// Dictionary file written by the indexer
    #[arg(short = 'd', long)]
    dictionary: PathBuf,
    /// Postings file written by the indexer
    #[arg(short = 'p', long)]
    postings: PathBuf,
    /// File with one query per line
    #[arg(short = 'q', long)]
    queries: PathBuf,
    /// Results file, one line per query
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Skip link spacing: sqrt, none, or a fixed distance
    #[arg(long, default_value_t = SkipDistance::Sqrt)]
    skip: SkipDistance,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();
    let config = SearchConfig {
        dictionary: args.dictionary,
        postings: args.postings,
        queries: args.queries,
        output: args.output,
        skip: args.skip,
    };
    let summary = run(&config)?;
    tracing::info!(output = %config.output.display(), queries = summary.queries, "results written");
    Ok(())
}
