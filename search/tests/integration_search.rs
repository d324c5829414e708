use boolsearch_core::persist::{save_dictionary, IndexPaths};
use boolsearch_core::spimi::SpimiBuilder;
use boolsearch_core::tokenizer::tokenize;
use boolsearch_core::SkipDistance;
use search::{run, SearchConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn build_tiny_index(dir: &Path) -> IndexPaths {
    let paths = IndexPaths::in_dir(dir.join("index"));
    let docs = [
        (1, "Cats chase mice around the barn."),
        (3, "A cat and a dog share the porch."),
        (5, "The cat sleeps all day."),
        (2, "Dogs bark at the mail carrier."),
        (4, "A dog fetched the ball."),
    ];
    let mut sorted = docs.to_vec();
    sorted.sort_by_key(|(id, _)| *id);

    let mut builder = SpimiBuilder::new(dir.join("blocks"), 2).unwrap();
    for (doc_id, text) in sorted {
        builder.add_document(doc_id, tokenize(text).into_iter().map(|(term, _)| term)).unwrap();
    }
    let dict = builder.finish(&paths.postings).unwrap();
    save_dictionary(&paths, &dict).unwrap();
    paths
}

fn search(dir: &Path, paths: &IndexPaths, queries: &str) -> Vec<String> {
    let queries_path = dir.join("queries.txt");
    let output = dir.join("results.txt");
    fs::write(&queries_path, queries).unwrap();
    let config = SearchConfig {
        dictionary: paths.dictionary.clone(),
        postings: paths.postings.clone(),
        queries: queries_path,
        output: output.clone(),
        skip: SkipDistance::Sqrt,
    };
    run(&config).unwrap();
    fs::read_to_string(output).unwrap().lines().map(str::to_string).collect()
}

#[test]
fn batch_over_disk_index() {
    let dir = tempdir().unwrap();
    let paths = build_tiny_index(dir.path());
    let results = search(
        dir.path(),
        &paths,
        "cat AND dog\ncats OR dogs\nCat AND NOT dog\nNOT cat\nzzzznotaterm AND cat\n(cat OR dog) AND NOT (barn OR ball)\n",
    );
    assert_eq!(results, vec!["3", "1 2 3 4 5", "1 5", "2 4", "", "2 3 5"]);
}

#[test]
fn malformed_line_is_isolated() {
    let dir = tempdir().unwrap();
    let paths = build_tiny_index(dir.path());
    let results = search(dir.path(), &paths, "( cat AND dog\ncat AND dog\n");
    assert_eq!(results, vec!["", "3"]);
}

#[test]
fn missing_index_is_fatal() {
    let dir = tempdir().unwrap();
    let config = SearchConfig {
        dictionary: dir.path().join("nope.bin"),
        postings: dir.path().join("nope-postings.bin"),
        queries: dir.path().join("queries.txt"),
        output: dir.path().join("out.txt"),
        skip: SkipDistance::None,
    };
    let err = run(&config).unwrap_err();
    assert!(format!("{err:#}").contains("opening dictionary"));
}

#[test]
fn truncated_postings_fail_only_affected_lines() {
    let dir = tempdir().unwrap();
    let paths = build_tiny_index(dir.path());
    // the all-documents list is written last; cut into it
    let file = fs::OpenOptions::new().write(true).open(&paths.postings).unwrap();
    let len = file.metadata().unwrap().len();
    file.set_len(len - 4).unwrap();
    drop(file);

    let results = search(dir.path(), &paths, "cat AND dog\nNOT cat\ncat OR dog\ncat AND NOT dog\n");
    assert_eq!(results, vec!["3", "", "1 2 3 4 5", "1 5"]);
}
