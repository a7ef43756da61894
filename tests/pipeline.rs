// End-to-end matching runs with a deterministic keyword embedder

use std::fs;
use std::path::Path;

use shelfmatch::config::Config;
use shelfmatch::core::{CatalogKind, Embedding};
use shelfmatch::index::MemoryIndex;
use shelfmatch::models::Embedder;
use shelfmatch::processing::pipeline;

const VOCABULARY: &[&str] = &["premium", "vodka", "dry", "gin", "lager", "whisky"];

const ALM_HEADER: &str =
    "ITEM_NUMBER|ITEM_DESCRIPTION|ITEM_BRAND|ITEM_SIZE|RETAIL_UNIT_LUC_PACK|CATEGORY|ALCOHOL_STRENGTH_PERC";
const DM_HEADER: &str = "STOCKCODE|PRODUCT_NAME|BRAND|PACKAGE_SIZE|PACK_FORMAT|CATEGORY|ALCOHOL_VOLUME|PRICE";

/// One dimension per vocabulary word, set when the word occurs
struct KeywordEmbedder {
    calls: usize,
    texts: usize,
}

impl KeywordEmbedder {
    fn new() -> Self {
        Self { calls: 0, texts: 0 }
    }
}

impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keywords"
    }

    fn dimension(&self) -> usize {
        VOCABULARY.len()
    }

    fn encode_batch(&mut self, texts: &[&str]) -> anyhow::Result<Vec<Embedding>> {
        self.calls += 1;
        self.texts += texts.len();
        Ok(texts
            .iter()
            .map(|text| {
                let words: Vec<&str> = text.split_whitespace().collect();
                let data = VOCABULARY
                    .iter()
                    .map(|v| if words.contains(v) { 1.0 } else { 0.0 })
                    .collect();
                Embedding::new(data)
            })
            .collect())
    }
}

fn lines(header: &str, rows: &[&str]) -> String {
    let mut text = format!("{}\n", header);
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

fn write_catalogs(dir: &Path, alm_rows: &[&str], dm_rows: &[&str]) -> Config {
    let alm = dir.join("alm.csv");
    let dm = dir.join("dm.csv");
    fs::write(&alm, lines(ALM_HEADER, alm_rows)).unwrap();
    fs::write(&dm, lines(DM_HEADER, dm_rows)).unwrap();

    Config {
        alm_path: alm,
        danmurphys_path: dm,
        output_dir: dir.join("matchings"),
        cache_dir: None,
        ..Config::default()
    }
}

fn read_results(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

#[test]
fn exact_description_match_yields_single_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_catalogs(
        dir.path(),
        &["1001|Premium Vodka 700ml Bottle|Smirnoff||1|Spirits|37.5", "1002|Dry Gin 1L|Tanqueray||6|Spirits|"],
        &[
            "D1|Premium Vodka 40% Bottle|Smirnoff|700ml|Bottle|Spirits||55.00",
            "D2|Lager 6 Pack|Crown|375ml|Pack|Beer||24.99",
            "D3|Whisky|Jameson|700ml|Bottle|Spirits||49.00",
        ],
    );

    let mut embedder = KeywordEmbedder::new();
    let mut index = MemoryIndex::new();
    let run = pipeline::run(&config, &mut embedder, &mut index).unwrap();

    assert_eq!(run.source, CatalogKind::Alm);
    assert_eq!(run.target, CatalogKind::DanMurphys);
    assert_eq!((run.source_count, run.target_count), (2, 3));
    assert_eq!(index.len("danmurphys_products"), Some(3));

    assert_eq!(run.matches.len(), 1);
    let record = &run.matches[0];
    assert_eq!(record.source.key, "1001");
    assert_eq!(record.target.key, "d1");
    assert!((record.score - 1.0).abs() < 1e-5);
    assert_eq!(record.target.field("PRICE"), "55.00");
    assert!(record.target.full_description.ends_with("spirits 40%"));

    let output = run.output.expect("results should be written");
    let (headers, rows) = read_results(&output);
    assert_eq!(headers.first().map(String::as_str), Some("ALM Product"));
    assert_eq!(headers.last().map(String::as_str), Some("Similarity Score"));
    assert_eq!(rows.len(), 1);

    let cell = |name: &str| &rows[0][headers.iter().position(|h| h == name).unwrap()];
    assert_eq!(cell("ALM Product"), "premium vodka");
    assert_eq!(cell("ALM Pack Size"), "700ml");
    assert_eq!(cell("ALM ID"), "1001");
    assert_eq!(cell("Dan Murphy's ID"), "d1");
    assert_eq!(cell("Dan Murphy's Price"), "55.00");
}

#[test]
fn empty_target_catalog_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_catalogs(dir.path(), &["1001|Premium Vodka 700ml Bottle|Smirnoff||1|Spirits|37.5"], &[]);

    let mut embedder = KeywordEmbedder::new();
    let mut index = MemoryIndex::new();
    let run = pipeline::run(&config, &mut embedder, &mut index).unwrap();

    assert_eq!(run.target_count, 0);
    assert!(run.matches.is_empty());

    let (headers, rows) = read_results(&run.output.unwrap());
    assert!(!headers.is_empty());
    assert!(rows.is_empty());
}

#[test]
fn unwritable_output_keeps_matches() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_catalogs(
        dir.path(),
        &["1001|Premium Vodka 700ml Bottle|Smirnoff||1|Spirits|37.5"],
        &["D1|Premium Vodka 40% Bottle|Smirnoff|700ml|Bottle|Spirits||55.00"],
    );
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "occupied").unwrap();
    config.output_dir = blocker.clone();

    let run = pipeline::run(&config, &mut KeywordEmbedder::new(), &mut MemoryIndex::new()).unwrap();

    assert!(run.output.is_none());
    assert_eq!(run.matches.len(), 1);
    assert_eq!(run.matches[0].target.key, "d1");
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "occupied");
}

#[test]
fn reverse_run_uses_danmurphys_as_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_catalogs(
        dir.path(),
        &["1001|Premium Vodka 700ml Bottle|Smirnoff||1|Spirits|37.5", "1002|Dry Gin 1L|Tanqueray||6|Spirits|"],
        &["D9|Dry Gin 37% Bottle|Tanqueray|700ml|Bottle|Spirits||60.00"],
    );
    config.source = CatalogKind::DanMurphys;

    let mut embedder = KeywordEmbedder::new();
    let mut index = MemoryIndex::new();
    let run = pipeline::run(&config, &mut embedder, &mut index).unwrap();

    assert_eq!(run.target, CatalogKind::Alm);
    assert_eq!(index.len("alm_products"), Some(2));
    assert_eq!(run.matches.len(), 1);
    assert_eq!(run.matches[0].source.key, "d9");
    assert_eq!(run.matches[0].target.key, "1002");

    let (headers, _) = read_results(&run.output.unwrap());
    assert_eq!(headers.first().map(String::as_str), Some("Dan Murphy's Product"));
}

#[test]
fn second_run_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_catalogs(
        dir.path(),
        &["1001|Premium Vodka 700ml Bottle|Smirnoff||1|Spirits|37.5"],
        &["D1|Premium Vodka 40% Bottle|Smirnoff|700ml|Bottle|Spirits||55.00"],
    );
    config.cache_dir = Some(dir.path().join("cache"));

    let mut first = KeywordEmbedder::new();
    let run = pipeline::run(&config, &mut first, &mut MemoryIndex::new()).unwrap();
    assert_eq!(first.texts, 2);
    assert_eq!(run.matches.len(), 1);

    let mut second = KeywordEmbedder::new();
    let again = pipeline::run(&config, &mut second, &mut MemoryIndex::new()).unwrap();
    assert_eq!(second.calls, 0);
    assert_eq!(again.matches.len(), 1);
    assert_eq!(again.matches[0].score, run.matches[0].score);
}

#[test]
fn missing_key_column_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_catalogs(dir.path(), &[], &["D1|Gin|Gordon's|700ml|Bottle|Spirits||40.00"]);
    fs::write(&config.alm_path, "ITEM_DESCRIPTION|ITEM_BRAND\nGin|Gordon's\n").unwrap();

    let result = pipeline::run(&config, &mut KeywordEmbedder::new(), &mut MemoryIndex::new());
    let err = result.err().expect("run should fail");
    assert!(format!("{:#}", err).contains("ITEM_NUMBER"));
}
