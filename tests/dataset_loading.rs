use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use wallet_forensics::config::DatasetPaths;
use wallet_forensics::{Address, Dataset, DatasetState};

fn addr(n: u8) -> String {
    format!("0x{:040x}", n)
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn record(grandparent: u8, parent: u8, child: u8) -> String {
    format!(
        r#"{{"grandparent": "{}", "parents": ["{}"], "children": {{"{}": ["{}"]}}}}"#,
        addr(grandparent),
        addr(parent),
        addr(parent),
        addr(child)
    )
}

fn paths(flagged: &NamedTempFile, origins: PathBuf) -> DatasetPaths {
    DatasetPaths {
        flagged: flagged.path().to_path_buf(),
        origins,
    }
}

#[test]
fn test_one_corrupt_entry_among_n() {
    // Third entry is missing a comma between its parents
    let broken = format!(
        r#"{{"grandparent": "{}", "parents": ["{}" "{}"], "children": {{}}}}"#,
        addr(30),
        addr(31),
        addr(32)
    );
    let text = format!(
        "[\n{},\n{},\n{},\n{}\n]",
        record(1, 2, 3),
        record(10, 11, 12),
        broken,
        record(20, 21, 22)
    );
    let file = write_temp(&text);

    let dataset = Dataset::load(&paths(&file, PathBuf::from("/nonexistent/origins.json"))).unwrap();
    assert_eq!(dataset.record_count(), 3);
    assert!(dataset.is_flagged(&Address::parse(&addr(21)).unwrap()));
    assert!(!dataset.is_flagged(&Address::parse(&addr(30)).unwrap()));
}

#[test]
fn test_trailing_commas_and_one_corrupt_entry() {
    // Every entry carries a trailing comma; the second also misses a comma
    let broken = format!(
        r#"{{"grandparent": "{}", "parents": ["{}" "{}"],}}"#,
        addr(30),
        addr(31),
        addr(32)
    );
    let text = format!(
        "[\n{},\n{},\n{},\n]",
        record(1, 2, 3).replace("}}", "},}"),
        broken,
        record(20, 21, 22).replace("}}", "},}")
    );
    let file = write_temp(&text);

    let state = DatasetState::from_path(file.path());
    let dataset = state.ready().unwrap();
    assert_eq!(dataset.record_count(), 2);
    assert!(dataset.is_flagged(&Address::parse(&addr(3)).unwrap()));
    assert!(dataset.is_flagged(&Address::parse(&addr(22)).unwrap()));
}

#[test]
fn test_wrongly_typed_entry_is_skipped() {
    let text = format!(
        "[{}, {{\"grandparent\": 42}}, {}]",
        record(1, 2, 3),
        record(10, 11, 12)
    );
    let dataset = Dataset::from_json(&text, None).unwrap();
    assert_eq!(dataset.record_count(), 2);
}

#[test]
fn test_trailing_commas_are_repaired() {
    let text = format!("[\n{},\n{},\n]", record(1, 2, 3), record(10, 11, 12));
    let file = write_temp(&text);

    let state = DatasetState::from_path(file.path());
    let dataset = state.ready().unwrap();
    assert_eq!(dataset.record_count(), 2);
}

#[test]
fn test_missing_flagged_file_is_unavailable() {
    let state = DatasetState::from_path(std::path::Path::new("/nonexistent/flagged.json"));
    assert!(!state.is_ready());
    assert!(state.ready().is_err());
}

#[test]
fn test_empty_array_is_a_valid_empty_dataset() {
    let file = write_temp("[]");
    let state = DatasetState::from_path(file.path());
    assert_eq!(state.ready().unwrap().record_count(), 0);
}

#[test]
fn test_entirely_unusable_file_is_unavailable() {
    let file = write_temp("this is not json at all");
    assert!(!DatasetState::from_path(file.path()).is_ready());
}

#[test]
fn test_origins_are_loaded_alongside() {
    let flagged = write_temp(&format!("[{}]", record(1, 2, 3)));
    let origins = write_temp(&format!(
        r#"[{{"address": "{}", "name": "Binance 14", "type": "exchange"}}, {{"address": "bogus"}}]"#,
        addr(0xe)
    ));

    let dataset = Dataset::load(&paths(&flagged, origins.path().to_path_buf())).unwrap();
    assert_eq!(dataset.origin_count(), 1);

    let origin = dataset
        .find_known_origin(&Address::parse(&addr(0xe)).unwrap())
        .unwrap();
    assert_eq!(origin.name, "Binance 14");
    assert_eq!(origin.kind, "exchange");
}
