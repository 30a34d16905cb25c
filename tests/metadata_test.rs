//! Tests for metadata loading and date handling

use std::path::PathBuf;

use rstest::rstest;
use tempfile::TempDir;

use chronotree::errors::TreeError;
use chronotree::metadata::{broad_region, DateParser, SampleTable};

fn create_table_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write metadata file");
    path
}

#[test]
fn given_tab_separated_table_when_loading_then_rows_parsed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_table_file(
        &temp,
        "meta.tsv",
        "strain\tdate\tRegion\nS1\t2023-05-10\tNE_East\nS2\t2021-XX-XX\tWest\n",
    );

    // Act
    let table = SampleTable::load(&path).unwrap();

    // Assert
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].strain, "S1");
    assert_eq!(table.rows()[0].region.as_deref(), Some("NE_East"));
}

#[test]
fn given_table_without_region_column_when_loading_then_rows_parsed() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_table_file(&temp, "meta.tsv", "strain\tdate\nS1\t2023-05-10\n");

    // Act
    let table = SampleTable::load(&path).unwrap();

    // Assert
    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0].region, None);
}

#[test]
fn given_table_missing_date_column_when_loading_then_errors() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_table_file(&temp, "meta.tsv", "strain\tRegion\nS1\tWest\n");

    // Act
    let result = SampleTable::load(&path);

    // Assert
    match result {
        Err(TreeError::MissingColumn { column, .. }) => assert_eq!(column, "date"),
        other => panic!("expected MissingColumn, got {:?}", other.err()),
    }
}

#[test]
fn given_missing_file_when_loading_then_errors() {
    // Arrange
    let path = PathBuf::from("/nonexistent/meta.tsv");

    // Act
    let result = SampleTable::load(&path);

    // Assert
    assert!(matches!(result, Err(TreeError::FileNotFound(_))));
}

#[test]
fn given_loaded_table_when_building_time_lookup_then_unparseable_dates_are_none() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = create_table_file(
        &temp,
        "meta.tsv",
        "strain\tdate\nS1\t2023-01-01\nS2\tnot-a-date\nS3\t\n",
    );
    let table = SampleTable::load(&path).unwrap();

    // Act
    let lookup = table.time_lookup();

    // Assert
    assert_eq!(lookup.len(), 3);
    assert_eq!(lookup.get("S1"), Some(2023.0));
    assert_eq!(lookup.get("S2"), None);
    assert_eq!(lookup.get("S3"), None);
    assert_eq!(lookup.get("missing"), None);
}

#[rstest]
#[case("2023-01-01", 2023.0)]
#[case("2023-07-02", 2023.0 + 182.0 / 365.0)]
#[case("2023-XX-XX", 2023.0 + 165.0 / 365.0)]
#[case("2023-06-XX", 2023.0 + 165.0 / 365.0)]
#[case("2024-02-29", 2024.0 + 59.0 / 366.0)]
#[case("2023", 2023.0)]
#[case("2023-05", 2023.0)]
#[case("2023-13-01", 2023.0)]
fn given_date_string_when_converting_then_decimal_year_matches(
    #[case] date: &str,
    #[case] expected: f64,
) {
    // Arrange
    let parser = DateParser::new();

    // Act
    let value = parser.to_decimal_year(date).unwrap();

    // Assert
    assert!(
        (value - expected).abs() < 1e-9,
        "{}: {} != {}",
        date,
        value,
        expected
    );
}

#[rstest]
#[case("garbage")]
#[case("")]
#[case("XX-XX-XX")]
fn given_undateable_string_when_converting_then_none(#[case] date: &str) {
    // Arrange
    let parser = DateParser::new();

    // Act & Assert
    assert_eq!(parser.to_decimal_year(date), None);
}

#[test]
fn given_date_string_when_extracting_year_then_leading_digits_win() {
    // Arrange
    let parser = DateParser::new();

    // Act & Assert
    assert_eq!(parser.extract_year("2023-05-10"), Some(2023));
    assert_eq!(parser.extract_year("1999"), Some(1999));
    assert_eq!(parser.extract_year("May 2023"), None);
}

#[test]
fn given_regions_when_grouping_then_broad_regions_match() {
    // Arrange & Act & Assert
    assert_eq!(broad_region(Some("NE_Central")), "Midwest");
    assert_eq!(broad_region(Some("Northeast")), "Northeast");
    assert_eq!(broad_region(Some("South")), "South");
    assert_eq!(broad_region(Some("Unknownia")), "Other");
    assert_eq!(broad_region(None), "Other");
}
