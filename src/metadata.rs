//! Sample metadata: TSV loading, date parsing, and region grouping.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::errors::{TreeError, TreeResult};

/// One row of the sample metadata table.
#[derive(Debug, Clone, Deserialize)]
pub struct SampleRecord {
    pub strain: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "Region", default)]
    pub region: Option<String>,
}

/// In-memory sample metadata table, keyed by strain identifier.
#[derive(Debug, Default)]
pub struct SampleTable {
    rows: Vec<SampleRecord>,
}

impl SampleTable {
    /// Load a tab-separated table with at least `strain` and `date`
    /// columns; `Region` is optional.
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> TreeResult<Self> {
        if !path.exists() {
            return Err(TreeError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        for required in ["strain", "date"] {
            if !headers.iter().any(|h| h == required) {
                return Err(TreeError::MissingColumn {
                    path: path.to_path_buf(),
                    column: required.to_string(),
                });
            }
        }

        let mut rows = Vec::new();
        for result in reader.deserialize() {
            let record: SampleRecord = result?;
            rows.push(record);
        }
        debug!("loaded {} metadata rows from {}", rows.len(), path.display());
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<SampleRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SampleRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// strain -> decimal year. Rows whose date cannot be parsed map to
    /// `None`; duplicate strains keep the last row, like a dict build.
    #[instrument(level = "debug", skip(self))]
    pub fn time_lookup(&self) -> TimeLookup {
        let parser = DateParser::new();
        self.rows
            .iter()
            .map(|row| {
                (
                    row.strain.clone(),
                    row.date.as_deref().and_then(|d| parser.to_decimal_year(d)),
                )
            })
            .collect()
    }

    /// strain -> region column, verbatim.
    #[instrument(level = "debug", skip(self))]
    pub fn region_lookup(&self) -> HashMap<String, Option<String>> {
        self.rows
            .iter()
            .map(|row| (row.strain.clone(), row.region.clone()))
            .collect()
    }

    /// Row counts per broad region, over the whole table.
    #[instrument(level = "debug", skip(self))]
    pub fn broad_region_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            let broad = broad_region(row.region.as_deref()).to_string();
            *counts.entry(broad).or_insert(0) += 1;
        }
        counts
    }
}

/// Sample identifier to decimal-year mapping.
///
/// A strain present with an unparseable date and a strain absent from the
/// table resolve identically: no time.
#[derive(Debug, Default, Clone)]
pub struct TimeLookup {
    map: HashMap<String, Option<f64>>,
}

impl TimeLookup {
    pub fn get(&self, strain: &str) -> Option<f64> {
        self.map.get(strain).copied().flatten()
    }

    pub fn insert(&mut self, strain: impl Into<String>, year: Option<f64>) {
        self.map.insert(strain.into(), year);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl FromIterator<(String, Option<f64>)> for TimeLookup {
    fn from_iter<T: IntoIterator<Item = (String, Option<f64>)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

/// Parses collection dates into calendar years.
///
/// Accepts `YYYY-MM-DD` with `XX` placeholders for unknown month or day
/// (`2023-XX-XX`), falling back to the leading year alone.
pub struct DateParser {
    year_re: Regex,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DateParser {
    pub fn new() -> Self {
        Self {
            year_re: Regex::new(r"^(\d{4})").unwrap(),
        }
    }

    /// Leading four-digit year, if any.
    pub fn extract_year(&self, date: &str) -> Option<i32> {
        self.year_re
            .captures(date.trim())
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Convert a date string to a fractional calendar year.
    ///
    /// Unknown month defaults to June, unknown day to the 15th: the
    /// midpoint convention for partially known collection dates.
    pub fn to_decimal_year(&self, date: &str) -> Option<f64> {
        self.parse_full_date(date)
            .or_else(|| self.extract_year(date).map(f64::from))
    }

    fn parse_full_date(&self, date: &str) -> Option<f64> {
        let parts: Vec<&str> = date.trim().split('-').collect();
        let year: i32 = parts.first()?.parse().ok()?;
        if parts.len() < 3 {
            return Some(f64::from(year));
        }

        let month: u32 = if parts[1] == "XX" {
            6
        } else {
            parts[1].parse().ok()?
        };
        let day: u32 = if parts[2] == "XX" {
            15
        } else {
            parts[2].parse().ok()?
        };

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let year_start = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let year_end = NaiveDate::from_ymd_opt(year + 1, 1, 1)?;

        let elapsed = (date - year_start).num_days() as f64;
        let span = (year_end - year_start).num_days() as f64;
        Some(f64::from(year) + elapsed / span)
    }
}

/// Collapse fine-grained regions into broad reporting regions.
///
/// Nebraska sub-regions (`NE_*`) count as Midwest.
pub fn broad_region(region: Option<&str>) -> &'static str {
    match region {
        None => "Other",
        Some(r) if r.starts_with("NE_") => "Midwest",
        Some("Northeast") => "Northeast",
        Some("West") => "West",
        Some("Midwest") => "Midwest",
        Some("South") => "South",
        Some(_) => "Other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_lookup_flattens_unparseable_dates() {
        let table = SampleTable::from_rows(vec![
            SampleRecord {
                strain: "S1".into(),
                date: Some("2021-07-01".into()),
                region: None,
            },
            SampleRecord {
                strain: "S2".into(),
                date: Some("unknown".into()),
                region: None,
            },
            SampleRecord {
                strain: "S3".into(),
                date: None,
                region: None,
            },
        ]);

        let lookup = table.time_lookup();
        assert!(lookup.get("S1").is_some());
        assert_eq!(lookup.get("S2"), None);
        assert_eq!(lookup.get("S3"), None);
        assert_eq!(lookup.get("S4"), None);
        assert_eq!(lookup.len(), 3);
    }

    #[test]
    fn test_broad_region_groups_nebraska_as_midwest() {
        assert_eq!(broad_region(Some("NE_Central")), "Midwest");
        assert_eq!(broad_region(Some("NE_West")), "Midwest");
        assert_eq!(broad_region(Some("Midwest")), "Midwest");
        assert_eq!(broad_region(Some("Northeast")), "Northeast");
        assert_eq!(broad_region(Some("Pacific")), "Other");
        assert_eq!(broad_region(None), "Other");
    }
}
