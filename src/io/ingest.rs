//! CSV ingest for wide-format market panels.
//!
//! Zillow-style research files carry one region per row:
//! - a `RegionName` column holding the ZIP code
//! - assorted metadata columns (`RegionID`, `SizeRank`, `StateName`, ...)
//! - one column per observation period, with an ISO date as the header
//!
//! The panel is treated as sparse: an empty cell is an absent observation,
//! not an error. Cells that are present but unusable are recorded in a
//! row-error side channel so a handful of bad values cannot sink a run.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::domain::{SegmentLabel, ValueRow};
use crate::error::AppError;

/// A cell or row that could not be used, with enough context to find it.
#[derive(Debug, Clone)]
pub struct RowError {
    /// 1-based line number in the CSV (header is line 1).
    pub line: usize,
    /// ZIP of the offending row, when it could be read.
    pub zip: Option<String>,
    pub message: String,
}

/// Outcome of ingesting one wide-format value file.
#[derive(Debug)]
pub struct IngestedValues {
    pub rows: Vec<ValueRow>,
    pub row_errors: Vec<RowError>,
    /// Region rows read from the file, excluding the header.
    pub rows_read: usize,
    /// Observation periods found in the header.
    pub periods: usize,
}

/// Outcome of ingesting a segment-label file (`zip,label`).
#[derive(Debug)]
pub struct IngestedLabels {
    pub labels: Vec<SegmentLabel>,
    pub row_errors: Vec<RowError>,
}

/// Load a wide-format value panel into long `ValueRow`s.
///
/// The region column is matched by name (`RegionName`, `zip`, `zip_code`,
/// `zipcode`); every header that parses as a date becomes a value column.
/// ZIPs are zero-padded to five digits, since region names lose their
/// leading zeros once a file has been through a spreadsheet.
pub fn read_value_rows(path: &Path) -> Result<IngestedValues, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let region_idx =
        find_column(&headers, &["regionname", "zip", "zip_code", "zipcode"]).ok_or_else(|| {
            AppError::new(
                2,
                format!(
                    "CSV '{}' has no region column (expected `RegionName` or `zip`).",
                    path.display()
                ),
            )
        })?;

    let date_columns = find_date_columns(&headers);
    if date_columns.is_empty() {
        return Err(AppError::new(
            2,
            format!("CSV '{}' has no date-named value columns.", path.display()),
        ));
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because records() starts after the 1-based header line.
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    zip: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        rows_read += 1;

        let zip = match get_nonempty(&record, region_idx) {
            Some(raw) => zero_pad_zip(raw),
            None => {
                row_errors.push(RowError {
                    line,
                    zip: None,
                    message: "Missing region value.".to_string(),
                });
                continue;
            }
        };

        for &(col, period) in &date_columns {
            let raw = match get_nonempty(&record, col) {
                Some(v) => v,
                None => continue,
            };
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => rows.push(ValueRow {
                    zip: zip.clone(),
                    period,
                    value: v,
                }),
                Ok(_) => row_errors.push(RowError {
                    line,
                    zip: Some(zip.clone()),
                    message: format!("Non-finite value in column `{period}`."),
                }),
                Err(_) => row_errors.push(RowError {
                    line,
                    zip: Some(zip.clone()),
                    message: format!("Invalid value '{raw}' in column `{period}`."),
                }),
            }
        }
    }

    if rows.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No usable values in '{}' ({rows_read} rows read, {} cell errors).",
                path.display(),
                row_errors.len()
            ),
        ));
    }

    Ok(IngestedValues {
        rows,
        row_errors,
        rows_read,
        periods: date_columns.len(),
    })
}

/// Load a `zip,label` file used to restrict a run to named segments.
pub fn read_labels(path: &Path) -> Result<IngestedLabels, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(2, format!("Failed to open labels CSV '{}': {e}", path.display()))
    })?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read labels CSV headers: {e}")))?
        .clone();

    let zip_idx = find_column(&headers, &["zip", "zip_code", "zipcode", "regionname"])
        .ok_or_else(|| AppError::new(2, "Labels CSV is missing a `zip` column."))?;
    let label_idx = find_column(&headers, &["label", "name", "neighborhood"])
        .ok_or_else(|| AppError::new(2, "Labels CSV is missing a `label` column."))?;

    let mut labels = Vec::new();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    zip: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let zip = match get_nonempty(&record, zip_idx) {
            Some(raw) => zero_pad_zip(raw),
            None => {
                row_errors.push(RowError {
                    line,
                    zip: None,
                    message: "Missing zip value.".to_string(),
                });
                continue;
            }
        };
        let label = match get_nonempty(&record, label_idx) {
            Some(l) => l.to_string(),
            None => {
                row_errors.push(RowError {
                    line,
                    zip: Some(zip),
                    message: "Missing label value.".to_string(),
                });
                continue;
            }
        };

        labels.push(SegmentLabel { zip, label });
    }

    if labels.is_empty() {
        return Err(AppError::new(
            3,
            format!("No usable labels in '{}'.", path.display()),
        ));
    }

    Ok(IngestedLabels { labels, row_errors })
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on
    // the first header. If we don't strip it, the region column goes missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&normalize_header_name(h).as_str()))
}

fn find_date_columns(headers: &StringRecord) -> Vec<(usize, NaiveDate)> {
    headers
        .iter()
        .enumerate()
        .filter_map(|(idx, h)| parse_period(&normalize_header_name(h)).map(|d| (idx, d)))
        .collect()
}

fn parse_period(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn get_nonempty<'a>(record: &'a StringRecord, idx: usize) -> Option<&'a str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn zero_pad_zip(raw: &str) -> String {
    format!("{raw:0>5}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn reads_wide_panel_and_pads_zips() {
        let f = write_temp(
            "RegionID,SizeRank,RegionName,StateName,2024-01-31,2024-02-29\n\
             91982,120,601,PR,150000,151000\n\
             84654,3,80302,CO,820000,\n",
        );
        let out = read_value_rows(f.path()).unwrap();
        assert_eq!(out.rows_read, 2);
        assert_eq!(out.periods, 2);
        assert!(out.row_errors.is_empty());
        // the empty cell for 80302 is an absent observation, not an error
        assert_eq!(out.rows.len(), 3);
        assert_eq!(out.rows[0].zip, "00601");
        assert_eq!(out.rows[2].zip, "80302");
        assert_eq!(out.rows[0].period, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!((out.rows[1].value - 151_000.0).abs() < 1e-9);
    }

    #[test]
    fn bad_cells_land_in_the_error_channel() {
        let f = write_temp(
            "RegionName,2024-01-31,2024-02-29\n\
             80302,abc,700000\n",
        );
        let out = read_value_rows(f.path()).unwrap();
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.row_errors.len(), 1);
        assert_eq!(out.row_errors[0].line, 2);
        assert_eq!(out.row_errors[0].zip.as_deref(), Some("80302"));
        assert!(out.row_errors[0].message.contains("abc"));
    }

    #[test]
    fn missing_region_column_is_an_input_error() {
        let f = write_temp("StateName,2024-01-31\nCO,100\n");
        let err = read_value_rows(f.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn file_without_date_columns_is_an_input_error() {
        let f = write_temp("RegionName,StateName\n80302,CO\n");
        let err = read_value_rows(f.path()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn all_cells_empty_is_a_data_error() {
        let f = write_temp("RegionName,2024-01-31\n80302,\n");
        let err = read_value_rows(f.path()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn header_bom_and_case_are_tolerated() {
        let f = write_temp("\u{feff}regionname,2024-01-31\n601,100000\n");
        let out = read_value_rows(f.path()).unwrap();
        assert_eq!(out.rows[0].zip, "00601");
    }

    #[test]
    fn labels_file_parses_and_pads() {
        let f = write_temp("zip,label\n80302,Downtown Boulder\n601,Adjuntas\n");
        let out = read_labels(f.path()).unwrap();
        assert_eq!(out.labels.len(), 2);
        assert_eq!(out.labels[0].zip, "80302");
        assert_eq!(out.labels[0].label, "Downtown Boulder");
        assert_eq!(out.labels[1].zip, "00601");
    }

    #[test]
    fn label_rows_missing_fields_are_recorded() {
        let f = write_temp("zip,label\n80302,\n80303,Gunbarrel\n");
        let out = read_labels(f.path()).unwrap();
        assert_eq!(out.labels.len(), 1);
        assert_eq!(out.labels[0].zip, "80303");
        assert_eq!(out.row_errors.len(), 1);
    }
}
