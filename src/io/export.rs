//! Export projection results to CSV and fitted rent models to JSON.
//!
//! The CSV export is meant to be easy to consume in spreadsheets or
//! downstream scripts: one row per segment, full return decomposition.
//!
//! Model JSON is the portable representation of a fitted rent model:
//! the regression parameters plus enough run metadata to interpret them
//! (as-of period, series granularity).

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Granularity, ProjectionRow};
use crate::error::AppError;
use crate::rent::RentModel;

/// On-disk envelope for a fitted rent model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    pub tool: String,
    /// As-of period of the dataset the model was fit on.
    pub asof: NaiveDate,
    pub granularity: Granularity,
    pub model: RentModel,
}

/// Write per-segment projection results to a CSV file.
pub fn write_results_csv(path: &Path, asof: NaiveDate, rows: &[ProjectionRow]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    // Header
    writeln!(
        file,
        "zip,label,asof,home_value,monthly_rent,cash_invested,loan_amount,monthly_payment,\
         effective_rent,operating_costs,monthly_cash_flow,annual_cash_flow,cash_on_cash,\
         tax_shield_annual,principal_paydown_year1,first_year_roi,appreciation_gain,\
         cumulative_cash_flow,cumulative_tax_shield,cumulative_paydown,total_return,total_return_pct"
    )
    .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for row in rows {
        let r = &row.result;
        writeln!(
            file,
            "{},{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.6},{:.2},{:.2},{:.6},{:.2},{:.2},{:.2},{:.2},{:.2},{:.6}",
            row.zip,
            csv_field(row.label.as_deref().unwrap_or("")),
            asof,
            row.home_value,
            row.rent,
            r.cash_invested,
            r.loan_amount,
            r.monthly_payment,
            r.effective_rent,
            r.operating_costs,
            r.monthly_cash_flow,
            r.annual_cash_flow,
            r.cash_on_cash,
            r.tax_shield_annual,
            r.principal_paydown_year1,
            r.first_year_roi,
            r.appreciation_gain,
            r.cumulative_cash_flow,
            r.cumulative_tax_shield,
            r.cumulative_paydown,
            r.total_return,
            r.total_return_pct,
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

/// Write a rent-model JSON file.
pub fn write_model_json(
    path: &Path,
    model: &RentModel,
    asof: NaiveDate,
    granularity: Granularity,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create model JSON '{}': {e}", path.display())))?;

    let envelope = ModelFile {
        tool: "roi".to_string(),
        asof,
        granularity,
        model: model.clone(),
    };

    serde_json::to_writer_pretty(file, &envelope)
        .map_err(|e| AppError::new(2, format!("Failed to write model JSON: {e}")))?;

    Ok(())
}

/// Read a rent-model JSON file.
pub fn read_model_json(path: &Path) -> Result<ModelFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open model JSON '{}': {e}", path.display())))?;
    let envelope: ModelFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid model JSON: {e}")))?;
    Ok(envelope)
}

/// Labels are free text and may contain commas; quote only when needed.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Assumptions;
    use crate::finance::evaluate;

    fn sample_rows() -> Vec<ProjectionRow> {
        let assumptions = Assumptions::default();
        vec![
            ProjectionRow {
                zip: "80302".to_string(),
                label: None,
                home_value: 300_000.0,
                rent: 1_800.0,
                result: evaluate(300_000.0, 1_800.0, &assumptions).unwrap(),
            },
            ProjectionRow {
                zip: "80205".to_string(),
                label: Some("Five Points, Denver".to_string()),
                home_value: 450_000.0,
                rent: 2_400.0,
                result: evaluate(450_000.0, 2_400.0, &assumptions).unwrap(),
            },
        ]
    }

    #[test]
    fn results_csv_has_one_line_per_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        let asof = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();

        write_results_csv(&path, asof, &sample_rows()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("zip,label,asof,home_value,monthly_rent"));
        assert!(lines[1].starts_with("80302,,2025-06-30,300000.00,1800.00"));
        // a label containing a comma must be quoted
        assert!(lines[2].contains("\"Five Points, Denver\""));
    }

    #[test]
    fn model_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let asof = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        let model = RentModel {
            slope: 0.62,
            intercept: -0.4,
            r_squared: 0.91,
            n_samples: 48,
        };

        write_model_json(&path, &model, asof, Granularity::Monthly).unwrap();
        let loaded = read_model_json(&path).unwrap();

        assert_eq!(loaded.tool, "roi");
        assert_eq!(loaded.asof, asof);
        assert_eq!(loaded.granularity, Granularity::Monthly);
        assert!((loaded.model.slope - 0.62).abs() < 1e-12);
        assert!((loaded.model.intercept + 0.4).abs() < 1e-12);
        assert_eq!(loaded.model.n_samples, 48);
    }

    #[test]
    fn reading_missing_model_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_model_json(&dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
