//! Dataset assembly: turn parsed value rows into aligned market segments.
//!
//! Responsibilities:
//!
//! - group home-value and rent rows by ZIP, sort each series by period
//! - infer the shared granularity (monthly vs annual) and reject mismatches
//! - align everything to the latest period present in both inputs
//! - record, rather than fail on, segments that cannot be aligned
//!
//! The original data source publishes values per ZIP per period; a ZIP can be
//! missing from either table or stale at the latest period. Those segments are
//! dropped into a side channel with a reason so coverage is reportable.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::types::{
    Granularity, MarketDataset, MarketSegment, SegmentLabel, SegmentSkip, SeriesPoint, ValueRow,
};
use crate::error::{EngineError, Result};

/// Build an aligned dataset from already-parsed home-value and rent rows.
///
/// Segment order follows first appearance in `home_rows`. Fails only for
/// whole-input problems (empty inputs, mixed granularity, no shared period);
/// per-segment gaps land in `MarketDataset::skipped`.
pub fn load_market_dataset(home_rows: &[ValueRow], rent_rows: &[ValueRow]) -> Result<MarketDataset> {
    if home_rows.is_empty() {
        return Err(EngineError::InsufficientData(
            "no home-value rows".to_string(),
        ));
    }
    if rent_rows.is_empty() {
        return Err(EngineError::InsufficientData("no rent rows".to_string()));
    }

    let home_gran = infer_granularity(home_rows);
    let rent_gran = infer_granularity(rent_rows);
    if home_gran != rent_gran {
        return Err(EngineError::InvalidInput(format!(
            "granularity mismatch: home values look {home_gran:?}, rents look {rent_gran:?}"
        )));
    }

    let asof = latest_common_period(home_rows, rent_rows).ok_or_else(|| {
        EngineError::InsufficientData(
            "home-value and rent inputs share no observation period".to_string(),
        )
    })?;

    let (home_order, mut home_series) = group_by_zip(home_rows);
    let (rent_order, mut rent_series) = group_by_zip(rent_rows);

    let mut segments = Vec::with_capacity(home_order.len());
    let mut skipped = Vec::new();

    for zip in home_order {
        let mut home_values = home_series.remove(&zip).unwrap_or_default();
        normalize_series(&mut home_values, asof);

        let Some(raw_rents) = rent_series.remove(&zip) else {
            skipped.push(SegmentSkip {
                zip,
                reason: "no rent series".to_string(),
            });
            continue;
        };
        let mut rents = raw_rents;
        normalize_series(&mut rents, asof);

        if home_values.last().map(|p| p.period) != Some(asof) {
            skipped.push(SegmentSkip {
                zip,
                reason: format!("no home value at {asof}"),
            });
            continue;
        }
        if rents.last().map(|p| p.period) != Some(asof) {
            skipped.push(SegmentSkip {
                zip,
                reason: format!("no rent at {asof}"),
            });
            continue;
        }

        segments.push(MarketSegment {
            zip,
            label: None,
            home_values,
            rents,
        });
    }

    // ZIPs that only ever appeared on the rent side.
    for zip in rent_order {
        if rent_series.remove(&zip).is_some() {
            skipped.push(SegmentSkip {
                zip,
                reason: "no home-value series".to_string(),
            });
        }
    }

    Ok(MarketDataset {
        segments,
        asof,
        granularity: home_gran,
        skipped,
    })
}

impl MarketDataset {
    /// Keep only the labelled segments, in label order, attaching the labels.
    ///
    /// The fitted rent model should still come from the full dataset; this is
    /// for narrowing the *projected* universe to a named local subset. Labels
    /// naming unknown ZIPs are recorded in the skip channel.
    pub fn restrict_to(&self, labels: &[SegmentLabel]) -> MarketDataset {
        let mut seen = std::collections::HashSet::new();
        let mut segments = Vec::new();
        let mut skipped = self.skipped.clone();
        for lab in labels {
            if !seen.insert(lab.zip.as_str()) {
                continue;
            }
            match self.segment(&lab.zip) {
                Some(seg) => {
                    let mut seg = seg.clone();
                    seg.label = Some(lab.label.clone());
                    segments.push(seg);
                }
                None => skipped.push(SegmentSkip {
                    zip: lab.zip.clone(),
                    reason: "not present in dataset".to_string(),
                }),
            }
        }
        MarketDataset {
            segments,
            asof: self.asof,
            granularity: self.granularity,
            skipped,
        }
    }
}

/// Group rows by ZIP preserving first-seen order.
fn group_by_zip(rows: &[ValueRow]) -> (Vec<String>, HashMap<String, Vec<SeriesPoint>>) {
    let mut order = Vec::new();
    let mut series: HashMap<String, Vec<SeriesPoint>> = HashMap::new();
    for row in rows {
        let points = series.entry(row.zip.clone()).or_insert_with(|| {
            order.push(row.zip.clone());
            Vec::new()
        });
        points.push(SeriesPoint {
            period: row.period,
            value: row.value,
        });
    }
    (order, series)
}

/// Sort ascending, truncate past `asof`, and collapse duplicate periods
/// keeping the last value reported for each.
fn normalize_series(points: &mut Vec<SeriesPoint>, asof: NaiveDate) {
    points.retain(|p| p.period <= asof);
    points.sort_by_key(|p| p.period);
    let mut out: Vec<SeriesPoint> = Vec::with_capacity(points.len());
    for p in points.drain(..) {
        match out.last_mut() {
            Some(last) if last.period == p.period => *last = p,
            _ => out.push(p),
        }
    }
    *points = out;
}

fn latest_common_period(home_rows: &[ValueRow], rent_rows: &[ValueRow]) -> Option<NaiveDate> {
    let rent_periods: std::collections::HashSet<NaiveDate> =
        rent_rows.iter().map(|r| r.period).collect();
    home_rows
        .iter()
        .map(|r| r.period)
        .filter(|p| rent_periods.contains(p))
        .max()
}

/// Median gap between distinct periods decides the spacing. A single-period
/// input has no gaps and is treated as monthly.
fn infer_granularity(rows: &[ValueRow]) -> Granularity {
    let mut periods: Vec<NaiveDate> = rows.iter().map(|r| r.period).collect();
    periods.sort_unstable();
    periods.dedup();
    let mut gaps: Vec<i64> = periods
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days())
        .collect();
    if gaps.is_empty() {
        return Granularity::Monthly;
    }
    gaps.sort_unstable();
    if gaps[gaps.len() / 2] > 45 {
        Granularity::Annual
    } else {
        Granularity::Monthly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn row(zip: &str, y: i32, m: u32, value: f64) -> ValueRow {
        ValueRow {
            zip: zip.to_string(),
            period: date(y, m),
            value,
        }
    }

    fn monthly_rows(zip: &str, start_month: u32, values: &[f64]) -> Vec<ValueRow> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| row(zip, 2024, start_month + i as u32, v))
            .collect()
    }

    #[test]
    fn aligns_to_latest_common_period() {
        let home = monthly_rows("80301", 1, &[290_000.0, 295_000.0, 300_000.0]);
        let rent = monthly_rows("80301", 1, &[1750.0, 1800.0]);
        let ds = load_market_dataset(&home, &rent).unwrap();
        assert_eq!(ds.asof, date(2024, 2));
        assert_eq!(ds.segments.len(), 1);
        let seg = &ds.segments[0];
        // The March home value is past the as-of period and must be dropped.
        assert_eq!(seg.home_values.len(), 2);
        assert!((seg.current_home_value().unwrap() - 295_000.0).abs() < 1e-9);
        assert!((seg.current_rent().unwrap() - 1800.0).abs() < 1e-9);
    }

    #[test]
    fn stale_segment_is_skipped_with_reason() {
        let mut home = monthly_rows("80301", 1, &[300_000.0, 305_000.0]);
        home.extend(monthly_rows("80302", 1, &[400_000.0])); // stale by February
        let mut rent = monthly_rows("80301", 1, &[1800.0, 1820.0]);
        rent.extend(monthly_rows("80302", 1, &[2100.0, 2150.0]));
        let ds = load_market_dataset(&home, &rent).unwrap();
        assert_eq!(ds.segments.len(), 1);
        assert_eq!(ds.segments[0].zip, "80301");
        assert_eq!(ds.skipped.len(), 1);
        assert_eq!(ds.skipped[0].zip, "80302");
        assert!(ds.skipped[0].reason.contains("no home value"));
    }

    #[test]
    fn rent_only_zip_is_recorded() {
        let home = monthly_rows("80301", 1, &[300_000.0]);
        let mut rent = monthly_rows("80301", 1, &[1800.0]);
        rent.extend(monthly_rows("99999", 1, &[900.0]));
        let ds = load_market_dataset(&home, &rent).unwrap();
        assert_eq!(ds.segments.len(), 1);
        assert!(
            ds.skipped
                .iter()
                .any(|s| s.zip == "99999" && s.reason.contains("no home-value series"))
        );
    }

    #[test]
    fn granularity_mismatch_is_rejected() {
        let home = monthly_rows("80301", 1, &[300_000.0, 301_000.0, 302_000.0]);
        let rent = vec![
            row("80301", 2022, 1, 1700.0),
            row("80301", 2023, 1, 1750.0),
            row("80301", 2024, 1, 1800.0),
        ];
        let err = load_market_dataset(&home, &rent).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn disjoint_periods_are_insufficient_data() {
        let home = monthly_rows("80301", 1, &[300_000.0, 301_000.0]);
        let rent = monthly_rows("80301", 5, &[1800.0, 1810.0]);
        let err = load_market_dataset(&home, &rent).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientData(_)));
    }

    #[test]
    fn duplicate_period_keeps_last_value() {
        let home = vec![
            row("80301", 2024, 1, 300_000.0),
            row("80301", 2024, 1, 310_000.0),
        ];
        let rent = monthly_rows("80301", 1, &[1800.0]);
        let ds = load_market_dataset(&home, &rent).unwrap();
        assert!((ds.segments[0].current_home_value().unwrap() - 310_000.0).abs() < 1e-9);
    }

    #[test]
    fn restrict_keeps_label_order_and_flags_unknown_zips() {
        let home = [
            monthly_rows("80301", 1, &[300_000.0]),
            monthly_rows("80302", 1, &[400_000.0]),
            monthly_rows("80303", 1, &[350_000.0]),
        ]
        .concat();
        let rent = [
            monthly_rows("80301", 1, &[1800.0]),
            monthly_rows("80302", 1, &[2100.0]),
            monthly_rows("80303", 1, &[1950.0]),
        ]
        .concat();
        let ds = load_market_dataset(&home, &rent).unwrap();

        let labels = vec![
            SegmentLabel {
                zip: "80303".to_string(),
                label: "South".to_string(),
            },
            SegmentLabel {
                zip: "80301".to_string(),
                label: "North".to_string(),
            },
            SegmentLabel {
                zip: "11111".to_string(),
                label: "Nowhere".to_string(),
            },
        ];
        let narrowed = ds.restrict_to(&labels);
        assert_eq!(narrowed.segments.len(), 2);
        assert_eq!(narrowed.segments[0].zip, "80303");
        assert_eq!(narrowed.segments[0].label.as_deref(), Some("South"));
        assert_eq!(narrowed.segments[1].zip, "80301");
        assert!(
            narrowed
                .skipped
                .iter()
                .any(|s| s.zip == "11111" && s.reason.contains("not present"))
        );
    }
}
