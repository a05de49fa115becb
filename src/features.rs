/// Feature engineering: calendar, rolling-window, and interaction features.
///
/// Every derived value is computed for every row (rolling features need the
/// history, and the model input is always the last row of an engineered
/// table). Windows are trailing and clamped at the table start: with fewer
/// than N prior rows the sum/mean covers whatever exists. Nothing at row i
/// ever reads a row past i.
///
/// Discharge-derived features follow the missing-data rule of the raw
/// series: a window with at least one present reading sums the present
/// ones, an all-absent window (and any interaction touching an absent
/// reading) stays missing.

use chrono::Datelike;

use crate::model::{FeatureError, Observation, ObservationTable};

/// Returns an augmented copy of the table; the input is left untouched.
pub fn engineer_features(table: &ObservationTable) -> Result<ObservationTable, FeatureError> {
    if table.is_empty() {
        return Err(FeatureError::EmptyTable);
    }

    let src = table.rows();
    let mut rows = src.to_vec();

    for i in 0..src.len() {
        let month = src[i].date.month();
        let row = &mut rows[i];

        row.month = Some(month);
        row.season = Some(month % 12 / 3);

        row.rain_last_3_days = Some(trailing_sum(src, i, 3, |o| o.precipitation_sum_mm));
        row.rain_last_7_days = Some(trailing_sum(src, i, 7, |o| o.precipitation_sum_mm));

        row.longai_discharge_last_3_days = trailing_sum_opt(src, i, 3, |o| o.longai_discharge);
        row.kushiyara_discharge_last_3_days = trailing_sum_opt(src, i, 3, |o| o.kushiyara_discharge);
        row.singla_discharge_last_3_days = trailing_sum_opt(src, i, 3, |o| o.singla_discharge);
        row.longai_discharge_last_7_days = trailing_sum_opt(src, i, 7, |o| o.longai_discharge);
        row.kushiyara_discharge_last_7_days = trailing_sum_opt(src, i, 7, |o| o.kushiyara_discharge);
        row.singla_discharge_last_7_days = trailing_sum_opt(src, i, 7, |o| o.singla_discharge);

        row.soil_moisture_trend = Some(trailing_mean(src, i, 5, |o| o.soil_moisture_100_255cm));
        row.rain_soil_interaction =
            Some(src[i].precipitation_sum_mm * src[i].soil_moisture_100_255cm);
        row.rivers_interaction = match (
            src[i].longai_discharge,
            src[i].kushiyara_discharge,
            src[i].singla_discharge,
        ) {
            (Some(longai), Some(kushiyara), Some(singla)) => Some(longai * kushiyara * singla),
            _ => None,
        };
    }

    // Dates are untouched, so the source table's ordering carries over.
    Ok(ObservationTable::from_sorted_rows(rows))
}

/// The trailing window of up to `n` rows ending at (and including) row `i`.
fn window(src: &[Observation], i: usize, n: usize) -> &[Observation] {
    let start = (i + 1).saturating_sub(n);
    &src[start..=i]
}

fn trailing_sum(src: &[Observation], i: usize, n: usize, field: impl Fn(&Observation) -> f64) -> f64 {
    window(src, i, n).iter().map(field).sum()
}

fn trailing_mean(
    src: &[Observation],
    i: usize,
    n: usize,
    field: impl Fn(&Observation) -> f64,
) -> f64 {
    let rows = window(src, i, n);
    rows.iter().map(field).sum::<f64>() / rows.len() as f64
}

/// Trailing sum over an optional series: present readings are summed,
/// an all-absent window yields `None`.
fn trailing_sum_opt(
    src: &[Observation],
    i: usize,
    n: usize,
    field: impl Fn(&Observation) -> Option<f64>,
) -> Option<f64> {
    let mut sum = 0.0;
    let mut present = 0;
    for row in window(src, i, n) {
        if let Some(value) = field(row) {
            sum += value;
            present += 1;
        }
    }
    if present == 0 {
        None
    } else {
        Some(sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// One row per consecutive March day, with rain and Longai discharge
    /// taken from the slices (None in `discharge` means absent reading).
    fn table(rain: &[f64], discharge: &[Option<f64>]) -> ObservationTable {
        assert_eq!(rain.len(), discharge.len());
        let rows = rain
            .iter()
            .zip(discharge)
            .enumerate()
            .map(|(i, (r, q))| {
                let mut obs = Observation::new(d(2025, 3, 1 + i as u32));
                obs.precipitation_sum_mm = *r;
                obs.longai_discharge = *q;
                obs.kushiyara_discharge = Some(2.0);
                obs.singla_discharge = Some(3.0);
                obs.soil_moisture_100_255cm = 0.4;
                obs
            })
            .collect();
        ObservationTable::new(rows).unwrap()
    }

    #[test]
    fn test_season_formula_exact_boundary_values() {
        // month % 12 / 3 for months 1..=12. Not a calendar-season mapping:
        // December lands in 0 with January and February.
        let rows = (1..=12)
            .map(|m| Observation::new(d(2024, m, 15)))
            .collect();
        let engineered = engineer_features(&ObservationTable::new(rows).unwrap())
            .expect("twelve-month table should engineer");

        let seasons: Vec<u32> = engineered.rows().iter().map(|r| r.season.unwrap()).collect();
        assert_eq!(seasons, vec![0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 0]);

        let months: Vec<u32> = engineered.rows().iter().map(|r| r.month.unwrap()).collect();
        assert_eq!(months, (1..=12).collect::<Vec<u32>>());
    }

    #[test]
    fn test_rolling_rain_sums_clamp_at_table_start() {
        let engineered = engineer_features(&table(
            &[1.0, 2.0, 3.0, 4.0],
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        ))
        .unwrap();
        let rows = engineered.rows();

        // Partial windows at the head are partial sums, not zero or error.
        assert_eq!(rows[0].rain_last_3_days, Some(1.0));
        assert_eq!(rows[1].rain_last_3_days, Some(3.0));
        assert_eq!(rows[2].rain_last_3_days, Some(6.0));
        assert_eq!(rows[3].rain_last_3_days, Some(9.0), "full window drops day one");
        assert_eq!(rows[3].rain_last_7_days, Some(10.0), "7-day window clamps to 4 rows");
    }

    #[test]
    fn test_rolling_discharge_sums_skip_absent_readings() {
        let engineered = engineer_features(&table(
            &[0.0, 0.0, 0.0],
            &[Some(10.0), None, Some(30.0)],
        ))
        .unwrap();
        let rows = engineered.rows();

        assert_eq!(rows[1].longai_discharge_last_3_days, Some(10.0));
        assert_eq!(rows[2].longai_discharge_last_3_days, Some(40.0));
    }

    #[test]
    fn test_fully_absent_series_propagates_missing_without_panic() {
        let engineered = engineer_features(&table(&[1.0, 2.0], &[None, None]))
            .expect("absent series must not fail engineering");
        let rows = engineered.rows();

        assert_eq!(rows[1].longai_discharge_last_3_days, None);
        assert_eq!(rows[1].longai_discharge_last_7_days, None);
        assert_eq!(
            rows[1].rivers_interaction, None,
            "interaction with an absent reading must stay missing"
        );
        // Features not touching the absent series are still produced.
        assert_eq!(rows[1].rain_last_3_days, Some(3.0));
        assert_eq!(rows[1].kushiyara_discharge_last_3_days, Some(4.0));
    }

    #[test]
    fn test_interactions() {
        let engineered = engineer_features(&table(&[5.0], &[Some(10.0)])).unwrap();
        let row = &engineered.rows()[0];

        assert_eq!(row.rain_soil_interaction, Some(5.0 * 0.4));
        assert_eq!(row.rivers_interaction, Some(10.0 * 2.0 * 3.0));
    }

    #[test]
    fn test_soil_moisture_trend_is_trailing_mean_of_deepest_layer() {
        let rows: Vec<Observation> = (0..6)
            .map(|i| {
                let mut obs = Observation::new(d(2025, 3, 1 + i));
                obs.soil_moisture_100_255cm = (i + 1) as f64;
                obs
            })
            .collect();
        let engineered = engineer_features(&ObservationTable::new(rows).unwrap()).unwrap();
        let trends: Vec<f64> = engineered
            .rows()
            .iter()
            .map(|r| r.soil_moisture_trend.unwrap())
            .collect();

        assert_eq!(trends[0], 1.0);
        assert_eq!(trends[1], 1.5);
        assert_eq!(trends[4], 3.0, "full 5-row window: mean of 1..=5");
        assert_eq!(trends[5], 4.0, "window slides: mean of 2..=6");
    }

    #[test]
    fn test_input_table_is_left_untouched() {
        let input = table(&[1.0, 2.0], &[Some(1.0), Some(2.0)]);
        let before = input.clone();
        let _ = engineer_features(&input).unwrap();
        assert_eq!(input, before, "engineering must work on a copy");
        assert_eq!(input.rows()[0].month, None);
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let empty = ObservationTable::new(Vec::new()).unwrap();
        assert_eq!(engineer_features(&empty), Err(FeatureError::EmptyTable));
    }
}
