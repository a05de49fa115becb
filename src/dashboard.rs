/// Presentation: headline metric deltas and the discharge chart object.
///
/// The chart is a plain serializable figure description (traces of x/y
/// series with style hints); actual drawing belongs to the dashboard host.
/// Flood markers are shifted forward one calendar day because the
/// classifier's flag describes risk for the day AFTER the row it sits on.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::model::{DashboardError, ObservationTable};

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

/// Day-over-day percentage change. A prior value of exactly zero reports
/// 0.0 rather than an infinite/undefined jump - deliberately lossy, but it
/// keeps the headline tiles rendering.
pub fn percent_change(yesterday: f64, today: f64) -> f64 {
    if yesterday == 0.0 {
        0.0
    } else {
        (today - yesterday) / yesterday * 100.0
    }
}

/// Today's headline readings with their deltas against yesterday.
#[derive(Debug, Clone, Serialize)]
pub struct HeadlineMetrics {
    pub date: NaiveDate,
    pub discharge_m3s: f64,
    pub discharge_delta_pct: f64,
    pub precipitation_mm: f64,
    pub precipitation_delta_pct: f64,
    pub temperature_c: f64,
    pub temperature_delta_pct: f64,
    pub wind_ms: f64,
    pub wind_delta_pct: f64,
}

pub fn headline_metrics(table: &ObservationTable) -> Result<HeadlineMetrics, DashboardError> {
    if table.is_empty() {
        return Err(DashboardError::EmptyTable);
    }
    if table.len() < 2 {
        return Err(DashboardError::NotEnoughRows { have: table.len() });
    }

    let rows = table.rows();
    let today = &rows[rows.len() - 1];
    let yesterday = &rows[rows.len() - 2];

    let today_discharge = today
        .longai_discharge
        .ok_or(DashboardError::MissingDischarge { date: today.date })?;
    let yesterday_discharge = yesterday
        .longai_discharge
        .ok_or(DashboardError::MissingDischarge { date: yesterday.date })?;

    Ok(HeadlineMetrics {
        date: today.date,
        discharge_m3s: today_discharge,
        discharge_delta_pct: percent_change(yesterday_discharge, today_discharge),
        precipitation_mm: today.precipitation_sum_mm,
        precipitation_delta_pct: percent_change(
            yesterday.precipitation_sum_mm,
            today.precipitation_sum_mm,
        ),
        temperature_c: today.temperature_mean_c,
        temperature_delta_pct: percent_change(
            yesterday.temperature_mean_c,
            today.temperature_mean_c,
        ),
        wind_ms: today.wind_speed_max_ms,
        wind_delta_pct: percent_change(yesterday.wind_speed_max_ms, today.wind_speed_max_ms),
    })
}

// ---------------------------------------------------------------------------
// Chart construction
// ---------------------------------------------------------------------------

/// One x/y series with rendering hints, in the shape charting front ends
/// expect (mode "lines" / "lines+markers" / "markers").
#[derive(Debug, Clone, Serialize)]
pub struct ChartTrace {
    pub name: &'static str,
    pub mode: &'static str,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_dash: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DischargeChart {
    pub title: String,
    pub traces: Vec<ChartTrace>,
}

/// Builds the discharge chart: the historical Longai series, a dashed
/// two-point bridge to the predicted next-day discharge (only when a
/// prediction is present), and one marker per flood-flagged row shifted
/// forward one day and annotated with its probability.
pub fn discharge_chart(table: &ObservationTable) -> Result<DischargeChart, DashboardError> {
    if table.is_empty() {
        return Err(DashboardError::EmptyTable);
    }
    let rows = table.rows();

    // Historical series; days without a reading are simply skipped.
    let mut history_x = Vec::new();
    let mut history_y = Vec::new();
    for row in rows {
        if let Some(discharge) = row.longai_discharge {
            history_x.push(row.date);
            history_y.push(discharge);
        }
    }

    let mut traces = vec![ChartTrace {
        name: "River discharge",
        mode: "lines",
        x: history_x,
        y: history_y,
        line_dash: None,
        text: Vec::new(),
    }];

    // Dashed bridge from the last known reading to tomorrow's prediction.
    if let Some(last) = rows.last() {
        if let (Some(known), Some(predicted)) = (last.longai_discharge, last.predicted_discharge) {
            traces.push(ChartTrace {
                name: "Predicted discharge",
                mode: "lines+markers",
                x: vec![last.date, last.date + Duration::days(1)],
                y: vec![known, predicted],
                line_dash: Some("dash"),
                text: Vec::new(),
            });
        }
    }

    // Flood markers, shifted to the day the risk applies to.
    let mut flood_x = Vec::new();
    let mut flood_y = Vec::new();
    let mut flood_text = Vec::new();
    for row in rows {
        if row.flood_flag != Some(true) {
            continue;
        }
        if let (Some(discharge), Some(probability)) = (row.longai_discharge, row.flood_probability)
        {
            flood_x.push(row.date + Duration::days(1));
            flood_y.push(discharge);
            flood_text.push(format!("Predicted flood, probability {:.2}", probability));
        }
    }
    if !flood_x.is_empty() {
        traces.push(ChartTrace {
            name: "Predicted flood",
            mode: "markers",
            x: flood_x,
            y: flood_y,
            line_dash: None,
            text: flood_text,
        });
    }

    Ok(DischargeChart {
        title: "River discharge with flood predictions".to_string(),
        traces,
    })
}

/// The days carrying elevated flood risk, already shifted to the day the
/// risk applies to.
#[derive(Debug, Clone, Serialize)]
pub struct FloodDay {
    pub date: NaiveDate,
    pub probability: f64,
}

pub fn flood_alert_days(table: &ObservationTable) -> Vec<FloodDay> {
    table
        .rows()
        .iter()
        .filter(|row| row.flood_flag == Some(true))
        .filter_map(|row| {
            row.flood_probability.map(|probability| FloodDay {
                date: row.date + Duration::days(1),
                probability,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Observation;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn two_day_table() -> ObservationTable {
        let mut yesterday = Observation::new(d(2025, 3, 1));
        yesterday.precipitation_sum_mm = 10.0;
        yesterday.temperature_mean_c = 20.0;
        yesterday.wind_speed_max_ms = 4.0;
        yesterday.longai_discharge = Some(40.0);

        let mut today = Observation::new(d(2025, 3, 2));
        today.precipitation_sum_mm = 15.0;
        today.temperature_mean_c = 25.0;
        today.wind_speed_max_ms = 2.0;
        today.longai_discharge = Some(50.0);

        ObservationTable::new(vec![yesterday, today]).unwrap()
    }

    #[test]
    fn test_percent_change_ordinary_case() {
        assert_eq!(percent_change(10.0, 15.0), 50.0);
        assert_eq!(percent_change(40.0, 30.0), -25.0);
    }

    #[test]
    fn test_percent_change_zero_baseline_reports_zero() {
        // Deliberate policy: a zero-to-nonzero jump reads as 0%, not inf.
        assert_eq!(percent_change(0.0, 5.0), 0.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_headline_metrics_values_and_deltas() {
        let metrics = headline_metrics(&two_day_table()).expect("two rows should suffice");
        assert_eq!(metrics.date, d(2025, 3, 2));
        assert_eq!(metrics.discharge_m3s, 50.0);
        assert_eq!(metrics.discharge_delta_pct, 25.0);
        assert_eq!(metrics.precipitation_delta_pct, 50.0);
        assert_eq!(metrics.temperature_delta_pct, 25.0);
        assert_eq!(metrics.wind_delta_pct, -50.0);
    }

    #[test]
    fn test_headline_metrics_needs_two_rows() {
        let table =
            ObservationTable::new(vec![Observation::new(d(2025, 3, 1))]).unwrap();
        assert_eq!(
            headline_metrics(&table).err(),
            Some(DashboardError::NotEnoughRows { have: 1 })
        );
    }

    #[test]
    fn test_headline_metrics_requires_discharge() {
        let mut rows = two_day_table().rows().to_vec();
        rows[1].longai_discharge = None;
        let table = ObservationTable::new(rows).unwrap();
        assert_eq!(
            headline_metrics(&table).err(),
            Some(DashboardError::MissingDischarge { date: d(2025, 3, 2) })
        );
    }

    #[test]
    fn test_chart_history_skips_missing_readings() {
        let mut rows = two_day_table().rows().to_vec();
        rows[0].longai_discharge = None;
        let table = ObservationTable::new(rows).unwrap();

        let chart = discharge_chart(&table).expect("should render");
        let history = &chart.traces[0];
        assert_eq!(history.x, vec![d(2025, 3, 2)], "day without a reading is skipped");
        assert_eq!(history.y, vec![50.0]);
    }

    #[test]
    fn test_chart_without_prediction_has_no_bridge() {
        let chart = discharge_chart(&two_day_table()).expect("should render");
        assert_eq!(chart.traces.len(), 1, "history only: no prediction, no floods");
        assert_eq!(chart.traces[0].name, "River discharge");
    }

    #[test]
    fn test_predicted_discharge_bridge_spans_to_next_day() {
        let mut rows = two_day_table().rows().to_vec();
        rows[1].predicted_discharge = Some(60.0);
        let table = ObservationTable::new(rows).unwrap();

        let chart = discharge_chart(&table).expect("should render");
        let bridge = chart
            .traces
            .iter()
            .find(|t| t.name == "Predicted discharge")
            .expect("prediction present, bridge expected");
        assert_eq!(bridge.x, vec![d(2025, 3, 2), d(2025, 3, 3)]);
        assert_eq!(bridge.y, vec![50.0, 60.0], "last known reading to prediction");
        assert_eq!(bridge.line_dash, Some("dash"));
    }

    #[test]
    fn test_flood_markers_shift_forward_one_day() {
        let mut rows = two_day_table().rows().to_vec();
        rows[1].flood_flag = Some(true);
        rows[1].flood_probability = Some(0.91);
        let table = ObservationTable::new(rows).unwrap();

        let chart = discharge_chart(&table).expect("should render");
        let markers = chart
            .traces
            .iter()
            .find(|t| t.name == "Predicted flood")
            .expect("flagged row should produce a marker");
        assert_eq!(
            markers.x,
            vec![d(2025, 3, 3)],
            "flag on March 2 describes risk for March 3"
        );
        assert_eq!(markers.y, vec![50.0], "marker sits at the flagged row's discharge");
        assert_eq!(markers.text, vec!["Predicted flood, probability 0.91".to_string()]);
    }

    #[test]
    fn test_unflagged_rows_produce_no_markers() {
        let mut rows = two_day_table().rows().to_vec();
        rows[1].flood_flag = Some(false);
        rows[1].flood_probability = Some(0.12);
        let table = ObservationTable::new(rows).unwrap();

        let chart = discharge_chart(&table).expect("should render");
        assert!(chart.traces.iter().all(|t| t.name != "Predicted flood"));
    }

    #[test]
    fn test_flood_alert_days_are_shifted() {
        let mut rows = two_day_table().rows().to_vec();
        rows[0].flood_flag = Some(true);
        rows[0].flood_probability = Some(0.66);
        let table = ObservationTable::new(rows).unwrap();

        let days = flood_alert_days(&table);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, d(2025, 3, 2));
        assert_eq!(days[0].probability, 0.66);
    }

    #[test]
    fn test_empty_table_is_a_typed_error() {
        let empty = ObservationTable::new(Vec::new()).unwrap();
        assert!(matches!(
            discharge_chart(&empty),
            Err(DashboardError::EmptyTable)
        ));
        assert!(matches!(
            headline_metrics(&empty),
            Err(DashboardError::EmptyTable)
        ));
    }
}
