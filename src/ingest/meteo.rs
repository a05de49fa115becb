/// Open-Meteo archive and flood API contract.
///
/// Handles URL construction and JSON response decoding for the two
/// endpoints the pipeline consumes:
///   https://archive-api.open-meteo.com/v1/archive  (weather history)
///   https://flood-api.open-meteo.com/v1/flood      (daily river discharge)
///
/// Responses carry per-block (hourly/daily) unix start/end/interval
/// metadata plus a `variables` array of value arrays. The index order of
/// `variables` matches the order of the variable list in the request URL;
/// that ordering is part of the API contract and the constants below are
/// its single source of truth. See `fixtures.rs` for annotated payloads.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

use crate::model::{FetchError, Observation, ObservationTable, River};

// ---------------------------------------------------------------------------
// Variable lists (request order == response index order)
// ---------------------------------------------------------------------------

pub const ARCHIVE_BASE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const FLOOD_BASE_URL: &str = "https://flood-api.open-meteo.com/v1/flood";

/// Hourly archive variables, in request order.
pub const HOURLY_VARIABLES: [&str; 8] = [
    "pressure_msl",
    "soil_moisture_0_to_7cm",
    "soil_moisture_7_to_28cm",
    "soil_moisture_28_to_100cm",
    "soil_moisture_100_to_255cm",
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
];

/// Daily archive variables, in request order.
pub const DAILY_VARIABLES: [&str; 5] = [
    "precipitation_sum",
    "wind_speed_10m_max",
    "wind_direction_10m_dominant",
    "et0_fao_evapotranspiration",
    "wind_gusts_10m_max",
];

pub const DISCHARGE_VARIABLE: &str = "river_discharge";

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which logical endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Historical weather features for the basin weather station.
    Archive,
    /// Daily discharge for one river gauge.
    Flood,
}

/// One acquisition request, also the unit of response caching.
#[derive(Debug, Clone, PartialEq)]
pub struct MeteoRequest {
    pub kind: RequestKind,
    pub latitude: f64,
    pub longitude: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MeteoRequest {
    pub fn url(&self) -> String {
        match self.kind {
            RequestKind::Archive => build_archive_url(
                self.latitude,
                self.longitude,
                self.start_date,
                self.end_date,
            ),
            RequestKind::Flood => {
                build_flood_url(self.latitude, self.longitude, self.start_date, self.end_date)
            }
        }
    }

    /// Cache key: two requests with the same signature are interchangeable.
    pub fn signature(&self) -> String {
        let kind = match self.kind {
            RequestKind::Archive => "archive",
            RequestKind::Flood => "flood",
        };
        format!(
            "{}|{:.5}|{:.5}|{}|{}",
            kind, self.latitude, self.longitude, self.start_date, self.end_date
        )
    }
}

/// Builds an archive API URL requesting the fixed hourly and daily
/// variable lists for the given coordinate and inclusive date range.
/// Wind speeds are requested in m/s.
pub fn build_archive_url(
    latitude: f64,
    longitude: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> String {
    format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&hourly={}&daily={}&wind_speed_unit=ms",
        ARCHIVE_BASE_URL,
        latitude,
        longitude,
        start_date.format("%Y-%m-%d"),
        end_date.format("%Y-%m-%d"),
        HOURLY_VARIABLES.join(","),
        DAILY_VARIABLES.join(","),
    )
}

/// Builds a flood API URL requesting daily river discharge for one gauge
/// coordinate. Timestamps are requested in UTC so the date axis lines up
/// with the archive response.
pub fn build_flood_url(
    latitude: f64,
    longitude: f64,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> String {
    format!(
        "{}?latitude={}&longitude={}&start_date={}&end_date={}&daily={}&timezone=UTC",
        FLOOD_BASE_URL,
        latitude,
        longitude,
        start_date.format("%Y-%m-%d"),
        end_date.format("%Y-%m-%d"),
        DISCHARGE_VARIABLE,
    )
}

// ---------------------------------------------------------------------------
// Serde structures for response deserialization
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MeteoResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub hourly: Option<VariableBlock>,
    pub daily: Option<VariableBlock>,
}

/// One time-resolution block of a response.
///
/// The time axis is not materialized in the payload; it is derived from
/// `start`/`end`/`interval` as the half-open range `[start, end)` stepped
/// by `interval` seconds. Each entry of `variables` must have exactly one
/// value per derived timestamp. Individual values may be null.
#[derive(Debug, Clone, Deserialize)]
pub struct VariableBlock {
    /// Unix seconds of the first sample (inclusive).
    pub start: i64,
    /// Unix seconds one interval past the last sample (exclusive).
    pub end: i64,
    /// Seconds between samples.
    pub interval: i64,
    /// Value arrays, index-aligned with the request's variable list.
    pub variables: Vec<Vec<Option<f64>>>,
}

impl VariableBlock {
    /// Derives the block's time axis as UTC calendar dates.
    pub fn dates(&self) -> Result<Vec<NaiveDate>, FetchError> {
        if self.interval <= 0 {
            return Err(FetchError::Decode(format!(
                "non-positive interval {}",
                self.interval
            )));
        }
        if self.end <= self.start {
            return Err(FetchError::Decode(format!(
                "empty time axis: start {} >= end {}",
                self.start, self.end
            )));
        }
        let mut dates = Vec::new();
        let mut ts = self.start;
        while ts < self.end {
            let dt = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| FetchError::Decode(format!("timestamp {} out of range", ts)))?;
            dates.push(dt.date_naive());
            ts += self.interval;
        }
        Ok(dates)
    }

    /// Index access into `variables`, validated against the time axis.
    pub fn variable(&self, index: usize, len: usize, name: &str) -> Result<&[Option<f64>], FetchError> {
        let values = self.variables.get(index).ok_or_else(|| {
            FetchError::Decode(format!(
                "variable index {} ({}) out of range, response has {}",
                index,
                name,
                self.variables.len()
            ))
        })?;
        if values.len() != len {
            return Err(FetchError::Decode(format!(
                "variable {} has {} values for {} timestamps",
                name,
                values.len(),
                len
            )));
        }
        Ok(values)
    }
}

// ---------------------------------------------------------------------------
// Feature table decoding
// ---------------------------------------------------------------------------

fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Per-day means of the eight hourly variables, keyed by UTC calendar day.
///
/// Rounding follows the upstream dataset conventions: pressure to 1
/// decimal, soil moisture to 3 decimals, temperatures unrounded.
fn hourly_daily_means(block: &VariableBlock) -> Result<BTreeMap<NaiveDate, [f64; 8]>, FetchError> {
    let dates = block.dates()?;

    // (sum, count) accumulator per variable per day
    let mut acc: BTreeMap<NaiveDate, [(f64, u32); 8]> = BTreeMap::new();
    for (index, name) in HOURLY_VARIABLES.iter().enumerate() {
        let values = block.variable(index, dates.len(), name)?;
        for (date, value) in dates.iter().zip(values) {
            let slot = &mut acc.entry(*date).or_insert([(0.0, 0); 8])[index];
            if let Some(v) = value {
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    let mut means = BTreeMap::new();
    for (date, sums) in acc {
        let mut row = [0.0; 8];
        for (index, (sum, count)) in sums.iter().enumerate() {
            if *count == 0 {
                return Err(FetchError::NoData(format!(
                    "no hourly {} samples on {}",
                    HOURLY_VARIABLES[index], date
                )));
            }
            let mean = sum / f64::from(*count);
            row[index] = match index {
                0 => round_dp(mean, 1),      // pressure_msl
                1..=4 => round_dp(mean, 3),  // soil moisture layers
                _ => mean,
            };
        }
        means.insert(date, row);
    }
    Ok(means)
}

/// Decodes an archive response into per-day observation rows: daily-native
/// fields joined (inner, by date) with the per-day means of the hourly
/// fields. Discharge and derived fields are left unpopulated.
pub fn parse_feature_table(response: &MeteoResponse) -> Result<Vec<Observation>, FetchError> {
    let daily = response
        .daily
        .as_ref()
        .ok_or_else(|| FetchError::Decode("archive response missing daily block".to_string()))?;
    let hourly = response
        .hourly
        .as_ref()
        .ok_or_else(|| FetchError::Decode("archive response missing hourly block".to_string()))?;

    let dates = daily.dates()?;
    let mut daily_values = Vec::with_capacity(DAILY_VARIABLES.len());
    for (index, name) in DAILY_VARIABLES.iter().enumerate() {
        daily_values.push(daily.variable(index, dates.len(), name)?);
    }

    let hourly_means = hourly_daily_means(hourly)?;

    let mut rows = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        // Inner join: a daily row without hourly coverage is dropped.
        let means = match hourly_means.get(date) {
            Some(means) => means,
            None => continue,
        };

        let mut daily_row = [0.0; 5];
        for (v, values) in daily_row.iter_mut().zip(&daily_values) {
            *v = values[i].ok_or_else(|| {
                FetchError::NoData(format!("daily variable missing value on {}", date))
            })?;
        }

        let mut obs = Observation::new(*date);
        obs.precipitation_sum_mm = daily_row[0];
        obs.wind_speed_max_ms = daily_row[1];
        obs.wind_direction_dominant_deg = daily_row[2];
        obs.et0_evapotranspiration_mm = daily_row[3];
        obs.wind_gusts_max_ms = daily_row[4];
        obs.pressure_msl_hpa = means[0];
        obs.soil_moisture_0_7cm = means[1];
        obs.soil_moisture_7_28cm = means[2];
        obs.soil_moisture_28_100cm = means[3];
        obs.soil_moisture_100_255cm = means[4];
        obs.temperature_max_c = means[5];
        obs.temperature_min_c = means[6];
        obs.temperature_mean_c = means[7];
        rows.push(obs);
    }

    if rows.is_empty() {
        return Err(FetchError::NoData(
            "hourly and daily spans do not overlap".to_string(),
        ));
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Discharge decoding and merge
// ---------------------------------------------------------------------------

/// Decodes a flood response into a per-day discharge series. Null readings
/// stay `None`: a gauge can be missing from the upstream model for part or
/// all of the span without failing the acquisition.
pub fn parse_discharge_series(
    response: &MeteoResponse,
) -> Result<Vec<(NaiveDate, Option<f64>)>, FetchError> {
    let daily = response
        .daily
        .as_ref()
        .ok_or_else(|| FetchError::Decode("flood response missing daily block".to_string()))?;
    let dates = daily.dates()?;
    let values = daily.variable(0, dates.len(), DISCHARGE_VARIABLE)?;
    Ok(dates.iter().copied().zip(values.iter().copied()).collect())
}

/// Inner-join merge of one river's discharge series onto the feature rows:
/// rows whose date the series does not cover are dropped, matching rows get
/// the reading (possibly `None`). An empty result is a merge failure.
pub fn merge_discharge(
    rows: Vec<Observation>,
    river: River,
    series: &[(NaiveDate, Option<f64>)],
) -> Result<Vec<Observation>, FetchError> {
    let by_date: HashMap<NaiveDate, Option<f64>> = series.iter().copied().collect();

    let mut merged: Vec<Observation> = rows
        .into_iter()
        .filter(|obs| by_date.contains_key(&obs.date))
        .collect();
    for obs in &mut merged {
        obs.set_discharge(river, by_date[&obs.date]);
    }

    if merged.is_empty() {
        return Err(FetchError::Merge(format!(
            "no overlapping dates between features and {} discharge",
            river
        )));
    }
    Ok(merged)
}

/// Assembles the full observation table from one archive response and the
/// three flood responses. Any decode or merge failure aborts the whole
/// assembly; a partial table is never returned.
pub fn assemble_table(
    features: &MeteoResponse,
    targets: &[(River, &MeteoResponse)],
) -> Result<ObservationTable, FetchError> {
    let mut rows = parse_feature_table(features)?;
    for (river, response) in targets {
        let series = parse_discharge_series(response)?;
        rows = merge_discharge(rows, *river, &series)?;
    }
    ObservationTable::new(rows).map_err(FetchError::Merge)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
