/// Shared domain types for the flood forecasting pipeline.
///
/// The central entity is the `ObservationTable`: a date-ascending, per-day
/// time series of weather readings, river discharge, engineered features,
/// and (for the last row only) model predictions. Every pipeline stage
/// takes a table and returns a new one; nothing mutates a caller's copy.
///
/// Per-stage error enums live here too, one per pipeline stage, so the
/// endpoint layer can decide how each failure degrades.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Rivers
// ---------------------------------------------------------------------------

/// The three monitored river gauges in the basin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum River {
    Longai,
    Kushiyara,
    Singla,
}

impl River {
    pub const ALL: [River; 3] = [River::Longai, River::Kushiyara, River::Singla];

    pub fn name(&self) -> &'static str {
        match self {
            River::Longai => "Longai",
            River::Kushiyara => "Kushiyara",
            River::Singla => "Singla",
        }
    }
}

impl fmt::Display for River {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Observation rows
// ---------------------------------------------------------------------------

/// One daily record.
///
/// Raw weather fields are plain `f64` because acquisition refuses to build
/// a table with holes in them. Discharge readings are `Option<f64>`: a
/// whole series can be absent from the flood API for part of the span.
/// Engineered and predicted fields start as `None` and are filled by the
/// features and prediction stages respectively; predictions only ever land
/// on the last row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,

    // Daily-native archive fields
    pub precipitation_sum_mm: f64,
    pub wind_speed_max_ms: f64,
    pub wind_direction_dominant_deg: f64,
    pub et0_evapotranspiration_mm: f64,
    pub wind_gusts_max_ms: f64,

    // Daily means of hourly archive fields
    pub pressure_msl_hpa: f64,
    pub soil_moisture_0_7cm: f64,
    pub soil_moisture_7_28cm: f64,
    pub soil_moisture_28_100cm: f64,
    pub soil_moisture_100_255cm: f64,
    pub temperature_max_c: f64,
    pub temperature_min_c: f64,
    pub temperature_mean_c: f64,

    // Per-river daily discharge (m³/s)
    pub longai_discharge: Option<f64>,
    pub kushiyara_discharge: Option<f64>,
    pub singla_discharge: Option<f64>,

    // Engineered features (features stage fills these for every row)
    pub month: Option<u32>,
    pub season: Option<u32>,
    pub rain_last_3_days: Option<f64>,
    pub rain_last_7_days: Option<f64>,
    pub longai_discharge_last_3_days: Option<f64>,
    pub kushiyara_discharge_last_3_days: Option<f64>,
    pub singla_discharge_last_3_days: Option<f64>,
    pub longai_discharge_last_7_days: Option<f64>,
    pub kushiyara_discharge_last_7_days: Option<f64>,
    pub singla_discharge_last_7_days: Option<f64>,
    pub soil_moisture_trend: Option<f64>,
    pub rain_soil_interaction: Option<f64>,
    pub rivers_interaction: Option<f64>,

    // Predictions (last row only)
    pub predicted_rain: Option<f64>,
    pub predicted_discharge: Option<f64>,
    pub flood_flag: Option<bool>,
    pub flood_probability: Option<f64>,
}

impl Observation {
    /// A record with zeroed raw fields and no derived/predicted values.
    /// Acquisition fills the raw fields in; stages fill the rest.
    pub fn new(date: NaiveDate) -> Self {
        Observation {
            date,
            precipitation_sum_mm: 0.0,
            wind_speed_max_ms: 0.0,
            wind_direction_dominant_deg: 0.0,
            et0_evapotranspiration_mm: 0.0,
            wind_gusts_max_ms: 0.0,
            pressure_msl_hpa: 0.0,
            soil_moisture_0_7cm: 0.0,
            soil_moisture_7_28cm: 0.0,
            soil_moisture_28_100cm: 0.0,
            soil_moisture_100_255cm: 0.0,
            temperature_max_c: 0.0,
            temperature_min_c: 0.0,
            temperature_mean_c: 0.0,
            longai_discharge: None,
            kushiyara_discharge: None,
            singla_discharge: None,
            month: None,
            season: None,
            rain_last_3_days: None,
            rain_last_7_days: None,
            longai_discharge_last_3_days: None,
            kushiyara_discharge_last_3_days: None,
            singla_discharge_last_3_days: None,
            longai_discharge_last_7_days: None,
            kushiyara_discharge_last_7_days: None,
            singla_discharge_last_7_days: None,
            soil_moisture_trend: None,
            rain_soil_interaction: None,
            rivers_interaction: None,
            predicted_rain: None,
            predicted_discharge: None,
            flood_flag: None,
            flood_probability: None,
        }
    }

    pub fn discharge(&self, river: River) -> Option<f64> {
        match river {
            River::Longai => self.longai_discharge,
            River::Kushiyara => self.kushiyara_discharge,
            River::Singla => self.singla_discharge,
        }
    }

    pub fn set_discharge(&mut self, river: River, value: Option<f64>) {
        match river {
            River::Longai => self.longai_discharge = value,
            River::Kushiyara => self.kushiyara_discharge = value,
            River::Singla => self.singla_discharge = value,
        }
    }
}

// ---------------------------------------------------------------------------
// Observation table
// ---------------------------------------------------------------------------

/// Date-ascending, duplicate-free collection of daily observations.
///
/// Invariants held by construction: rows sorted by date ascending, no two
/// rows share a date. Rolling features at row *i* may only depend on rows
/// `<= i`; prediction fields are populated on the last row only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    /// Builds a table, validating the date ordering invariant.
    pub fn new(rows: Vec<Observation>) -> Result<Self, String> {
        for pair in rows.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(format!(
                    "rows out of order: {} follows {}",
                    pair[1].date, pair[0].date
                ));
            }
        }
        Ok(ObservationTable { rows })
    }

    /// Invariant: caller guarantees rows are already sorted and deduped
    /// (e.g. a copy of an existing table's rows with non-date fields edited).
    pub(crate) fn from_sorted_rows(rows: Vec<Observation>) -> Self {
        debug_assert!(rows.windows(2).all(|p| p[0].date < p[1].date));
        ObservationTable { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&Observation> {
        self.rows.last()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }
}

// ---------------------------------------------------------------------------
// Per-stage errors
// ---------------------------------------------------------------------------

/// Acquisition failures. Any of these aborts the whole acquisition: the
/// stage never hands back a partially filled table.
#[derive(Debug)]
pub enum FetchError {
    /// Transport failure (connection, timeout) after all retry attempts.
    Http(String),
    /// Non-success HTTP status after all retry attempts.
    Status(u16),
    /// Response body did not match the API contract (bad JSON, wrong
    /// variable count, array length mismatch).
    Decode(String),
    /// Structurally valid response with nothing usable in it.
    NoData(String),
    /// Feature and target tables could not be joined by date.
    Merge(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(msg) => write!(f, "HTTP transport error: {}", msg),
            FetchError::Status(code) => write!(f, "HTTP status {}", code),
            FetchError::Decode(msg) => write!(f, "response decode error: {}", msg),
            FetchError::NoData(msg) => write!(f, "no data available: {}", msg),
            FetchError::Merge(msg) => write!(f, "merge error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Feature engineering failures.
#[derive(Debug, PartialEq)]
pub enum FeatureError {
    EmptyTable,
}

impl fmt::Display for FeatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureError::EmptyTable => write!(f, "cannot engineer features for an empty table"),
        }
    }
}

impl std::error::Error for FeatureError {}

/// Prediction pipeline failures.
#[derive(Debug, PartialEq)]
pub enum PredictError {
    EmptyTable,
    /// The last row lacks a value the model's input schema requires.
    MissingFeature { feature: &'static str },
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::EmptyTable => write!(f, "cannot predict from an empty table"),
            PredictError::MissingFeature { feature } => {
                write!(f, "last row is missing model input `{}`", feature)
            }
        }
    }
}

impl std::error::Error for PredictError {}

/// Presentation failures.
#[derive(Debug, PartialEq)]
pub enum DashboardError {
    EmptyTable,
    /// Day-over-day deltas need at least two rows.
    NotEnoughRows { have: usize },
    /// The headline discharge reading is absent for one of the two days.
    MissingDischarge { date: NaiveDate },
}

impl fmt::Display for DashboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashboardError::EmptyTable => write!(f, "cannot render an empty table"),
            DashboardError::NotEnoughRows { have } => {
                write!(f, "headline metrics need 2 rows, table has {}", have)
            }
            DashboardError::MissingDischarge { date } => {
                write!(f, "no Longai discharge reading for {}", date)
            }
        }
    }
}

impl std::error::Error for DashboardError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
