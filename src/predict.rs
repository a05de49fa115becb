/// One-step-ahead prediction: ordered feature-vector assembly and the
/// pipeline that writes the four predicted fields into the last row.
///
/// The two name lists below are the canonical model input schemas, in the
/// exact column order the artifacts were trained with. Like a request's
/// variable list order in the ingest layer, this ordering is an external
/// contract: artifacts whose declared `feature_names` disagree with it are
/// rejected at load time (see `artifacts::ModelSet::load`), and the
/// assembly functions here must produce values in precisely this order.

use crate::artifacts::ModelSet;
use crate::model::{Observation, ObservationTable, PredictError};

/// Regressor input columns (rain and discharge models), trained order.
pub const REGRESSION_FEATURES: [&str; 15] = [
    "precipitation_sum",
    "longai_discharge",
    "temperature_max",
    "temperature_min",
    "soil_moisture_0_to_7cm",
    "soil_moisture_7_to_28cm",
    "soil_moisture_28_to_100cm",
    "soil_moisture_100_to_255cm",
    "rain_last_7_days",
    "longai_discharge_last_7_days",
    "soil_moisture_trend",
    "rain_soil_interaction",
    "rivers_interaction",
    "month",
    "season",
];

/// Flood classifier input columns, trained order. `unknown_discharge`
/// (position 2) names a series the pipeline never observes; its value
/// comes from the artifact's declared fill (`ModelSet::unknown_discharge_fill`).
pub const FLOOD_FEATURES: [&str; 20] = [
    "temperature_min",
    "temperature_mean",
    "unknown_discharge",
    "kushiyara_discharge",
    "longai_discharge",
    "singla_discharge",
    "pressure_msl",
    "soil_moisture_0_to_7cm",
    "soil_moisture_7_to_28cm",
    "soil_moisture_28_to_100cm",
    "soil_moisture_100_to_255cm",
    "month",
    "longai_discharge_last_3_days",
    "kushiyara_discharge_last_3_days",
    "singla_discharge_last_3_days",
    "longai_discharge_last_7_days",
    "kushiyara_discharge_last_7_days",
    "singla_discharge_last_7_days",
    "soil_moisture_trend",
    "rivers_interaction",
];

fn require(value: Option<f64>, feature: &'static str) -> Result<f64, PredictError> {
    value.ok_or(PredictError::MissingFeature { feature })
}

fn require_month(value: Option<u32>) -> Result<f64, PredictError> {
    value
        .map(f64::from)
        .ok_or(PredictError::MissingFeature { feature: "month" })
}

/// Assembles the 15-field regressor input from an engineered row, in
/// `REGRESSION_FEATURES` order.
pub fn regression_vector(row: &Observation) -> Result<[f64; 15], PredictError> {
    Ok([
        row.precipitation_sum_mm,
        require(row.longai_discharge, "longai_discharge")?,
        row.temperature_max_c,
        row.temperature_min_c,
        row.soil_moisture_0_7cm,
        row.soil_moisture_7_28cm,
        row.soil_moisture_28_100cm,
        row.soil_moisture_100_255cm,
        require(row.rain_last_7_days, "rain_last_7_days")?,
        require(row.longai_discharge_last_7_days, "longai_discharge_last_7_days")?,
        require(row.soil_moisture_trend, "soil_moisture_trend")?,
        require(row.rain_soil_interaction, "rain_soil_interaction")?,
        require(row.rivers_interaction, "rivers_interaction")?,
        require_month(row.month)?,
        row.season
            .map(f64::from)
            .ok_or(PredictError::MissingFeature { feature: "season" })?,
    ])
}

/// Assembles the 20-field classifier input from an engineered row, in
/// `FLOOD_FEATURES` order.
pub fn flood_vector(row: &Observation, unknown_fill: f64) -> Result<[f64; 20], PredictError> {
    Ok([
        row.temperature_min_c,
        row.temperature_mean_c,
        unknown_fill,
        require(row.kushiyara_discharge, "kushiyara_discharge")?,
        require(row.longai_discharge, "longai_discharge")?,
        require(row.singla_discharge, "singla_discharge")?,
        row.pressure_msl_hpa,
        row.soil_moisture_0_7cm,
        row.soil_moisture_7_28cm,
        row.soil_moisture_28_100cm,
        row.soil_moisture_100_255cm,
        require_month(row.month)?,
        require(row.longai_discharge_last_3_days, "longai_discharge_last_3_days")?,
        require(row.kushiyara_discharge_last_3_days, "kushiyara_discharge_last_3_days")?,
        require(row.singla_discharge_last_3_days, "singla_discharge_last_3_days")?,
        require(row.longai_discharge_last_7_days, "longai_discharge_last_7_days")?,
        require(row.kushiyara_discharge_last_7_days, "kushiyara_discharge_last_7_days")?,
        require(row.singla_discharge_last_7_days, "singla_discharge_last_7_days")?,
        require(row.soil_moisture_trend, "soil_moisture_trend")?,
        require(row.rivers_interaction, "rivers_interaction")?,
    ])
}

/// Applies all three models to the last row of an engineered table and
/// returns a copy with the four predicted fields written into that row
/// only. Earlier rows keep their missing sentinels; the input is left
/// untouched.
pub fn predict_next_day(
    table: &ObservationTable,
    models: &ModelSet,
) -> Result<ObservationTable, PredictError> {
    let last = table.last().ok_or(PredictError::EmptyTable)?;

    let regression = regression_vector(last)?;
    let flood = flood_vector(last, models.unknown_discharge_fill)?;

    let predicted_rain = models.rain.predict(&regression);
    let predicted_discharge = models.discharge.predict(&regression);
    let flood_flag = models.flood.predict_class(&flood);
    let flood_probability = models.flood.predict_probability(&flood);

    let mut rows = table.rows().to_vec();
    let last_index = rows.len() - 1;
    let row = &mut rows[last_index];
    row.predicted_rain = Some(predicted_rain);
    row.predicted_discharge = Some(predicted_discharge);
    row.flood_flag = Some(flood_flag);
    row.flood_probability = Some(flood_probability);

    Ok(ObservationTable::from_sorted_rows(rows))
}
