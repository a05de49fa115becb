/// floodcast: Barak basin river discharge forecasting service.
///
/// # Module structure
///
/// ```text
/// floodcast
/// ├── model      — shared data types (Observation, ObservationTable, error enums)
/// ├── config     — basin configuration loader (basin.toml: station, gauges, model paths)
/// ├── ingest
/// │   ├── meteo  — Open-Meteo archive + flood APIs: URL construction, JSON parsing, joins
/// │   ├── client — cached HTTP client with retry/backoff and window verification
/// │   └── fixtures (test only) — representative API response payloads
/// ├── features   — derived columns (season, trailing rain/discharge sums, interactions)
/// ├── artifacts  — model file loading with schema validation (ModelSet)
/// ├── predict    — ordered feature vectors + next-day rain/discharge/flood predictions
/// ├── dashboard  — headline metrics, discharge chart object, flood alert days
/// └── endpoint   — HTTP API serving the assembled dashboard as JSON
/// ```

/// Public modules
pub mod artifacts;
pub mod config;
pub mod dashboard;
pub mod endpoint;
pub mod features;
pub mod ingest;
pub mod model;
pub mod predict;
