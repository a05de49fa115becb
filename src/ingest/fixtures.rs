/// Test fixtures: representative Open-Meteo archive and flood payloads.
///
/// These fixtures are structurally complete but truncated to the minimum
/// needed to exercise the decoder: two calendar days, four hourly samples
/// per day (the decoder derives the time axis from start/end/interval, so
/// a 6-hour interval exercises the same grouping path as a 1-hour one).
///
/// Response shape:
///   response.hourly / response.daily
///     .start     — unix seconds of the first sample (inclusive)
///     .end       — unix seconds past the last sample (exclusive)
///     .interval  — seconds between samples
///     .variables — array of value arrays, index-aligned with the
///                  request's variable list order (HOURLY_VARIABLES /
///                  DAILY_VARIABLES / river_discharge)
///
/// Note: individual readings may be JSON null. The flood model in
/// particular can lack coverage for a gauge on some days.
///
/// Unix anchors used below:
///   1740787200 = 2025-03-01T00:00:00Z
///   1740960000 = 2025-03-03T00:00:00Z
///   1743465600 = 2025-04-01T00:00:00Z

/// Archive response for 2025-03-01..2025-03-02. Hourly values are constant
/// within each day so the expected daily means are the values themselves
/// (before rounding: pressure to 1 decimal, soil moisture to 3).
#[cfg(test)]
pub(crate) fn fixture_archive_two_days_json() -> &'static str {
    r#"{
      "latitude": 24.80,
      "longitude": 92.35,
      "hourly": {
        "start": 1740787200,
        "end": 1740960000,
        "interval": 21600,
        "variables": [
          [1008.27, 1008.27, 1008.27, 1008.27, 1007.11, 1007.11, 1007.11, 1007.11],
          [0.1234, 0.1234, 0.1234, 0.1234, 0.1434, 0.1434, 0.1434, 0.1434],
          [0.2234, 0.2234, 0.2234, 0.2234, 0.2434, 0.2434, 0.2434, 0.2434],
          [0.3234, 0.3234, 0.3234, 0.3234, 0.3434, 0.3434, 0.3434, 0.3434],
          [0.4234, 0.4234, 0.4234, 0.4234, 0.4434, 0.4434, 0.4434, 0.4434],
          [30.5, 30.5, 30.5, 30.5, 31.0, 31.0, 31.0, 31.0],
          [18.5, 18.5, 18.5, 18.5, 19.0, 19.0, 19.0, 19.0],
          [24.5, 24.5, 24.5, 24.5, 25.0, 25.0, 25.0, 25.0]
        ]
      },
      "daily": {
        "start": 1740787200,
        "end": 1740960000,
        "interval": 86400,
        "variables": [
          [12.5, 0.0],
          [4.2, 5.0],
          [180.0, 200.0],
          [3.1, 2.9],
          [9.9, 11.2]
        ]
      }
    }"#
}

/// Flood response for the Longai gauge, same two days as the archive
/// fixture, both readings present.
#[cfg(test)]
pub(crate) fn fixture_flood_longai_json() -> &'static str {
    r#"{
      "latitude": 24.80,
      "longitude": 92.35,
      "hourly": null,
      "daily": {
        "start": 1740787200,
        "end": 1740960000,
        "interval": 86400,
        "variables": [
          [42.0, 45.5]
        ]
      }
    }"#
}

/// Kushiyara gauge with a null second reading: the flood model has no
/// coverage for that day. Must decode to a missing value, not an error.
#[cfg(test)]
pub(crate) fn fixture_flood_kushiyara_missing_day_json() -> &'static str {
    r#"{
      "latitude": 24.6266,
      "longitude": 91.7782,
      "hourly": null,
      "daily": {
        "start": 1740787200,
        "end": 1740960000,
        "interval": 86400,
        "variables": [
          [30.0, null]
        ]
      }
    }"#
}

/// Singla gauge, both readings present.
#[cfg(test)]
pub(crate) fn fixture_flood_singla_json() -> &'static str {
    r#"{
      "latitude": 24.68216,
      "longitude": 92.4457,
      "hourly": null,
      "daily": {
        "start": 1740787200,
        "end": 1740960000,
        "interval": 86400,
        "variables": [
          [12.0, 13.0]
        ]
      }
    }"#
}

/// A flood response whose span (April) shares no dates with the archive
/// fixture (March). Merging this against the feature table must fail.
#[cfg(test)]
pub(crate) fn fixture_flood_disjoint_dates_json() -> &'static str {
    r#"{
      "latitude": 24.68216,
      "longitude": 92.4457,
      "hourly": null,
      "daily": {
        "start": 1743465600,
        "end": 1743638400,
        "interval": 86400,
        "variables": [
          [99.0, 98.0]
        ]
      }
    }"#
}
