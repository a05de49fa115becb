/// Blocking acquisition client for the Open-Meteo APIs.
///
/// Wraps `reqwest::blocking::Client` with the two behaviors every refresh
/// relies on:
///
/// 1. An in-process response cache keyed by request signature. Successful
///    responses for a given (endpoint, coordinate, date range) are kept for
///    the life of the process, so repeated dashboard refreshes over the
///    same window do not re-fetch.
/// 2. Bounded retry with multiplicative backoff (base 200 ms, doubled per
///    attempt, 5 attempts) for transport failures and 5xx/429 statuses.
///    Decode failures and client-error statuses are not retried.
///
/// `fetch_window` runs the full acquisition: one archive request for the
/// basin weather station plus one flood request per river gauge, assembled
/// into the final observation table. Any stage failing aborts the whole
/// acquisition; a partial table is never returned.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::BasinConfig;
use crate::ingest::meteo::{self, MeteoRequest, MeteoResponse, RequestKind};
use crate::model::{FetchError, ObservationTable, River};

const DEFAULT_MAX_ATTEMPTS: u32 = 5;
const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(200);

pub struct MeteoClient {
    http: reqwest::blocking::Client,
    cache: Mutex<HashMap<String, MeteoResponse>>,
    cache_hits: AtomicUsize,
    max_attempts: u32,
    backoff_base: Duration,
}

impl MeteoClient {
    pub fn new() -> Self {
        MeteoClient {
            http: reqwest::blocking::Client::new(),
            cache: Mutex::new(HashMap::new()),
            cache_hits: AtomicUsize::new(0),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Number of requests answered from the cache since construction.
    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Pre-populates the cache, bypassing the network. Used by tests to
    /// drive the acquisition path against fixture responses.
    pub fn seed_cache(&self, request: &MeteoRequest, response: MeteoResponse) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request.signature(), response);
    }

    /// Fetches one request, consulting the cache first and retrying
    /// transient failures with multiplicative backoff.
    pub fn fetch(&self, request: &MeteoRequest) -> Result<MeteoResponse, FetchError> {
        let key = request.signature();

        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(response) = cache.get(&key) {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(response.clone());
            }
        }

        let url = request.url();
        let mut last_error = FetchError::Http("no attempts made".to_string());

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                std::thread::sleep(self.backoff_base * 2u32.pow(attempt - 1));
            }

            let response = match self.http.get(&url).send() {
                Ok(response) => response,
                Err(e) => {
                    last_error = FetchError::Http(e.to_string());
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                // Decode failures are contract violations, not transient.
                let decoded: MeteoResponse = response
                    .json()
                    .map_err(|e| FetchError::Decode(e.to_string()))?;
                self.cache
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .insert(key, decoded.clone());
                return Ok(decoded);
            } else if status.is_server_error() || status.as_u16() == 429 {
                last_error = FetchError::Status(status.as_u16());
            } else {
                return Err(FetchError::Status(status.as_u16()));
            }
        }

        Err(last_error)
    }

    /// Full acquisition for one date window: archive features for the basin
    /// weather station, discharge for each of the three river gauges,
    /// merged into one observation table covering exactly the requested
    /// inclusive span.
    pub fn fetch_window(
        &self,
        basin: &BasinConfig,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<ObservationTable, FetchError> {
        if start_date > end_date {
            return Err(FetchError::NoData(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }

        let features = self.fetch(&MeteoRequest {
            kind: RequestKind::Archive,
            latitude: basin.station.latitude,
            longitude: basin.station.longitude,
            start_date,
            end_date,
        })?;

        let mut targets = Vec::with_capacity(River::ALL.len());
        for river in River::ALL {
            let gauge = basin.gauge(river);
            let response = self.fetch(&MeteoRequest {
                kind: RequestKind::Flood,
                latitude: gauge.latitude,
                longitude: gauge.longitude,
                start_date,
                end_date,
            })?;
            targets.push((river, response));
        }

        let target_refs: Vec<(River, &MeteoResponse)> =
            targets.iter().map(|(river, response)| (*river, response)).collect();
        let table = meteo::assemble_table(&features, &target_refs)?;
        verify_span(&table, start_date, end_date)?;
        Ok(table)
    }
}

impl Default for MeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The acquisition contract: the assembled table covers exactly the
/// requested inclusive date span, one row per day.
fn verify_span(
    table: &ObservationTable,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<(), FetchError> {
    let expected_days = (end_date - start_date).num_days() + 1;
    let covered = table.first_date().zip(table.last_date());
    if table.len() as i64 != expected_days || covered != Some((start_date, end_date)) {
        return Err(FetchError::NoData(format!(
            "acquired table covers {:?}..{:?} ({} rows), requested {}..{}",
            table.first_date(),
            table.last_date(),
            table.len(),
            start_date,
            end_date
        )));
    }
    Ok(())
}
