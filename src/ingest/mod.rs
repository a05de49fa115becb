/// Data acquisition: Open-Meteo API contract and the cached HTTP client.

pub mod client;
pub mod meteo;

#[cfg(test)]
pub(crate) mod fixtures;
