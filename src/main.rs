//! Flood Forecasting Service - Dashboard Host
//!
//! A server-side host that on each request:
//! 1. Fetches archive weather and river discharge data from Open-Meteo
//! 2. Engineers the derived feature columns the models were trained on
//! 3. Predicts next-day rainfall, discharge, and flood probability
//! 4. Serves headline metrics, the discharge chart, and flood alerts as JSON
//!
//! Responses are cached per window, so repeated dashboard loads for the
//! same range do not re-hit the upstream APIs.
//!
//! Usage:
//!   cargo run --release                          # Serve on port 8000
//!   cargo run --release -- --endpoint 8080       # Serve on port 8080
//!   cargo run --release -- --config other.toml   # Alternate basin config

use std::env;
use std::path::Path;

use chrono::{Duration, Utc};

use floodcast::artifacts::ModelSet;
use floodcast::config::BasinConfig;
use floodcast::endpoint::{self, AppState};
use floodcast::ingest::client::MeteoClient;

const DEFAULT_PORT: u16 = 8000;

fn main() {
    println!("🌊 Flood Forecasting Service");
    println!("=============================\n");

    // Parse command-line arguments
    let args: Vec<String> = env::args().collect();
    let mut port = DEFAULT_PORT;
    let mut config_path = "basin.toml".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--endpoint" => {
                if i + 1 < args.len() {
                    port = match args[i + 1].parse() {
                        Ok(p) => p,
                        Err(_) => {
                            eprintln!("Error: invalid port number: {}", args[i + 1]);
                            std::process::exit(1);
                        }
                    };
                    i += 2;
                } else {
                    eprintln!("Error: --endpoint requires a port number");
                    std::process::exit(1);
                }
            }
            "--config" => {
                if i + 1 < args.len() {
                    config_path = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--endpoint PORT] [--config PATH]", args[0]);
                std::process::exit(1);
            }
        }
    }

    // Load basin configuration
    println!("📊 Loading basin configuration from {}...", config_path);
    let basin = match BasinConfig::from_path(Path::new(&config_path)) {
        Ok(basin) => basin,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    println!("✓ Basin: {} ({} gauges)\n", basin.name, basin.gauges.len());

    // Load and validate model artifacts
    println!("📦 Loading model artifacts...");
    let models = match ModelSet::load(&basin.models) {
        Ok(models) => models,
        Err(e) => {
            eprintln!("\n❌ Model loading failed: {}\n", e);
            std::process::exit(1);
        }
    };
    println!("✓ Models loaded and schemas validated\n");

    let state = AppState {
        basin,
        models,
        client: MeteoClient::new(),
    };

    // Warm-up pass over the default window; a failure here is not fatal,
    // the endpoint still serves and later requests may succeed.
    let end = Utc::now().date_naive();
    let start = end - Duration::days(9);
    println!("🔄 Warming up: fetching {} to {}...", start, end);
    match endpoint::build_dashboard(&state, start, end) {
        Ok(payload) => {
            let m = &payload.metrics;
            println!("✓ Warm-up complete for {}", m.date);
            println!(
                "   Discharge: {:.1} m³/s ({:+.1}%)",
                m.discharge_m3s, m.discharge_delta_pct
            );
            println!(
                "   Rainfall:  {:.1} mm ({:+.1}%)",
                m.precipitation_mm, m.precipitation_delta_pct
            );
            if payload.flood_days.is_empty() {
                println!("   No flood alerts\n");
            } else {
                for day in &payload.flood_days {
                    println!(
                        "   🚨 Flood alert for {} (probability {:.2})",
                        day.date, day.probability
                    );
                }
                println!();
            }
        }
        Err(e) => {
            eprintln!("⚠️  Warm-up failed: {:?}", e);
            eprintln!("   Continuing; the endpoint will retry per request\n");
        }
    }

    // Serve the endpoint in the foreground
    if let Err(e) = endpoint::start_endpoint_server(port, state) {
        eprintln!("\n❌ Endpoint server error: {}", e);
        std::process::exit(1);
    }
}
