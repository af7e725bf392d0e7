use std::time::Duration;

use log::info;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Per-request timeout for the interview API.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Robust environment variable loading - tries runtime first, then
/// build-time embedded fallbacks (see build.rs).
fn robust_env_var(key: &str) -> Option<String> {
    // Load .env if present for development
    let _ = dotenvy::dotenv();

    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            info!("[ENV] Loaded {} from runtime environment", key);
            return Some(value);
        }
    }

    let embedded = match key {
        "API_BASE_URL" => option_env!("API_BASE_URL"),
        _ => None,
    };

    embedded
        .filter(|v| !v.is_empty())
        .map(|v| {
            info!("[ENV] Loaded {} from build-time embedded variables", key);
            v.to_string()
        })
}

/// Base URL of the remote interview service.
pub fn api_base_url() -> String {
    robust_env_var("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}
