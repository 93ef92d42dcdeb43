use std::env;

// Polling Configuration
pub const INITIAL_POLL_DELAY_MS: u64 = 500;
pub const POLL_INTERVAL_MS: u64 = 1000;

// Upstream Configuration
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:8080/xtmrnserver";

// Demo Configuration
pub const DEFAULT_WATCH_SYMBOLS: &str = "2330.TW,1101.TW";

pub struct Config {
    pub upstream_url: String,
    pub watch_symbols: Vec<String>,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            upstream_url: env::var("UPSTREAM_URL")
                .unwrap_or_else(|_| DEFAULT_UPSTREAM_URL.to_string()),
            watch_symbols: env::var("WATCH_SYMBOLS")
                .unwrap_or_else(|_| DEFAULT_WATCH_SYMBOLS.to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.upstream_url.starts_with("http://") && !self.upstream_url.starts_with("https://") {
            return Err(format!("Invalid upstream URL: {}", self.upstream_url));
        }

        if self.watch_symbols.is_empty() {
            return Err("WATCH_SYMBOLS must name at least one symbol".to_string());
        }

        Ok(())
    }

    pub fn log_config(&self) {
        println!("Quote Engine Configuration:");
        println!("  Upstream URL: {}", self.upstream_url);
        println!("  Watch Symbols: {}", self.watch_symbols.join(", "));
        println!("  Log Level: {}", self.log_level);
    }
}
