use std::env;

use anyhow::{bail, Context, Result};

/// Connection string used when `MONGODB_URI` is not set.
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017/stockforumx";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub mongodb_uri: String,
    pub sweep_interval_seconds: u64, // 60 (1 minute)
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mongodb_uri =
            env::var("MONGODB_URI").unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string());
        if !mongodb_uri.starts_with("mongodb://") && !mongodb_uri.starts_with("mongodb+srv://") {
            bail!("MONGODB_URI must start with \"mongodb://\" or \"mongodb+srv://\"");
        }

        let sweep_interval_seconds: u64 = env::var("SWEEP_INTERVAL")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("SWEEP_INTERVAL must be a whole number of seconds")?;
        if sweep_interval_seconds == 0 {
            bail!("SWEEP_INTERVAL must be at least 1 second");
        }

        Ok(Self {
            mongodb_uri,
            sweep_interval_seconds,
        })
    }
}
