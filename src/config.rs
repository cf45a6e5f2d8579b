use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, PartialEq, Deserialize)]
pub struct Config {
    /// Number of frames in the buffer pool.
    pub pool_size: usize,
    /// Sync the file to durable storage after a successful flush.
    #[serde(default)]
    pub sync_on_flush: bool,
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("pool_size", 64)?
            .set_default("sync_on_flush", false)?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("PAGEBUF"));
        Ok(cfg.build()?.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config { pool_size: 64, sync_on_flush: false }
    }
}
