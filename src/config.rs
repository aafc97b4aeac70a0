use serde::Deserialize;

use crate::error::Result;
use crate::value_err;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub log_level: String,

    /// Namespace prefix of every storage table.
    pub table_prefix: String,

    /// Limit applied when a query does not request one.
    pub default_query_limit: u64,
    /// Upper bound of any requested limit.
    pub max_query_limit: u64,

    pub decimal_mark: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: "info".to_string(),
            table_prefix: "cargo__".to_string(),
            default_query_limit: 100,
            max_query_limit: 5000,
            decimal_mark: ".".to_string(),
        }
    }
}

impl Config {
    pub fn new(file: &str) -> Result<Config> {
        let mut cfg = config::Config::builder()
            .set_default("log_level", "info")?
            .set_default("table_prefix", "cargo__")?
            .set_default("default_query_limit", 100)?
            .set_default("max_query_limit", 5000)?
            .set_default("decimal_mark", ".")?;
        if !file.is_empty() {
            cfg = cfg.add_source(config::File::with_name(file))
        }
        cfg = cfg.add_source(config::Environment::with_prefix("CARGOQL"));
        let cfg: Config = cfg.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_query_limit == 0 {
            return Err(value_err!("max_query_limit must be positive"));
        }
        if self.default_query_limit > self.max_query_limit {
            return Err(value_err!(
                "default_query_limit {} exceeds max_query_limit {}",
                self.default_query_limit,
                self.max_query_limit
            ));
        }
        Ok(())
    }
}
