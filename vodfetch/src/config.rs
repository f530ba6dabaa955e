use std::{fs::File, path::Path};

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub workers: Option<usize>,
    pub request_timeout: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_millis: Option<u64>,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let file = File::open(path.as_ref())?;
    let config: Config = serde_yaml::from_reader(file)?;
    Ok(config)
}
