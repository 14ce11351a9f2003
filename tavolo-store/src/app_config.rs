use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub delivery: DeliveryConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DeliveryConfig {
    /// Upper bound on a single routing call, in milliseconds
    #[serde(default = "default_routing_timeout_ms")]
    pub routing_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotifyConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_routing_timeout_ms() -> u64 { 3000 }
fn default_queue_capacity() -> usize { 256 }
fn default_workers() -> usize { 2 }

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self { routing_timeout_ms: default_routing_timeout_ms() }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            workers: default_workers(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default").required(false))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of TAVOLO)
            // Eg.. `TAVOLO__NOTIFY__WORKERS=4` would set `notify.workers`
            .add_source(config::Environment::with_prefix("TAVOLO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
