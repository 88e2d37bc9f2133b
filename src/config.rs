use std::{env, path::PathBuf, str::FromStr};

use anyhow::Result;
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub system: System,
    #[serde(default)]
    pub dfm: Dfm,
    #[serde(default)]
    pub snapshot: Snapshot,
}

const SYSTEM_HOST: &str = "SYSTEM_HOST";
const SYSTEM_PORT: &str = "SYSTEM_PORT";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct System {
    pub host: String,
    pub port: u16,
}

impl Default for System {
    fn default() -> Self {
        System {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

const DFM_SYMBOLS: &str = "DFM_SYMBOLS";
const DFM_BROWSER_PATH: &str = "DFM_BROWSER_PATH";
const DFM_PAGE_LOAD_TIMEOUT_SECS: &str = "DFM_PAGE_LOAD_TIMEOUT_SECS";
const DFM_REGION_WAIT_TIMEOUT_SECS: &str = "DFM_REGION_WAIT_TIMEOUT_SECS";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Dfm {
    /// Tickers fetched on every stocks request, in response order.
    pub symbols: Vec<String>,
    /// Chrome binary override, empty means auto detect.
    pub browser_path: String,
    pub page_load_timeout_secs: u64,
    pub region_wait_timeout_secs: u64,
}

impl Default for Dfm {
    fn default() -> Self {
        Dfm {
            symbols: vec!["SALIK".to_string(), "DTC".to_string()],
            browser_path: String::new(),
            page_load_timeout_secs: 20,
            region_wait_timeout_secs: 15,
        }
    }
}

const SNAPSHOT_PATH: &str = "SNAPSHOT_PATH";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Snapshot {
    pub path: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            path: "static/stocks.csv".to_string(),
        }
    }
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| App::get().expect("Config error"));

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        if config_path.exists() {
            let config: App = config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize()?;
            return Ok(config.override_with_env());
        }

        Ok(App::from_env())
    }

    fn from_env() -> Self {
        App::default().override_with_env()
    }

    fn override_with_env(mut self) -> Self {
        if let Ok(host) = env::var(SYSTEM_HOST) {
            self.system.host = host;
        }

        if let Ok(port) = env::var(SYSTEM_PORT) {
            self.system.port = u16::from_str(&port).unwrap_or(8000);
        }

        if let Ok(symbols) = env::var(DFM_SYMBOLS) {
            let parsed = parse_symbols(&symbols);
            if !parsed.is_empty() {
                self.dfm.symbols = parsed;
            }
        }

        if let Ok(path) = env::var(DFM_BROWSER_PATH) {
            self.dfm.browser_path = path;
        }

        if let Ok(secs) = env::var(DFM_PAGE_LOAD_TIMEOUT_SECS) {
            self.dfm.page_load_timeout_secs = u64::from_str(&secs).unwrap_or(20);
        }

        if let Ok(secs) = env::var(DFM_REGION_WAIT_TIMEOUT_SECS) {
            self.dfm.region_wait_timeout_secs = u64::from_str(&secs).unwrap_or(15);
        }

        if let Ok(path) = env::var(SNAPSHOT_PATH) {
            self.snapshot.path = path;
        }

        self
    }
}

impl System {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Splits a comma separated ticker list, dropping empty entries.
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|symbol| !symbol.is_empty())
        .map(String::from)
        .collect()
}

fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}
