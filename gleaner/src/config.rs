use anyhow::{Context, Result};
use gleaner_webdriver::Browser;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "gleaner";
const ENV_PREFIX: &str = "GLEANER";

pub const DEFAULT_EVENTS_URL: &str = "https://www.python.org/events/python-events/";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:4444";

#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub webdriver: WebDriverConfig,
    #[serde(default)]
    pub events: EventsConfig,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct WebDriverConfig {
    #[serde(default = "default_webdriver_url")]
    pub url: String,
    #[serde(default = "default_browser")]
    pub browser: Browser,
    #[serde(default)]
    pub arguments: Vec<String>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_url")]
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            storage: StorageConfig::default(),
            webdriver: WebDriverConfig::default(),
            events: EventsConfig::default(),
        }
    }
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        WebDriverConfig {
            url: default_webdriver_url(),
            browser: default_browser(),
            arguments: vec![],
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        EventsConfig {
            url: default_events_url(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_webdriver_url() -> String {
    DEFAULT_WEBDRIVER_URL.to_owned()
}

fn default_browser() -> Browser {
    Browser::Edge
}

fn default_events_url() -> String {
    DEFAULT_EVENTS_URL.to_owned()
}

/// Load the config from `path`, or from an optional `gleaner.{toml,json}` in
/// the working directory. Environment variables such as
/// `GLEANER_WEBDRIVER__URL` override file values.
pub fn read(path: Option<&Path>) -> Result<Config> {
    let file = match path {
        Some(path) => config::File::from(path),
        None => config::File::with_name(CONFIG_FILE).required(false),
    };

    let config = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .context("reading config")?
        .try_deserialize()
        .context("parsing config")?;

    Ok(config)
}
