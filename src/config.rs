use crate::model::ConfigError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const CONFIG_PATH_ENV: &str = "OLX_SNIPER_CONFIG";

const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_PATH: &str = "seen_ads.json";
const DEFAULT_HEALTH_ADDR: &str = "0.0.0.0:8080";

/// Every key is optional here; required ones are checked after env overrides.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub search_url: Option<String>,
    pub webhook_url: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub poll_interval_secs: Option<u64>,
    pub fetch_timeout_secs: Option<u64>,
    pub webhook_timeout_secs: Option<u64>,
    pub base_url: Option<String>,
    pub seen_store_path: Option<String>,
    pub health_addr: Option<String>,
    pub debug_html_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub search_url: Url,
    pub base_url: Url,
    pub webhook_url: Url,
    pub keywords: Vec<String>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub webhook_timeout: Duration,
    pub store_path: PathBuf,
    pub health_addr: String,
    pub debug_html_dir: Option<PathBuf>,
}

/// Reads the optional JSON file, then lets the process environment override it.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let file = read_config_file(&path)?;
    resolve(file, |key| std::env::var(key).ok())
}

pub fn read_config_file(path: &str) -> Result<FileConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(FileConfig::default()),
        Err(e) => {
            return Err(ConfigError::File {
                path: path.to_string(),
                source: e,
            });
        }
    };
    serde_json::from_str(&content).map_err(|e| ConfigError::Json {
        path: path.to_string(),
        source: e,
    })
}

pub fn resolve<F>(file: FileConfig, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    let search_raw = lookup("SEARCH_URL")
        .or(file.search_url)
        .ok_or(ConfigError::Missing("SEARCH_URL"))?;
    let search_url = parse_http_url("SEARCH_URL", &search_raw)?;

    let webhook_raw = lookup("DISCORD_WEBHOOK")
        .or(file.webhook_url)
        .ok_or(ConfigError::Missing("DISCORD_WEBHOOK"))?;
    let webhook_url = parse_http_url("DISCORD_WEBHOOK", &webhook_raw)?;

    let raw_keywords = match lookup("KEYWORDS") {
        Some(list) => list.split(',').map(str::to_string).collect(),
        None => file.keywords.ok_or(ConfigError::Missing("KEYWORDS"))?,
    };
    let keywords = normalize_keywords(raw_keywords);
    if keywords.is_empty() {
        return Err(ConfigError::Invalid {
            key: "KEYWORDS",
            reason: "at least one non-blank keyword is required".into(),
        });
    }

    let base_url = match lookup("BASE_URL").or(file.base_url) {
        Some(raw) => parse_http_url("BASE_URL", &raw)?,
        None => origin_of(&search_url)?,
    };

    let poll_interval = seconds(
        "POLL_INTERVAL_SECS",
        lookup("POLL_INTERVAL_SECS"),
        file.poll_interval_secs,
        DEFAULT_POLL_INTERVAL_SECS,
    )?;
    let fetch_timeout = seconds(
        "FETCH_TIMEOUT_SECS",
        lookup("FETCH_TIMEOUT_SECS"),
        file.fetch_timeout_secs,
        DEFAULT_FETCH_TIMEOUT_SECS,
    )?;
    let webhook_timeout = seconds(
        "WEBHOOK_TIMEOUT_SECS",
        lookup("WEBHOOK_TIMEOUT_SECS"),
        file.webhook_timeout_secs,
        DEFAULT_WEBHOOK_TIMEOUT_SECS,
    )?;

    let store_path = lookup("SEEN_STORE_PATH")
        .or(file.seen_store_path)
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string());

    // Hosting platforms hand out only a port.
    let health_addr = lookup("HEALTH_ADDR")
        .or(file.health_addr)
        .or_else(|| lookup("PORT").map(|port| format!("0.0.0.0:{}", port.trim())))
        .unwrap_or_else(|| DEFAULT_HEALTH_ADDR.to_string());

    let debug_html_dir = lookup("DEBUG_HTML_DIR")
        .or(file.debug_html_dir)
        .map(PathBuf::from);

    Ok(AppConfig {
        search_url,
        base_url,
        webhook_url,
        keywords,
        poll_interval,
        fetch_timeout,
        webhook_timeout,
        store_path: PathBuf::from(store_path),
        health_addr,
        debug_html_dir,
    })
}

/// Trims, lower-cases and de-duplicates keywords, keeping first-seen order.
pub fn normalize_keywords(raw: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for keyword in raw {
        let k = keyword.trim().to_lowercase();
        if !k.is_empty() && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}

fn parse_http_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme `{}`", other),
        }),
    }
}

fn origin_of(search_url: &Url) -> Result<Url, ConfigError> {
    let origin = search_url.origin().ascii_serialization();
    Url::parse(&origin).map_err(|e| ConfigError::Invalid {
        key: "BASE_URL",
        reason: format!("cannot derive from SEARCH_URL: {}", e),
    })
}

fn seconds(
    key: &'static str,
    env: Option<String>,
    file: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match env {
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
            key,
            reason: format!("`{}` is not a whole number of seconds: {}", raw, e),
        })?,
        None => file.unwrap_or(default),
    };
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
