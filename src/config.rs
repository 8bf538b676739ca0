use anyhow::{Context, Result};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_urls: Vec<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub max_retries: usize,
    pub blocks_per_page: u64,
    pub transactions_per_page: usize,
    pub transaction_scan_window: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            json_rpc_urls: vec![DEFAULT_RPC_URL.to_string()],
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_retries: 3,
            blocks_per_page: 20,
            transactions_per_page: 25,
            transaction_scan_window: 50,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let json_rpc_urls = match lookup("JSON_RPC_URL") {
            Some(raw) => parse_urls(&raw)?,
            None => defaults.json_rpc_urls,
        };

        let poll_interval = Duration::from_secs(parse_or(
            &lookup,
            "POLL_INTERVAL_SECS",
            defaults.poll_interval.as_secs(),
        )?);
        let request_timeout = Duration::from_secs(parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?);

        Ok(Config {
            json_rpc_urls,
            poll_interval,
            request_timeout,
            max_retries: parse_or(&lookup, "RPC_MAX_RETRIES", defaults.max_retries)?,
            blocks_per_page: parse_or(&lookup, "BLOCKS_PER_PAGE", defaults.blocks_per_page)?,
            transactions_per_page: parse_or(
                &lookup,
                "TRANSACTIONS_PER_PAGE",
                defaults.transactions_per_page,
            )?,
            transaction_scan_window: parse_or(
                &lookup,
                "TRANSACTION_SCAN_WINDOW",
                defaults.transaction_scan_window,
            )?,
        })
    }
}

fn parse_urls(raw: &str) -> Result<Vec<String>> {
    let urls: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .collect();

    if urls.is_empty() {
        anyhow::bail!("JSON_RPC_URL is set but contains no URL");
    }
    Ok(urls)
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key} value: {raw:?}")),
        None => Ok(default),
    }
}
