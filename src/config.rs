use crate::domain::{CurrencyPolicy, Decimal, SdId};
use crate::engine::ExchangeRate;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub sd_api_url: String,
    pub sd_login: String,
    pub sd_password: String,
    /// Peer cache service to prefer for heavy entities; direct upstream
    /// when unset.
    pub cache_service_url: Option<String>,
    pub exchange_rate: ExchangeRate,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    /// Agent ids forming the iroda cohort; empty disables the cohort cut.
    pub iroda_agents: HashSet<SdId>,
    pub currency_policy: CurrencyPolicy,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let sd_api_url = env_map
            .get("SD_API_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("SD_API_URL".to_string()))?;

        let sd_login = env_map
            .get("SD_LOGIN")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("SD_LOGIN".to_string()))?;

        let sd_password = env_map
            .get("SD_PASSWORD")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("SD_PASSWORD".to_string()))?;

        let cache_service_url = env_map.get("CACHE_SERVICE_URL").cloned();

        let exchange_rate = match env_map.get("EXCHANGE_RATE") {
            None => ExchangeRate::default(),
            Some(raw) => {
                let value = Decimal::from_str_canonical(raw).map_err(|_| {
                    ConfigError::InvalidValue(
                        "EXCHANGE_RATE".to_string(),
                        "must be a decimal number".to_string(),
                    )
                })?;
                ExchangeRate::try_new(value).map_err(|e| {
                    ConfigError::InvalidValue("EXCHANGE_RATE".to_string(), e.to_string())
                })?
            }
        };

        let cache_ttl_secs = env_map
            .get("CACHE_TTL_SECS")
            .map(|s| s.as_str())
            .unwrap_or("300")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "CACHE_TTL_SECS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let upstream_timeout_ms = env_map
            .get("UPSTREAM_TIMEOUT_MS")
            .map(|s| s.as_str())
            .unwrap_or("5000")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "UPSTREAM_TIMEOUT_MS".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let iroda_agents = parse_iroda_agents_from_map(&env_map)?;
        let currency_policy = parse_currency_policy_from_map(&env_map);

        Ok(Config {
            port,
            sd_api_url,
            sd_login,
            sd_password,
            cache_service_url,
            exchange_rate,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            upstream_timeout: Duration::from_millis(upstream_timeout_ms),
            iroda_agents,
            currency_policy,
        })
    }
}

#[cfg_attr(not(test), allow(dead_code))]
fn parse_iroda_agents_from_map(
    env_map: &HashMap<String, String>,
) -> Result<HashSet<SdId>, ConfigError> {
    if let Some(ids_str) = env_map.get("IRODA_AGENTS") {
        Ok(parse_id_list(ids_str))
    } else if let Some(file_path) = env_map.get("IRODA_AGENTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "IRODA_AGENTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        Ok(content
            .lines()
            .map(|line| line.trim())
            .filter(|s| !s.is_empty())
            .map(SdId::new)
            .collect())
    } else {
        Ok(HashSet::new())
    }
}

/// Classification sets start from the standard type catalog; each env
/// variable, when present, replaces its set wholesale.
#[cfg_attr(not(test), allow(dead_code))]
fn parse_currency_policy_from_map(env_map: &HashMap<String, String>) -> CurrencyPolicy {
    let mut policy = CurrencyPolicy::standard();
    if let Some(ids) = env_map.get("USD_PAYMENT_TYPES") {
        policy.usd_payment_types = parse_id_list(ids);
    }
    if let Some(ids) = env_map.get("NONCASH_PAYMENT_TYPES") {
        policy.noncash_payment_types = parse_id_list(ids);
    }
    if let Some(ids) = env_map.get("CLICK_PAYMENT_TYPES") {
        policy.click_payment_types = parse_id_list(ids);
    }
    if let Some(ids) = env_map.get("USD_PRICE_TYPES") {
        policy.usd_price_types = parse_id_list(ids);
    }
    policy
}

fn parse_id_list(raw: &str) -> HashSet<SdId> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(SdId::new)
        .collect()
}
