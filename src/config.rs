/*
 * Responsibility
 * - 環境変数の読み込み (.env は dotenvy 経由)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 * - IdP 設定 (domain, audience, issuer, algorithms) はハードコードしない
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,

    pub database_url: String,
    pub database_max_connections: u32,

    pub auth_domain: String,
    pub auth_audience: String,
    pub auth_issuer: String,
    pub auth_algorithms: Vec<Algorithm>,
    pub access_token_leeway_seconds: u64,

    pub jwks_url: Url,
    pub jwks_cache_ttl: Duration,
    pub jwks_min_refresh_interval: Duration,
    pub jwks_fetch_timeout: Duration,
    pub jwks_fetch_attempts: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
                None => Ok(default),
            }
        };

        let port = number("PORT", 3000)?;
        let port = u16::try_from(port).map_err(|_| ConfigError::Invalid("PORT"))?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let database_url = required("DATABASE_URL")?;
        let database_max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 5)?)
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        let auth_domain = required("AUTH0_DOMAIN")?;
        let auth_audience = required("API_AUDIENCE")?;
        let auth_issuer = lookup("AUTH_ISSUER")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| format!("https://{}/", auth_domain));

        let auth_algorithms =
            parse_algorithms(&lookup("AUTH_ALGORITHMS").unwrap_or_else(|| "RS256".to_string()))?;

        let access_token_leeway_seconds = number("ACCESS_TOKEN_LEEWAY_SECONDS", 60)?;

        let jwks_url = match lookup("JWKS_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Url::parse(raw.trim()).map_err(|_| ConfigError::Invalid("JWKS_URL"))?,
            None => Url::parse(&format!("https://{}/.well-known/jwks.json", auth_domain))
                .map_err(|_| ConfigError::Invalid("AUTH0_DOMAIN"))?,
        };

        let jwks_cache_ttl = Duration::from_secs(number("JWKS_CACHE_TTL_SECONDS", 600)?);
        let jwks_min_refresh_interval =
            Duration::from_secs(number("JWKS_MIN_REFRESH_SECONDS", 10)?);
        let jwks_fetch_timeout = Duration::from_secs(number("JWKS_FETCH_TIMEOUT_SECONDS", 5)?);

        let jwks_fetch_attempts = u32::try_from(number("JWKS_FETCH_ATTEMPTS", 3)?)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or(ConfigError::Invalid("JWKS_FETCH_ATTEMPTS"))?;

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            database_url,
            database_max_connections,
            auth_domain,
            auth_audience,
            auth_issuer,
            auth_algorithms,
            access_token_leeway_seconds,
            jwks_url,
            jwks_cache_ttl,
            jwks_min_refresh_interval,
            jwks_fetch_timeout,
            jwks_fetch_attempts,
        })
    }
}

// Only RSA algorithms: the key set publishes RSA public components (n, e).
fn parse_algorithms(raw: &str) -> Result<Vec<Algorithm>, ConfigError> {
    let mut algorithms = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let alg = Algorithm::from_str(name).map_err(|_| ConfigError::Invalid("AUTH_ALGORITHMS"))?;
        match alg {
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512 => {
                if !algorithms.contains(&alg) {
                    algorithms.push(alg);
                }
            }
            _ => return Err(ConfigError::Invalid("AUTH_ALGORITHMS")),
        }
    }

    if algorithms.is_empty() {
        return Err(ConfigError::Invalid("AUTH_ALGORITHMS"));
    }
    Ok(algorithms)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("DATABASE_URL", "postgres://localhost/coffee"),
        ("AUTH0_DOMAIN", "coffee.eu.auth0.com"),
        ("API_AUDIENCE", "drinks"),
    ];

    #[test]
    fn defaults_are_derived_from_the_domain() {
        let config = Config::from_lookup(lookup_from(BASE)).expect("config");

        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert_eq!(config.auth_domain, "coffee.eu.auth0.com");
        assert_eq!(config.auth_issuer, "https://coffee.eu.auth0.com/");
        assert_eq!(
            config.jwks_url.as_str(),
            "https://coffee.eu.auth0.com/.well-known/jwks.json"
        );
        assert_eq!(config.auth_algorithms, vec![Algorithm::RS256]);
        assert_eq!(config.jwks_cache_ttl, Duration::from_secs(600));
        assert_eq!(config.jwks_fetch_attempts, 3);
    }

    #[test]
    fn overrides_are_honoured() {
        let mut pairs = BASE.to_vec();
        pairs.extend_from_slice(&[
            ("PORT", "8080"),
            ("APP_ENV", "PROD"),
            ("AUTH_ISSUER", "https://issuer.example/"),
            ("AUTH_ALGORITHMS", "RS256, PS256,RS256"),
            ("JWKS_URL", "http://127.0.0.1:9000/jwks.json"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ]);
        let config = Config::from_lookup(lookup_from(&pairs)).expect("config");

        assert_eq!(config.addr.port(), 8080);
        assert!(config.app_env.is_production());
        assert_eq!(config.auth_issuer, "https://issuer.example/");
        assert_eq!(config.auth_algorithms, vec![Algorithm::RS256, Algorithm::PS256]);
        assert_eq!(config.jwks_url.as_str(), "http://127.0.0.1:9000/jwks.json");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn missing_required_values_fail() {
        let err = Config::from_lookup(lookup_from(&BASE[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("API_AUDIENCE"));

        let mut pairs = BASE.to_vec();
        pairs.push(("AUTH0_DOMAIN", "   "));
        let map_last_wins = lookup_from(&pairs);
        assert_eq!(
            Config::from_lookup(map_last_wins).unwrap_err(),
            ConfigError::Missing("AUTH0_DOMAIN")
        );
    }

    #[test]
    fn rejects_non_rsa_or_unknown_algorithms() {
        for raw in ["HS256", "ES256", "nope", " , "] {
            let mut pairs = BASE.to_vec();
            pairs.push(("AUTH_ALGORITHMS", raw));
            assert_eq!(
                Config::from_lookup(lookup_from(&pairs)).unwrap_err(),
                ConfigError::Invalid("AUTH_ALGORITHMS"),
                "{raw}"
            );
        }
    }

    #[test]
    fn rejects_zero_fetch_attempts_and_bad_numbers() {
        let mut pairs = BASE.to_vec();
        pairs.push(("JWKS_FETCH_ATTEMPTS", "0"));
        assert_eq!(
            Config::from_lookup(lookup_from(&pairs)).unwrap_err(),
            ConfigError::Invalid("JWKS_FETCH_ATTEMPTS")
        );

        let mut pairs = BASE.to_vec();
        pairs.push(("PORT", "99999"));
        assert_eq!(
            Config::from_lookup(lookup_from(&pairs)).unwrap_err(),
            ConfigError::Invalid("PORT")
        );
    }
}
