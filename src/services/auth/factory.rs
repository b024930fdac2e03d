/// Factory: build the `Authorizer` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::{
    Authorizer, AuthorizerSettings, HttpKeySetSource, KeySetCache, KeySetError, RetryPolicy,
};

pub fn build_authorizer(config: &Config) -> Result<Arc<Authorizer>, KeySetError> {
    let retry = RetryPolicy {
        attempts: config.jwks_fetch_attempts,
        ..RetryPolicy::default()
    };
    let source = HttpKeySetSource::new(config.jwks_url.clone(), config.jwks_fetch_timeout, retry)?;

    let keys = KeySetCache::new(
        Arc::new(source),
        config.jwks_cache_ttl,
        config.jwks_min_refresh_interval,
    );

    let settings = AuthorizerSettings {
        audience: config.auth_audience.clone(),
        issuer: config.auth_issuer.clone(),
        algorithms: config.auth_algorithms.clone(),
        leeway_seconds: config.access_token_leeway_seconds,
    };

    Ok(Arc::new(Authorizer::new(settings, keys)))
}
