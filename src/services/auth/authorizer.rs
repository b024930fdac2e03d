use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::error::AuthError;
use super::header::extract_bearer;
use super::jwks::JsonWebKeySet;
use super::key_cache::KeySetCache;

/// Claims of a verified access token.
///
/// Only built after the signature, `exp`, `aud` and `iss` have been checked.
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    // `iss`, `aud` and `exp` default at the serde layer so that an absent
    // claim reaches `Validation` and is reported as a missing required claim.
    #[serde(default)]
    pub iss: String,
    // String or array of strings; the audience check itself is done by jsonwebtoken.
    #[serde(default)]
    pub aud: serde_json::Value,
    #[serde(default)]
    pub exp: u64,

    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub iat: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,

    /// `None` means the claim was absent, which is different from an empty list.
    #[serde(default)]
    pub permissions: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenClaims {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_deref()
            .is_some_and(|perms| perms.iter().any(|p| p == permission))
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizerSettings {
    pub audience: String,
    pub issuer: String,
    pub algorithms: Vec<Algorithm>,
    pub leeway_seconds: u64,
}

/// Bearer token authorizer backed by a remote JSON Web Key Set.
pub struct Authorizer {
    keys: KeySetCache,
    validation: Validation,
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("keys", &self.keys)
            .field("validation", &self.validation)
            .finish()
    }
}

impl Authorizer {
    pub fn new(settings: AuthorizerSettings, keys: KeySetCache) -> Self {
        let primary = settings
            .algorithms
            .first()
            .copied()
            .unwrap_or(Algorithm::RS256);

        let mut validation = Validation::new(primary);
        if !settings.algorithms.is_empty() {
            validation.algorithms = settings.algorithms.clone();
        }
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = settings.leeway_seconds;

        Self { keys, validation }
    }

    /// Run the whole pipeline for one request.
    ///
    /// header -> key set -> verified claims -> permission. The first failing
    /// step ends the request with its error.
    pub async fn authorize(
        &self,
        header: Option<&str>,
        required_permission: &str,
    ) -> Result<TokenClaims, AuthError> {
        let token = extract_bearer(header)?;

        let keys = self
            .keys
            .keys()
            .await
            .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?;

        let claims = self.verify_decode(token, keys).await?;

        check_permission(required_permission, &claims)?;

        Ok(claims)
    }

    /// Verify the token signature with the key named by its `kid`, then validate claims.
    ///
    /// A `kid` missing from `keys` triggers one key set refresh before giving up.
    pub async fn verify_decode(
        &self,
        token: &str,
        keys: Arc<JsonWebKeySet>,
    ) -> Result<TokenClaims, AuthError> {
        let header = jsonwebtoken::decode_header(token).map_err(|_| AuthError::MalformedToken)?;

        let kid = header
            .kid
            .filter(|kid| !kid.is_empty())
            .ok_or(AuthError::MissingKeyId)?;

        let decoding_key = match keys.find(&kid) {
            Some(key) => rsa_key(&key.n, &key.e)?,
            None => {
                let refreshed = self
                    .keys
                    .refresh_for_unknown_kid(&keys)
                    .await
                    .map_err(|e| AuthError::KeyRetrieval(e.to_string()))?;
                let key = refreshed.find(&kid).ok_or(AuthError::NoMatchingKey)?;
                rsa_key(&key.n, &key.e)?
            }
        };

        jsonwebtoken::decode::<TokenClaims>(token, &decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::from_jwt(&e))
    }
}

fn rsa_key(n: &str, e: &str) -> Result<DecodingKey, AuthError> {
    DecodingKey::from_rsa_components(n, e).map_err(|_| AuthError::MalformedToken)
}

/// An empty `required` permission means the route only needs a valid token,
/// but the token must still carry a `permissions` claim.
pub fn check_permission(required: &str, claims: &TokenClaims) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::PermissionsMissing);
    }

    if required.is_empty() || claims.has_permission(required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied)
    }
}
