//! Shared test helpers: fixed RSA keys, token minting and an in-process key source.
//!
//! `PRIMARY_*` is the key published in test key sets. `ROGUE_*` is a second
//! key pair used to sign tokens the published key cannot verify (or to play
//! the "rotated in" key).
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::services::auth::{
    Authorizer, AuthorizerSettings, KeySetCache, KeySetError, KeySetSource,
    jwks::{JsonWebKeySet, SigningKey},
};

pub const TEST_ISSUER: &str = "https://coffee-shop.test/";
pub const TEST_AUDIENCE: &str = "drinks";

pub const PRIMARY_KEY_PEM: &str = include_str!("../testdata/rsa_primary.pem");
const PRIMARY_N: &str = "0NcJaDac6_cntrAuWf2Zuo4EGrB2QE-xDZY7d3JdQi8ukq9ge_J0umbIswbwz7NtG6obq3em4THA3A9Bw2B_Als1vu2lUNXotUMoDXIVyWP5Zc27wklHMdFYFRlT8jHZBzZXgn8LVAzRnMochH0EjJUINZIN_7GH5aEkzzFpWdJqknKs2BC5zzinOg9XSQPs64EdCKZmP9aTTHBU3heO7L_yKyn50GIc3ytMhiChSP_MeDZ3mBORQT7zq9aGBUeAKcTWlvZ1B4pCbOvUjFd9PQwseMOsPIed1T7qqzyIUZvox7jhLe9vRK-PmcV61WCUSwDpQ2QIQOd6-1dkiZisFw";

pub const ROGUE_KEY_PEM: &str = include_str!("../testdata/rsa_rogue.pem");
const ROGUE_N: &str = "yI6DsxY496JZcZeZLGVSGzRAMKCFv5gZahNV0aKjsaLWmTFXjjZD08OSiGJDuozU7hDcWVwJxwH-vSqocvAYwGtjbd-6bDx5reKMys3267QGWe0qHmVMQFj9c8jxe6WupHs3eAylBtUloBon_BH6Ik2EdX2GvSzZZ5RpTmY4ef0Qw6zLYmaaXHYWleVEPpoAiw-xqtWSrnKT-Qkg4VpovQ-chfFZfH8ni_6htnPkEbVCVw5skOIqmrCD8TWrFKSWFrEeheeRK79dUS2AwXrjItVTF5Oqm8IugMXFHUTV5mrpjuR9wWgCz8NN0sXCToLw29nltHCbuTXGUlf_M9oE-Q";

const RSA_E: &str = "AQAB";

fn rsa_jwk(kid: &str, n: &str) -> SigningKey {
    SigningKey {
        kid: kid.to_string(),
        kty: "RSA".to_string(),
        key_use: "sig".to_string(),
        n: n.to_string(),
        e: RSA_E.to_string(),
    }
}

/// Public half of the primary key, published under `kid`.
pub fn primary_jwk(kid: &str) -> SigningKey {
    rsa_jwk(kid, PRIMARY_N)
}

/// Public half of the rogue key, published under `kid`.
pub fn rogue_jwk(kid: &str) -> SigningKey {
    rsa_jwk(kid, ROGUE_N)
}

pub fn now() -> u64 {
    chrono::Utc::now().timestamp() as u64
}

/// Claims accepted by [`test_authorizer`], expiring in one hour.
pub fn claims_with(permissions: &[&str]) -> Value {
    let now = now();
    json!({
        "iss": TEST_ISSUER,
        "sub": "auth0|barista",
        "aud": TEST_AUDIENCE,
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

/// RS256-sign `claims` with an RSA private key in PEM.
pub fn sign(private_key_pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);

    let key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).expect("test key pem");
    jsonwebtoken::encode(&header, claims, &key).expect("sign test token")
}

/// A token with arbitrary header/payload JSON and a junk signature.
pub fn craft_raw_token(header: &Value, payload: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(header.to_string());
    let payload = URL_SAFE_NO_PAD.encode(payload.to_string());
    let signature = URL_SAFE_NO_PAD.encode(b"not-a-signature");
    format!("{header}.{payload}.{signature}")
}

/// In-process key source; counts fetches and can be rotated or made to fail.
pub struct StaticKeySource {
    set: Mutex<Option<JsonWebKeySet>>,
    fetches: AtomicUsize,
    latency: Duration,
}

impl StaticKeySource {
    pub fn new(keys: Vec<SigningKey>) -> Arc<Self> {
        Arc::new(Self {
            set: Mutex::new(Some(JsonWebKeySet { keys })),
            fetches: AtomicUsize::new(0),
            latency: Duration::ZERO,
        })
    }

    /// Every fetch fails with a 503.
    pub fn failing() -> Arc<Self> {
        Self::failing_after(Duration::ZERO)
    }

    /// Every fetch takes `latency` and then fails with a 503.
    pub fn failing_after(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            set: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            latency,
        })
    }

    pub fn rotate(&self, keys: Vec<SigningKey>) {
        *self.set.lock().expect("lock") = Some(JsonWebKeySet { keys });
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch(&self) -> Result<JsonWebKeySet, KeySetError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.set
            .lock()
            .expect("lock")
            .clone()
            .ok_or(KeySetError::Status(StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Authorizer expecting [`TEST_ISSUER`]/[`TEST_AUDIENCE`], with no forced-refresh throttle.
pub fn test_authorizer(source: Arc<StaticKeySource>) -> Authorizer {
    let settings = AuthorizerSettings {
        audience: TEST_AUDIENCE.to_string(),
        issuer: TEST_ISSUER.to_string(),
        algorithms: vec![Algorithm::RS256],
        leeway_seconds: 0,
    };
    let keys = KeySetCache::new(source, Duration::from_secs(600), Duration::ZERO);
    Authorizer::new(settings, keys)
}
