//! Authorization failures.
//!
//! Every step of the bearer pipeline fails with one of these. Each variant
//! carries a stable `code`, a human readable `description` and the HTTP status
//! the boundary renders it with.
use axum::http::StatusCode;
use std::fmt;
use thiserror::Error;

/// Why an `Authorization` header that *is* present was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProblem {
    /// First part is not `Bearer` (case-insensitive).
    MissingScheme,
    /// Only `Bearer`, nothing after it.
    MissingToken,
    /// More than `Bearer <token>`.
    ExtraParts,
}

impl fmt::Display for HeaderProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingScheme => "scheme is not bearer",
            Self::MissingToken => "token is missing",
            Self::ExtraParts => "too many parts",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingHeader,

    #[error("authorization header is malformed: {0}")]
    InvalidHeader(HeaderProblem),

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no signing key matches the token key id")]
    NoMatchingKey,

    #[error("token expired")]
    TokenExpired,

    #[error("token audience or issuer is invalid")]
    InvalidClaims,

    #[error("token could not be decoded")]
    MalformedToken,

    #[error("token carries no permissions claim")]
    PermissionsMissing,

    #[error("token lacks the required permission")]
    PermissionDenied,

    #[error("signing keys unavailable: {0}")]
    KeyRetrieval(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingHeader => "authorization_header_missing",
            Self::InvalidHeader(_)
            | Self::MissingKeyId
            | Self::NoMatchingKey
            | Self::MalformedToken
            | Self::KeyRetrieval(_) => "invalid_header",
            Self::TokenExpired => "token_expired",
            Self::InvalidClaims | Self::PermissionsMissing => "invalid_claims",
            Self::PermissionDenied => "not_authorised",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header is expected.",
            Self::InvalidHeader(HeaderProblem::MissingScheme) => {
                "Authorization header must start with \"Bearer\"."
            }
            Self::InvalidHeader(HeaderProblem::MissingToken) => "Token not found.",
            Self::InvalidHeader(HeaderProblem::ExtraParts) => {
                "Authorization header must be bearer token."
            }
            Self::MissingKeyId => "Authorization malformed.",
            Self::NoMatchingKey => "Unable to find the appropriate key.",
            Self::TokenExpired => "Token expired.",
            Self::InvalidClaims => "Incorrect claims. Please, check the audience and issuer.",
            Self::MalformedToken => "Unable to parse authentication token.",
            Self::PermissionsMissing => "Permissions not included in JWT.",
            Self::PermissionDenied => "Permission not found.",
            Self::KeyRetrieval(_) => "Unable to fetch signing keys.",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader
            | Self::InvalidHeader(_)
            | Self::MissingKeyId
            | Self::TokenExpired
            | Self::InvalidClaims => StatusCode::UNAUTHORIZED,
            Self::NoMatchingKey
            | Self::MalformedToken
            | Self::PermissionsMissing
            | Self::KeyRetrieval(_) => StatusCode::BAD_REQUEST,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
        }
    }

    /// Classify a `jsonwebtoken` decode failure.
    pub(crate) fn from_jwt(err: &jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => Self::TokenExpired,
            ErrorKind::InvalidAudience
            | ErrorKind::InvalidIssuer
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => Self::InvalidClaims,
            _ => Self::MalformedToken,
        }
    }
}
