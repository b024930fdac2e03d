use super::error::{AuthError, HeaderProblem};

/// Pull the token out of a raw `Authorization` header value.
///
/// The header must be exactly `Bearer <token>`: two whitespace separated
/// parts, the first one case-insensitively equal to `bearer`.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let raw = header
        .filter(|h| !h.trim().is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let mut parts = raw.split_whitespace();

    // Non-empty after trim, so there is at least one part.
    let scheme = parts.next().unwrap_or_default();
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidHeader(HeaderProblem::MissingScheme));
    }

    let token = parts
        .next()
        .ok_or(AuthError::InvalidHeader(HeaderProblem::MissingToken))?;

    if parts.next().is_some() {
        return Err(AuthError::InvalidHeader(HeaderProblem::ExtraParts));
    }

    Ok(token)
}
