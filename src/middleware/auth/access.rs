//! Permission gate for protected routes.
//!
//! `requires_auth(permission, authorizer, handler)` wraps a handler in a
//! middleware that runs the bearer pipeline (header -> keys -> token ->
//! permission) and only calls the handler when every step passes. The
//! verified `TokenClaims` are put in the request extensions; handlers read
//! them through the `Claims` extractor.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::error::AppError;
use crate::services::auth::Authorizer;

#[derive(Clone)]
struct PermissionGate {
    authorizer: Arc<Authorizer>,
    permission: &'static str,
}

/// Wrap `handler` so it only runs for tokens carrying `permission`.
///
/// An empty `permission` accepts any verified token.
///
/// ```ignore
/// let route = get(list_drinks).merge(requires_auth("post:drinks", state.auth.clone(), post(create_drink)));
/// ```
pub fn requires_auth<S>(
    permission: &'static str,
    authorizer: Arc<Authorizer>,
    handler: MethodRouter<S>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let gate = PermissionGate {
        authorizer,
        permission,
    };
    handler.route_layer(middleware::from_fn_with_state(gate, authorize))
}

async fn authorize(
    State(gate): State<PermissionGate>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());

    let claims = match gate
        .authorizer
        .authorize(header.as_deref(), gate.permission)
        .await
    {
        Ok(claims) => claims,
        Err(err) => {
            tracing::warn!(
                code = err.code(),
                error = %err,
                permission = gate.permission,
                "authorization failed"
            );
            return Err(err.into());
        }
    };

    tracing::debug!(sub = ?claims.sub, permission = gate.permission, "authorized");

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
