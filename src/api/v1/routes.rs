/*
 * Responsibility
 * - URL 構造と、どの method にどの permission が必要か
 * - 公開 (GET /drinks, /health) と requires_auth で包んだ method を merge する
 */
use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::{
    api::v1::handlers::{
        drinks::{create_drink, delete_drink, list_drinks, list_drinks_detail, update_drink},
        health::health,
    },
    error::AppError,
    middleware::auth::requires_auth,
    state::AppState,
};

pub fn routes(state: &AppState) -> Router<AppState> {
    let auth = &state.auth;

    Router::new()
        .route("/health", get(health))
        .route(
            "/drinks",
            get(list_drinks).merge(requires_auth("post:drinks", auth.clone(), post(create_drink))),
        )
        .route(
            "/drinks-detail",
            requires_auth("get:drinks-detail", auth.clone(), get(list_drinks_detail)),
        )
        .route(
            "/drinks/{drink_id}",
            requires_auth("patch:drinks", auth.clone(), patch(update_drink)).merge(
                requires_auth("delete:drinks", auth.clone(), delete(delete_drink)),
            ),
        )
        .fallback(|| async { AppError::NotFound })
        .method_not_allowed_fallback(|| async { AppError::MethodNotAllowed })
}
