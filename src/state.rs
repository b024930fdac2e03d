/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - drinks: DrinkStore, auth: Authorizer
 * - Clone 前提で持つ (内部は Arc で cheap)
 */
use std::sync::Arc;

use crate::repos::DrinkStore;
use crate::services::auth::Authorizer;

#[derive(Clone)]
pub struct AppState {
    pub drinks: Arc<dyn DrinkStore>,
    pub auth: Arc<Authorizer>,
}

impl AppState {
    pub fn new(drinks: Arc<dyn DrinkStore>, auth: Arc<Authorizer>) -> Self {
        Self { drinks, auth }
    }
}
