/*
 * Responsibility
 * - /drinks 系 handler
 * - Path/Json を Result で受け、rejection は共通の JSON envelope (404 / 422) に揃える
 * - 認可は routes 側の requires_auth が済ませている。ここでは Claims を受け取るだけ
 */
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};

use crate::{
    api::v1::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkLong, DrinkShort, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::Claims,
    },
    error::AppError,
    state::AppState,
};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(req)| req)
        .map_err(|rejection| AppError::unprocessable(rejection.body_text()))
}

fn drink_id(path: Result<Path<i32>, PathRejection>) -> Result<i32, AppError> {
    path.map(|Path(id)| id).map_err(|_| AppError::NotFound)
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<DrinkShort>>, AppError> {
    let drinks = state.drinks.list().await?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkShort::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    State(state): State<AppState>,
    Claims(_): Claims,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let drinks = state.drinks.list().await?;
    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkLong::from).collect(),
    )))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let req = body(payload)?;
    req.validate().map_err(AppError::unprocessable)?;

    let recipe = req.recipe.into_vec();
    let drink = state.drinks.create(req.title.trim(), &recipe).await?;

    tracing::info!(drink_id = drink.id, sub = ?claims.sub, "drink created");

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(drink)])))
}

pub async fn update_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    path: Result<Path<i32>, PathRejection>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<DrinkLong>>, AppError> {
    let id = drink_id(path)?;
    let req = body(payload)?;
    req.validate().map_err(AppError::unprocessable)?;

    let recipe = req.recipe.map(|r| r.into_vec());
    let drink = state
        .drinks
        .update(id, req.title.as_deref().map(str::trim), recipe.as_deref())
        .await?
        .ok_or(AppError::NotFound)?;

    tracing::info!(drink_id = drink.id, sub = ?claims.sub, "drink updated");

    Ok(Json(DrinksResponse::new(vec![DrinkLong::from(drink)])))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Claims(claims): Claims,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    let id = drink_id(path)?;

    if !state.drinks.delete(id).await? {
        return Err(AppError::NotFound);
    }

    tracing::info!(drink_id = id, sub = ?claims.sub, "drink deleted");

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
