/*
 * Responsibility
 * - drinks CRUD (DrinkStore trait の裏側)
 * - recipe は JSON text カラムで保持、title は UNIQUE 前提
 */
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::repos::error::StoreResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drink {
    pub id: i32,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Persistence for drinks.
///
/// Implementations must be shareable across requests (`Arc<dyn DrinkStore>`).
#[async_trait]
pub trait DrinkStore: Send + Sync + 'static {
    async fn list(&self) -> StoreResult<Vec<Drink>>;

    // Fails with `StoreError::Conflict` when the title is taken.
    async fn create(&self, title: &str, recipe: &[Ingredient]) -> StoreResult<Drink>;

    // `None` fields are left untouched. Returns `Ok(None)` when `id` does not exist.
    async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> StoreResult<Option<Drink>>;

    // Returns whether a row was deleted.
    async fn delete(&self, id: i32) -> StoreResult<bool>;
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DrinkRow {
    id: i32,
    title: String,
    recipe: String,
}

impl TryFrom<DrinkRow> for Drink {
    type Error = serde_json::Error;

    fn try_from(row: DrinkRow) -> Result<Self, Self::Error> {
        Ok(Drink {
            id: row.id,
            title: row.title,
            recipe: serde_json::from_str(&row.recipe)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgDrinkStore {
    pool: PgPool,
}

impl PgDrinkStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrinkStore for PgDrinkStore {
    async fn list(&self) -> StoreResult<Vec<Drink>> {
        let rows = sqlx::query_as::<_, DrinkRow>(
            r#"
            SELECT id, title, recipe
            FROM drinks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut drinks = Vec::with_capacity(rows.len());
        for row in rows {
            drinks.push(Drink::try_from(row)?);
        }
        Ok(drinks)
    }

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> StoreResult<Drink> {
        let recipe = serde_json::to_string(recipe)?;

        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            INSERT INTO drinks (title, recipe)
            VALUES ($1, $2)
            RETURNING id, title, recipe
            "#,
        )
        .bind(title)
        .bind(recipe)
        .fetch_one(&self.pool)
        .await?;

        Ok(Drink::try_from(row)?)
    }

    async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> StoreResult<Option<Drink>> {
        let recipe = recipe.map(serde_json::to_string).transpose()?;

        let row = sqlx::query_as::<_, DrinkRow>(
            r#"
            UPDATE drinks
            SET
                title = COALESCE($2, title),
                recipe = COALESCE($3, recipe)
            WHERE id = $1
            RETURNING id, title, recipe
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(recipe)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Drink::try_from).transpose()?)
    }

    async fn delete(&self, id: i32) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM drinks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub use memory::MemoryDrinkStore;
