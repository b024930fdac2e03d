/*
 * Responsibility
 * - store 層が上位に伝える意味の定義
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("db error")]
    Db(#[source] sqlx::Error),
    #[error("conflict")]
    Conflict,
    #[error("stored recipe is not valid json")]
    CorruptRecipe(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn from_sqlx(e: sqlx::Error) -> Self {
        // 23505: unique_violation (drinks.title)
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some("23505")
        {
            return StoreError::Conflict;
        }
        StoreError::Db(e)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::from_sqlx(e)
    }
}
