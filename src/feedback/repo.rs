use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Like/dislike for one recipe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Like,
    Dislike,
}

impl Rating {
    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Like => "like",
            Rating::Dislike => "dislike",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown rating '{0}'")]
pub struct UnknownRating(String);

impl TryFrom<String> for Rating {
    type Error = UnknownRating;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "like" => Ok(Rating::Like),
            "dislike" => Ok(Rating::Dislike),
            _ => Err(UnknownRating(value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeFeedback {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub recipe_id: String,
    #[sqlx(try_from = "String")]
    pub rating: Rating,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// At most one rating per (user, recipe); the newest write wins.
pub async fn upsert(db: &PgPool, user_id: Uuid, recipe_id: &str, rating: Rating) -> anyhow::Result<RecipeFeedback> {
    let row = sqlx::query_as::<_, RecipeFeedback>(
        r#"
        INSERT INTO recipe_feedback (user_id, recipe_id, rating)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, recipe_id)
        DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()
        RETURNING user_id, recipe_id, rating, updated_at
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(rating.as_str())
    .fetch_one(db)
    .await
    .context("upsert recipe feedback")?;
    Ok(row)
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<RecipeFeedback>> {
    let rows = sqlx::query_as::<_, RecipeFeedback>(
        r#"
        SELECT user_id, recipe_id, rating, updated_at
        FROM recipe_feedback
        WHERE user_id = $1
        ORDER BY updated_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list recipe feedback")?;
    Ok(rows)
}

pub async fn delete(db: &PgPool, user_id: Uuid, recipe_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM recipe_feedback WHERE user_id = $1 AND recipe_id = $2")
        .bind(user_id)
        .bind(recipe_id)
        .execute(db)
        .await
        .context("delete recipe feedback")?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_uses_lowercase_wire_names() {
        assert_eq!(serde_json::to_string(&Rating::Dislike).unwrap(), "\"dislike\"");
        let parsed: Rating = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(parsed, Rating::Like);
        assert!(serde_json::from_str::<Rating>("\"meh\"").is_err());
        assert_eq!(Rating::try_from("dislike".to_string()).unwrap(), Rating::Dislike);
        assert!(Rating::try_from("Like".to_string()).is_err());
    }
}
