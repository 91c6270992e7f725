use anyhow::Context;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::{repo_types::MealPlanRow, AssembledPlan};

const COLUMNS: &str = "id, user_id, week, shopping_list, estimated_cost, created_at, updated_at";

pub async fn insert(db: &PgPool, user_id: Uuid, plan: &AssembledPlan) -> anyhow::Result<MealPlanRow> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        INSERT INTO meal_plans (id, user_id, week, shopping_list, estimated_cost)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(Json(&plan.week))
    .bind(&plan.shopping_list)
    .bind(plan.estimated_cost)
    .fetch_one(db)
    .await
    .context("insert meal plan")?;
    Ok(row)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<MealPlanRow>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM meal_plans
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list meal plans")?;
    Ok(rows)
}

pub async fn latest_for_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<MealPlanRow>> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM meal_plans
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#
    ))
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("latest meal plan")?;
    Ok(row)
}

pub async fn get(db: &PgPool, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<Option<MealPlanRow>> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM meal_plans
        WHERE id = $1 AND user_id = $2
        "#
    ))
    .bind(plan_id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("get meal plan")?;
    Ok(row)
}

/// Replaces the week of an owned plan; `None` when the caller does not own it.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    plan_id: Uuid,
    plan: &AssembledPlan,
) -> anyhow::Result<Option<MealPlanRow>> {
    let row = sqlx::query_as::<_, MealPlanRow>(&format!(
        r#"
        UPDATE meal_plans
           SET week = $3, shopping_list = $4, estimated_cost = $5, updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {COLUMNS}
        "#
    ))
    .bind(plan_id)
    .bind(user_id)
    .bind(Json(&plan.week))
    .bind(&plan.shopping_list)
    .bind(plan.estimated_cost)
    .fetch_optional(db)
    .await
    .context("update meal plan")?;
    Ok(row)
}

pub async fn delete(db: &PgPool, user_id: Uuid, plan_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM meal_plans WHERE id = $1 AND user_id = $2")
        .bind(plan_id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete meal plan")?;
    Ok(result.rows_affected() > 0)
}

// ---- Maintenance (not user scoped) ----

pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<MealPlanRow>> {
    let rows = sqlx::query_as::<_, MealPlanRow>(&format!(
        "SELECT {COLUMNS} FROM meal_plans ORDER BY created_at ASC"
    ))
    .fetch_all(db)
    .await
    .context("list all meal plans")?;
    Ok(rows)
}

pub async fn replace_contents(db: &PgPool, plan_id: Uuid, plan: &AssembledPlan) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        UPDATE meal_plans
           SET week = $2, shopping_list = $3, estimated_cost = $4, updated_at = now()
         WHERE id = $1
        "#,
    )
    .bind(plan_id)
    .bind(Json(&plan.week))
    .bind(&plan.shopping_list)
    .bind(plan.estimated_cost)
    .execute(db)
    .await
    .with_context(|| format!("rewrite meal plan {plan_id}"))?;
    Ok(())
}
