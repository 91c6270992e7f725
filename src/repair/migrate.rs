use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::Catalog,
    plans::{assemble_week, repo, AssembledPlan, DayPlan, PlanError},
};

#[derive(Debug, Default)]
pub struct MigrationReport {
    pub scanned: usize,
    pub migrated: usize,
    pub failed: Vec<(Uuid, String)>,
}

/// `None` when every slot already carries an id, otherwise the week rebuilt
/// with canonical slots and a fresh shopping list.
pub fn plan_migration(catalog: &Catalog, week: &[DayPlan]) -> Option<Result<AssembledPlan, PlanError>> {
    if week.iter().all(DayPlan::is_canonical) {
        return None;
    }
    Some(assemble_week(catalog, week.to_vec()))
}

/// Rewrites saved plans whose slots still hold bare recipe names. Each plan is
/// updated on its own; one bad plan does not stop the rest.
pub async fn migrate_plans(db: &PgPool, catalog: &Catalog, dry_run: bool) -> anyhow::Result<MigrationReport> {
    let rows = repo::list_all(db).await?;
    let mut report = MigrationReport {
        scanned: rows.len(),
        ..Default::default()
    };

    for row in rows {
        match plan_migration(catalog, &row.week.0) {
            None => {}
            Some(Ok(plan)) => {
                if !dry_run {
                    repo::replace_contents(db, row.id, &plan).await?;
                }
                info!(plan_id = %row.id, dry_run, "plan migrated");
                report.migrated += 1;
            }
            Some(Err(e)) => {
                warn!(plan_id = %row.id, error = %e, "plan could not be migrated");
                report.failed.push((row.id, e.to_string()));
            }
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{test_support::recipe, MealType},
        plans::{planner::WEEKDAYS, MealRef},
    };

    fn catalog() -> Catalog {
        Catalog::from_sources(vec![
            (MealType::Breakfast, vec![recipe("b1", "Overnight Oats", MealType::Breakfast, &["oats", "milk"])]),
            (MealType::Lunch, vec![recipe("l1", "Lentil Soup", MealType::Lunch, &["lentils"])]),
            (MealType::Dinner, vec![recipe("d1", "Salmon Bowl", MealType::Dinner, &["salmon", "rice"])]),
        ])
    }

    fn legacy_week(dinner: &str) -> Vec<DayPlan> {
        let name = |n: &str| MealRef {
            id: None,
            name: n.to_string(),
        };
        WEEKDAYS
            .iter()
            .map(|day| DayPlan {
                day: day.to_string(),
                breakfast: name("overnight oats"),
                lunch: name("Lentil Soup"),
                dinner: name(dinner),
            })
            .collect()
    }

    #[test]
    fn legacy_names_become_ids() {
        let catalog = catalog();
        let plan = plan_migration(&catalog, &legacy_week("salmon")).unwrap().unwrap();
        assert!(plan.week.iter().all(DayPlan::is_canonical));
        assert_eq!(plan.week[0].breakfast.id.as_deref(), Some("b1"));
        assert_eq!(plan.week[6].dinner.name, "Salmon Bowl");

        let mut list = plan.shopping_list.clone();
        list.sort();
        assert_eq!(list, ["lentils", "milk", "oats", "rice", "salmon"]);

        assert!(plan_migration(&catalog, &plan.week).is_none());
    }

    #[test]
    fn unknown_names_fail() {
        let result = plan_migration(&catalog(), &legacy_week("Beef Wellington")).unwrap();
        assert!(matches!(result, Err(PlanError::Unresolved { .. })));
    }
}
