use anyhow::Result;

use larder_core::app::{Action, AppState};
use larder_core::catalog::Catalog;
use larder_core::nutrients::{BudgetStatus, DailySummary, MealType, current_hour};

use super::helpers::{budget_bar, no_neg_zero, print_nutrient_table};

/// Build a selection from `food_ids`, drop one entry per `remove_ids`, and
/// report the result as of `hour` (default: now).
pub(crate) fn cmd_summary(
    catalog: Catalog,
    food_ids: &[String],
    remove_ids: &[String],
    hour: Option<u32>,
    json: bool,
) -> Result<()> {
    let hour = hour.unwrap_or_else(current_hour);
    let summary = build_summary(catalog, food_ids, remove_ids, hour)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    print_summary(&summary, hour);
    Ok(())
}

fn build_summary(
    catalog: Catalog,
    food_ids: &[String],
    remove_ids: &[String],
    hour: u32,
) -> Result<DailySummary> {
    let mut state = AppState::new(catalog);
    for id in food_ids {
        state.apply(Action::AddFood(id.clone()))?;
    }
    for id in remove_ids {
        state.apply(Action::RemoveFood(id.clone()))?;
    }
    Ok(state.summary(hour))
}

fn status_label(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Green => "on track",
        BudgetStatus::Yellow => "close to budget",
        BudgetStatus::Red => "over budget",
    }
}

fn print_summary(summary: &DailySummary, hour: u32) {
    let current = MealType::from_hour(hour);
    println!("=== Today ({}, {}) ===\n", current.label(), current.time_range());

    let budget = &summary.budget;
    let consumed = no_neg_zero(budget.consumed);
    println!(
        "  {consumed:.0} / {:.0} kcal ({:.0}%)  {}  {}\n",
        budget.budget,
        budget.percentage,
        budget_bar(budget),
        status_label(summary.status)
    );

    for meal in &summary.meals {
        let label = meal.label.to_uppercase();
        println!("  {label} ({}) {:.0} kcal", meal.time, meal.calories);
        if meal.foods.is_empty() {
            println!("    No foods added");
        }
        for f in &meal.foods {
            let n = &f.nutrients;
            println!(
                "    [{}] {} ({:.0}g) {:.0} kcal | P:{:.1}g C:{:.1}g F:{:.1}g",
                f.id, f.name, f.serving_size, n.calories, n.protein, n.carbs, n.fat
            );
        }
        println!();
    }

    print_nutrient_table(&summary.totals);
}

#[cfg(test)]
mod tests {
    use super::*;
    use larder_core::models::{Food, Nutrients};

    fn food(id: &str, calories: f64) -> Food {
        Food {
            id: id.to_string(),
            category_id: "c".to_string(),
            name: id.to_string(),
            description: None,
            serving_size: 100.0,
            nutrients: Nutrients {
                calories,
                ..Nutrients::default()
            },
            image_url: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            foods: vec![food("pizza", 900.0), food("salad", 150.0)],
            ..Catalog::default()
        }
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_build_summary_counts_duplicates() {
        let summary = build_summary(catalog(), &ids(&["pizza", "pizza", "salad"]), &[], 19).unwrap();
        assert_eq!(summary.totals.calories, 1950.0);
        assert_eq!(summary.status, BudgetStatus::Yellow);
        assert_eq!(summary.meals[2].foods.len(), 3);
    }

    #[test]
    fn test_build_summary_removes_one_occurrence() {
        let summary = build_summary(
            catalog(),
            &ids(&["pizza", "pizza", "pizza"]),
            &ids(&["pizza"]),
            8,
        )
        .unwrap();
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.totals.calories, 1800.0);
    }

    #[test]
    fn test_build_summary_over_budget() {
        let summary = build_summary(catalog(), &ids(&["pizza", "pizza", "pizza"]), &[], 12).unwrap();
        assert_eq!(summary.status, BudgetStatus::Red);
        assert_eq!(summary.bar_width, 100.0);
        assert!(summary.budget.percentage > 130.0);
    }

    #[test]
    fn test_build_summary_unknown_food() {
        let err = build_summary(catalog(), &ids(&["soup"]), &[], 12).unwrap_err();
        assert_eq!(err.to_string(), "Food soup not found");
    }

    #[test]
    fn test_empty_selection() {
        let summary = build_summary(catalog(), &[], &[], 12).unwrap();
        assert_eq!(summary.totals, Nutrients::default());
        assert_eq!(summary.status, BudgetStatus::Green);
        assert!(summary.meals.iter().all(|m| m.foods.is_empty()));
    }
}
