use chrono::{Local, Timelike};
use serde::Serialize;

use crate::models::{Food, Nutrients};

pub const DAILY_CALORIE_BUDGET: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    /// Breakfast is [5, 11), lunch [11, 16), dinner [16, 23). Late night and
    /// early morning hours fall back to breakfast.
    #[must_use]
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            11..16 => MealType::Lunch,
            16..23 => MealType::Dinner,
            _ => MealType::Breakfast,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
        }
    }

    #[must_use]
    pub fn time_range(self) -> &'static str {
        match self {
            MealType::Breakfast => "05:00 - 11:00",
            MealType::Lunch => "11:00 - 16:00",
            MealType::Dinner => "16:00 - 23:00",
        }
    }
}

/// Local wall-clock hour, 0..=23.
#[must_use]
pub fn current_hour() -> u32 {
    Local::now().hour()
}

#[derive(Debug, Clone, Serialize)]
pub struct MealSummary {
    pub meal_type: MealType,
    pub label: &'static str,
    pub time: &'static str,
    pub calories: f64,
    pub foods: Vec<Food>,
}

/// Bucket the whole selection by meal.
///
/// Entries carry no timestamp, so every entry lands in the meal of `hour`
/// (the hour the summary is built, not the hour the food was added). All
/// three meals are always returned, breakfast first.
#[must_use]
pub fn group_by_meal(selection: &[Food], hour: u32) -> Vec<MealSummary> {
    let current = MealType::from_hour(hour);
    MealType::ALL
        .into_iter()
        .map(|meal_type| {
            let foods: Vec<Food> = if meal_type == current {
                selection.to_vec()
            } else {
                Vec::new()
            };
            MealSummary {
                meal_type,
                label: meal_type.label(),
                time: meal_type.time_range(),
                calories: foods.iter().map(|f| f.nutrients.calories).sum(),
                foods,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalorieBudget {
    pub consumed: f64,
    pub budget: f64,
    /// Unclamped; above 100 once the budget is exceeded.
    pub percentage: f64,
}

impl CalorieBudget {
    #[must_use]
    pub fn new(consumed: f64) -> Self {
        Self {
            consumed,
            budget: DAILY_CALORIE_BUDGET,
            percentage: consumed / DAILY_CALORIE_BUDGET * 100.0,
        }
    }

    /// Progress bar width in percent, clamped to [0, 100].
    #[must_use]
    pub fn bar_width(&self) -> f64 {
        self.percentage.clamp(0.0, 100.0)
    }

    #[must_use]
    pub fn status(&self) -> BudgetStatus {
        if self.percentage <= 80.0 {
            BudgetStatus::Green
        } else if self.percentage <= 100.0 {
            BudgetStatus::Yellow
        } else {
            BudgetStatus::Red
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub totals: Nutrients,
    pub budget: CalorieBudget,
    pub status: BudgetStatus,
    pub bar_width: f64,
    pub meals: Vec<MealSummary>,
    pub entries: Vec<Food>,
}

/// Totals, meal grouping and budget for a selection, evaluated at `hour`.
#[must_use]
pub fn summarize(selection: &[Food], hour: u32) -> DailySummary {
    let totals = Nutrients::total(selection);
    let budget = CalorieBudget::new(totals.calories);
    DailySummary {
        totals,
        budget,
        status: budget.status(),
        bar_width: budget.bar_width(),
        meals: group_by_meal(selection, hour),
        entries: selection.to_vec(),
    }
}
