use serde::Serialize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use larder_core::catalog::Catalog;
use larder_core::models::{Food, Nutrients};
use larder_core::nutrients::CalorieBudget;

const BAR_WIDTH: usize = 20;

pub(crate) fn print_food_table(foods: &[&Food], catalog: &Catalog) {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "P")]
        protein: String,
        #[tabled(rename = "C")]
        carbs: String,
        #[tabled(rename = "F")]
        fat: String,
    }

    let rows: Vec<FoodRow> = foods
        .iter()
        .enumerate()
        .map(|(i, f)| FoodRow {
            idx: i + 1,
            id: truncate(&f.id, 12),
            name: truncate(&f.name, 35),
            category: catalog
                .category_name(f)
                .map(|c| truncate(c, 20))
                .unwrap_or_default(),
            serving: format!("{:.0}g", f.serving_size),
            calories: format!("{:.0}", f.nutrients.calories),
            protein: format!("{:.1}", f.nutrients.protein),
            carbs: format!("{:.1}", f.nutrients.carbs),
            fat: format!("{:.1}", f.nutrients.fat),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..9)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Every nutrient as a `(label, formatted value with unit)` row.
pub(crate) fn nutrient_rows(n: &Nutrients) -> Vec<(&'static str, String)> {
    n.fields()
        .into_iter()
        .map(|(field, value)| {
            let value = no_neg_zero(value);
            let (label, shown) = match field {
                "calories" => ("Calories", format!("{value:.0} kcal")),
                "protein" => ("Protein", format!("{value:.1}g")),
                "carbs" => ("Carbs", format!("{value:.1}g")),
                "fat" => ("Fat", format!("{value:.1}g")),
                "fiber" => ("Fiber", format!("{value:.1}g")),
                "sugar" => ("Sugar", format!("{value:.1}g")),
                "sodium" => ("Sodium", format!("{value:.0}mg")),
                "potassium" => ("Potassium", format!("{value:.0}mg")),
                "vitamin_a" => ("Vitamin A", format!("{value:.0}IU")),
                "vitamin_c" => ("Vitamin C", format!("{value:.1}mg")),
                "calcium" => ("Calcium", format!("{value:.0}mg")),
                "iron" => ("Iron", format!("{value:.1}mg")),
                other => (other, format!("{value}")),
            };
            (label, shown)
        })
        .collect()
}

pub(crate) fn print_nutrient_table(n: &Nutrients) {
    #[derive(Tabled)]
    struct NutrientRow {
        #[tabled(rename = "Nutrient")]
        label: &'static str,
        #[tabled(rename = "Amount")]
        amount: String,
    }

    let rows: Vec<NutrientRow> = nutrient_rows(n)
        .into_iter()
        .map(|(label, amount)| NutrientRow { label, amount })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

/// Text progress bar for the calorie budget, e.g. `[#####---------------]`.
pub(crate) fn budget_bar(budget: &CalorieBudget) -> String {
    #[allow(clippy::cast_sign_loss, clippy::cast_precision_loss)]
    let filled = ((budget.bar_width() / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
