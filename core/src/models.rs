use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A category as it is sent to the store; the store assigns the id.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

/// The twelve per-serving nutrient quantities carried by every food.
///
/// Also used as the running total of a selection, so it adds field-wise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub sugar: f64,
    #[serde(default)]
    pub sodium: f64,
    #[serde(default)]
    pub potassium: f64,
    #[serde(default)]
    pub vitamin_a: f64,
    #[serde(default)]
    pub vitamin_c: f64,
    #[serde(default)]
    pub calcium: f64,
    #[serde(default)]
    pub iron: f64,
}

impl Nutrients {
    /// Field names paired with values, in display order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, f64); 12] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
            ("potassium", self.potassium),
            ("vitamin_a", self.vitamin_a),
            ("vitamin_c", self.vitamin_c),
            ("calcium", self.calcium),
            ("iron", self.iron),
        ]
    }

    /// Field-wise sum over a sequence of foods. Empty input yields all zeros.
    pub fn total<'a, I>(foods: I) -> Self
    where
        I: IntoIterator<Item = &'a Food>,
    {
        foods.into_iter().map(|f| f.nutrients).sum()
    }
}

impl Add for Nutrients {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
            fiber: self.fiber + rhs.fiber,
            sugar: self.sugar + rhs.sugar,
            sodium: self.sodium + rhs.sodium,
            potassium: self.potassium + rhs.potassium,
            vitamin_a: self.vitamin_a + rhs.vitamin_a,
            vitamin_c: self.vitamin_c + rhs.vitamin_c,
            calcium: self.calcium + rhs.calcium,
            iron: self.iron + rhs.iron,
        }
    }
}

impl Sum for Nutrients {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Food {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub serving_size: f64,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A food without an id, as it appears in an import payload and as it is
/// handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFood {
    #[serde(deserialize_with = "deserialize_id")]
    pub category_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub serving_size: f64,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A category in an import payload. Its `id` is local to the payload and is
/// only used to rewrite the foods' `category_id` during import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportCategory {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportPayload {
    pub categories: Vec<ImportCategory>,
    pub foods: Vec<NewFood>,
}

/// Outcome of an import, shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub success: bool,
    pub message: String,
    pub categories: usize,
    pub foods: usize,
}

impl ImportReport {
    #[must_use]
    pub fn succeeded(categories: usize, foods: usize) -> Self {
        Self {
            success: true,
            message: format!("Successfully imported {categories} categories and {foods} foods"),
            categories,
            foods,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            categories: 0,
            foods: 0,
        }
    }
}

/// Validate an imported food: non-empty name, non-negative quantities.
pub fn validate_new_food(food: &NewFood) -> anyhow::Result<()> {
    if food.name.trim().is_empty() {
        anyhow::bail!("name must not be empty");
    }
    if food.serving_size < 0.0 {
        anyhow::bail!("serving_size must not be negative");
    }
    for (field, value) in food.nutrients.fields() {
        if value < 0.0 {
            anyhow::bail!("{field} must not be negative");
        }
    }
    Ok(())
}

/// Hosted backends hand out either text or integer primary keys; both are
/// kept as strings here.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
    })
}
