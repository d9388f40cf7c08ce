use serde::Serialize;

use crate::models::Food;

/// Ordered list of foods picked for the day. The same food may appear any
/// number of times, one entry per serving.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Selection {
    entries: Vec<Food>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, food: Food) {
        self.entries.push(food);
    }

    /// Remove the first entry with this food id. Later servings of the same
    /// food are left alone. Returns false when nothing matched.
    pub fn remove(&mut self, food_id: &str) -> bool {
        match self.entries.iter().position(|f| f.id == food_id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[Food] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
