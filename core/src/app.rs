use anyhow::{Result, bail};

use crate::catalog::Catalog;
use crate::filter::filter_foods;
use crate::models::Food;
use crate::notifications::{Notification, NotificationFeed};
use crate::nutrients::{DailySummary, summarize};
use crate::selection::Selection;

/// Every way the application state can change.
#[derive(Debug, Clone)]
pub enum Action {
    SelectCategory(Option<String>),
    Search(String),
    AddFood(String),
    RemoveFood(String),
    /// Empty the day's selection.
    ClearSelection,
    /// One notification decay step.
    Tick,
    /// Swap in a freshly loaded catalog. The selection is kept.
    ReplaceCatalog(Catalog),
}

/// State of one tracking session: the loaded catalog, the current filters,
/// the day's selection and pending notifications.
///
/// Readers get borrowed views; all changes go through [`AppState::apply`].
#[derive(Debug, Default)]
pub struct AppState {
    catalog: Catalog,
    selected_category: Option<String>,
    search_query: String,
    selection: Selection,
    notifications: NotificationFeed,
}

impl AppState {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, action: Action) -> Result<()> {
        match action {
            Action::SelectCategory(category) => {
                self.selected_category = category.filter(|c| !c.is_empty());
            }
            Action::Search(query) => self.search_query = query,
            Action::AddFood(food_id) => {
                let Some(food) = self.catalog.food(&food_id).cloned() else {
                    bail!("Food {food_id} not found");
                };
                let now_ms = chrono::Utc::now().timestamp_millis();
                self.notifications.push(food.clone(), now_ms);
                self.selection.add(food);
            }
            Action::RemoveFood(food_id) => {
                self.selection.remove(&food_id);
            }
            Action::ClearSelection => self.selection.clear(),
            Action::Tick => self.notifications.tick(),
            Action::ReplaceCatalog(catalog) => self.catalog = catalog,
        }
        Ok(())
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    #[must_use]
    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn visible_foods(&self) -> Vec<&Food> {
        filter_foods(
            &self.catalog.foods,
            self.selected_category.as_deref(),
            &self.search_query,
        )
    }

    #[must_use]
    pub fn summary(&self, hour: u32) -> DailySummary {
        summarize(self.selection.entries(), hour)
    }

    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodCategory, Nutrients};

    fn food(id: &str, category_id: &str, name: &str, calories: f64) -> Food {
        Food {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: name.to_string(),
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
            categories: vec![
                FoodCategory {
                    id: "fruit".to_string(),
                    name: "Fruit".to_string(),
                    description: None,
                },
                FoodCategory {
                    id: "grain".to_string(),
                    name: "Grains".to_string(),
                    description: None,
                },
            ],
            foods: vec![
                food("1", "fruit", "Apple", 95.0),
                food("2", "fruit", "Banana", 105.0),
                food("3", "grain", "Oatmeal", 150.0),
            ],
            failures: Vec::new(),
        }
    }

    #[test]
    fn test_filters_drive_visible_foods() {
        let mut state = AppState::new(catalog());
        assert_eq!(state.visible_foods().len(), 3);

        state
            .apply(Action::SelectCategory(Some("fruit".to_string())))
            .unwrap();
        assert_eq!(state.visible_foods().len(), 2);

        state.apply(Action::Search("ban".to_string())).unwrap();
        let visible = state.visible_foods();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Banana");

        state
            .apply(Action::SelectCategory(Some(String::new())))
            .unwrap();
        assert!(state.selected_category().is_none());
        assert_eq!(state.search_query(), "ban");
    }

    #[test]
    fn test_add_and_remove_update_summary() {
        let mut state = AppState::new(catalog());
        state.apply(Action::AddFood("1".to_string())).unwrap();
        state.apply(Action::AddFood("3".to_string())).unwrap();
        state.apply(Action::AddFood("1".to_string())).unwrap();

        let summary = state.summary(12);
        assert_eq!(summary.totals.calories, 340.0);
        assert_eq!(summary.meals[1].foods.len(), 3);

        state.apply(Action::RemoveFood("1".to_string())).unwrap();
        let ids: Vec<&str> = state
            .selection()
            .entries()
            .iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(state.summary(12).totals.calories, 245.0);
    }

    #[test]
    fn test_clear_selection_resets_totals() {
        let mut state = AppState::new(catalog());
        state.apply(Action::AddFood("1".to_string())).unwrap();
        state.apply(Action::AddFood("3".to_string())).unwrap();
        state.apply(Action::ClearSelection).unwrap();
        assert!(state.selection().is_empty());
        assert_eq!(state.summary(12).totals.calories, 0.0);
    }

    #[test]
    fn test_add_unknown_food_is_rejected() {
        let mut state = AppState::new(catalog());
        let err = state.apply(Action::AddFood("99".to_string())).unwrap_err();
        assert!(err.to_string().contains("99"));
        assert!(state.selection().is_empty());
        assert_eq!(state.notifications().count(), 0);
    }

    #[test]
    fn test_add_raises_notification_that_fades() {
        let mut state = AppState::new(catalog());
        state.apply(Action::AddFood("2".to_string())).unwrap();
        assert_eq!(state.notifications().count(), 1);

        for _ in 0..50 {
            state.apply(Action::Tick).unwrap();
        }
        assert_eq!(state.notifications().count(), 0);
        // Fading notifications leave the selection alone.
        assert_eq!(state.selection().len(), 1);
    }

    #[test]
    fn test_replace_catalog_keeps_selection() {
        let mut state = AppState::new(catalog());
        state.apply(Action::AddFood("3".to_string())).unwrap();
        state
            .apply(Action::ReplaceCatalog(Catalog::default()))
            .unwrap();
        assert!(state.visible_foods().is_empty());
        assert_eq!(state.selection().len(), 1);
    }
}
