use crate::models::Food;

/// Foods visible under a category selector and a free-text query.
///
/// A food passes when the selector is unset (or empty) or equals its
/// `category_id` exactly, and the query is empty or is a case-insensitive
/// substring of its name or description. Order is preserved.
#[must_use]
pub fn filter_foods<'a>(
    foods: &'a [Food],
    category: Option<&str>,
    query: &str,
) -> Vec<&'a Food> {
    let category = category.filter(|c| !c.is_empty());
    let needle = query.to_lowercase();

    foods
        .iter()
        .filter(|f| category.is_none_or(|c| f.category_id == c))
        .filter(|f| matches_text(f, &needle))
        .collect()
}

fn matches_text(food: &Food, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    food.name.to_lowercase().contains(needle)
        || food
            .description
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Nutrients;

    fn food(id: &str, category_id: &str, name: &str, description: Option<&str>) -> Food {
        Food {
            id: id.to_string(),
            category_id: category_id.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            serving_size: 100.0,
            nutrients: Nutrients::default(),
            image_url: None,
        }
    }

    fn sample() -> Vec<Food> {
        vec![
            food("1", "fruit", "Apple", Some("Crisp red fruit")),
            food("2", "veg", "Broccoli", None),
            food("3", "fruit", "Banana", Some("Potassium rich")),
            food("4", "dairy", "Greek Yogurt", Some("Thick and creamy")),
        ]
    }

    fn ids(foods: &[&Food]) -> Vec<String> {
        foods.iter().map(|f| f.id.clone()).collect()
    }

    #[test]
    fn test_no_filters_returns_everything_in_order() {
        let foods = sample();
        assert_eq!(ids(&filter_foods(&foods, None, "")), vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_empty_category_selector_means_all() {
        let foods = sample();
        assert_eq!(filter_foods(&foods, Some(""), "").len(), 4);
    }

    #[test]
    fn test_category_only() {
        let foods = sample();
        assert_eq!(ids(&filter_foods(&foods, Some("fruit"), "")), vec!["1", "3"]);
    }

    #[test]
    fn test_category_match_is_case_sensitive() {
        let foods = sample();
        assert!(filter_foods(&foods, Some("Fruit"), "").is_empty());
    }

    #[test]
    fn test_text_matches_name_case_insensitively() {
        let foods = sample();
        assert_eq!(ids(&filter_foods(&foods, None, "bAnAnA")), vec!["3"]);
    }

    #[test]
    fn test_text_matches_description() {
        let foods = sample();
        assert_eq!(ids(&filter_foods(&foods, None, "CREAMY")), vec!["4"]);
    }

    #[test]
    fn test_null_description_never_matches() {
        let foods = sample();
        // "rich" only appears in Banana's description; Broccoli has none.
        assert_eq!(ids(&filter_foods(&foods, None, "rich")), vec!["3"]);
        assert!(filter_foods(&foods, Some("veg"), "fruit").is_empty());
    }

    #[test]
    fn test_both_predicates_must_hold() {
        let foods = sample();
        assert_eq!(ids(&filter_foods(&foods, Some("fruit"), "red")), vec!["1"]);
        assert!(filter_foods(&foods, Some("dairy"), "apple").is_empty());
    }
}
