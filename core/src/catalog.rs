use anyhow::{Result, bail};
use tracing::debug;

use crate::models::{
    CascadeReport, Document, Ingredient, NewIngredient, new_id, validate_ingredient,
};

impl Document {
    pub fn create_ingredient(&mut self, input: &NewIngredient) -> Result<Ingredient> {
        let input = input.normalized();
        validate_ingredient(&input)?;
        let ingredient = input.into_ingredient(new_id("ing"));
        self.ingredients.push(ingredient.clone());
        Ok(ingredient)
    }

    /// Replace every field of an existing ingredient except its id.
    pub fn update_ingredient(&mut self, id: &str, input: &NewIngredient) -> Result<Ingredient> {
        let input = input.normalized();
        validate_ingredient(&input)?;
        let Some(slot) = self.ingredients.iter_mut().find(|i| i.id == id) else {
            bail!("Ingredient {id} not found");
        };
        *slot = input.into_ingredient(id.to_string());
        Ok(slot.clone())
    }

    /// Remove an ingredient and every meal line that references it.
    /// Returns `None` when no ingredient has this id.
    pub fn delete_ingredient(&mut self, id: &str) -> Option<CascadeReport> {
        let before = self.ingredients.len();
        self.ingredients.retain(|i| i.id != id);
        if self.ingredients.len() == before {
            return None;
        }

        let mut report = CascadeReport::default();
        for meal in &mut self.meals {
            let lines = meal.items.len();
            meal.items.retain(|line| line.ingredient_id != id);
            let removed = lines - meal.items.len();
            if removed > 0 {
                report.lines_removed += removed;
                report.containers_touched += 1;
            }
        }
        debug!(
            ingredient = id,
            lines_removed = report.lines_removed,
            meals_touched = report.containers_touched,
            "deleted ingredient"
        );
        Some(report)
    }

    #[must_use]
    pub fn find_ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.id == id)
    }

    /// Ingredients whose name or brand contains `filter` (case-insensitive),
    /// ordered by name. A blank filter matches everything.
    #[must_use]
    pub fn list_ingredients(&self, filter: Option<&str>) -> Vec<&Ingredient> {
        let needle = filter.map(|f| f.trim().to_lowercase()).unwrap_or_default();
        let mut found: Vec<&Ingredient> = self
            .ingredients
            .iter()
            .filter(|i| {
                needle.is_empty()
                    || i.name.to_lowercase().contains(&needle)
                    || i
                        .brand
                        .as_deref()
                        .is_some_and(|b| b.to_lowercase().contains(&needle))
            })
            .collect();
        found.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name))
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LineMode, MealLine};

    fn input(name: &str, brand: Option<&str>) -> NewIngredient {
        NewIngredient {
            name: name.to_string(),
            brand: brand.map(ToString::to_string),
            kcal100: 100.0,
            protein100: 10.0,
            ..NewIngredient::default()
        }
    }

    #[test]
    fn test_create_assigns_id_and_trims() {
        let mut doc = Document::default();
        let ing = doc.create_ingredient(&input("  Rice ", Some(""))).unwrap();
        assert!(ing.id.starts_with("ing-"));
        assert_eq!(ing.name, "Rice");
        assert!(ing.brand.is_none());
        assert!(ing.price_per_kg.is_none());
        assert_eq!(doc.ingredients.len(), 1);
    }

    #[test]
    fn test_create_rejects_invalid_without_mutation() {
        let mut doc = Document::default();
        assert!(doc.create_ingredient(&input(" ", None)).is_err());
        let mut bad = input("Salt", None);
        bad.kcal100 = -5.0;
        assert!(doc.create_ingredient(&bad).is_err());
        assert!(doc.ingredients.is_empty());
    }

    #[test]
    fn test_update_keeps_id() {
        let mut doc = Document::default();
        let ing = doc.create_ingredient(&input("Rice", None)).unwrap();
        let mut edit = NewIngredient::from(&ing);
        edit.kcal100 = 130.0;
        edit.price_per_kg = Some(2.4);
        let updated = doc.update_ingredient(&ing.id, &edit).unwrap();
        assert_eq!(updated.id, ing.id);
        assert_eq!(doc.find_ingredient(&ing.id).unwrap().kcal100, 130.0);
        assert_eq!(doc.find_ingredient(&ing.id).unwrap().price_per_kg, Some(2.4));
    }

    #[test]
    fn test_update_invalid_leaves_record() {
        let mut doc = Document::default();
        let ing = doc.create_ingredient(&input("Rice", None)).unwrap();
        let mut edit = NewIngredient::from(&ing);
        edit.protein100 = -1.0;
        assert!(doc.update_ingredient(&ing.id, &edit).is_err());
        assert_eq!(doc.find_ingredient(&ing.id).unwrap(), &ing);
    }

    #[test]
    fn test_update_not_found() {
        let mut doc = Document::default();
        assert!(doc.update_ingredient("ing-missing", &input("X", None)).is_err());
    }

    #[test]
    fn test_delete_cascades_to_meal_lines_only() {
        let mut doc = Document::default();
        let rice = doc.create_ingredient(&input("Rice", None)).unwrap();
        let beans = doc.create_ingredient(&input("Beans", None)).unwrap();
        let meal = doc.create_meal("Burrito").unwrap();
        let other = doc.create_meal("Plain beans").unwrap();
        for (meal_id, ing_id) in [
            (&meal.id, &rice.id),
            (&meal.id, &beans.id),
            (&meal.id, &rice.id),
            (&other.id, &beans.id),
        ] {
            doc.add_meal_line(
                meal_id,
                MealLine {
                    ingredient_id: ing_id.clone(),
                    mode: LineMode::Grams,
                    amount: 100.0,
                },
            )
            .unwrap();
        }

        let report = doc.delete_ingredient(&rice.id).unwrap();
        assert_eq!(report.lines_removed, 2);
        assert_eq!(report.containers_touched, 1);
        assert!(doc.find_ingredient(&rice.id).is_none());
        assert_eq!(doc.meals.len(), 2);
        let burrito = doc.find_meal(&meal.id).unwrap();
        assert_eq!(burrito.items.len(), 1);
        assert_eq!(burrito.items[0].ingredient_id, beans.id);
        assert_eq!(doc.find_meal(&other.id).unwrap().items.len(), 1);
    }

    #[test]
    fn test_delete_unknown_is_none() {
        let mut doc = Document::default();
        doc.create_ingredient(&input("Rice", None)).unwrap();
        assert!(doc.delete_ingredient("ing-nope").is_none());
        assert_eq!(doc.ingredients.len(), 1);
    }

    #[test]
    fn test_list_filters_name_and_brand_sorted() {
        let mut doc = Document::default();
        doc.create_ingredient(&input("yogurt", Some("Fage"))).unwrap();
        doc.create_ingredient(&input("Apple", None)).unwrap();
        doc.create_ingredient(&input("Banana", Some("Chiquita"))).unwrap();

        let all: Vec<&str> = doc
            .list_ingredients(None)
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(all, vec!["Apple", "Banana", "yogurt"]);

        let by_brand = doc.list_ingredients(Some("FAGE"));
        assert_eq!(by_brand.len(), 1);
        assert_eq!(by_brand[0].name, "yogurt");

        let by_name = doc.list_ingredients(Some("an"));
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Banana");

        assert_eq!(doc.list_ingredients(Some("  ")).len(), 3);
        assert!(doc.list_ingredients(Some("pizza")).is_empty());
    }
}
