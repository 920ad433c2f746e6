use anyhow::{Result, bail};
use serde::Serialize;
use tracing::debug;

use crate::models::{
    CascadeReport, Document, LineMode, Meal, MealLine, Totals, new_id, validate_amount,
    validate_name,
};
use crate::nutrition::{line_nutrition, sum_rounded};

/// One meal line resolved against the catalog, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub index: usize,
    pub ingredient_id: String,
    pub ingredient_name: Option<String>,
    pub mode: LineMode,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub portion_name: Option<String>,
    /// False when the ingredient is gone or a portion line has no usable portion.
    pub counted: bool,
    pub totals: Totals,
}

impl Document {
    #[must_use]
    pub fn find_meal(&self, id: &str) -> Option<&Meal> {
        self.meals.iter().find(|m| m.id == id)
    }

    fn meal_mut(&mut self, id: &str) -> Result<&mut Meal> {
        match self.meals.iter_mut().find(|m| m.id == id) {
            Some(meal) => Ok(meal),
            None => bail!("Meal {id} not found"),
        }
    }

    /// Sum of every resolvable line. Lines whose ingredient no longer exists
    /// are skipped.
    #[must_use]
    pub fn meal_totals(&self, meal: &Meal) -> Totals {
        sum_rounded(meal.items.iter().filter_map(|line| {
            self.find_ingredient(&line.ingredient_id)
                .map(|ingredient| line_nutrition(ingredient, line.mode, line.amount))
        }))
    }

    #[must_use]
    pub fn meal_breakdown(&self, meal: &Meal) -> Vec<LineView> {
        meal.items
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let ingredient = self.find_ingredient(&line.ingredient_id);
                let counted = ingredient.is_some_and(|i| {
                    line.mode == LineMode::Grams || i.has_usable_portion()
                });
                LineView {
                    index,
                    ingredient_id: line.ingredient_id.clone(),
                    ingredient_name: ingredient.map(|i| i.name.clone()),
                    mode: line.mode,
                    amount: line.amount,
                    portion_name: ingredient.and_then(|i| i.portion_name.clone()),
                    counted,
                    totals: ingredient
                        .map(|i| line_nutrition(i, line.mode, line.amount))
                        .unwrap_or_default(),
                }
            })
            .collect()
    }

    pub fn create_meal(&mut self, name: &str) -> Result<Meal> {
        let meal = Meal {
            id: new_id("meal"),
            name: validate_name("Meal", name)?,
            items: Vec::new(),
        };
        self.meals.push(meal.clone());
        Ok(meal)
    }

    pub fn rename_meal(&mut self, id: &str, name: &str) -> Result<Meal> {
        let name = validate_name("Meal", name)?;
        let meal = self.meal_mut(id)?;
        meal.name = name;
        Ok(meal.clone())
    }

    /// Insert or replace a meal by id. A blank id gets a fresh one.
    pub fn save_meal(&mut self, mut meal: Meal) -> Result<Meal> {
        meal.name = validate_name("Meal", &meal.name)?;
        for line in &meal.items {
            validate_amount(line.amount)?;
        }
        if meal.id.trim().is_empty() {
            meal.id = new_id("meal");
        }
        match self.meals.iter_mut().find(|m| m.id == meal.id) {
            Some(slot) => slot.clone_from(&meal),
            None => self.meals.push(meal.clone()),
        }
        Ok(meal)
    }

    pub fn add_meal_line(&mut self, meal_id: &str, line: MealLine) -> Result<Meal> {
        validate_amount(line.amount)?;
        let Some(ingredient) = self.find_ingredient(&line.ingredient_id) else {
            bail!("Ingredient {} not found", line.ingredient_id);
        };
        if line.mode == LineMode::Portion && !ingredient.has_usable_portion() {
            bail!(
                "Ingredient '{}' has no portion size; add it in grams or set portionGrams first",
                ingredient.name
            );
        }
        let meal = self.meal_mut(meal_id)?;
        meal.items.push(line);
        Ok(meal.clone())
    }

    pub fn remove_meal_line(&mut self, meal_id: &str, index: usize) -> Result<Meal> {
        let meal = self.meal_mut(meal_id)?;
        if index >= meal.items.len() {
            bail!(
                "Meal '{}' has no line {} ({} lines)",
                meal.name,
                index + 1,
                meal.items.len()
            );
        }
        meal.items.remove(index);
        Ok(meal.clone())
    }

    /// Remove a meal and every day line that references it.
    /// Returns `None` when no meal has this id.
    pub fn delete_meal(&mut self, id: &str) -> Option<CascadeReport> {
        let before = self.meals.len();
        self.meals.retain(|m| m.id != id);
        if self.meals.len() == before {
            return None;
        }

        let mut report = CascadeReport::default();
        for day in &mut self.days {
            let lines = day.items.len();
            day.items.retain(|line| line.meal_id != id);
            let removed = lines - day.items.len();
            if removed > 0 {
                report.lines_removed += removed;
                report.containers_touched += 1;
            }
        }
        debug!(
            meal = id,
            lines_removed = report.lines_removed,
            days_touched = report.containers_touched,
            "deleted meal"
        );
        Some(report)
    }
}
