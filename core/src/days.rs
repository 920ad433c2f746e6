use anyhow::{Result, bail};
use serde::Serialize;

use crate::models::{
    Day, DayLine, Document, GoalDelta, Settings, Totals, new_id, validate_goal, validate_name,
};
use crate::nutrition::{round1, sum_rounded};

/// Day totals plus the comparison against the configured goals.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayReport {
    pub id: String,
    pub name: String,
    pub meals: Vec<DayMealView>,
    pub totals: Totals,
    pub goals: Settings,
    pub delta: GoalDelta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMealView {
    pub index: usize,
    pub meal_id: String,
    pub meal_name: Option<String>,
    pub totals: Totals,
}

/// `totals - goal` for each goal that is set; positive means over.
#[must_use]
pub fn goal_delta(totals: &Totals, goals: &Settings) -> GoalDelta {
    GoalDelta {
        kcal: goals.goal_kcal.map(|goal| round1(totals.kcal - goal)),
        protein: goals.goal_protein.map(|goal| round1(totals.protein - goal)),
    }
}

impl Document {
    #[must_use]
    pub fn find_day(&self, id: &str) -> Option<&Day> {
        self.days.iter().find(|d| d.id == id)
    }

    fn day_mut(&mut self, id: &str) -> Result<&mut Day> {
        match self.days.iter_mut().find(|d| d.id == id) {
            Some(day) => Ok(day),
            None => bail!("Day {id} not found"),
        }
    }

    /// Sum of every referenced meal that still exists.
    #[must_use]
    pub fn day_totals(&self, day: &Day) -> Totals {
        sum_rounded(
            day.items
                .iter()
                .filter_map(|line| self.find_meal(&line.meal_id))
                .map(|meal| self.meal_totals(meal)),
        )
    }

    #[must_use]
    pub fn day_report(&self, day: &Day) -> DayReport {
        let meals = day
            .items
            .iter()
            .enumerate()
            .map(|(index, line)| {
                let meal = self.find_meal(&line.meal_id);
                DayMealView {
                    index,
                    meal_id: line.meal_id.clone(),
                    meal_name: meal.map(|m| m.name.clone()),
                    totals: meal.map(|m| self.meal_totals(m)).unwrap_or_default(),
                }
            })
            .collect();
        let totals = self.day_totals(day);
        DayReport {
            id: day.id.clone(),
            name: day.name.clone(),
            meals,
            totals,
            goals: self.settings,
            delta: goal_delta(&totals, &self.settings),
        }
    }

    pub fn create_day(&mut self, name: &str) -> Result<Day> {
        let day = Day {
            id: new_id("day"),
            name: validate_name("Day", name)?,
            items: Vec::new(),
        };
        self.days.push(day.clone());
        Ok(day)
    }

    pub fn rename_day(&mut self, id: &str, name: &str) -> Result<Day> {
        let name = validate_name("Day", name)?;
        let day = self.day_mut(id)?;
        day.name = name;
        Ok(day.clone())
    }

    /// Insert or replace a day by id. A blank id gets a fresh one.
    pub fn save_day(&mut self, mut day: Day) -> Result<Day> {
        day.name = validate_name("Day", &day.name)?;
        if day.id.trim().is_empty() {
            day.id = new_id("day");
        }
        match self.days.iter_mut().find(|d| d.id == day.id) {
            Some(slot) => slot.clone_from(&day),
            None => self.days.push(day.clone()),
        }
        Ok(day)
    }

    pub fn add_day_line(&mut self, day_id: &str, meal_id: &str) -> Result<Day> {
        if self.find_meal(meal_id).is_none() {
            bail!("Meal {meal_id} not found");
        }
        let day = self.day_mut(day_id)?;
        day.items.push(DayLine {
            meal_id: meal_id.to_string(),
        });
        Ok(day.clone())
    }

    pub fn remove_day_line(&mut self, day_id: &str, index: usize) -> Result<Day> {
        let day = self.day_mut(day_id)?;
        if index >= day.items.len() {
            bail!(
                "Day '{}' has no line {} ({} lines)",
                day.name,
                index + 1,
                day.items.len()
            );
        }
        day.items.remove(index);
        Ok(day.clone())
    }

    /// Nothing references days, so there is nothing to cascade.
    pub fn delete_day(&mut self, id: &str) -> bool {
        let before = self.days.len();
        self.days.retain(|d| d.id != id);
        self.days.len() < before
    }

    pub fn set_goals(&mut self, kcal: Option<f64>, protein: Option<f64>) -> Result<Settings> {
        validate_goal("goalKcal", kcal)?;
        validate_goal("goalProtein", protein)?;
        self.settings = Settings {
            goal_kcal: kcal,
            goal_protein: protein,
        };
        Ok(self.settings)
    }
}
