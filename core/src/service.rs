use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::info;

use crate::days::DayReport;
use crate::meals::LineView;
use crate::migrate;
use crate::models::{
    CURRENT_VERSION, CascadeReport, Day, Document, ImportSummary, Ingredient, LineMode, Meal,
    MealLine, NewIngredient, Settings, Theme, Totals, validate_ingredient,
};
use crate::store::Store;

/// Owns the document and its store. Every mutation is applied to a copy,
/// written, and only then becomes the current document.
pub struct MealbookService {
    store: Store,
    doc: Document,
}

impl MealbookService {
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::with_store(Store::open(db_path)?)
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::with_store(Store::open_in_memory()?)
    }

    pub fn with_store(store: Store) -> Result<Self> {
        let doc = store.load_document()?;
        Ok(Self { store, doc })
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn commit<T>(&mut self, change: impl FnOnce(&mut Document) -> Result<T>) -> Result<T> {
        let mut next = self.doc.clone();
        let out = change(&mut next)?;
        self.store.save_document(&next)?;
        self.doc = next;
        Ok(out)
    }

    // --- Ingredients ---

    pub fn create_ingredient(&mut self, input: &NewIngredient) -> Result<Ingredient> {
        self.commit(|doc| doc.create_ingredient(input))
    }

    pub fn update_ingredient(&mut self, id: &str, input: &NewIngredient) -> Result<Ingredient> {
        self.commit(|doc| doc.update_ingredient(id, input))
    }

    /// `Ok(None)` when nothing had this id; the store is not written then.
    pub fn delete_ingredient(&mut self, id: &str) -> Result<Option<CascadeReport>> {
        if self.doc.find_ingredient(id).is_none() {
            return Ok(None);
        }
        self.commit(|doc| Ok(doc.delete_ingredient(id)))
    }

    #[must_use]
    pub fn find_ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.doc.find_ingredient(id)
    }

    #[must_use]
    pub fn list_ingredients(&self, filter: Option<&str>) -> Vec<&Ingredient> {
        self.doc.list_ingredients(filter)
    }

    // --- Meals ---

    pub fn create_meal(&mut self, name: &str) -> Result<Meal> {
        self.commit(|doc| doc.create_meal(name))
    }

    pub fn rename_meal(&mut self, id: &str, name: &str) -> Result<Meal> {
        self.commit(|doc| doc.rename_meal(id, name))
    }

    pub fn save_meal(&mut self, meal: Meal) -> Result<Meal> {
        self.commit(|doc| doc.save_meal(meal))
    }

    pub fn add_meal_line(
        &mut self,
        meal_id: &str,
        ingredient_id: &str,
        mode: LineMode,
        amount: f64,
    ) -> Result<Meal> {
        let line = MealLine {
            ingredient_id: ingredient_id.to_string(),
            mode,
            amount,
        };
        self.commit(|doc| doc.add_meal_line(meal_id, line))
    }

    pub fn remove_meal_line(&mut self, meal_id: &str, index: usize) -> Result<Meal> {
        self.commit(|doc| doc.remove_meal_line(meal_id, index))
    }

    pub fn delete_meal(&mut self, id: &str) -> Result<Option<CascadeReport>> {
        if self.doc.find_meal(id).is_none() {
            return Ok(None);
        }
        self.commit(|doc| Ok(doc.delete_meal(id)))
    }

    #[must_use]
    pub fn find_meal(&self, id: &str) -> Option<&Meal> {
        self.doc.find_meal(id)
    }

    #[must_use]
    pub fn meals(&self) -> &[Meal] {
        &self.doc.meals
    }

    #[must_use]
    pub fn meal_totals(&self, meal: &Meal) -> Totals {
        self.doc.meal_totals(meal)
    }

    #[must_use]
    pub fn meal_breakdown(&self, meal: &Meal) -> Vec<LineView> {
        self.doc.meal_breakdown(meal)
    }

    // --- Days ---

    pub fn create_day(&mut self, name: &str) -> Result<Day> {
        self.commit(|doc| doc.create_day(name))
    }

    pub fn rename_day(&mut self, id: &str, name: &str) -> Result<Day> {
        self.commit(|doc| doc.rename_day(id, name))
    }

    pub fn save_day(&mut self, day: Day) -> Result<Day> {
        self.commit(|doc| doc.save_day(day))
    }

    pub fn add_day_line(&mut self, day_id: &str, meal_id: &str) -> Result<Day> {
        self.commit(|doc| doc.add_day_line(day_id, meal_id))
    }

    pub fn remove_day_line(&mut self, day_id: &str, index: usize) -> Result<Day> {
        self.commit(|doc| doc.remove_day_line(day_id, index))
    }

    pub fn delete_day(&mut self, id: &str) -> Result<bool> {
        if self.doc.find_day(id).is_none() {
            return Ok(false);
        }
        self.commit(|doc| Ok(doc.delete_day(id)))
    }

    #[must_use]
    pub fn find_day(&self, id: &str) -> Option<&Day> {
        self.doc.find_day(id)
    }

    #[must_use]
    pub fn days(&self) -> &[Day] {
        &self.doc.days
    }

    #[must_use]
    pub fn day_totals(&self, day: &Day) -> Totals {
        self.doc.day_totals(day)
    }

    #[must_use]
    pub fn day_report(&self, day: &Day) -> DayReport {
        self.doc.day_report(day)
    }

    // --- Goals ---

    #[must_use]
    pub fn goals(&self) -> Settings {
        self.doc.settings
    }

    pub fn set_goals(&mut self, kcal: Option<f64>, protein: Option<f64>) -> Result<Settings> {
        self.commit(|doc| doc.set_goals(kcal, protein))
    }

    // --- Theme ---

    pub fn theme(&self) -> Result<Theme> {
        self.store.theme()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set_theme(theme)
    }

    // --- Export / Import ---

    /// The whole document as pretty-printed JSON.
    pub fn export_document(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.doc).context("Failed to serialize document")
    }

    /// Replace the document with an imported one. Anything that is not an
    /// object with `ingredients` and `meals` arrays is rejected and the
    /// current document is left as it was.
    pub fn import_document(&mut self, json: &str) -> Result<ImportSummary> {
        let value: Value = serde_json::from_str(json).context("Import file is not valid JSON")?;
        let Some(map) = value.as_object() else {
            bail!("Invalid import file: expected a JSON object");
        };
        for key in ["ingredients", "meals"] {
            if !map.get(key).is_some_and(Value::is_array) {
                bail!("Invalid import file: '{key}' must be an array");
            }
        }
        let version = migrate::declared_version(map);
        if version > CURRENT_VERSION {
            bail!(
                "Import file has version {version}, newer than supported version {CURRENT_VERSION}"
            );
        }

        let imported = migrate::upgrade(value).context("Invalid import file")?;
        for ingredient in &imported.ingredients {
            validate_ingredient(&NewIngredient::from(ingredient)).with_context(|| {
                format!("Invalid import file: ingredient '{}'", ingredient.id)
            })?;
        }
        let summary = ImportSummary {
            ingredients_imported: imported.ingredients.len(),
            meals_imported: imported.meals.len(),
            days_imported: imported.days.len(),
        };
        self.commit(|doc| {
            *doc = imported;
            Ok(())
        })?;
        info!(
            ingredients = summary.ingredients_imported,
            meals = summary.meals_imported,
            days = summary.days_imported,
            "imported document"
        );
        Ok(summary)
    }
}
