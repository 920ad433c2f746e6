use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version written by this build.
pub const CURRENT_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub kcal100: f64,
    pub protein100: f64,
    #[serde(default)]
    pub price_per_kg: Option<f64>,
    #[serde(default)]
    pub portion_name: Option<String>,
    #[serde(default)]
    pub portion_grams: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Ingredient {
    /// Grams in one portion, when the portion is usable (finite and positive).
    #[must_use]
    pub fn usable_portion_grams(&self) -> Option<f64> {
        self.portion_grams.filter(|g| g.is_finite() && *g > 0.0)
    }

    #[must_use]
    pub fn has_usable_portion(&self) -> bool {
        self.usable_portion_grams().is_some()
    }
}

/// Editable fields of an ingredient; the id is assigned by the catalog.
#[derive(Debug, Clone, Default)]
pub struct NewIngredient {
    pub name: String,
    pub brand: Option<String>,
    pub kcal100: f64,
    pub protein100: f64,
    pub price_per_kg: Option<f64>,
    pub portion_name: Option<String>,
    pub portion_grams: Option<f64>,
    pub notes: Option<String>,
}

impl NewIngredient {
    /// Trim text fields, turning blank optional text into `None`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            brand: clean_text(self.brand.as_deref()),
            kcal100: self.kcal100,
            protein100: self.protein100,
            price_per_kg: self.price_per_kg,
            portion_name: clean_text(self.portion_name.as_deref()),
            portion_grams: self.portion_grams,
            notes: clean_text(self.notes.as_deref()),
        }
    }

    pub(crate) fn into_ingredient(self, id: String) -> Ingredient {
        Ingredient {
            id,
            name: self.name,
            brand: self.brand,
            kcal100: self.kcal100,
            protein100: self.protein100,
            price_per_kg: self.price_per_kg,
            portion_name: self.portion_name,
            portion_grams: self.portion_grams,
            notes: self.notes,
        }
    }
}

impl From<&Ingredient> for NewIngredient {
    fn from(ingredient: &Ingredient) -> Self {
        Self {
            name: ingredient.name.clone(),
            brand: ingredient.brand.clone(),
            kcal100: ingredient.kcal100,
            protein100: ingredient.protein100,
            price_per_kg: ingredient.price_per_kg,
            portion_name: ingredient.portion_name.clone(),
            portion_grams: ingredient.portion_grams,
            notes: ingredient.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineMode {
    #[default]
    Grams,
    Portion,
}

impl LineMode {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" => Ok(Self::Grams),
            "portion" | "portions" | "p" => Ok(Self::Portion),
            _ => bail!("Invalid mode '{s}'. Must be one of: grams, portion"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Portion => "portion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLine {
    pub ingredient_id: String,
    #[serde(default)]
    pub mode: LineMode,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<MealLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayLine {
    pub meal_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<DayLine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub goal_kcal: Option<f64>,
    #[serde(default)]
    pub goal_protein: Option<f64>,
}

/// The whole persisted state graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub version: i64,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default)]
    pub days: Vec<Day>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            settings: Settings::default(),
            ingredients: Vec::new(),
            meals: Vec::new(),
            days: Vec::new(),
        }
    }
}

/// Nutrition and cost of a line, meal, or day.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Totals {
    pub kcal: f64,
    pub protein: f64,
    pub cost: f64,
}

/// What a delete removed besides the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    pub lines_removed: usize,
    pub containers_touched: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Over,
    Under,
    OnTarget,
}

impl GoalStatus {
    #[must_use]
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Self::Over
        } else if delta < 0.0 {
            Self::Under
        } else {
            Self::OnTarget
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Over => "over",
            Self::Under => "under",
            Self::OnTarget => "on target",
        }
    }
}

/// Day totals minus goals. `None` where no goal is set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GoalDelta {
    pub kcal: Option<f64>,
    pub protein: Option<f64>,
}

impl GoalDelta {
    #[must_use]
    pub fn kcal_status(&self) -> Option<GoalStatus> {
        self.kcal.map(GoalStatus::from_delta)
    }

    #[must_use]
    pub fn protein_status(&self) -> Option<GoalStatus> {
        self.protein.map(GoalStatus::from_delta)
    }
}

/// Format a delta with an explicit `+` on positive values: `+150.0`, `-20.5`, `0.0`.
#[must_use]
pub fn format_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{delta:.1}")
    } else if delta == 0.0 {
        // avoids "-0.0"
        "0.0".to_string()
    } else {
        format!("{delta:.1}")
    }
}

/// Display mode preference, persisted apart from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => bail!("Invalid theme '{s}'. Must be one of: light, dark"),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_field_names)]
pub struct ImportSummary {
    pub ingredients_imported: usize,
    pub meals_imported: usize,
    pub days_imported: usize,
}

/// Fresh record id, e.g. `ing-3f2a..`.
#[must_use]
pub fn new_id(kind: &str) -> String {
    format!("{kind}-{}", Uuid::new_v4().simple())
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        bail!("{field} must be a number");
    }
    if value < 0.0 {
        bail!("{field} must not be negative");
    }
    Ok(())
}

/// Validate ingredient input: name must not be empty, numbers must not be negative.
pub fn validate_ingredient(input: &NewIngredient) -> Result<()> {
    if input.name.trim().is_empty() {
        bail!("Ingredient name must not be empty");
    }
    check_non_negative("kcal100", input.kcal100)?;
    check_non_negative("protein100", input.protein100)?;
    if let Some(price) = input.price_per_kg {
        check_non_negative("pricePerKg", price)?;
    }
    if let Some(grams) = input.portion_grams {
        check_non_negative("portionGrams", grams)?;
    }
    Ok(())
}

pub fn validate_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("{kind} name must not be empty");
    }
    Ok(trimmed.to_string())
}

pub fn validate_amount(amount: f64) -> Result<()> {
    check_non_negative("amount", amount)
}

/// Validate a goal value; `None` clears the goal.
pub fn validate_goal(field: &str, goal: Option<f64>) -> Result<()> {
    if let Some(value) = goal {
        check_non_negative(field, value)?;
    }
    Ok(())
}
