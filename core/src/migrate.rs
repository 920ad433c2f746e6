//! Upgrades stored and imported documents to the current schema.
//!
//! A document without a `version` is legacy version 0. Each entry in
//! [`MIGRATIONS`] lifts a document from one version to the next and they run in
//! order. [`normalize`] then repairs shape problems any version may carry, and
//! is idempotent.

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use crate::models::{CURRENT_VERSION, Document, new_id};

type Migration = fn(&mut Map<String, Value>);

/// `MIGRATIONS[n]` upgrades version `n` to `n + 1`.
const MIGRATIONS: &[Migration] = &[migrate_v0_to_v1];

const INGREDIENT_TEXT_KEYS: &[&str] = &["brand", "portionName", "notes"];

/// Migrate and normalize a parsed document, then decode it.
pub fn upgrade(value: Value) -> Result<Document> {
    let Value::Object(mut map) = value else {
        bail!("Document must be a JSON object");
    };

    let version = declared_version(&map);
    map.insert("version".to_string(), json!(version));
    if version > CURRENT_VERSION {
        warn!(
            version,
            current = CURRENT_VERSION,
            "document is newer than this build; reading it best-effort"
        );
    }
    let start = usize::try_from(version.max(0)).unwrap_or(0);
    for (from, step) in MIGRATIONS.iter().enumerate().skip(start) {
        debug!(from, to = from + 1, "migrating document");
        step(&mut map);
    }

    normalize(&mut map);
    serde_json::from_value(Value::Object(map)).context("Document does not match the schema")
}

/// The schema version a document claims. Missing or non-numeric is legacy 0;
/// a fractional version rounds up so `1.5` counts as newer than 1.
#[must_use]
pub fn declared_version(doc: &Map<String, Value>) -> i64 {
    let Some(version) = doc.get("version") else {
        return 0;
    };
    if let Some(v) = version.as_i64() {
        return v;
    }
    as_number(version).map_or(0, |v| v.ceil() as i64)
}

/// Version 0 documents named days by a `date` string and had no prices.
fn migrate_v0_to_v1(doc: &mut Map<String, Value>) {
    if let Some(Value::Array(days)) = doc.get_mut("days") {
        for day in days.iter_mut().filter_map(Value::as_object_mut) {
            rename_legacy_date(day);
        }
    }
    doc.insert("version".to_string(), json!(1));
}

fn rename_legacy_date(day: &mut Map<String, Value>) {
    let has_name = match day.get("name") {
        None | Some(Value::Null) => false,
        Some(Value::String(name)) => !name.is_empty(),
        Some(_) => true,
    };
    if !has_name {
        if let Some(date) = day.remove("date") {
            day.insert("name".to_string(), date);
        }
    }
}

/// Coerce a document of the current version into a decodable shape.
pub fn normalize(doc: &mut Map<String, Value>) {
    if !doc.get("version").is_some_and(Value::is_i64) {
        doc.insert("version".to_string(), json!(CURRENT_VERSION));
    }

    if !doc.get("settings").is_some_and(Value::is_object) {
        doc.insert("settings".to_string(), json!({}));
    }
    if let Some(Value::Object(settings)) = doc.get_mut("settings") {
        for key in ["goalKcal", "goalProtein"] {
            let goal = settings.get(key).and_then(as_number);
            settings.insert(key.to_string(), goal.map_or(Value::Null, |g| json!(g)));
        }
    }

    for key in ["ingredients", "meals", "days"] {
        if !doc.get(key).is_some_and(Value::is_array) {
            doc.insert(key.to_string(), json!([]));
        }
    }

    if let Some(Value::Array(ingredients)) = doc.get_mut("ingredients") {
        ingredients.retain(Value::is_object);
        for ingredient in ingredients.iter_mut().filter_map(Value::as_object_mut) {
            normalize_ingredient(ingredient);
        }
    }

    if let Some(Value::Array(meals)) = doc.get_mut("meals") {
        meals.retain(Value::is_object);
        for meal in meals.iter_mut().filter_map(Value::as_object_mut) {
            ensure_id(meal, "meal");
            ensure_text(meal, "name");
            ensure_items(meal);
            if let Some(Value::Array(lines)) = meal.get_mut("items") {
                lines.retain(|l| l.get("ingredientId").is_some_and(Value::is_string));
                for line in lines.iter_mut().filter_map(Value::as_object_mut) {
                    normalize_meal_line(line);
                }
            }
        }
    }

    if let Some(Value::Array(days)) = doc.get_mut("days") {
        days.retain(Value::is_object);
        for day in days.iter_mut().filter_map(Value::as_object_mut) {
            rename_legacy_date(day);
            ensure_id(day, "day");
            ensure_text(day, "name");
            ensure_items(day);
            if let Some(Value::Array(lines)) = day.get_mut("items") {
                lines.retain(|l| l.get("mealId").is_some_and(Value::is_string));
            }
        }
    }
}

fn normalize_ingredient(ingredient: &mut Map<String, Value>) {
    ensure_id(ingredient, "ing");
    ensure_text(ingredient, "name");
    for key in ["kcal100", "protein100"] {
        let value = ingredient
            .get(key)
            .and_then(as_number)
            .filter(|v| *v >= 0.0)
            .unwrap_or(0.0);
        ingredient.insert(key.to_string(), json!(value));
    }
    for key in ["pricePerKg", "portionGrams"] {
        let value = ingredient.get(key).and_then(as_number).filter(|v| *v >= 0.0);
        ingredient.insert(key.to_string(), value.map_or(Value::Null, |v| json!(v)));
    }
    for key in INGREDIENT_TEXT_KEYS {
        let text = match ingredient.get(*key) {
            Some(Value::String(s)) => json!(s),
            Some(Value::Number(n)) => json!(n.to_string()),
            _ => Value::Null,
        };
        ingredient.insert((*key).to_string(), text);
    }
}

fn normalize_meal_line(line: &mut Map<String, Value>) {
    let mode = match line.get("mode").and_then(Value::as_str) {
        Some("portion") => "portion",
        _ => "grams",
    };
    line.insert("mode".to_string(), json!(mode));
    let amount = line
        .get("amount")
        .and_then(as_number)
        .filter(|v| *v >= 0.0)
        .unwrap_or(0.0);
    line.insert("amount".to_string(), json!(amount));
}

fn ensure_id(record: &mut Map<String, Value>, kind: &str) {
    let present = record
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.is_empty());
    if !present {
        let id = match record.get("id") {
            Some(Value::Number(n)) => n.to_string(),
            _ => new_id(kind),
        };
        record.insert("id".to_string(), json!(id));
    }
}

fn ensure_text(record: &mut Map<String, Value>, key: &str) {
    let text = match record.get(key) {
        Some(Value::String(_)) => return,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    record.insert(key.to_string(), json!(text));
}

fn ensure_items(record: &mut Map<String, Value>) {
    if !record.get("items").is_some_and(Value::is_array) {
        record.insert("items".to_string(), json!([]));
    }
}

/// A finite number, or a string that parses as one.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LineMode;

    #[test]
    fn test_legacy_day_date_becomes_name() {
        let doc = upgrade(json!({
            "ingredients": [],
            "meals": [],
            "days": [{ "id": "d1", "date": "Monday", "items": [] }]
        }))
        .unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.days[0].name, "Monday");
    }

    #[test]
    fn test_date_renamed_even_when_versioned() {
        let doc = upgrade(json!({
            "version": 1,
            "ingredients": [],
            "meals": [],
            "days": [{ "date": "Tuesday" }]
        }))
        .unwrap();
        assert_eq!(doc.days[0].name, "Tuesday");
        assert!(doc.days[0].id.starts_with("day-"));
        assert!(doc.days[0].items.is_empty());
    }

    #[test]
    fn test_existing_name_wins_over_date() {
        let doc = upgrade(json!({
            "days": [{ "id": "d1", "name": "Leg day", "date": "2024-01-01" }]
        }))
        .unwrap();
        assert_eq!(doc.days[0].name, "Leg day");
    }

    #[test]
    fn test_missing_collections_and_settings() {
        let doc = upgrade(json!({ "version": 1 })).unwrap();
        assert!(doc.ingredients.is_empty());
        assert!(doc.meals.is_empty());
        assert!(doc.days.is_empty());
        assert!(doc.settings.goal_kcal.is_none());
        assert!(doc.settings.goal_protein.is_none());
    }

    #[test]
    fn test_non_array_collections_coerced() {
        let doc = upgrade(json!({
            "settings": "broken",
            "ingredients": {},
            "meals": null,
            "days": 5
        }))
        .unwrap();
        assert!(doc.ingredients.is_empty());
        assert!(doc.meals.is_empty());
        assert!(doc.days.is_empty());
    }

    #[test]
    fn test_ingredient_price_defaults_to_null() {
        let mut map = json!({
            "version": 1,
            "ingredients": [{ "id": "i1", "name": "Egg", "kcal100": 143, "protein100": 12.6 }]
        })
        .as_object()
        .cloned()
        .unwrap();
        normalize(&mut map);
        assert!(map["ingredients"][0]["pricePerKg"].is_null());
        assert!(map["ingredients"][0]["portionGrams"].is_null());

        let doc: Document = serde_json::from_value(Value::Object(map)).unwrap();
        assert_eq!(doc.ingredients[0].kcal100, 143.0);
        assert!(doc.ingredients[0].price_per_kg.is_none());
    }

    #[test]
    fn test_string_numbers_and_bad_amounts() {
        let doc = upgrade(json!({
            "ingredients": [{ "id": "i1", "name": "Egg", "kcal100": "143", "protein100": "x" }],
            "meals": [{
                "id": "m1",
                "name": "Eggs",
                "items": [
                    { "ingredientId": "i1", "mode": "portion", "amount": "2" },
                    { "ingredientId": "i1", "amount": "lots" },
                    { "mode": "grams", "amount": 10 }
                ]
            }]
        }))
        .unwrap();
        assert_eq!(doc.ingredients[0].kcal100, 143.0);
        assert_eq!(doc.ingredients[0].protein100, 0.0);
        let items = &doc.meals[0].items;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].mode, LineMode::Portion);
        assert_eq!(items[0].amount, 2.0);
        assert_eq!(items[1].mode, LineMode::Grams);
        assert_eq!(items[1].amount, 0.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let mut once = json!({
            "days": [{ "date": "Monday" }],
            "meals": [{ "name": "Soup" }]
        })
        .as_object()
        .cloned()
        .unwrap();
        normalize(&mut once);
        let mut twice = once.clone();
        normalize(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(upgrade(json!([1, 2, 3])).is_err());
        assert!(upgrade(json!("hello")).is_err());
    }

    #[test]
    fn test_future_version_read_best_effort() {
        let doc = upgrade(json!({ "version": 7, "ingredients": [] })).unwrap();
        assert_eq!(doc.version, 7);
    }

    #[test]
    fn test_float_version_kept_as_integer() {
        let doc = upgrade(json!({ "version": 7.0 })).unwrap();
        assert_eq!(doc.version, 7);
        let doc = upgrade(json!({ "version": 1.0, "days": [{ "date": "Monday" }] })).unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.days[0].name, "Monday");
    }

    #[test]
    fn test_declared_version() {
        let version = |v: Value| declared_version(json!({ "version": v }).as_object().unwrap());
        assert_eq!(version(json!(1)), 1);
        assert_eq!(version(json!(2.0)), 2);
        assert_eq!(version(json!(1.5)), 2);
        assert_eq!(version(json!("3")), 3);
        assert_eq!(version(json!(null)), 0);
        assert_eq!(version(json!("abc")), 0);
        assert_eq!(declared_version(&Map::new()), 0);
    }

    #[test]
    fn test_wrongly_typed_text_fields_coerced() {
        let doc = upgrade(json!({
            "version": 1,
            "ingredients": [{
                "id": "i1",
                "name": "Oats",
                "kcal100": 389,
                "protein100": 16.9,
                "brand": 5,
                "portionName": ["bowl"],
                "notes": true
            }],
            "meals": [{ "id": "m1", "name": "Porridge", "items": [] }]
        }))
        .unwrap();
        let oats = &doc.ingredients[0];
        assert_eq!(oats.brand.as_deref(), Some("5"));
        assert!(oats.portion_name.is_none());
        assert!(oats.notes.is_none());
        assert_eq!(doc.meals.len(), 1);
    }

    #[test]
    fn test_negative_numbers_clamped() {
        let doc = upgrade(json!({
            "ingredients": [{
                "id": "i1",
                "name": "Oil",
                "kcal100": -500,
                "protein100": -3,
                "pricePerKg": -2,
                "portionGrams": -8
            }],
            "meals": [{
                "id": "m1",
                "name": "Salad",
                "items": [{ "ingredientId": "i1", "amount": -20 }]
            }]
        }))
        .unwrap();
        let oil = &doc.ingredients[0];
        assert_eq!(oil.kcal100, 0.0);
        assert_eq!(oil.protein100, 0.0);
        assert!(oil.price_per_kg.is_none());
        assert!(oil.portion_grams.is_none());
        assert_eq!(doc.meals[0].items[0].amount, 0.0);
    }

    #[test]
    fn test_empty_name_takes_legacy_date() {
        let doc = upgrade(json!({
            "version": 1,
            "days": [
                { "id": "d1", "name": "", "date": "Tuesday" },
                { "id": "d2", "name": "" }
            ]
        }))
        .unwrap();
        assert_eq!(doc.days[0].name, "Tuesday");
        assert_eq!(doc.days[1].name, "");
    }
}
