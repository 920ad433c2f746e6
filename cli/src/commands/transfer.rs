use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

use mealbook_core::service::MealbookService;

pub(crate) fn default_export_name(date: NaiveDate) -> String {
    format!("mealbook-export-{}.json", date.format("%Y-%m-%d"))
}

pub(crate) fn cmd_export(svc: &MealbookService, output: Option<PathBuf>, json: bool) -> Result<()> {
    let body = svc.export_document()?;

    if output.as_deref() == Some(Path::new("-")) {
        println!("{body}");
        return Ok(());
    }

    let path =
        output.unwrap_or_else(|| PathBuf::from(default_export_name(Local::now().date_naive())));
    std::fs::write(&path, &body)
        .with_context(|| format!("Failed to write export file: {}", path.display()))?;

    let doc = svc.document();
    if json {
        println!(
            "{}",
            serde_json::json!({
                "path": path.display().to_string(),
                "ingredients": doc.ingredients.len(),
                "meals": doc.meals.len(),
                "days": doc.days.len(),
            })
        );
    } else {
        let (ingredients, meals, days) = (doc.ingredients.len(), doc.meals.len(), doc.days.len());
        println!(
            "Exported {ingredients} ingredient(s), {meals} meal(s), {days} day(s) to {}",
            path.display()
        );
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &mut MealbookService, file: &Path, json: bool) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read import file: {}", file.display()))?;
    let summary = svc
        .import_document(&contents)
        .with_context(|| format!("Could not import {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let ingredients = summary.ingredients_imported;
        let meals = summary.meals_imported;
        let days = summary.days_imported;
        println!("Imported {ingredients} ingredient(s), {meals} meal(s), {days} day(s)");
        println!("Previous data was replaced.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(default_export_name(date), "mealbook-export-2024-03-07.json");
    }

    #[test]
    fn test_export_then_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup.json");

        let mut source = MealbookService::new_in_memory().unwrap();
        source.create_meal("Porridge").unwrap();
        source.set_goals(Some(2100.0), None).unwrap();
        cmd_export(&source, Some(path.clone()), true).unwrap();
        assert!(path.is_file());

        let mut target = MealbookService::new_in_memory().unwrap();
        cmd_import(&mut target, &path, true).unwrap();
        assert_eq!(target.document(), source.document());
    }

    #[test]
    fn test_import_invalid_file_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"ingredients": "nope", "meals": []}"#).unwrap();

        let mut svc = MealbookService::new_in_memory().unwrap();
        svc.create_day("Monday").unwrap();
        let err = cmd_import(&mut svc, &path, false).unwrap_err();
        assert!(format!("{err:#}").contains("ingredients"));
        assert_eq!(svc.days().len(), 1);
    }
}
