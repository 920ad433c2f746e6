use anyhow::Result;

use mealbook_core::models::LineMode;
use mealbook_core::service::MealbookService;

use super::helpers::{
    exit_not_found, find_ingredient, find_meal, format_totals, line_index, print_line_table,
    print_totals_table,
};

fn meal_id(svc: &MealbookService, reference: &str, json: bool) -> Result<String> {
    match find_meal(svc.meals(), reference)? {
        Some(meal) => Ok(meal.id.clone()),
        None => exit_not_found(&format!("Meal '{reference}' not found"), json),
    }
}

pub(crate) fn cmd_meal_create(svc: &mut MealbookService, name: &str, json: bool) -> Result<()> {
    let meal = svc.create_meal(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let id = &meal.id;
        let name = &meal.name;
        println!("Created meal: {name} (id: {id})");
        println!("Add ingredients with: mealbook meal add \"{name}\" <ingredient> <grams>");
    }
    Ok(())
}

pub(crate) fn cmd_meal_rename(
    svc: &mut MealbookService,
    reference: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let id = meal_id(svc, reference, json)?;
    let meal = svc.rename_meal(&id, name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &meal.name;
        println!("Renamed meal {id} to {name}");
    }
    Ok(())
}

pub(crate) fn cmd_meal_add(
    svc: &mut MealbookService,
    meal_ref: &str,
    ingredient_ref: &str,
    amount: f64,
    mode: &str,
    json: bool,
) -> Result<()> {
    let mode = LineMode::parse(mode)?;
    let id = meal_id(svc, meal_ref, json)?;
    let Some(ingredient) = find_ingredient(&svc.document().ingredients, ingredient_ref)? else {
        exit_not_found(&format!("Ingredient '{ingredient_ref}' not found"), json);
    };
    let ingredient_id = ingredient.id.clone();
    let ingredient_name = ingredient.name.clone();

    let meal = svc.add_meal_line(&id, &ingredient_id, mode, amount)?;
    let line = svc
        .meal_breakdown(&meal)
        .pop()
        .map(|view| view.totals)
        .unwrap_or_default();
    let totals = svc.meal_totals(&meal);

    if json {
        println!(
            "{}",
            serde_json::json!({ "meal": meal, "line": line, "totals": totals })
        );
    } else {
        let meal_name = &meal.name;
        let what = match mode {
            LineMode::Grams => format!("{amount}g"),
            LineMode::Portion => format!("{amount} portion(s)"),
        };
        println!(
            "Added {what} of {ingredient_name} to {meal_name} ({})",
            format_totals(&line)
        );
        println!("Meal total: {}", format_totals(&totals));
    }
    Ok(())
}

pub(crate) fn cmd_meal_remove(
    svc: &mut MealbookService,
    reference: &str,
    line: usize,
    json: bool,
) -> Result<()> {
    let index = line_index(line)?;
    let id = meal_id(svc, reference, json)?;
    let meal = svc.remove_meal_line(&id, index)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&meal)?);
    } else {
        let name = &meal.name;
        println!("Removed line {line} from {name}");
        println!("Meal total: {}", format_totals(&svc.meal_totals(&meal)));
    }
    Ok(())
}

pub(crate) fn cmd_meal_delete(svc: &mut MealbookService, reference: &str, json: bool) -> Result<()> {
    let id = meal_id(svc, reference, json)?;
    let Some(report) = svc.delete_meal(&id)? else {
        exit_not_found(&format!("Meal '{reference}' not found"), json);
    };
    if json {
        println!("{}", serde_json::json!({ "deleted": id, "cascade": report }));
    } else {
        println!("Deleted meal {id}");
        if report.lines_removed > 0 {
            let lines = report.lines_removed;
            let days = report.containers_touched;
            println!("Removed it {lines} time(s) from {days} day(s)");
        }
    }
    Ok(())
}

pub(crate) fn cmd_meal_show(svc: &MealbookService, reference: &str, json: bool) -> Result<()> {
    let Some(meal) = find_meal(svc.meals(), reference)? else {
        exit_not_found(&format!("Meal '{reference}' not found"), json);
    };
    let lines = svc.meal_breakdown(meal);
    let totals = svc.meal_totals(meal);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "id": meal.id,
                "name": meal.name,
                "lines": lines,
                "totals": totals,
            }))?
        );
        return Ok(());
    }

    let name = &meal.name;
    let id = &meal.id;
    println!("=== {name} ===  (id: {id})\n");
    if lines.is_empty() {
        println!("  (no ingredients)");
    } else {
        print_line_table(&lines);
    }
    println!("\nTotal: {}", format_totals(&totals));
    Ok(())
}

pub(crate) fn cmd_meal_list(svc: &MealbookService, json: bool) -> Result<()> {
    let meals = svc.meals();

    if json {
        let out: Vec<_> = meals
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "name": m.name,
                    "lines": m.items.len(),
                    "totals": svc.meal_totals(m),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if meals.is_empty() {
        eprintln!("No meals yet. Use `mealbook meal create <name>` to create one.");
    } else {
        print_totals_table(
            meals
                .iter()
                .map(|m| (m.id.as_str(), m.name.as_str(), svc.meal_totals(m), m.items.len())),
        );
    }
    Ok(())
}
