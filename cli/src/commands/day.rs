use anyhow::Result;

use mealbook_core::days::DayReport;
use mealbook_core::models::{GoalStatus, format_delta};
use mealbook_core::service::MealbookService;

use super::helpers::{
    exit_not_found, find_day, find_meal, format_totals, line_index, no_neg_zero,
    print_totals_table, truncate,
};

fn day_id(svc: &MealbookService, reference: &str, json: bool) -> Result<String> {
    match find_day(svc.days(), reference)? {
        Some(day) => Ok(day.id.clone()),
        None => exit_not_found(&format!("Day '{reference}' not found"), json),
    }
}

/// `+150.0 kcal (over)`, or `-` when no goal is set.
fn goal_line(delta: Option<f64>, status: Option<GoalStatus>, unit: &str) -> String {
    match (delta, status) {
        (Some(d), Some(s)) => format!("{} {unit} ({})", format_delta(d), s.label()),
        _ => "-".to_string(),
    }
}

pub(crate) fn cmd_day_create(svc: &mut MealbookService, name: &str, json: bool) -> Result<()> {
    let day = svc.create_day(name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        let id = &day.id;
        let name = &day.name;
        println!("Created day: {name} (id: {id})");
        println!("Add meals with: mealbook day add \"{name}\" <meal>");
    }
    Ok(())
}

pub(crate) fn cmd_day_rename(
    svc: &mut MealbookService,
    reference: &str,
    name: &str,
    json: bool,
) -> Result<()> {
    let id = day_id(svc, reference, json)?;
    let day = svc.rename_day(&id, name)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        let name = &day.name;
        println!("Renamed day {id} to {name}");
    }
    Ok(())
}

pub(crate) fn cmd_day_add(
    svc: &mut MealbookService,
    day_ref: &str,
    meal_ref: &str,
    json: bool,
) -> Result<()> {
    let id = day_id(svc, day_ref, json)?;
    let Some(meal) = find_meal(svc.meals(), meal_ref)? else {
        exit_not_found(&format!("Meal '{meal_ref}' not found"), json);
    };
    let meal_id = meal.id.clone();
    let meal_name = meal.name.clone();

    let day = svc.add_day_line(&id, &meal_id)?;
    let totals = svc.day_totals(&day);
    if json {
        println!(
            "{}",
            serde_json::json!({ "day": day, "totals": totals })
        );
    } else {
        let day_name = &day.name;
        println!("Added {meal_name} to {day_name}");
        println!("Day total: {}", format_totals(&totals));
    }
    Ok(())
}

pub(crate) fn cmd_day_remove(
    svc: &mut MealbookService,
    reference: &str,
    line: usize,
    json: bool,
) -> Result<()> {
    let index = line_index(line)?;
    let id = day_id(svc, reference, json)?;
    let day = svc.remove_day_line(&id, index)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
    } else {
        let name = &day.name;
        println!("Removed line {line} from {name}");
        println!("Day total: {}", format_totals(&svc.day_totals(&day)));
    }
    Ok(())
}

pub(crate) fn cmd_day_delete(svc: &mut MealbookService, reference: &str, json: bool) -> Result<()> {
    let id = day_id(svc, reference, json)?;
    if !svc.delete_day(&id)? {
        exit_not_found(&format!("Day '{reference}' not found"), json);
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted day {id}");
    }
    Ok(())
}

pub(crate) fn cmd_day_show(svc: &MealbookService, reference: &str, json: bool) -> Result<()> {
    let Some(day) = find_day(svc.days(), reference)? else {
        exit_not_found(&format!("Day '{reference}' not found"), json);
    };
    let report = svc.day_report(day);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    print_day_report(&report);
    Ok(())
}

fn print_day_report(report: &DayReport) {
    let name = &report.name;
    let id = &report.id;
    println!("=== {name} ===  (id: {id})\n");

    if report.meals.is_empty() {
        println!("  (no meals)");
    }
    for view in &report.meals {
        let n = view.index + 1;
        let meal_name = view.meal_name.as_deref().map_or_else(
            || format!("(missing {})", view.meal_id),
            |name| truncate(name, 35),
        );
        println!("  {n}. {meal_name} - {}", format_totals(&view.totals));
    }

    let t = &report.totals;
    let kcal = no_neg_zero(t.kcal);
    let protein = no_neg_zero(t.protein);
    let cost = no_neg_zero(t.cost);
    println!("\n  Total:   {kcal:.1} kcal | P:{protein:.1}g | cost {cost:.2}");

    if report.goals.goal_kcal.is_none() && report.goals.goal_protein.is_none() {
        println!("  Goals:   none set (use `mealbook goal set`)");
        return;
    }
    if let Some(goal) = report.goals.goal_kcal {
        let line = goal_line(report.delta.kcal, report.delta.kcal_status(), "kcal");
        println!("  Calories: goal {goal:.0}, {line}");
    }
    if let Some(goal) = report.goals.goal_protein {
        let line = goal_line(report.delta.protein, report.delta.protein_status(), "g");
        println!("  Protein:  goal {goal:.0}g, {line}");
    }
}

pub(crate) fn cmd_day_list(svc: &MealbookService, json: bool) -> Result<()> {
    let days = svc.days();

    if json {
        let reports: Vec<DayReport> = days.iter().map(|d| svc.day_report(d)).collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if days.is_empty() {
        eprintln!("No days yet. Use `mealbook day create <name>` to create one.");
    } else {
        print_totals_table(
            days.iter()
                .map(|d| (d.id.as_str(), d.name.as_str(), svc.day_totals(d), d.items.len())),
        );
    }
    Ok(())
}
