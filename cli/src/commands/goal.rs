use anyhow::{Result, bail};

use mealbook_core::models::Settings;
use mealbook_core::service::MealbookService;

fn print_goals(goals: Settings) {
    match goals.goal_kcal {
        Some(kcal) => println!("Calories: {kcal} kcal/day"),
        None => println!("Calories: not set"),
    }
    match goals.goal_protein {
        Some(protein) => println!("Protein:  {protein} g/day"),
        None => println!("Protein:  not set"),
    }
}

pub(crate) fn cmd_goal_set(
    svc: &mut MealbookService,
    kcal: Option<f64>,
    protein: Option<f64>,
    json: bool,
) -> Result<()> {
    if kcal.is_none() && protein.is_none() {
        bail!("Give at least one of --kcal or --protein");
    }
    let current = svc.goals();
    let goals = svc.set_goals(kcal.or(current.goal_kcal), protein.or(current.goal_protein))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else {
        print_goals(goals);
    }
    Ok(())
}

pub(crate) fn cmd_goal_show(svc: &MealbookService, json: bool) -> Result<()> {
    let goals = svc.goals();
    if json {
        println!("{}", serde_json::to_string_pretty(&goals)?);
    } else if goals == Settings::default() {
        eprintln!("No goals set. Use `mealbook goal set --kcal <n>` to set one.");
    } else {
        print_goals(goals);
    }
    Ok(())
}

pub(crate) fn cmd_goal_clear(svc: &mut MealbookService, json: bool) -> Result<()> {
    let had_goals = svc.goals() != Settings::default();
    if had_goals {
        svc.set_goals(None, None)?;
    }

    if json {
        println!("{}", serde_json::json!({ "cleared": had_goals }));
    } else if had_goals {
        println!("Goals cleared");
    } else {
        eprintln!("No goals were set");
    }
    Ok(())
}
