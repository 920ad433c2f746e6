use anyhow::Result;
use clap::Args;

use mealbook_core::models::NewIngredient;
use mealbook_core::service::MealbookService;

use super::helpers::{exit_not_found, find_ingredient, print_ingredient_table};

/// Optional ingredient fields shared by `add` and `edit`.
#[derive(Args, Debug, Default)]
pub(crate) struct IngredientFields {
    /// Brand name
    #[arg(long)]
    brand: Option<String>,
    /// Price per kilogram
    #[arg(long)]
    price: Option<f64>,
    /// Portion name (e.g. "slice", "cookie")
    #[arg(long)]
    portion_name: Option<String>,
    /// Grams in one portion
    #[arg(long)]
    portion_grams: Option<f64>,
    /// Free-form notes
    #[arg(long)]
    notes: Option<String>,
}

impl IngredientFields {
    fn apply(self, input: &mut NewIngredient) {
        if let Some(brand) = self.brand {
            input.brand = Some(brand);
        }
        if let Some(price) = self.price {
            input.price_per_kg = Some(price);
        }
        if let Some(name) = self.portion_name {
            input.portion_name = Some(name);
        }
        if let Some(grams) = self.portion_grams {
            input.portion_grams = Some(grams);
        }
        if let Some(notes) = self.notes {
            input.notes = Some(notes);
        }
    }
}

pub(crate) fn cmd_ingredient_add(
    svc: &mut MealbookService,
    name: &str,
    kcal: f64,
    protein: f64,
    fields: IngredientFields,
    json: bool,
) -> Result<()> {
    let mut input = NewIngredient {
        name: name.to_string(),
        kcal100: kcal,
        protein100: protein,
        ..NewIngredient::default()
    };
    fields.apply(&mut input);
    let ingredient = svc.create_ingredient(&input)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        let id = &ingredient.id;
        let name = &ingredient.name;
        println!("Added ingredient: {name} (id: {id})");
        if ingredient.portion_grams.is_some() && !ingredient.has_usable_portion() {
            eprintln!("Note: portion size is not usable; portion mode is unavailable");
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_ingredient_edit(
    svc: &mut MealbookService,
    reference: &str,
    name: Option<String>,
    kcal: Option<f64>,
    protein: Option<f64>,
    fields: IngredientFields,
    reset_optional: bool,
    json: bool,
) -> Result<()> {
    let Some(existing) = find_ingredient(&svc.document().ingredients, reference)? else {
        exit_not_found(&format!("Ingredient '{reference}' not found"), json);
    };
    let id = existing.id.clone();
    let mut input = NewIngredient::from(existing);

    if reset_optional {
        input.brand = None;
        input.price_per_kg = None;
        input.portion_name = None;
        input.portion_grams = None;
        input.notes = None;
    }
    if let Some(name) = name {
        input.name = name;
    }
    if let Some(kcal) = kcal {
        input.kcal100 = kcal;
    }
    if let Some(protein) = protein {
        input.protein100 = protein;
    }
    fields.apply(&mut input);

    let ingredient = svc.update_ingredient(&id, &input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ingredient)?);
    } else {
        let name = &ingredient.name;
        println!("Updated ingredient: {name} (id: {id})");
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_delete(
    svc: &mut MealbookService,
    reference: &str,
    json: bool,
) -> Result<()> {
    let Some(existing) = find_ingredient(&svc.document().ingredients, reference)? else {
        exit_not_found(&format!("Ingredient '{reference}' not found"), json);
    };
    let id = existing.id.clone();
    let name = existing.name.clone();

    let Some(report) = svc.delete_ingredient(&id)? else {
        exit_not_found(&format!("Ingredient '{reference}' not found"), json);
    };
    if json {
        println!(
            "{}",
            serde_json::json!({ "deleted": id, "cascade": report })
        );
    } else {
        println!("Deleted ingredient: {name}");
        if report.lines_removed > 0 {
            let lines = report.lines_removed;
            let meals = report.containers_touched;
            println!("Removed {lines} line(s) from {meals} meal(s)");
        }
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_show(svc: &MealbookService, reference: &str, json: bool) -> Result<()> {
    let Some(ingredient) = find_ingredient(&svc.document().ingredients, reference)? else {
        exit_not_found(&format!("Ingredient '{reference}' not found"), json);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(ingredient)?);
        return Ok(());
    }

    let name = &ingredient.name;
    let id = &ingredient.id;
    println!("{name} (id: {id})");
    if let Some(brand) = &ingredient.brand {
        println!("  Brand:     {brand}");
    }
    println!("  kcal/100g: {:.1}", ingredient.kcal100);
    println!("  P/100g:    {:.1}g", ingredient.protein100);
    if let Some(price) = ingredient.price_per_kg {
        println!("  Price/kg:  {price:.2}");
    }
    match (ingredient.usable_portion_grams(), ingredient.portion_name.as_deref()) {
        (Some(g), Some(portion)) => println!("  Portion:   1 {portion} = {g}g"),
        (Some(g), None) => println!("  Portion:   {g}g"),
        (None, _) => println!("  Portion:   - (grams only)"),
    }
    if let Some(notes) = &ingredient.notes {
        println!("  Notes:     {notes}");
    }

    let used_in: Vec<&str> = svc
        .meals()
        .iter()
        .filter(|m| m.items.iter().any(|l| l.ingredient_id == *id))
        .map(|m| m.name.as_str())
        .collect();
    if !used_in.is_empty() {
        println!("  Used in:   {}", used_in.join(", "));
    }
    Ok(())
}

pub(crate) fn cmd_ingredient_list(
    svc: &MealbookService,
    search: Option<&str>,
    json: bool,
) -> Result<()> {
    let ingredients = svc.list_ingredients(search);

    if json {
        println!("{}", serde_json::to_string_pretty(&ingredients)?);
    } else if ingredients.is_empty() {
        if search.is_some_and(|s| !s.trim().is_empty()) {
            eprintln!("No ingredients match '{}'", search.unwrap_or_default());
        } else {
            eprintln!("No ingredients yet. Use `mealbook ingredient add` to add one.");
        }
    } else {
        print_ingredient_table(&ingredients);
    }
    Ok(())
}
