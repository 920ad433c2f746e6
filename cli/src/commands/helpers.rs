use anyhow::{Result, bail};
use serde::Serialize;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use mealbook_core::meals::LineView;
use mealbook_core::models::{Day, Ingredient, LineMode, Meal, Totals};

/// Look a record up by exact id, falling back to a case-insensitive name match.
/// More than one record with that name is an error; none is `Ok(None)`.
pub(crate) fn find_by_ref<'a, T>(
    items: &'a [T],
    reference: &str,
    kind: &str,
    id_of: impl Fn(&T) -> &str,
    name_of: impl Fn(&T) -> &str,
) -> Result<Option<&'a T>> {
    if let Some(found) = items.iter().find(|item| id_of(item) == reference) {
        return Ok(Some(found));
    }

    let wanted = reference.trim().to_lowercase();
    let matches: Vec<&T> = items
        .iter()
        .filter(|item| name_of(item).to_lowercase() == wanted)
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [one] => Ok(Some(*one)),
        many => {
            let ids: Vec<&str> = many.iter().map(|item| id_of(item)).collect();
            bail!(
                "{} {kind}s are named '{reference}'; use an ID instead: {}",
                many.len(),
                ids.join(", ")
            )
        }
    }
}

pub(crate) fn find_ingredient<'a>(
    items: &'a [Ingredient],
    reference: &str,
) -> Result<Option<&'a Ingredient>> {
    find_by_ref(items, reference, "ingredient", |i| i.id.as_str(), |i| i.name.as_str())
}

pub(crate) fn find_meal<'a>(items: &'a [Meal], reference: &str) -> Result<Option<&'a Meal>> {
    find_by_ref(items, reference, "meal", |m| m.id.as_str(), |m| m.name.as_str())
}

pub(crate) fn find_day<'a>(items: &'a [Day], reference: &str) -> Result<Option<&'a Day>> {
    find_by_ref(items, reference, "day", |d| d.id.as_str(), |d| d.name.as_str())
}

/// Report a missing record and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

/// Convert a 1-based line number from the command line to an index.
pub(crate) fn line_index(line: usize) -> Result<usize> {
    if line == 0 {
        bail!("Line numbers start at 1");
    }
    Ok(line - 1)
}

pub(crate) fn format_amount(mode: LineMode, amount: f64, portion_name: Option<&str>) -> String {
    match mode {
        LineMode::Grams => format!("{amount}g"),
        LineMode::Portion => {
            let unit = portion_name.unwrap_or("portion");
            if (amount - 1.0).abs() < f64::EPSILON {
                format!("1 {unit}")
            } else {
                format!("{amount} x {unit}")
            }
        }
    }
}

pub(crate) fn format_totals(t: &Totals) -> String {
    let kcal = no_neg_zero(t.kcal);
    let protein = no_neg_zero(t.protein);
    let cost = no_neg_zero(t.cost);
    format!("{kcal:.1} kcal | P:{protein:.1}g | {cost:.2}")
}

pub(crate) fn print_ingredient_table(ingredients: &[&Ingredient]) {
    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Brand")]
        brand: String,
        #[tabled(rename = "kcal/100g")]
        kcal: String,
        #[tabled(rename = "P/100g")]
        protein: String,
        #[tabled(rename = "Price/kg")]
        price: String,
        #[tabled(rename = "Portion")]
        portion: String,
    }

    let rows: Vec<IngredientRow> = ingredients
        .iter()
        .enumerate()
        .map(|(i, ing)| IngredientRow {
            idx: i + 1,
            id: ing.id.clone(),
            name: truncate(&ing.name, 35),
            brand: ing
                .brand
                .as_deref()
                .map(|b| truncate(b, 20))
                .unwrap_or_default(),
            kcal: format!("{:.1}", ing.kcal100),
            protein: format!("{:.1}", ing.protein100),
            price: ing.price_per_kg.map_or("-".into(), |p| format!("{p:.2}")),
            portion: match (ing.usable_portion_grams(), ing.portion_name.as_deref()) {
                (Some(g), Some(name)) => format!("{name} ({g}g)"),
                (Some(g), None) => format!("{g}g"),
                _ => "-".into(),
            },
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_line_table(lines: &[LineView]) {
    #[derive(Tabled)]
    struct LineRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Ingredient")]
        ingredient: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Cost")]
        cost: String,
    }

    let rows: Vec<LineRow> = lines
        .iter()
        .map(|l| {
            let mut ingredient = l
                .ingredient_name
                .as_deref()
                .map_or_else(
                    || format!("(missing {})", l.ingredient_id),
                    |n| truncate(n, 35),
                );
            if l.ingredient_name.is_some() && !l.counted {
                ingredient.push_str(" (no portion size)");
            }
            LineRow {
                idx: l.index + 1,
                ingredient,
                amount: format_amount(l.mode, l.amount, l.portion_name.as_deref()),
                kcal: format!("{:.1}", no_neg_zero(l.totals.kcal)),
                protein: format!("{:.1}", no_neg_zero(l.totals.protein)),
                cost: format!("{:.2}", no_neg_zero(l.totals.cost)),
            }
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn print_totals_table<'a>(
    rows: impl IntoIterator<Item = (&'a str, &'a str, Totals, usize)>,
) {
    #[derive(Tabled)]
    struct TotalsRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Lines")]
        lines: usize,
        #[tabled(rename = "kcal")]
        kcal: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Cost")]
        cost: String,
    }

    let rows: Vec<TotalsRow> = rows
        .into_iter()
        .map(|(id, name, totals, lines)| TotalsRow {
            id: id.to_string(),
            name: truncate(name, 35),
            lines,
            kcal: format!("{:.1}", no_neg_zero(totals.kcal)),
            protein: format!("{:.1}", no_neg_zero(totals.protein)),
            cost: format!("{:.2}", no_neg_zero(totals.cost)),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mealbook_core::models::MealLine;

    fn meal(id: &str, name: &str) -> Meal {
        Meal {
            id: id.to_string(),
            name: name.to_string(),
            items: Vec::<MealLine>::new(),
        }
    }

    #[test]
    fn test_find_by_id_then_name() {
        let meals = vec![meal("meal-1", "Breakfast"), meal("meal-2", "Lunch")];
        assert_eq!(find_meal(&meals, "meal-2").unwrap().unwrap().name, "Lunch");
        assert_eq!(find_meal(&meals, "breakfast").unwrap().unwrap().id, "meal-1");
        assert_eq!(find_meal(&meals, " LUNCH ").unwrap().unwrap().id, "meal-2");
        assert!(find_meal(&meals, "Dinner").unwrap().is_none());
    }

    #[test]
    fn test_find_by_ref_ambiguous_name() {
        let meals = vec![meal("meal-1", "Snack"), meal("meal-2", "snack")];
        let err = find_meal(&meals, "Snack").unwrap_err().to_string();
        assert!(err.contains("meal-1"));
        assert!(err.contains("meal-2"));
        // an exact id still resolves
        assert_eq!(find_meal(&meals, "meal-2").unwrap().unwrap().name, "snack");
    }

    #[test]
    fn test_line_index() {
        assert_eq!(line_index(1).unwrap(), 0);
        assert_eq!(line_index(3).unwrap(), 2);
        assert!(line_index(0).is_err());
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(LineMode::Grams, 150.0, None), "150g");
        assert_eq!(format_amount(LineMode::Grams, 12.5, Some("slice")), "12.5g");
        assert_eq!(format_amount(LineMode::Portion, 1.0, Some("cookie")), "1 cookie");
        assert_eq!(format_amount(LineMode::Portion, 2.0, Some("cookie")), "2 x cookie");
        assert_eq!(format_amount(LineMode::Portion, 0.5, None), "0.5 x portion");
    }

    #[test]
    fn test_format_totals() {
        let t = Totals {
            kcal: 469.0,
            protein: 17.9,
            cost: 0.1,
        };
        assert_eq!(format_totals(&t), "469.0 kcal | P:17.9g | 0.10");
        assert_eq!(
            format_totals(&Totals::default()),
            "0.0 kcal | P:0.0g | 0.00"
        );
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("Meal x not found"), r#"{"error":"Meal x not found"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
        assert_eq!(truncate("Müsli", 10), "Müsli");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(5.0), 5.0);
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }
}
