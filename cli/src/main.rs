mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{
    IngredientFields, cmd_day_add, cmd_day_create, cmd_day_delete, cmd_day_list, cmd_day_remove,
    cmd_day_rename, cmd_day_show, cmd_export, cmd_goal_clear, cmd_goal_set, cmd_goal_show,
    cmd_import, cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_edit,
    cmd_ingredient_list, cmd_ingredient_show, cmd_meal_add, cmd_meal_create, cmd_meal_delete,
    cmd_meal_list, cmd_meal_remove, cmd_meal_rename, cmd_meal_show, cmd_theme,
};
use crate::config::Config;
use mealbook_core::service::MealbookService;

const LOG_ENV: &str = "MEALBOOK_LOG";

#[derive(Parser)]
#[command(
    name = "mealbook",
    version,
    about = "Plan meals and days from your own ingredient list",
    long_about = "Keep a catalog of ingredients, build meals from them by weight or portion, \
                  and stack meals into days to compare against calorie and protein goals."
)]
struct Cli {
    /// Data directory (default: $MEALBOOK_DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the ingredient catalog
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Build meals from ingredients
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Stack meals into days
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Daily calorie and protein goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Export everything to a JSON file
    Export {
        /// Output path, or `-` for stdout (default: mealbook-export-YYYY-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace everything with the contents of an exported JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or set the display theme
    Theme {
        /// light or dark (omit to show the current theme)
        mode: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum IngredientCommands {
    /// Add an ingredient
    Add {
        /// Ingredient name
        name: String,
        /// Calories per 100g
        #[arg(long)]
        kcal: f64,
        /// Protein grams per 100g
        #[arg(long)]
        protein: f64,
        #[command(flatten)]
        fields: IngredientFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an ingredient; unspecified fields are kept
    Edit {
        /// Ingredient ID or name
        ingredient: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Calories per 100g
        #[arg(long)]
        kcal: Option<f64>,
        /// Protein grams per 100g
        #[arg(long)]
        protein: Option<f64>,
        #[command(flatten)]
        fields: IngredientFields,
        /// Clear brand, price, portion and notes before applying the flags above
        #[arg(long)]
        reset_optional: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an ingredient and every meal line that uses it
    Delete {
        /// Ingredient ID or name
        ingredient: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one ingredient
    Show {
        /// Ingredient ID or name
        ingredient: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List ingredients, optionally filtered by name or brand
    List {
        /// Case-insensitive text to match against name or brand
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// Create an empty meal
    Create {
        /// Meal name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a meal
    Rename {
        /// Meal ID or name
        meal: String,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an ingredient line to a meal
    Add {
        /// Meal ID or name
        meal: String,
        /// Ingredient ID or name
        ingredient: String,
        /// Grams, or number of portions with --mode portion
        amount: f64,
        /// Line mode: grams or portion
        #[arg(short, long, default_value = "grams")]
        mode: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a line from a meal by its number (as shown by `meal show`)
    Remove {
        /// Meal ID or name
        meal: String,
        /// Line number, starting at 1
        line: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal and remove it from every day
    Delete {
        /// Meal ID or name
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a meal with per-line nutrition
    Show {
        /// Meal ID or name
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all meals with totals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DayCommands {
    /// Create an empty day
    Create {
        /// Day name (e.g. "Monday" or "Training day")
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a day
    Rename {
        /// Day ID or name
        day: String,
        /// New name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a meal to a day
    Add {
        /// Day ID or name
        day: String,
        /// Meal ID or name
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a meal from a day by its number (as shown by `day show`)
    Remove {
        /// Day ID or name
        day: String,
        /// Line number, starting at 1
        line: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a day
    Delete {
        /// Day ID or name
        day: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's meals, totals and distance from goals
    Show {
        /// Day ID or name
        day: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all days with totals
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Set daily goals; an omitted goal keeps its current value
    Set {
        /// Calorie goal
        #[arg(long)]
        kcal: Option<f64>,
        /// Protein goal in grams
        #[arg(long)]
        protein: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show current goals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear both goals
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[allow(clippy::too_many_lines)]
fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    tracing::debug!(
        data_dir = %config.data_dir.display(),
        store = %config.store_path.display(),
        "opening store"
    );
    let mut svc = MealbookService::new(&config.store_path)?;

    match cli.command {
        Commands::Ingredient { command } => match command {
            IngredientCommands::Add {
                name,
                kcal,
                protein,
                fields,
                json,
            } => cmd_ingredient_add(&mut svc, &name, kcal, protein, fields, json),
            IngredientCommands::Edit {
                ingredient,
                name,
                kcal,
                protein,
                fields,
                reset_optional,
                json,
            } => cmd_ingredient_edit(
                &mut svc,
                &ingredient,
                name,
                kcal,
                protein,
                fields,
                reset_optional,
                json,
            ),
            IngredientCommands::Delete { ingredient, json } => {
                cmd_ingredient_delete(&mut svc, &ingredient, json)
            }
            IngredientCommands::Show { ingredient, json } => {
                cmd_ingredient_show(&svc, &ingredient, json)
            }
            IngredientCommands::List { search, json } => {
                cmd_ingredient_list(&svc, search.as_deref(), json)
            }
        },
        Commands::Meal { command } => match command {
            MealCommands::Create { name, json } => cmd_meal_create(&mut svc, &name, json),
            MealCommands::Rename { meal, name, json } => {
                cmd_meal_rename(&mut svc, &meal, &name, json)
            }
            MealCommands::Add {
                meal,
                ingredient,
                amount,
                mode,
                json,
            } => cmd_meal_add(&mut svc, &meal, &ingredient, amount, &mode, json),
            MealCommands::Remove { meal, line, json } => {
                cmd_meal_remove(&mut svc, &meal, line, json)
            }
            MealCommands::Delete { meal, json } => cmd_meal_delete(&mut svc, &meal, json),
            MealCommands::Show { meal, json } => cmd_meal_show(&svc, &meal, json),
            MealCommands::List { json } => cmd_meal_list(&svc, json),
        },
        Commands::Day { command } => match command {
            DayCommands::Create { name, json } => cmd_day_create(&mut svc, &name, json),
            DayCommands::Rename { day, name, json } => cmd_day_rename(&mut svc, &day, &name, json),
            DayCommands::Add { day, meal, json } => cmd_day_add(&mut svc, &day, &meal, json),
            DayCommands::Remove { day, line, json } => cmd_day_remove(&mut svc, &day, line, json),
            DayCommands::Delete { day, json } => cmd_day_delete(&mut svc, &day, json),
            DayCommands::Show { day, json } => cmd_day_show(&svc, &day, json),
            DayCommands::List { json } => cmd_day_list(&svc, json),
        },
        Commands::Goal { command } => match command {
            GoalCommands::Set {
                kcal,
                protein,
                json,
            } => cmd_goal_set(&mut svc, kcal, protein, json),
            GoalCommands::Show { json } => cmd_goal_show(&svc, json),
            GoalCommands::Clear { json } => cmd_goal_clear(&mut svc, json),
        },
        Commands::Export { output, json } => cmd_export(&svc, output, json),
        Commands::Import { file, json } => cmd_import(&mut svc, &file, json),
        Commands::Theme { mode, json } => cmd_theme(&svc, mode.as_deref(), json),
    }
}
