mod day;
mod goal;
mod helpers;
mod ingredient;
mod meal;
mod theme;
mod transfer;

pub(crate) use day::{
    cmd_day_add, cmd_day_create, cmd_day_delete, cmd_day_list, cmd_day_remove, cmd_day_rename,
    cmd_day_show,
};
pub(crate) use goal::{cmd_goal_clear, cmd_goal_set, cmd_goal_show};
pub(crate) use ingredient::{
    IngredientFields, cmd_ingredient_add, cmd_ingredient_delete, cmd_ingredient_edit,
    cmd_ingredient_list, cmd_ingredient_show,
};
pub(crate) use meal::{
    cmd_meal_add, cmd_meal_create, cmd_meal_delete, cmd_meal_list, cmd_meal_remove,
    cmd_meal_rename, cmd_meal_show,
};
pub(crate) use theme::cmd_theme;
pub(crate) use transfer::{cmd_export, cmd_import};
