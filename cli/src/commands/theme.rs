use anyhow::Result;

use mealbook_core::models::Theme;
use mealbook_core::service::MealbookService;

pub(crate) fn cmd_theme(svc: &MealbookService, mode: Option<&str>, json: bool) -> Result<()> {
    let theme = match mode {
        Some(mode) => {
            let theme = Theme::parse(mode)?;
            svc.set_theme(theme)?;
            theme
        }
        None => svc.theme()?,
    };

    if json {
        println!("{}", serde_json::json!({ "theme": theme }));
    } else if mode.is_some() {
        println!("Theme set to {}", theme.as_str());
    } else {
        println!("{}", theme.as_str());
    }
    Ok(())
}
