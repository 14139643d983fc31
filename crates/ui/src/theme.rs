use confab_chat::ThemeChoice;
use gpui::{App, Window};
use gpui_component::{Theme, ThemeMode};

pub fn theme_mode(choice: ThemeChoice) -> ThemeMode {
    match choice {
        ThemeChoice::Light => ThemeMode::Light,
        ThemeChoice::Dark => ThemeMode::Dark,
    }
}

/// Switches the global component theme to the configured mode.
pub fn apply_theme(choice: ThemeChoice, window: Option<&mut Window>, cx: &mut App) {
    Theme::change(theme_mode(choice), window, cx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_is_the_default_mode() {
        assert_eq!(theme_mode(ThemeChoice::default()), ThemeMode::Light);
        assert_eq!(theme_mode(ThemeChoice::Dark), ThemeMode::Dark);
    }
}
