use ratatui::style::Color;

use super::ThemeName;

/// Colours used by the month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: Color,
    pub text: Color,
    pub muted: Color,
    pub today: Color,
    pub selected_fg: Color,
    pub selected_bg: Color,
    pub event_marker: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: ThemeName) -> Self {
        match theme {
            ThemeName::Dark => Self {
                accent: Color::Cyan,
                text: Color::White,
                muted: Color::DarkGray,
                today: Color::Yellow,
                selected_fg: Color::Black,
                selected_bg: Color::Blue,
                event_marker: Color::Green,
                error: Color::Red,
            },
            ThemeName::Light => Self {
                accent: Color::Blue,
                text: Color::Black,
                muted: Color::Gray,
                today: Color::Magenta,
                selected_fg: Color::White,
                selected_bg: Color::Blue,
                event_marker: Color::Green,
                error: Color::Red,
            },
            ThemeName::HighContrast => Self {
                accent: Color::White,
                text: Color::White,
                muted: Color::Gray,
                today: Color::LightYellow,
                selected_fg: Color::Black,
                selected_bg: Color::White,
                event_marker: Color::LightGreen,
                error: Color::LightRed,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_have_distinct_palettes() {
        let dark = Palette::for_theme(ThemeName::Dark);
        assert_ne!(dark, Palette::for_theme(ThemeName::Light));
        assert_ne!(dark, Palette::for_theme(ThemeName::HighContrast));
    }
}
