use std::fs;

use ratatui::style::Color;
use rust_embed::Embed;
use serde::{Deserialize, Serialize};

use crate::engine::timer::ColorZone;
use crate::session::events::Severity;

#[derive(Embed)]
#[folder = "assets/themes/"]
struct ThemeAssets;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub colors: ThemeColors,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThemeColors {
    pub bg: String,
    pub fg: String,
    pub text_dim: String,
    pub accent: String,
    pub accent_dim: String,
    pub border: String,
    pub border_focused: String,
    pub header_bg: String,
    pub header_fg: String,
    pub bar_empty: String,
    pub zone_safe: String,
    pub zone_caution: String,
    pub zone_danger: String,
    pub correct: String,
    pub wrong: String,
    pub option_bg: String,
    pub incentive: String,
    pub warning: String,
    pub success: String,
    pub info: String,
}

impl Theme {
    pub fn load(name: &str) -> Option<Self> {
        // Try user themes dir
        if let Some(config_dir) = dirs::config_dir() {
            let user_theme_path = config_dir
                .join("matemagica")
                .join("themes")
                .join(format!("{name}.toml"));
            if let Ok(content) = fs::read_to_string(&user_theme_path) {
                match toml::from_str::<Theme>(&content) {
                    Ok(theme) => return Some(theme),
                    Err(e) => tracing::warn!(path = %user_theme_path.display(), error = %e, "invalid user theme"),
                }
            }
        }

        // Try bundled themes
        let filename = format!("{name}.toml");
        if let Some(file) = ThemeAssets::get(&filename)
            && let Ok(content) = std::str::from_utf8(file.data.as_ref())
            && let Ok(theme) = toml::from_str::<Theme>(content)
        {
            return Some(theme);
        }

        None
    }

    pub fn available_themes() -> Vec<String> {
        ThemeAssets::iter()
            .filter_map(|f| f.strip_suffix(".toml").map(|n| n.to_string()))
            .collect()
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::load("chalkboard").unwrap_or_else(|| Self {
            name: "default".to_string(),
            colors: ThemeColors::default(),
        })
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            bg: "#1f2b24".to_string(),
            fg: "#e8efe6".to_string(),
            text_dim: "#7d8f82".to_string(),
            accent: "#f2d974".to_string(),
            accent_dim: "#3c4d42".to_string(),
            border: "#4a5d50".to_string(),
            border_focused: "#f2d974".to_string(),
            header_bg: "#2a3a30".to_string(),
            header_fg: "#e8efe6".to_string(),
            bar_empty: "#2a3a30".to_string(),
            zone_safe: "#8fd694".to_string(),
            zone_caution: "#f2d974".to_string(),
            zone_danger: "#f28b82".to_string(),
            correct: "#8fd694".to_string(),
            wrong: "#f28b82".to_string(),
            option_bg: "#2a3a30".to_string(),
            incentive: "#c3a6ff".to_string(),
            warning: "#f2d974".to_string(),
            success: "#8fd694".to_string(),
            info: "#8ecae6".to_string(),
        }
    }
}

impl ThemeColors {
    pub fn parse_color(hex: &str) -> Color {
        let hex = hex.trim_start_matches('#');
        if hex.len() == 6
            && let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            )
        {
            return Color::Rgb(r, g, b);
        }
        Color::White
    }

    pub fn bg(&self) -> Color { Self::parse_color(&self.bg) }
    pub fn fg(&self) -> Color { Self::parse_color(&self.fg) }
    pub fn text_dim(&self) -> Color { Self::parse_color(&self.text_dim) }
    pub fn accent(&self) -> Color { Self::parse_color(&self.accent) }
    pub fn accent_dim(&self) -> Color { Self::parse_color(&self.accent_dim) }
    pub fn border(&self) -> Color { Self::parse_color(&self.border) }
    pub fn border_focused(&self) -> Color { Self::parse_color(&self.border_focused) }
    pub fn header_bg(&self) -> Color { Self::parse_color(&self.header_bg) }
    pub fn header_fg(&self) -> Color { Self::parse_color(&self.header_fg) }
    pub fn bar_empty(&self) -> Color { Self::parse_color(&self.bar_empty) }
    pub fn correct(&self) -> Color { Self::parse_color(&self.correct) }
    pub fn wrong(&self) -> Color { Self::parse_color(&self.wrong) }
    pub fn option_bg(&self) -> Color { Self::parse_color(&self.option_bg) }
    pub fn warning(&self) -> Color { Self::parse_color(&self.warning) }
    pub fn success(&self) -> Color { Self::parse_color(&self.success) }

    pub fn zone(&self, zone: ColorZone) -> Color {
        match zone {
            ColorZone::Safe => Self::parse_color(&self.zone_safe),
            ColorZone::Caution => Self::parse_color(&self.zone_caution),
            ColorZone::Danger => Self::parse_color(&self.zone_danger),
        }
    }

    pub fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Success => Self::parse_color(&self.success),
            Severity::Info => Self::parse_color(&self.info),
            Severity::Warning => Self::parse_color(&self.warning),
            Severity::Incentive => Self::parse_color(&self.incentive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_themes_parse() {
        let names = Theme::available_themes();
        assert!(names.contains(&"chalkboard".to_string()));
        for name in names {
            assert!(Theme::load(&name).is_some(), "theme {name} should parse");
        }
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(ThemeColors::parse_color("#ff8000"), Color::Rgb(255, 128, 0));
        assert_eq!(ThemeColors::parse_color("nope"), Color::White);
    }
}
