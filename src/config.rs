use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::round::Level;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    #[serde(default = "default_time_limit_easy_secs")]
    pub time_limit_easy_secs: u64,
    #[serde(default = "default_time_limit_medium_secs")]
    pub time_limit_medium_secs: u64,
    #[serde(default = "default_time_limit_advanced_secs")]
    pub time_limit_advanced_secs: u64,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_xp_per_hit")]
    pub xp_per_hit: u32,
    #[serde(default = "default_extend_cost")]
    pub extend_cost: u32,
    #[serde(default = "default_extend_cost_accessible")]
    pub extend_cost_accessible: u32,
    #[serde(default = "default_extend_secs")]
    pub extend_secs: u64,
    #[serde(default = "default_extend_secs_accessible")]
    pub extend_secs_accessible: u64,
    #[serde(default = "default_reveal_cost")]
    pub reveal_cost: u32,
    #[serde(default = "default_correct_delay_ms")]
    pub correct_delay_ms: u64,
    #[serde(default = "default_wrong_delay_ms")]
    pub wrong_delay_ms: u64,
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default)]
    pub start_in_study_mode: bool,
    #[serde(default)]
    pub voice_readout: bool,
}

fn default_theme() -> String {
    "chalkboard".to_string()
}
fn default_question_count() -> usize {
    20
}
fn default_time_limit_easy_secs() -> u64 {
    15
}
fn default_time_limit_medium_secs() -> u64 {
    30
}
fn default_time_limit_advanced_secs() -> u64 {
    45
}
fn default_tick_ms() -> u64 {
    100
}
fn default_xp_per_hit() -> u32 {
    50
}
fn default_extend_cost() -> u32 {
    100
}
fn default_extend_cost_accessible() -> u32 {
    150
}
fn default_extend_secs() -> u64 {
    5
}
fn default_extend_secs_accessible() -> u64 {
    10
}
fn default_reveal_cost() -> u32 {
    250
}
fn default_correct_delay_ms() -> u64 {
    1500
}
fn default_wrong_delay_ms() -> u64 {
    2500
}
fn default_reveal_delay_ms() -> u64 {
    3000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            question_count: default_question_count(),
            time_limit_easy_secs: default_time_limit_easy_secs(),
            time_limit_medium_secs: default_time_limit_medium_secs(),
            time_limit_advanced_secs: default_time_limit_advanced_secs(),
            tick_ms: default_tick_ms(),
            xp_per_hit: default_xp_per_hit(),
            extend_cost: default_extend_cost(),
            extend_cost_accessible: default_extend_cost_accessible(),
            extend_secs: default_extend_secs(),
            extend_secs_accessible: default_extend_secs_accessible(),
            reveal_cost: default_reveal_cost(),
            correct_delay_ms: default_correct_delay_ms(),
            wrong_delay_ms: default_wrong_delay_ms(),
            reveal_delay_ms: default_reveal_delay_ms(),
            start_in_study_mode: false,
            voice_readout: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("matemagica")
            .join("config.toml")
    }

    /// Clamp values a hand-edited config could push out of a playable range.
    pub fn validate(&mut self) {
        self.question_count = self.question_count.clamp(1, 50);
        self.time_limit_easy_secs = self.time_limit_easy_secs.clamp(3, 600);
        self.time_limit_medium_secs = self.time_limit_medium_secs.clamp(3, 600);
        self.time_limit_advanced_secs = self.time_limit_advanced_secs.clamp(3, 600);
        self.tick_ms = self.tick_ms.clamp(10, 1000);
        self.correct_delay_ms = self.correct_delay_ms.min(10_000);
        self.wrong_delay_ms = self.wrong_delay_ms.min(10_000);
        self.reveal_delay_ms = self.reveal_delay_ms.min(10_000);
    }

    /// Base countdown for a level, before the accessibility doubling.
    pub fn time_limit(&self, level: Level) -> Duration {
        let secs = match level {
            Level::Easy => self.time_limit_easy_secs,
            Level::Medium => self.time_limit_medium_secs,
            Level::Advanced => self.time_limit_advanced_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serde_defaults_from_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.question_count, 20);
        assert_eq!(config.time_limit_easy_secs, 15);
        assert_eq!(config.tick_ms, 100);
        assert_eq!(config.reveal_cost, 250);
        assert!(!config.start_in_study_mode);
    }

    #[test]
    fn test_config_partial_file_keeps_other_defaults() {
        let toml_str = r#"
theme = "paper"
question_count = 10
extend_cost = 80
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme, "paper");
        assert_eq!(config.question_count, 10);
        assert_eq!(config.extend_cost, 80);
        assert_eq!(config.extend_cost_accessible, 150);
        assert_eq!(config.wrong_delay_ms, 2500);
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(config.question_count, deserialized.question_count);
        assert_eq!(config.theme, deserialized.theme);
        assert_eq!(config.extend_secs_accessible, deserialized.extend_secs_accessible);
    }

    #[test]
    fn test_validate_clamps_values() {
        let mut config = Config::default();
        config.question_count = 0;
        config.tick_ms = 0;
        config.time_limit_advanced_secs = 100_000;
        config.validate();
        assert_eq!(config.question_count, 1);
        assert_eq!(config.tick_ms, 10);
        assert_eq!(config.time_limit_advanced_secs, 600);
    }

    #[test]
    fn test_time_limit_per_level() {
        let config = Config::default();
        assert_eq!(config.time_limit(Level::Easy), Duration::from_secs(15));
        assert_eq!(config.time_limit(Level::Medium), Duration::from_secs(30));
        assert_eq!(config.time_limit(Level::Advanced), Duration::from_secs(45));
    }
}
