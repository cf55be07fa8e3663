//! Configuration module - environment variable parsing

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::game::ai::AiTunables;
use crate::game::r#match::DEFAULT_ROUND_SECONDS;

pub const DEFAULT_COMMENTARY_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_COMMENTARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_COMMENTARY_TIMEOUT_MS: u64 = 8_000;

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Commentary collaborator settings
#[derive(Clone, Debug)]
pub struct CommentaryConfig {
    /// Absent key means commentary runs in offline mode
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,

    /// Seed for every random source; wall clock when unset
    pub seed: Option<u64>,
    pub round_seconds: u32,
    /// Archetype ids for team 1; first three roster entries when empty
    pub local_team: Vec<String>,
    pub stage: Option<String>,
    /// Content table replacing the built-in one
    pub roster_path: Option<PathBuf>,

    pub commentary: CommentaryConfig,
    pub ai: AiTunables,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let round_seconds = parse::<u32>(&var, "ROUND_SECONDS")?.unwrap_or(DEFAULT_ROUND_SECONDS);
        if round_seconds == 0 {
            return Err(ConfigError::Invalid("ROUND_SECONDS"));
        }

        let local_team = var("LOCAL_TEAM")
            .map(|ids| {
                ids.split(',')
                    .map(|id| id.trim().to_string())
                    .filter(|id| !id.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let timeout_ms =
            parse::<u64>(&var, "COMMENTARY_TIMEOUT_MS")?.unwrap_or(DEFAULT_COMMENTARY_TIMEOUT_MS);

        let mut ai = AiTunables::default();
        if let Some(v) = probability(&var, "AI_BLOCK_CHANCE")? {
            ai.block_chance = v;
        }
        if let Some(v) = probability(&var, "AI_JUMP_CHANCE")? {
            ai.jump_chance = v;
        }
        if let Some(v) = probability(&var, "AI_LIGHT_WEIGHT")? {
            ai.light_weight = v;
        }
        if let Some(v) = probability(&var, "AI_HEAVY_WEIGHT")? {
            ai.heavy_weight = v;
        }
        if let Some(v) = probability(&var, "AI_SPECIAL_WEIGHT")? {
            ai.special_weight = v;
        }
        if ai.light_weight + ai.heavy_weight + ai.special_weight > 1.0 {
            return Err(ConfigError::Invalid("AI_*_WEIGHT"));
        }

        Ok(Self {
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parse(&var, "LOG_FORMAT")?.unwrap_or_default(),

            seed: parse(&var, "MATCH_SEED")?,
            round_seconds,
            local_team,
            stage: var("STAGE"),
            roster_path: var("ROSTER_PATH").map(PathBuf::from),

            commentary: CommentaryConfig {
                api_key: var("COMMENTARY_API_KEY"),
                base_url: var("COMMENTARY_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_COMMENTARY_BASE_URL.to_string()),
                model: var("COMMENTARY_MODEL")
                    .unwrap_or_else(|| DEFAULT_COMMENTARY_MODEL.to_string()),
                timeout: Duration::from_millis(timeout_ms),
            },
            ai,
        })
    }
}

fn parse<T: FromStr>(
    var: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    var(name)
        .map(|v| v.trim().parse().map_err(|_| ConfigError::Invalid(name)))
        .transpose()
}

fn probability(
    var: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<f64>, ConfigError> {
    match parse::<f64>(var, name)? {
        Some(p) if !(0.0..=1.0).contains(&p) => Err(ConfigError::Invalid(name)),
        other => Ok(other),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.seed, None);
        assert_eq!(config.round_seconds, DEFAULT_ROUND_SECONDS);
        assert!(config.local_team.is_empty());
        assert!(config.commentary.api_key.is_none());
        assert_eq!(config.commentary.model, DEFAULT_COMMENTARY_MODEL);
        assert_eq!(config.commentary.timeout, Duration::from_secs(8));
        assert_eq!(config.ai, AiTunables::default());
    }

    #[test]
    fn reads_match_settings() {
        let config = load(&[
            ("MATCH_SEED", "42"),
            ("ROUND_SECONDS", "60"),
            ("LOCAL_TEAM", "kaito, ren ,hana"),
            ("STAGE", "dojo"),
            ("COMMENTARY_API_KEY", "secret"),
            ("COMMENTARY_TIMEOUT_MS", "2500"),
            ("AI_BLOCK_CHANCE", "0.25"),
        ])
        .unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.round_seconds, 60);
        assert_eq!(config.local_team, vec!["kaito", "ren", "hana"]);
        assert_eq!(config.stage.as_deref(), Some("dojo"));
        assert_eq!(config.commentary.api_key.as_deref(), Some("secret"));
        assert_eq!(config.commentary.timeout, Duration::from_millis(2500));
        assert_eq!(config.ai.block_chance, 0.25);
    }

    #[test]
    fn reads_log_format() {
        let config = load(&[("LOG_FORMAT", "JSON")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);

        let config = load(&[("LOG_FORMAT", "text")]).unwrap();
        assert_eq!(config.log_format, LogFormat::Text);

        assert!(matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid("LOG_FORMAT"))
        ));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("COMMENTARY_API_KEY", "  "), ("STAGE", "")]).unwrap();
        assert!(config.commentary.api_key.is_none());
        assert!(config.stage.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(matches!(
            load(&[("MATCH_SEED", "abc")]),
            Err(ConfigError::Invalid("MATCH_SEED"))
        ));
        assert!(matches!(
            load(&[("ROUND_SECONDS", "0")]),
            Err(ConfigError::Invalid("ROUND_SECONDS"))
        ));
        assert!(matches!(
            load(&[("AI_BLOCK_CHANCE", "1.5")]),
            Err(ConfigError::Invalid("AI_BLOCK_CHANCE"))
        ));
        assert!(matches!(
            load(&[("AI_LIGHT_WEIGHT", "0.9")]),
            Err(ConfigError::Invalid("AI_*_WEIGHT"))
        ));
    }
}
