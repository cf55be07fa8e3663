//! Archetype and stage content tables

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Built-in roster compiled into the binary
const BUILTIN_ROSTER: &str = include_str!("../../assets/roster.json");

pub const DEFAULT_STAGE_WIDTH: f32 = 1024.0;
pub const DEFAULT_GROUND_Y: f32 = 480.0;
pub const DEFAULT_PROJECTILE_SPEED: f32 = 15.0;

/// Body type; selects the attack-table modifiers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Build {
    /// Slower, wider, harder hitting
    Heavy,
    #[default]
    Balanced,
    /// Quicker startup, shorter recovery
    Swift,
}

/// Cosmetic tag for the projectile a Special attack throws
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileKind {
    #[default]
    EnergyBall,
    Fireball,
    Sand,
    Lightning,
}

/// Immutable per-archetype stats, shared by reference between roster slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub style: String,
    pub width: f32,
    pub height: f32,
    /// Horizontal run speed (px/tick)
    pub speed: f32,
    /// Vertical jump impulse (negative is up)
    pub jump_force: f32,
    pub max_health: i32,
    #[serde(default)]
    pub build: Build,
    #[serde(default)]
    pub projectile: ProjectileKind,
    #[serde(default = "default_projectile_speed")]
    pub projectile_speed: f32,
    #[serde(default)]
    pub accent_color: String,
}

fn default_projectile_speed() -> f32 {
    DEFAULT_PROJECTILE_SPEED
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_stage_width")]
    pub width: f32,
    #[serde(default = "default_ground_y")]
    pub ground_y: f32,
}

fn default_stage_width() -> f32 {
    DEFAULT_STAGE_WIDTH
}

fn default_ground_y() -> f32 {
    DEFAULT_GROUND_Y
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    fighters: Vec<FighterConfig>,
    stages: Vec<StageConfig>,
}

/// Roster errors
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("Failed to read roster file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed roster table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid archetype '{0}': {1}")]
    InvalidArchetype(String, &'static str),

    #[error("Roster must contain at least {0} archetypes and one stage")]
    TooSmall(usize),

    #[error("Unknown archetype id: {0}")]
    UnknownFighter(String),

    #[error("Unknown stage id: {0}")]
    UnknownStage(String),
}

/// Loaded content: archetypes and stages
#[derive(Debug, Clone)]
pub struct Roster {
    fighters: Vec<Arc<FighterConfig>>,
    stages: Vec<StageConfig>,
}

impl Roster {
    /// Roster shipped with the binary
    pub fn builtin() -> Result<Self, RosterError> {
        Self::from_json(BUILTIN_ROSTER)
    }

    /// Load a roster table from disk
    pub fn from_path(path: &Path) -> Result<Self, RosterError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, RosterError> {
        let file: RosterFile = serde_json::from_str(json)?;

        for f in &file.fighters {
            if f.max_health <= 0 {
                return Err(RosterError::InvalidArchetype(
                    f.id.clone(),
                    "max_health must be positive",
                ));
            }
            if f.width <= 0.0 || f.height <= 0.0 {
                return Err(RosterError::InvalidArchetype(
                    f.id.clone(),
                    "body must have a positive size",
                ));
            }
        }
        if file.fighters.len() < 3 || file.stages.is_empty() {
            return Err(RosterError::TooSmall(3));
        }

        Ok(Self {
            fighters: file.fighters.into_iter().map(Arc::new).collect(),
            stages: file.stages,
        })
    }

    pub fn fighters(&self) -> &[Arc<FighterConfig>] {
        &self.fighters
    }

    pub fn stages(&self) -> &[StageConfig] {
        &self.stages
    }

    pub fn fighter(&self, id: &str) -> Result<Arc<FighterConfig>, RosterError> {
        self.fighters
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| RosterError::UnknownFighter(id.to_string()))
    }

    pub fn stage(&self, id: &str) -> Result<StageConfig, RosterError> {
        self.stages
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| RosterError::UnknownStage(id.to_string()))
    }

    /// Resolve a list of archetype ids in order
    pub fn team<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Arc<FighterConfig>>, RosterError> {
        ids.iter().map(|id| self.fighter(id.as_ref())).collect()
    }

    /// Draw `size` distinct archetypes (CPU team selection)
    pub fn random_team<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        size: usize,
    ) -> Vec<Arc<FighterConfig>> {
        self.fighters.choose_multiple(rng, size).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn builtin_roster_loads() {
        let roster = Roster::builtin().unwrap();
        assert_eq!(roster.fighters().len(), 10);
        assert_eq!(roster.stages().len(), 5);

        let suna = roster.fighter("suna").unwrap();
        assert_eq!(suna.build, Build::Heavy);
        assert_eq!(suna.projectile, ProjectileKind::Sand);
        assert_eq!(suna.projectile_speed, 10.0);

        let kaito = roster.fighter("kaito").unwrap();
        assert_eq!(kaito.projectile_speed, DEFAULT_PROJECTILE_SPEED);
        assert_eq!(roster.stage("gate").unwrap().width, DEFAULT_STAGE_WIDTH);
    }

    #[test]
    fn unknown_ids_are_reported() {
        let roster = Roster::builtin().unwrap();
        assert!(matches!(roster.fighter("nobody"), Err(RosterError::UnknownFighter(_))));
        assert!(matches!(roster.stage("moon"), Err(RosterError::UnknownStage(_))));
        assert!(roster.team(&["kaito", "nobody"]).is_err());
    }

    #[test]
    fn rejects_non_positive_health() {
        let json = r#"{
            "fighters": [{
                "id": "a", "name": "A", "width": 10, "height": 10,
                "speed": 1, "jump_force": -1, "max_health": 0
            }],
            "stages": []
        }"#;
        assert!(matches!(
            Roster::from_json(json),
            Err(RosterError::InvalidArchetype(_, _))
        ));
    }

    #[test]
    fn random_team_is_distinct_and_seeded() {
        let roster = Roster::builtin().unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        let team_a = roster.random_team(&mut a, 3);
        let team_b = roster.random_team(&mut b, 3);

        assert_eq!(team_a.len(), 3);
        assert_ne!(team_a[0].id, team_a[1].id);
        assert_ne!(team_a[1].id, team_a[2].id);
        assert_ne!(team_a[0].id, team_a[2].id);
        let ids_a: Vec<_> = team_a.iter().map(|f| f.id.clone()).collect();
        let ids_b: Vec<_> = team_b.iter().map(|f| f.id.clone()).collect();
        assert_eq!(ids_a, ids_b);
    }
}
