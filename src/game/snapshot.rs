//! Immutable per-tick views for the presentation layer

use serde::{Deserialize, Serialize};

use super::combat::AttackKind;
use super::fighter::{FighterState, Phase};
use super::protocol::{GameEvent, HitEffect, ProjectileSnapshot, ScreenShake};
use super::tag::Team;
use super::Side;

/// Fighter state in a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterSnapshot {
    pub id: String,
    pub name: String,
    /// Roster slot 0..3
    pub slot: usize,
    pub active: bool,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub facing: f32,
    pub health: i32,
    pub max_health: i32,
    pub meter: i32,
    pub phase: Phase,
    pub attack_kind: Option<AttackKind>,
    /// Animation frame counter
    pub frame: u32,
    pub invincible: bool,
}

impl FighterSnapshot {
    pub fn capture(fighter: &FighterState, slot: usize, active: bool) -> Self {
        Self {
            id: fighter.config.id.clone(),
            name: fighter.config.name.clone(),
            slot,
            active,
            x: fighter.position.x,
            y: fighter.position.y,
            vel_x: fighter.velocity.x,
            vel_y: fighter.velocity.y,
            facing: fighter.facing,
            health: fighter.health,
            max_health: fighter.config.max_health,
            meter: fighter.meter,
            phase: fighter.phase,
            attack_kind: fighter.is_attacking.then_some(fighter.attack_kind),
            frame: fighter.frames_current,
            invincible: fighter.invincible_frames > 0,
        }
    }
}

/// Everything one tick produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    pub timer_seconds: u32,
    pub hit_stop: u32,
    pub shake: ScreenShake,
    pub active_local: FighterSnapshot,
    pub active_opponent: FighterSnapshot,
    pub team_local: Vec<FighterSnapshot>,
    pub team_opponent: Vec<FighterSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub effects: Vec<HitEffect>,
    /// Gameplay events of this tick only
    pub events: Vec<GameEvent>,
    pub over: bool,
    pub winner: Option<Side>,
}

/// Capture every roster slot of a team
pub fn team_snapshot(team: &Team) -> Vec<FighterSnapshot> {
    team.members
        .iter()
        .enumerate()
        .map(|(slot, m)| FighterSnapshot::capture(m, slot, slot == team.active))
        .collect()
}
