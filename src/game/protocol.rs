//! Output message definitions
//! These are the types the simulation hands to the presentation layer

use serde::{Deserialize, Serialize};

use super::archetype::ProjectileKind;
use super::combat::AttackKind;
use super::fighter::FighterState;
use super::r#match::MatchResult;
use super::snapshot::FrameSnapshot;
use super::{Side, Vec2};

pub const HIT_EFFECT_RADIUS: f32 = 15.0;
pub const HIT_EFFECT_LIFE: u32 = 15;
/// Effect anchor, measured down from the defender's top
pub const HIT_EFFECT_OFFSET_Y: f32 = 40.0;

/// Messages broadcast by a running match
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchMsg {
    /// State after one tick
    Frame(FrameSnapshot),
    /// Match is over; commentary may still be pending
    MatchEnd(ResultPhase),
}

/// Two-phase match result: the outcome is known before its commentary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ResultPhase {
    AwaitingCommentary { result: MatchResult },
    Resolved { result: MatchResult, commentary: String },
}

impl ResultPhase {
    pub fn result(&self) -> &MatchResult {
        match self {
            ResultPhase::AwaitingCommentary { result } => result,
            ResultPhase::Resolved { result, .. } => result,
        }
    }

    /// Commentary text, once it has arrived
    pub fn commentary(&self) -> Option<&str> {
        match self {
            ResultPhase::AwaitingCommentary { .. } => None,
            ResultPhase::Resolved { commentary, .. } => Some(commentary),
        }
    }
}

/// Camera shake (cosmetic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScreenShake {
    pub magnitude: f32,
    /// Remaining ticks
    pub duration: u32,
}

impl ScreenShake {
    pub const fn new(magnitude: f32, duration: u32) -> Self {
        Self {
            magnitude,
            duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.duration > 0
    }

    pub fn decay(&mut self) {
        if self.is_active() {
            self.duration -= 1;
        }
        if !self.is_active() {
            self.magnitude = 0.0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HitEffectKind {
    /// Blocked hit
    Chakra,
    /// Clean hit
    Spark,
}

impl HitEffectKind {
    pub fn color(self) -> &'static str {
        match self {
            HitEffectKind::Chakra => "#38bdf8",
            HitEffectKind::Spark => "#fbbf24",
        }
    }
}

/// Transient hit flash; no gameplay meaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEffect {
    pub position: Vec2,
    pub color: String,
    pub radius: f32,
    pub life: u32,
    pub kind: HitEffectKind,
}

impl HitEffect {
    /// Effect anchored on the defender's body
    pub fn at(defender: &FighterState, kind: HitEffectKind) -> Self {
        Self {
            position: Vec2::new(
                defender.center_x(),
                defender.position.y + HIT_EFFECT_OFFSET_Y,
            ),
            color: kind.color().to_string(),
            radius: HIT_EFFECT_RADIUS,
            life: HIT_EFFECT_LIFE,
            kind,
        }
    }

    /// Age one tick; returns false once expired
    pub fn tick(&mut self) -> bool {
        self.life = self.life.saturating_sub(1);
        self.life > 0
    }
}

/// Projectile state in a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub owner: Side,
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub kind: ProjectileKind,
}

/// Gameplay events (hits, tags, knockouts)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Hit registered, melee or projectile
    Hit {
        attacker: Side,
        kind: AttackKind,
        blocked: bool,
        damage: i32,
        projectile: bool,
    },

    ProjectileFired {
        owner: Side,
        kind: ProjectileKind,
    },

    SuperActivated {
        side: Side,
        fighter: String,
    },

    /// Active member changed
    Tagged {
        side: Side,
        member: usize,
        /// false for a KO replacement
        manual: bool,
    },

    KnockedOut {
        side: Side,
        fighter: String,
    },

    MatchOver {
        winner: Side,
    },
}
