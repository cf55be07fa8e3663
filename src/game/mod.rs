//! Game simulation modules

pub mod ai;
pub mod archetype;
pub mod combat;
pub mod fighter;
pub mod input;
pub mod r#match;
pub mod physics;
pub mod projectile;
pub mod protocol;
pub mod runner;
pub mod snapshot;
pub mod tag;

pub use archetype::Roster;
pub use r#match::{MatchResult, Simulation};
pub use runner::{GameMatch, MatchHandle};

use serde::{Deserialize, Serialize};

/// 2D vector in stage pixels (y grows downward)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Edge-inclusive overlap on both axes
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x + self.width >= other.x
            && self.x <= other.x + other.width
            && self.y + self.height >= other.y
            && self.y <= other.y + other.height
    }
}

/// Which team a fighter, projectile or event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Team 1, driven by the local player
    Local,
    /// Team 2, driven by the AI controller
    Opponent,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Local => Side::Opponent,
            Side::Opponent => Side::Local,
        }
    }

    /// Human-facing team label used in results
    pub fn label(self) -> &'static str {
        match self {
            Side::Local => "Team 1",
            Side::Opponent => "Team 2",
        }
    }
}
