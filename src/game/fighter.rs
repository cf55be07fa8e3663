//! Per-slot fighter record

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::ai::AiState;
use super::archetype::FighterConfig;
use super::combat::{AttackKind, MoveSet, HITBOX_HEIGHT, HITBOX_OFFSET_Y};
use super::{Rect, Vec2};

pub const METER_MAX: i32 = 100;

/// Frames in one idle-animation loop
pub const IDLE_CYCLE: u32 = 60;

/// Per-tick horizontal damping while stunned or blocking
pub const STUN_DAMPING: f32 = 0.9;

/// Lifecycle phase of a fighter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Jumping,
    Attacking,
    TakeHit,
    Block,
    Dead,
}

/// Active-damage sub-range of an attack, in frames since activation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitWindow {
    pub start: u32,
    pub end: u32,
}

impl HitWindow {
    pub fn contains(&self, frame: u32) -> bool {
        frame >= self.start && frame <= self.end
    }
}

/// Live, mutable state of one roster slot (authoritative)
#[derive(Debug, Clone)]
pub struct FighterState {
    pub config: Arc<FighterConfig>,
    /// Attack timings resolved once from the archetype's build
    pub moves: MoveSet,

    // Position and movement
    pub position: Vec2,
    pub velocity: Vec2,
    /// +1 faces right, -1 faces left
    pub facing: f32,

    // Resources
    pub health: i32,
    pub meter: i32,

    // Phase and attack timing
    pub phase: Phase,
    pub attack_kind: AttackKind,
    pub attack_box: Rect,
    pub frames_current: u32,
    pub frames_hold: u32,
    pub hit_window: HitWindow,
    pub is_attacking: bool,
    /// Latched once the current activation has scored
    pub has_hit: bool,

    // Countdowns
    pub invincible_frames: u32,
    pub block_cooldown: u32,

    /// Decision sub-state, present only for AI-driven fighters
    pub ai: Option<AiState>,
}

impl FighterState {
    pub fn new(config: Arc<FighterConfig>, spawn: Vec2, facing: f32) -> Self {
        let moves = MoveSet::for_build(config.build);
        let light = moves.get(AttackKind::Light);
        let mut fighter = Self {
            moves,
            position: spawn,
            velocity: Vec2::default(),
            facing: if facing < 0.0 { -1.0 } else { 1.0 },
            health: config.max_health,
            meter: 0,
            phase: Phase::Idle,
            attack_kind: AttackKind::Light,
            attack_box: Rect::new(spawn.x, spawn.y, light.width as f32, HITBOX_HEIGHT),
            frames_current: 0,
            frames_hold: 0,
            hit_window: HitWindow::default(),
            is_attacking: false,
            has_hit: false,
            invincible_frames: 0,
            block_cooldown: 0,
            ai: None,
            config,
        };
        fighter.update_attack_box();
        fighter
    }

    /// Same as `new`, with an AI decision sub-state attached
    pub fn new_ai(config: Arc<FighterConfig>, spawn: Vec2, facing: f32) -> Self {
        let mut fighter = Self::new(config, spawn, facing);
        fighter.ai = Some(AiState::default());
        fighter
    }

    /// Hurtbox
    pub fn body(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.config.width,
            self.config.height,
        )
    }

    pub fn center_x(&self) -> f32 {
        self.position.x + self.config.width / 2.0
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Standing on the ground line with no vertical motion
    pub fn is_grounded(&self, ground_y: f32) -> bool {
        self.velocity.y == 0.0 && self.position.y + self.config.height >= ground_y
    }

    pub fn is_airborne(&self, ground_y: f32) -> bool {
        !self.is_grounded(ground_y)
    }

    /// In hit-stun or holding a block; ignores movement and attack input
    pub fn is_stunned(&self) -> bool {
        matches!(self.phase, Phase::TakeHit | Phase::Block)
    }

    /// Idle or running: free to block, jump or start an attack
    pub fn is_neutral(&self) -> bool {
        matches!(self.phase, Phase::Idle | Phase::Running)
    }

    pub fn gain_meter(&mut self, amount: i32) {
        self.meter = (self.meter + amount).clamp(0, METER_MAX);
    }

    /// Subtract health, clamped to [0, max]; returns the new health
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.health = (self.health - amount.max(0)).clamp(0, self.config.max_health);
        self.health
    }

    /// Per-tick countdowns that run regardless of phase
    pub fn tick_timers(&mut self) {
        self.invincible_frames = self.invincible_frames.saturating_sub(1);
        self.block_cooldown = self.block_cooldown.saturating_sub(1);
    }

    pub fn face_towards(&mut self, target_x: f32) {
        let dx = target_x - self.position.x;
        if dx != 0.0 {
            self.facing = dx.signum();
        }
    }

    pub fn decelerate(&mut self) {
        self.velocity.x *= STUN_DAMPING;
    }

    /// Enter Block if neutral and off cooldown
    pub fn enter_block(&mut self, hold: u32, cooldown: u32) -> bool {
        if !self.is_alive() || !self.is_neutral() || self.block_cooldown > 0 {
            return false;
        }
        self.phase = Phase::Block;
        self.frames_current = 0;
        self.frames_hold = hold;
        self.block_cooldown = cooldown;
        self.velocity.x = 0.0;
        true
    }

    /// Drop any in-flight attack and return to Idle
    pub fn end_attack(&mut self) {
        self.is_attacking = false;
        self.frames_current = 0;
        if self.phase == Phase::Attacking {
            self.phase = Phase::Idle;
        }
    }

    /// Keep Idle/Running in sync with horizontal motion on the ground
    pub fn update_locomotion(&mut self, ground_y: f32) {
        if self.is_neutral() && self.is_grounded(ground_y) {
            self.phase = if self.velocity.x != 0.0 {
                Phase::Running
            } else {
                Phase::Idle
            };
        }
    }

    /// Re-anchor the melee box to the body on the facing side
    pub fn update_attack_box(&mut self) {
        let width = self.attack_box.width;
        let anchor = self.center_x();
        self.attack_box.x = if self.facing > 0.0 {
            anchor
        } else {
            anchor - width
        };
        self.attack_box.y = self.position.y + HITBOX_OFFSET_Y;
        self.attack_box.height = HITBOX_HEIGHT;
    }
}

/// Idle-only display model for the selection screen.
///
/// Shares the archetype with match fighters but never touches a match record.
/// The headless binary has no selection screen to drive it.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct PreviewPose {
    pub config: Arc<FighterConfig>,
    pub position: Vec2,
    pub facing: f32,
    pub frame: u32,
}

impl PreviewPose {
    pub fn new(config: Arc<FighterConfig>, position: Vec2) -> Self {
        Self {
            config,
            position,
            facing: 1.0,
            frame: 0,
        }
    }

    /// Advance the idle animation by one display frame
    pub fn tick(&mut self) {
        self.frame = (self.frame + 1) % IDLE_CYCLE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Roster;

    fn kaito() -> Arc<FighterConfig> {
        Roster::builtin().unwrap().fighter("kaito").unwrap()
    }

    #[test]
    fn spawns_with_full_health_and_empty_meter() {
        let f = FighterState::new(kaito(), Vec2::new(150.0, 0.0), 1.0);
        assert_eq!(f.health, 110);
        assert_eq!(f.meter, 0);
        assert_eq!(f.phase, Phase::Idle);
        assert!(f.ai.is_none());
        assert!(FighterState::new_ai(kaito(), Vec2::default(), -1.0).ai.is_some());
    }

    #[test]
    fn health_and_meter_are_clamped() {
        let mut f = FighterState::new(kaito(), Vec2::default(), 1.0);
        f.gain_meter(250);
        assert_eq!(f.meter, METER_MAX);
        f.gain_meter(-500);
        assert_eq!(f.meter, 0);

        assert_eq!(f.take_damage(30), 80);
        assert_eq!(f.take_damage(1_000), 0);
        assert!(!f.is_alive());
    }

    #[test]
    fn block_respects_phase_and_cooldown() {
        let mut f = FighterState::new(kaito(), Vec2::default(), 1.0);
        assert!(f.enter_block(20, 60));
        assert_eq!(f.phase, Phase::Block);
        assert_eq!(f.block_cooldown, 60);

        f.phase = Phase::Idle;
        assert!(!f.enter_block(20, 60), "cooldown still running");

        f.block_cooldown = 0;
        f.phase = Phase::TakeHit;
        assert!(!f.enter_block(20, 60), "cannot block out of hit-stun");
    }

    #[test]
    fn attack_box_mirrors_with_facing() {
        let mut f = FighterState::new(kaito(), Vec2::new(100.0, 200.0), 1.0);
        f.attack_box.width = 80.0;
        f.update_attack_box();
        assert_eq!(f.attack_box.x, 130.0);
        assert_eq!(f.attack_box.y, 220.0);

        f.facing = -1.0;
        f.update_attack_box();
        assert_eq!(f.attack_box.x, 50.0);
    }

    #[test]
    fn preview_pose_loops_idle_frames() {
        let mut pose = PreviewPose::new(kaito(), Vec2::new(25.0, 20.0));
        for _ in 0..IDLE_CYCLE + 5 {
            pose.tick();
        }
        assert_eq!(pose.frame, 5);
        assert_eq!(pose.position, Vec2::new(25.0, 20.0));
    }
}
