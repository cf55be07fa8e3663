//! Opponent decision loop

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::combat::{AttackKind, BLOCK_COOLDOWN, BLOCK_HOLD, SUPER_COST};
use super::fighter::{FighterState, Phase};
use super::physics::PhysicsSystem;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiIntent {
    #[default]
    Wait,
    Chase,
    Attack,
    Retreat,
}

/// Per-fighter decision sub-state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiState {
    pub intent: AiIntent,
    /// Ticks until the next re-decision
    pub decision_cooldown: u32,
}

/// Tuned constants for the decision loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTunables {
    /// Chance to react to an incoming attack with a block
    pub block_chance: f64,
    pub block_range: f32,
    /// Beyond this distance the AI always closes in
    pub chase_range: f32,
    /// Inside this distance the AI always attacks
    pub melee_range: f32,
    /// Cumulative mid-range thresholds: below `press` attack or retreat,
    /// below `approach` chase, otherwise wait
    pub press_threshold: f64,
    pub approach_threshold: f64,
    pub retreat_speed_factor: f32,
    pub decision_cooldown_min: u32,
    pub decision_cooldown_jitter: u32,
    pub light_weight: f64,
    pub heavy_weight: f64,
    pub special_weight: f64,
    /// Per-tick anti-air jump chance
    pub jump_chance: f64,
}

impl Default for AiTunables {
    fn default() -> Self {
        Self {
            block_chance: 0.6,
            block_range: 180.0,
            chase_range: 400.0,
            melee_range: 80.0,
            press_threshold: 0.4,
            approach_threshold: 0.7,
            retreat_speed_factor: 0.8,
            decision_cooldown_min: 20,
            decision_cooldown_jitter: 20,
            light_weight: 0.4,
            heavy_weight: 0.3,
            special_weight: 0.2,
            jump_chance: 0.05,
        }
    }
}

/// Drives every opponent-side fighter from one seeded RNG
#[derive(Debug, Clone)]
pub struct AiController {
    rng: ChaCha8Rng,
    tunables: AiTunables,
}

impl AiController {
    pub fn new(seed: u64, tunables: AiTunables) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            tunables,
        }
    }

    /// Run one tick of the decision loop for `me`.
    ///
    /// Movement and blocking are applied directly; an attack the AI wants
    /// to start is returned so the caller can run it through the same
    /// activation path as player attacks.
    pub fn update(
        &mut self,
        me: &mut FighterState,
        target: &FighterState,
        ground_y: f32,
    ) -> Option<AttackKind> {
        let mut state = me.ai?;

        if !me.is_alive() {
            me.velocity.x = 0.0;
            return None;
        }
        // Hit-stun: damping is handled by the fighter step
        if me.phase == Phase::TakeHit {
            return None;
        }

        state.decision_cooldown = state.decision_cooldown.saturating_sub(1);

        let dx = target.position.x - me.position.x;
        let distance = dx.abs();
        let toward = if dx >= 0.0 { 1.0 } else { -1.0 };

        // Defense override
        if target.is_attacking
            && distance < self.tunables.block_range
            && me.is_neutral()
            && me.block_cooldown == 0
            && self.rng.gen_bool(self.tunables.block_chance)
        {
            me.enter_block(BLOCK_HOLD, BLOCK_COOLDOWN);
            me.ai = Some(state);
            return None;
        }
        if me.phase == Phase::Block {
            me.ai = Some(state);
            return None;
        }

        if state.decision_cooldown == 0 {
            state.intent = self.decide(me, target, distance);
            state.decision_cooldown = self.tunables.decision_cooldown_min
                + self.rng.gen_range(0..self.tunables.decision_cooldown_jitter.max(1));
        }

        let mut attack = None;
        match state.intent {
            AiIntent::Chase => me.velocity.x = toward * me.config.speed,
            AiIntent::Retreat => {
                me.velocity.x = -toward * me.config.speed * self.tunables.retreat_speed_factor
            }
            AiIntent::Attack => {
                me.velocity.x = 0.0;
                if !me.is_attacking {
                    attack = Some(self.roll_attack(me.meter));
                }
            }
            AiIntent::Wait => me.velocity.x = 0.0,
        }

        if target.is_airborne(ground_y)
            && me.is_grounded(ground_y)
            && self.rng.gen_bool(self.tunables.jump_chance)
        {
            PhysicsSystem::jump(me, 1.0, ground_y);
        }

        me.ai = Some(state);
        attack
    }

    fn decide(&mut self, me: &FighterState, target: &FighterState, distance: f32) -> AiIntent {
        if distance > self.tunables.chase_range {
            return AiIntent::Chase;
        }
        if distance < self.tunables.melee_range {
            return AiIntent::Attack;
        }

        let roll: f64 = self.rng.gen();
        if roll < self.tunables.press_threshold {
            if me.health > target.health {
                AiIntent::Retreat
            } else {
                AiIntent::Attack
            }
        } else if roll < self.tunables.approach_threshold {
            AiIntent::Chase
        } else {
            AiIntent::Wait
        }
    }

    /// Weighted attack choice; a Super roll without a full meter falls back to Special
    fn roll_attack(&mut self, meter: i32) -> AttackKind {
        let t = &self.tunables;
        let roll: f64 = self.rng.gen();

        if roll < t.light_weight {
            AttackKind::Light
        } else if roll < t.light_weight + t.heavy_weight {
            AttackKind::Heavy
        } else if roll < t.light_weight + t.heavy_weight + t.special_weight || meter < SUPER_COST {
            AttackKind::Special
        } else {
            AttackKind::Super
        }
    }
}
