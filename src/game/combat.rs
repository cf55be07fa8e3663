//! Combat system - attack tables, melee hit detection, hit resolution

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::archetype::Build;
use super::fighter::{FighterState, HitWindow, Phase};
use super::protocol::{HitEffect, HitEffectKind, ScreenShake};

/// Forced TakeHit duration after an unblocked hit
pub const HIT_STUN: u32 = 20;
/// Invincibility granted when hit-stun ends
pub const POST_STUN_INVINCIBILITY: u32 = 50;

pub const BLOCK_HOLD: u32 = 20;
pub const BLOCK_COOLDOWN: u32 = 60;

pub const METER_GAIN_HIT: i32 = 12;
pub const METER_GAIN_DAMAGE: i32 = 8;
pub const SUPER_COST: i32 = 100;

pub const BLOCK_PUSHBACK: f32 = 8.0;
pub const HIT_PUSHBACK: f32 = 15.0;
/// Upward pop on an unblocked hit
pub const HIT_LIFT: f32 = -3.0;

pub const HIT_STOP_BLOCK: u32 = 6;
pub const HIT_STOP_HIT: u32 = 10;
pub const HIT_STOP_HEAVY: u32 = 20;
pub const SUPER_FLASH_HIT_STOP: u32 = 20;

pub const SUPER_FLASH_SHAKE: ScreenShake = ScreenShake::new(10.0, 20);
pub const HEAVY_HIT_SHAKE: ScreenShake = ScreenShake::new(15.0, 8);
pub const LIGHT_HIT_SHAKE: ScreenShake = ScreenShake::new(4.0, 4);

pub const HITBOX_HEIGHT: f32 = 50.0;
/// Melee box top, measured down from the body top
pub const HITBOX_OFFSET_Y: f32 = 20.0;

/// Damage a Special's projectile carries
pub const PROJECTILE_DAMAGE: i32 = 15;

/// Attack strength
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    #[default]
    Light,
    Heavy,
    /// Delivers damage only through a projectile
    Special,
    /// Meter-gated; freezes the match on activation
    Super,
}

impl AttackKind {
    pub const ALL: [AttackKind; 4] = [
        AttackKind::Light,
        AttackKind::Heavy,
        AttackKind::Special,
        AttackKind::Super,
    ];

    fn index(self) -> usize {
        match self {
            AttackKind::Light => 0,
            AttackKind::Heavy => 1,
            AttackKind::Special => 2,
            AttackKind::Super => 3,
        }
    }

    /// Heavy and Super hit harder on screen
    pub fn is_heavy(self) -> bool {
        matches!(self, AttackKind::Heavy | AttackKind::Super)
    }
}

/// Timing and geometry of one attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackProfile {
    /// Total frames the attack occupies
    pub hold: u32,
    pub window_start: u32,
    pub window_end: u32,
    pub damage: i32,
    /// Melee box width (0 = no melee box)
    pub width: u32,
}

impl AttackProfile {
    /// Base table shared by every archetype
    pub fn base(kind: AttackKind) -> Self {
        match kind {
            AttackKind::Light => Self {
                hold: 18,
                window_start: 4,
                window_end: 12,
                damage: 5,
                width: 80,
            },
            AttackKind::Heavy => Self {
                hold: 25,
                window_start: 6,
                window_end: 18,
                damage: 12,
                width: 110,
            },
            AttackKind::Special => Self {
                hold: 35,
                window_start: 12,
                window_end: 35,
                damage: PROJECTILE_DAMAGE,
                width: 0,
            },
            AttackKind::Super => Self {
                hold: 50,
                window_start: 10,
                window_end: 40,
                damage: 35,
                width: 200,
            },
        }
    }

    /// Base entry with the build's offsets applied
    pub fn for_build(build: Build, kind: AttackKind) -> Self {
        let mut p = Self::base(kind);
        match build {
            Build::Balanced => {}
            Build::Heavy => {
                p.hold += 8;
                p.window_start += 4;
                p.window_end += 4;
                if kind != AttackKind::Special {
                    p.width += 30;
                    p.damage += 4;
                }
            }
            Build::Swift => {
                p.hold = p.hold.saturating_sub(4);
                p.window_start = p.window_start.saturating_sub(2);
                p.window_end = p.window_end.saturating_sub(4);
            }
        }

        // Keep the window inside the attack
        p.window_start = p.window_start.max(1);
        p.window_end = p.window_end.clamp(p.window_start, p.hold);
        p
    }
}

/// Per-fighter attack table, resolved once at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSet {
    profiles: [AttackProfile; 4],
}

impl MoveSet {
    pub fn for_build(build: Build) -> Self {
        Self {
            profiles: AttackKind::ALL.map(|kind| AttackProfile::for_build(build, kind)),
        }
    }

    pub fn get(&self, kind: AttackKind) -> AttackProfile {
        self.profiles[kind.index()]
    }
}

/// What hit the defender
#[derive(Debug, Clone, Copy)]
pub struct Strike {
    pub kind: AttackKind,
    pub damage: i32,
    /// +1 pushes the defender right, -1 left
    pub push_dir: f32,
}

/// Outcome of a resolved hit
#[derive(Debug, Clone)]
pub struct HitOutcome {
    pub kind: AttackKind,
    pub blocked: bool,
    /// Health actually removed
    pub damage: i32,
    pub hit_stop: u32,
    pub shake: Option<ScreenShake>,
    pub effect: HitEffect,
    pub knocked_out: bool,
}

/// Combat system for attacks and damage
pub struct CombatSystem;

impl CombatSystem {
    /// Begin an attack; refused while stunned, dead or mid-attack
    pub fn start_attack(fighter: &mut FighterState, kind: AttackKind) -> bool {
        if !fighter.is_alive() || fighter.is_stunned() || fighter.is_attacking {
            return false;
        }

        let profile = fighter.moves.get(kind);
        fighter.is_attacking = true;
        fighter.has_hit = false;
        fighter.phase = Phase::Attacking;
        fighter.attack_kind = kind;
        fighter.frames_current = 0;
        fighter.frames_hold = profile.hold;
        fighter.hit_window = HitWindow {
            start: profile.window_start,
            end: profile.window_end,
        };
        fighter.attack_box.width = profile.width as f32;
        fighter.update_attack_box();
        true
    }

    /// Advance an attack one frame.
    ///
    /// Returns true on the frame a Special releases its projectile. The
    /// release consumes the activation's `has_hit` latch.
    pub fn advance_attack(fighter: &mut FighterState) -> bool {
        if !fighter.is_attacking {
            return false;
        }

        fighter.frames_current += 1;

        let mut release = false;
        if fighter.attack_kind == AttackKind::Special
            && fighter.frames_current == fighter.hit_window.start
            && !fighter.has_hit
        {
            fighter.has_hit = true;
            release = true;
        }

        if fighter.frames_current >= fighter.frames_hold {
            fighter.end_attack();
        }

        release
    }

    /// Whether the attacker's melee box scores on the defender this frame
    pub fn melee_connects(attacker: &FighterState, defender: &FighterState) -> bool {
        attacker.is_alive()
            && defender.is_alive()
            && attacker.phase == Phase::Attacking
            && attacker.is_attacking
            && attacker.attack_kind != AttackKind::Special
            && !attacker.has_hit
            && defender.invincible_frames == 0
            && attacker.hit_window.contains(attacker.frames_current)
            && attacker.attack_box.intersects(&defender.body())
    }

    /// Melee check and resolution for one attacker/defender pair
    pub fn resolve_melee(
        attacker: &mut FighterState,
        defender: &mut FighterState,
    ) -> Option<HitOutcome> {
        if !Self::melee_connects(attacker, defender) {
            return None;
        }

        attacker.has_hit = true;
        let kind = attacker.attack_kind;
        let strike = Strike {
            kind,
            damage: attacker.moves.get(kind).damage,
            push_dir: Self::push_dir(attacker.position.x, defender.position.x),
        };

        let outcome = Self::apply_hit(defender, strike)?;
        if !outcome.blocked {
            attacker.gain_meter(METER_GAIN_HIT);
        }
        Some(outcome)
    }

    /// Apply a strike to the defender (shared by melee and projectiles).
    ///
    /// Invincible or dead defenders are untouched.
    pub fn apply_hit(defender: &mut FighterState, strike: Strike) -> Option<HitOutcome> {
        if defender.invincible_frames > 0 || !defender.is_alive() {
            return None;
        }

        let blocked = defender.phase == Phase::Block;
        defender.is_attacking = false;

        let outcome = if blocked {
            defender.phase = Phase::Idle;
            defender.frames_hold = 0;
            defender.frames_current = 0;
            defender.velocity.x = strike.push_dir * BLOCK_PUSHBACK;
            defender.velocity.y = 0.0;

            HitOutcome {
                kind: strike.kind,
                blocked: true,
                damage: 0,
                hit_stop: HIT_STOP_BLOCK,
                shake: None,
                effect: HitEffect::at(defender, HitEffectKind::Chakra),
                knocked_out: false,
            }
        } else {
            let before = defender.health;
            let after = defender.take_damage(strike.damage);
            defender.gain_meter(METER_GAIN_DAMAGE);
            defender.velocity.x = strike.push_dir * HIT_PUSHBACK;
            defender.velocity.y = HIT_LIFT;

            let knocked_out = after == 0;
            if knocked_out {
                defender.phase = Phase::Dead;
            } else {
                defender.phase = Phase::TakeHit;
                defender.frames_hold = HIT_STUN;
            }

            let (hit_stop, shake) = if strike.kind.is_heavy() {
                (HIT_STOP_HEAVY, HEAVY_HIT_SHAKE)
            } else {
                (HIT_STOP_HIT, LIGHT_HIT_SHAKE)
            };

            HitOutcome {
                kind: strike.kind,
                blocked: false,
                damage: before - after,
                hit_stop,
                shake: Some(shake),
                effect: HitEffect::at(defender, HitEffectKind::Spark),
                knocked_out,
            }
        };

        debug!(
            defender = %defender.config.id,
            kind = ?strike.kind,
            blocked = outcome.blocked,
            damage = outcome.damage,
            health = defender.health,
            "Hit resolved"
        );

        Some(outcome)
    }

    /// Progress Block and TakeHit toward Idle
    pub fn advance_recovery(fighter: &mut FighterState) {
        match fighter.phase {
            Phase::Block => {
                if fighter.frames_current < fighter.frames_hold {
                    fighter.frames_current += 1;
                } else {
                    fighter.phase = Phase::Idle;
                    fighter.frames_current = 0;
                }
            }
            Phase::TakeHit => {
                if fighter.frames_hold > 0 {
                    fighter.frames_hold -= 1;
                } else {
                    fighter.invincible_frames = POST_STUN_INVINCIBILITY;
                    fighter.phase = Phase::Idle;
                }
            }
            _ => {}
        }
    }

    /// Direction that carries the defender away from the attacker
    pub fn push_dir(attacker_x: f32, defender_x: f32) -> f32 {
        if attacker_x < defender_x {
            1.0
        } else {
            -1.0
        }
    }
}
