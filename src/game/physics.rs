//! Fighter physics: gravity, ground contact, wall clamping

use super::archetype::StageConfig;
use super::fighter::{FighterState, Phase};

/// Downward acceleration per tick
pub const GRAVITY: f32 = 0.85;

/// Jump impulse multiplier for a short tap of the jump key
pub const SHORT_HOP_SCALE: f32 = 0.7;

/// Physics system for updating fighter positions and velocities
pub struct PhysicsSystem;

impl PhysicsSystem {
    /// Integrate one tick for an active fighter
    pub fn integrate(fighter: &mut FighterState, stage: &StageConfig) {
        let height = fighter.config.height;
        let floor = stage.ground_y - height;

        if fighter.phase == Phase::Dead {
            // Ragdoll: keep falling, no wall clamp, never leaves Dead
            if fighter.position.y + height < stage.ground_y {
                fighter.position.y += fighter.velocity.y;
                fighter.velocity.y += GRAVITY;
            }
            fighter.position.x += fighter.velocity.x;
            if fighter.position.y + height >= stage.ground_y {
                fighter.position.y = floor;
                fighter.velocity.y = 0.0;
                fighter.velocity.x = 0.0;
            }
            fighter.update_attack_box();
            return;
        }

        if fighter.is_airborne(stage.ground_y) {
            fighter.velocity.y += GRAVITY;
        }

        fighter.position.x += fighter.velocity.x;
        fighter.position.y += fighter.velocity.y;

        let max_x = (stage.width - fighter.config.width).max(0.0);
        fighter.position.x = fighter.position.x.clamp(0.0, max_x);

        if fighter.position.y + height >= stage.ground_y {
            fighter.position.y = floor;
            fighter.velocity.y = 0.0;
            if fighter.phase == Phase::Jumping {
                fighter.phase = Phase::Idle;
            }
        }

        fighter.update_attack_box();
    }

    /// Launch a jump with the archetype impulse scaled by `scale`.
    ///
    /// Only grounded, unstunned fighters can jump.
    pub fn jump(fighter: &mut FighterState, scale: f32, ground_y: f32) -> bool {
        if !fighter.is_alive() || fighter.is_stunned() || !fighter.is_grounded(ground_y) {
            return false;
        }

        fighter.velocity.y = fighter.config.jump_force * scale;
        if fighter.is_neutral() {
            fighter.phase = Phase::Jumping;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Roster, Vec2};

    fn setup() -> (FighterState, StageConfig) {
        let roster = Roster::builtin().unwrap();
        let stage = roster.stage("gate").unwrap();
        let kaito = roster.fighter("kaito").unwrap();
        let floor = stage.ground_y - kaito.height;
        (FighterState::new(kaito, Vec2::new(150.0, floor), 1.0), stage)
    }

    #[test]
    fn grounded_fighter_stays_on_floor() {
        let (mut f, stage) = setup();
        let y = f.position.y;
        for _ in 0..10 {
            PhysicsSystem::integrate(&mut f, &stage);
        }
        assert_eq!(f.position.y, y);
        assert_eq!(f.velocity.y, 0.0);
    }

    #[test]
    fn airborne_fighter_falls_and_lands_idle() {
        let (mut f, stage) = setup();
        f.position.y = -200.0;
        f.phase = Phase::Jumping;

        PhysicsSystem::integrate(&mut f, &stage);
        assert_eq!(f.velocity.y, GRAVITY);

        for _ in 0..200 {
            PhysicsSystem::integrate(&mut f, &stage);
        }
        assert_eq!(f.position.y + f.config.height, stage.ground_y);
        assert_eq!(f.velocity.y, 0.0);
        assert_eq!(f.phase, Phase::Idle);
    }

    #[test]
    fn walls_clamp_horizontal_position() {
        let (mut f, stage) = setup();
        f.velocity.x = -500.0;
        PhysicsSystem::integrate(&mut f, &stage);
        assert_eq!(f.position.x, 0.0);

        f.velocity.x = 5_000.0;
        PhysicsSystem::integrate(&mut f, &stage);
        assert_eq!(f.position.x, stage.width - f.config.width);
    }

    #[test]
    fn jump_then_short_hop() {
        let (mut f, stage) = setup();
        assert!(PhysicsSystem::jump(&mut f, 1.0, stage.ground_y));
        assert_eq!(f.velocity.y, f.config.jump_force);
        assert_eq!(f.phase, Phase::Jumping);

        // No double jump
        PhysicsSystem::integrate(&mut f, &stage);
        assert!(!PhysicsSystem::jump(&mut f, 1.0, stage.ground_y));

        let (mut g, _) = setup();
        PhysicsSystem::jump(&mut g, SHORT_HOP_SCALE, stage.ground_y);
        assert_eq!(g.velocity.y, g.config.jump_force * SHORT_HOP_SCALE);
    }

    #[test]
    fn stunned_fighter_cannot_jump() {
        let (mut f, stage) = setup();
        f.phase = Phase::TakeHit;
        assert!(!PhysicsSystem::jump(&mut f, 1.0, stage.ground_y));
    }

    #[test]
    fn dead_fighter_skips_clamp_and_settles() {
        let (mut f, stage) = setup();
        f.health = 0;
        f.phase = Phase::Dead;
        f.position = Vec2::new(5.0, 100.0);
        f.velocity = Vec2::new(-15.0, -3.0);

        PhysicsSystem::integrate(&mut f, &stage);
        assert!(f.position.x < 0.0, "dead fighters are not wall-clamped");

        for _ in 0..100 {
            PhysicsSystem::integrate(&mut f, &stage);
        }
        assert_eq!(f.position.y + f.config.height, stage.ground_y);
        assert_eq!(f.phase, Phase::Dead);
    }
}
