//! Ranged attacks released by Special activations

use super::archetype::ProjectileKind;
use super::combat::{AttackKind, CombatSystem, HitOutcome, Strike, PROJECTILE_DAMAGE};
use super::fighter::FighterState;
use super::protocol::ProjectileSnapshot;
use super::{Rect, Side, Vec2};

pub const PROJECTILE_SIZE: f32 = 40.0;
/// Spawn height, measured down from the caster's top
pub const PROJECTILE_OFFSET_Y: f32 = 30.0;
/// Distance past either stage edge before a projectile is dropped
pub const OFFSTAGE_MARGIN: f32 = 100.0;

#[derive(Debug, Clone)]
pub struct Projectile {
    /// Centre of the projectile
    pub position: Vec2,
    pub velocity: Vec2,
    pub owner: Side,
    pub damage: i32,
    pub width: f32,
    pub height: f32,
    pub kind: ProjectileKind,
    pub removed: bool,
}

impl Projectile {
    /// Projectile leaving the caster's leading edge in its facing direction
    pub fn from_caster(caster: &FighterState, owner: Side) -> Self {
        let edge = if caster.facing > 0.0 {
            caster.position.x + caster.config.width
        } else {
            caster.position.x
        };

        Self {
            position: Vec2::new(edge, caster.position.y + PROJECTILE_OFFSET_Y),
            velocity: Vec2::new(caster.facing * caster.config.projectile_speed, 0.0),
            owner,
            damage: PROJECTILE_DAMAGE,
            width: PROJECTILE_SIZE,
            height: PROJECTILE_SIZE,
            kind: caster.config.projectile,
            removed: false,
        }
    }

    /// Box approximation of the round projectile
    pub fn hit_box(&self) -> Rect {
        Rect::new(
            self.position.x - self.width / 2.0,
            self.position.y - self.height / 2.0,
            self.width,
            self.height,
        )
    }

    pub fn is_offstage(&self, stage_width: f32) -> bool {
        self.position.x < -OFFSTAGE_MARGIN || self.position.x > stage_width + OFFSTAGE_MARGIN
    }

    pub fn snapshot(&self) -> ProjectileSnapshot {
        ProjectileSnapshot {
            owner: self.owner,
            x: self.position.x,
            y: self.position.y,
            vel_x: self.velocity.x,
            kind: self.kind,
        }
    }
}

/// A projectile that connected this tick
#[derive(Debug, Clone)]
pub struct ProjectileHit {
    pub owner: Side,
    pub outcome: HitOutcome,
}

/// Owns every live projectile in the match
#[derive(Debug, Default)]
pub struct ProjectileSystem {
    projectiles: Vec<Projectile>,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, caster: &FighterState, owner: Side) -> &Projectile {
        self.projectiles.push(Projectile::from_caster(caster, owner));
        &self.projectiles[self.projectiles.len() - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    /// Move every projectile and resolve hits against the opposing active fighter
    pub fn advance(
        &mut self,
        stage_width: f32,
        local: &mut FighterState,
        opponent: &mut FighterState,
    ) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();

        for projectile in self.projectiles.iter_mut().filter(|p| !p.removed) {
            projectile.position.x += projectile.velocity.x;
            projectile.position.y += projectile.velocity.y;

            if projectile.is_offstage(stage_width) {
                projectile.removed = true;
                continue;
            }

            let target = match projectile.owner {
                Side::Local => &mut *opponent,
                Side::Opponent => &mut *local,
            };

            if !target.is_alive() || target.invincible_frames > 0 {
                continue;
            }
            if !projectile.hit_box().intersects(&target.body()) {
                continue;
            }

            let strike = Strike {
                kind: AttackKind::Special,
                damage: projectile.damage,
                push_dir: if projectile.velocity.x >= 0.0 { 1.0 } else { -1.0 },
            };
            if let Some(outcome) = CombatSystem::apply_hit(target, strike) {
                projectile.removed = true;
                hits.push(ProjectileHit {
                    owner: projectile.owner,
                    outcome,
                });
            }
        }

        hits
    }

    /// Drop removed projectiles (end of tick)
    pub fn purge(&mut self) {
        self.projectiles.retain(|p| !p.removed);
    }
}

#[cfg(test)]
impl ProjectileSystem {
    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::METER_GAIN_DAMAGE;
    use crate::game::fighter::Phase;
    use crate::game::Roster;

    fn fighter(id: &str, x: f32, facing: f32) -> FighterState {
        let config = Roster::builtin().unwrap().fighter(id).unwrap();
        FighterState::new(config, Vec2::new(x, 365.0), facing)
    }

    #[test]
    fn spawns_at_leading_edge() {
        let right = Projectile::from_caster(&fighter("kaito", 100.0, 1.0), Side::Local);
        assert_eq!(right.position, Vec2::new(160.0, 395.0));
        assert_eq!(right.velocity.x, 15.0);
        assert_eq!(right.kind, ProjectileKind::EnergyBall);

        let left = Projectile::from_caster(&fighter("suna", 100.0, -1.0), Side::Opponent);
        assert_eq!(left.position.x, 100.0);
        assert_eq!(left.velocity.x, -10.0);
        assert_eq!(left.kind, ProjectileKind::Sand);
    }

    #[test]
    fn hits_opposing_fighter_once() {
        let mut system = ProjectileSystem::new();
        let mut local = fighter("kaito", 100.0, 1.0);
        let mut opponent = fighter("kaito", 220.0, -1.0);
        system.spawn(&local, Side::Local);

        let mut hits = Vec::new();
        for _ in 0..10 {
            hits.extend(system.advance(1024.0, &mut local, &mut opponent));
            system.purge();
        }

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].owner, Side::Local);
        assert_eq!(opponent.health, 110 - PROJECTILE_DAMAGE);
        assert_eq!(opponent.meter, METER_GAIN_DAMAGE);
        assert_eq!(opponent.phase, Phase::TakeHit);
        assert_eq!(opponent.velocity.x, 15.0);
        assert_eq!(local.health, 110);
        assert!(system.is_empty());
    }

    #[test]
    fn blocked_projectile_deals_nothing() {
        let mut system = ProjectileSystem::new();
        let mut local = fighter("kaito", 100.0, 1.0);
        let mut opponent = fighter("kaito", 180.0, -1.0);
        opponent.health = 40;
        opponent.enter_block(20, 60);
        system.spawn(&local, Side::Local);

        let hits = system.advance(1024.0, &mut local, &mut opponent);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].outcome.blocked);
        assert_eq!(opponent.health, 40);
        assert_eq!(opponent.velocity.x, 8.0);
    }

    #[test]
    fn invincible_target_is_passed_through() {
        let mut system = ProjectileSystem::new();
        let mut local = fighter("kaito", 100.0, 1.0);
        let mut opponent = fighter("kaito", 180.0, -1.0);
        opponent.invincible_frames = 50;
        system.spawn(&local, Side::Local);

        let hits = system.advance(1024.0, &mut local, &mut opponent);
        assert!(hits.is_empty());
        assert_eq!(opponent.health, 110);
        assert_eq!(opponent.velocity, Vec2::default());
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn offstage_projectiles_are_removed_without_effect() {
        let mut system = ProjectileSystem::new();
        let mut local = fighter("kaito", 900.0, 1.0);
        let mut opponent = fighter("kaito", 10.0, -1.0);
        system.spawn(&local, Side::Local);

        let mut ticks = 0;
        while !system.is_empty() {
            assert!(system.advance(1024.0, &mut local, &mut opponent).is_empty());
            system.purge();
            ticks += 1;
            assert!(ticks < 100);
        }
        assert_eq!(opponent.health, 110);
    }

    #[test]
    fn own_projectile_never_hits_owner() {
        let mut system = ProjectileSystem::new();
        let mut local = fighter("kaito", 100.0, 1.0);
        let mut opponent = fighter("kaito", 800.0, -1.0);
        system.spawn(&local, Side::Local);
        // Owner walks into its own projectile
        local.position.x = 150.0;
        assert!(system.advance(1024.0, &mut local, &mut opponent).is_empty());
        assert_eq!(local.health, 110);
    }
}
