//! Team rosters and tag switching

use std::sync::Arc;
use tracing::info;

use super::archetype::FighterConfig;
use super::fighter::{FighterState, Phase};
use super::{Side, Vec2};

pub const TEAM_SIZE: usize = 3;

/// Real-time gap required between manual switches
pub const TAG_COOLDOWN_MS: u64 = 3_000;
/// Invincibility granted to an incoming member
pub const ENTRANCE_INVINCIBILITY: u32 = 50;
/// Incoming members drop in from above the stage
pub const ENTRANCE_Y: f32 = -200.0;
pub const ENTRANCE_DROP_SPEED: f32 = 10.0;

/// Spawn x for each side's opening member
pub const LOCAL_SPAWN_X: f32 = 150.0;
pub const OPPONENT_SPAWN_X: f32 = 750.0;
/// KO replacements enter from the team's own edge
pub const KO_ENTRY_MARGIN: f32 = 50.0;

/// Three roster slots and the index of the one on stage
#[derive(Debug, Clone)]
pub struct Team {
    pub side: Side,
    pub members: [FighterState; TEAM_SIZE],
    pub active: usize,
    /// Time of the last manual switch (ms since match start)
    pub last_switch_ms: Option<u64>,
}

impl Team {
    /// Build a team standing on the ground line; opponents get AI state
    pub fn new(side: Side, configs: [Arc<FighterConfig>; TEAM_SIZE], ground_y: f32) -> Self {
        let (x, facing) = match side {
            Side::Local => (LOCAL_SPAWN_X, 1.0),
            Side::Opponent => (OPPONENT_SPAWN_X, -1.0),
        };

        let members = configs.map(|config| {
            let spawn = Vec2::new(x, ground_y - config.height);
            match side {
                Side::Local => FighterState::new(config, spawn, facing),
                Side::Opponent => FighterState::new_ai(config, spawn, facing),
            }
        });

        Self {
            side,
            members,
            active: 0,
            last_switch_ms: None,
        }
    }

    pub fn active(&self) -> &FighterState {
        &self.members[self.active]
    }

    pub fn active_mut(&mut self) -> &mut FighterState {
        &mut self.members[self.active]
    }

    /// Summed remaining health across the roster
    pub fn total_health(&self) -> i32 {
        self.members.iter().map(|m| m.health.max(0)).sum()
    }

    pub fn member_names(&self) -> Vec<String> {
        self.members.iter().map(|m| m.config.name.clone()).collect()
    }

    /// Put `index` on stage at `x`, dropping in from above
    fn bring_in(&mut self, index: usize, x: f32) {
        let incoming = &mut self.members[index];
        incoming.position = Vec2::new(x, ENTRANCE_Y);
        incoming.velocity = Vec2::new(0.0, ENTRANCE_DROP_SPEED);
        incoming.invincible_frames = ENTRANCE_INVINCIBILITY;
        incoming.end_attack();
        incoming.phase = Phase::Jumping;
        incoming.update_attack_box();
        self.active = index;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagDirection {
    Prev,
    Next,
}

/// Result of the KO check after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoSwitch {
    NotNeeded,
    Switched(usize),
    /// No living member remains
    Eliminated,
}

/// Active-member selection for both teams
pub struct TagManager;

impl TagManager {
    /// Manual tag request. Returns the new active index when honoured.
    pub fn request_switch(team: &mut Team, direction: TagDirection, now_ms: u64) -> Option<usize> {
        if let Some(last) = team.last_switch_ms {
            if now_ms.saturating_sub(last) <= TAG_COOLDOWN_MS {
                return None;
            }
        }
        if !team.active().is_alive() {
            return None;
        }

        let target = (1..TEAM_SIZE).find_map(|step| {
            let index = match direction {
                TagDirection::Next => (team.active + step) % TEAM_SIZE,
                TagDirection::Prev => (team.active + TEAM_SIZE - step) % TEAM_SIZE,
            };
            team.members[index].is_alive().then_some(index)
        })?;

        let x = team.active().position.x;
        let outgoing = team.active_mut();
        outgoing.end_attack();
        outgoing.velocity = Vec2::default();

        team.bring_in(target, x);
        team.last_switch_ms = Some(now_ms);

        info!(
            side = ?team.side,
            member = %team.active().config.name,
            "Tag switch"
        );
        Some(target)
    }

    /// Replace a knocked-out active member with the first living one.
    ///
    /// `entry_x` is the team's edge of the stage. Does not touch the
    /// manual-switch cooldown.
    pub fn auto_switch(team: &mut Team, entry_x: f32) -> AutoSwitch {
        if team.active().is_alive() {
            return AutoSwitch::NotNeeded;
        }

        match team.members.iter().position(FighterState::is_alive) {
            Some(index) => {
                team.bring_in(index, entry_x);
                info!(
                    side = ?team.side,
                    member = %team.active().config.name,
                    "KO replacement"
                );
                AutoSwitch::Switched(index)
            }
            None => AutoSwitch::Eliminated,
        }
    }

    /// KO entrance x for a side
    pub fn entry_x(side: Side, stage_width: f32) -> f32 {
        match side {
            Side::Local => 0.0,
            Side::Opponent => stage_width - KO_ENTRY_MARGIN,
        }
    }
}
