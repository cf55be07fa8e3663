//! Match state and the per-frame simulation step

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::ai::{AiController, AiTunables};
use super::archetype::{FighterConfig, RosterError, StageConfig};
use super::combat::{
    AttackKind, CombatSystem, HitOutcome, BLOCK_COOLDOWN, BLOCK_HOLD, METER_GAIN_HIT, SUPER_COST,
    SUPER_FLASH_HIT_STOP, SUPER_FLASH_SHAKE,
};
use super::fighter::{FighterState, IDLE_CYCLE};
use super::input::InputAction;
use super::physics::{PhysicsSystem, SHORT_HOP_SCALE};
use super::projectile::ProjectileSystem;
use super::protocol::{GameEvent, HitEffect, ScreenShake};
use super::snapshot::{team_snapshot, FighterSnapshot, FrameSnapshot};
use super::tag::{AutoSwitch, TagDirection, TagManager, Team, TEAM_SIZE};
use super::Side;

pub const DEFAULT_ROUND_SECONDS: u32 = 99;

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Match in progress
    Active,
    /// Result decided, no further mutation
    Over,
}

/// How the match was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// A team ran out of living members
    KnockOut,
    /// Timer expired; summed health decides
    TimeOut,
}

/// Result record handed to the commentary collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub match_id: Uuid,
    pub winner: Side,
    pub winner_label: String,
    pub loser_label: String,
    pub winner_remaining_health: i32,
    pub duration_secs: u64,
    pub winning_member_names: Vec<String>,
    pub decision: Decision,
    pub finished_at: DateTime<Utc>,
}

/// Match-wide timing and outcome
#[derive(Debug, Clone)]
pub struct MatchState {
    pub tick: u64,
    pub timer_seconds: u32,
    /// Global freeze; physics, AI and timer wait while positive
    pub hit_stop: u32,
    pub shake: ScreenShake,
    pub phase: MatchPhase,
    pub result: Option<MatchResult>,
}

impl MatchState {
    pub fn new(round_seconds: u32) -> Self {
        Self {
            tick: 0,
            timer_seconds: round_seconds,
            hit_stop: 0,
            shake: ScreenShake::default(),
            phase: MatchPhase::Active,
            result: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.phase == MatchPhase::Over
    }

    /// Extend the freeze; a shorter request never cuts a longer one
    pub fn freeze(&mut self, ticks: u32) {
        self.hit_stop = self.hit_stop.max(ticks);
    }
}

/// Match construction errors
#[derive(Debug, thiserror::Error)]
pub enum MatchSetupError {
    #[error("{side:?} team needs exactly 3 members, got {got}")]
    TeamSize { side: Side, got: usize },

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Held movement keys of the local side
#[derive(Debug, Clone, Copy, Default)]
struct LocalControl {
    left: bool,
    right: bool,
}

impl LocalControl {
    fn velocity(&self, speed: f32) -> f32 {
        match (self.left, self.right) {
            (true, false) => -speed,
            (false, true) => speed,
            _ => 0.0,
        }
    }
}

/// One match: both teams, the stage and everything that moves.
///
/// Owned by a single task and advanced once per rendered frame.
pub struct Simulation {
    id: Uuid,
    stage: StageConfig,
    local: Team,
    opponent: Team,
    projectiles: ProjectileSystem,
    effects: Vec<HitEffect>,
    ai: AiController,
    control: LocalControl,
    /// Actions received during a freeze, applied when it lifts
    pending: Vec<InputAction>,
    state: MatchState,
    /// Events of the tick in progress
    events: Vec<GameEvent>,
}

impl Simulation {
    pub fn new(
        team_local: &[Arc<FighterConfig>],
        team_opponent: &[Arc<FighterConfig>],
        stage: StageConfig,
        tunables: AiTunables,
        seed: u64,
    ) -> Result<Self, MatchSetupError> {
        let local = Team::new(Side::Local, Self::roster(Side::Local, team_local)?, stage.ground_y);
        let opponent = Team::new(
            Side::Opponent,
            Self::roster(Side::Opponent, team_opponent)?,
            stage.ground_y,
        );

        let id = Uuid::new_v4();
        info!(
            match_id = %id,
            stage = %stage.name,
            seed,
            local = ?local.member_names(),
            opponent = ?opponent.member_names(),
            "Match created"
        );

        Ok(Self {
            id,
            stage,
            local,
            opponent,
            projectiles: ProjectileSystem::new(),
            effects: Vec::new(),
            ai: AiController::new(seed, tunables),
            control: LocalControl::default(),
            pending: Vec::new(),
            state: MatchState::new(DEFAULT_ROUND_SECONDS),
            events: Vec::new(),
        })
    }

    pub fn with_round_seconds(mut self, seconds: u32) -> Self {
        self.state.timer_seconds = seconds;
        self
    }

    fn roster(
        side: Side,
        configs: &[Arc<FighterConfig>],
    ) -> Result<[Arc<FighterConfig>; TEAM_SIZE], MatchSetupError> {
        configs.to_vec().try_into().map_err(|v: Vec<_>| MatchSetupError::TeamSize {
            side,
            got: v.len(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn result(&self) -> Option<&MatchResult> {
        self.state.result.as_ref()
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::Local => &self.local,
            Side::Opponent => &self.opponent,
        }
    }

    pub fn team_mut(&mut self, side: Side) -> &mut Team {
        match side {
            Side::Local => &mut self.local,
            Side::Opponent => &mut self.opponent,
        }
    }

    /// Advance one frame.
    ///
    /// `now_ms` is real time since match start; it drives the tag cooldown
    /// and the result's duration.
    pub fn advance(&mut self, actions: &[InputAction], now_ms: u64) -> FrameSnapshot {
        if self.state.is_over() {
            return self.snapshot();
        }

        self.state.tick += 1;
        self.pending.extend_from_slice(actions);

        if self.state.hit_stop == 0 {
            for action in std::mem::take(&mut self.pending) {
                self.apply_action(action, now_ms);
            }
        }

        if self.state.hit_stop > 0 {
            self.state.hit_stop -= 1;
        } else {
            self.step(now_ms);
        }

        self.decay_cosmetics();
        self.snapshot()
    }

    /// One real-time second elapsed. Ignored during a freeze or after the end.
    pub fn countdown_second(&mut self, now_ms: u64) -> bool {
        if self.state.is_over() || self.state.hit_stop > 0 {
            return false;
        }

        self.state.timer_seconds = self.state.timer_seconds.saturating_sub(1);
        if self.state.timer_seconds == 0 {
            self.time_out(now_ms);
        }
        true
    }

    fn apply_action(&mut self, action: InputAction, now_ms: u64) {
        match action {
            InputAction::MoveLeft { held } => self.control.left = held,
            InputAction::MoveRight { held } => self.control.right = held,
            InputAction::TagPrev => self.manual_tag(TagDirection::Prev, now_ms),
            InputAction::TagNext => self.manual_tag(TagDirection::Next, now_ms),
            // Charge timing lives in the input mapper
            InputAction::JumpPress => {}
            InputAction::JumpRelease { held_ms } => {
                let scale = if InputAction::is_full_jump(held_ms) {
                    1.0
                } else {
                    SHORT_HOP_SCALE
                };
                PhysicsSystem::jump(self.local.active_mut(), scale, self.stage.ground_y);
            }
            InputAction::Block => {
                self.local.active_mut().enter_block(BLOCK_HOLD, BLOCK_COOLDOWN);
            }
            InputAction::LightAttack => {
                self.begin_attack(Side::Local, AttackKind::Light);
            }
            InputAction::HeavyAttack => {
                self.begin_attack(Side::Local, AttackKind::Heavy);
            }
            InputAction::SpecialAttack => {
                self.begin_attack(Side::Local, AttackKind::Special);
            }
            InputAction::SuperAttack => {
                self.begin_attack(Side::Local, AttackKind::Super);
            }
        }
    }

    fn manual_tag(&mut self, direction: TagDirection, now_ms: u64) {
        if let Some(member) = TagManager::request_switch(&mut self.local, direction, now_ms) {
            self.events.push(GameEvent::Tagged {
                side: Side::Local,
                member,
                manual: true,
            });
        }
    }

    /// Shared activation path for player and AI attacks
    fn begin_attack(&mut self, side: Side, kind: AttackKind) -> bool {
        let fighter = self.team_mut(side).active_mut();
        if kind == AttackKind::Super && fighter.meter < SUPER_COST {
            return false;
        }
        if !CombatSystem::start_attack(fighter, kind) {
            return false;
        }

        if kind == AttackKind::Super {
            fighter.gain_meter(-SUPER_COST);
            let name = fighter.config.name.clone();
            info!(match_id = %self.id, side = ?side, fighter = %name, "Super activated");

            self.state.freeze(SUPER_FLASH_HIT_STOP);
            self.state.shake = SUPER_FLASH_SHAKE;
            self.events.push(GameEvent::SuperActivated { side, fighter: name });
        }
        true
    }

    fn step(&mut self, now_ms: u64) {
        let ground_y = self.stage.ground_y;

        // AI picks movement and maybe an attack
        let ai_attack = self
            .ai
            .update(self.opponent.active_mut(), self.local.active(), ground_y);
        if let Some(kind) = ai_attack {
            self.begin_attack(Side::Opponent, kind);
        }

        // Timers, facing, locomotion, attack frames
        let opponent_x = self.opponent.active().position.x;
        let local_x = self.local.active().position.x;
        let control = self.control.velocity(self.local.active().config.speed);

        if step_fighter(self.local.active_mut(), opponent_x, Some(control), ground_y) {
            self.fire_projectile(Side::Local);
        }
        if step_fighter(self.opponent.active_mut(), local_x, None, ground_y) {
            self.fire_projectile(Side::Opponent);
        }

        // Melee, both directions
        if let Some(outcome) =
            CombatSystem::resolve_melee(self.local.active_mut(), self.opponent.active_mut())
        {
            self.register_hit(Side::Local, outcome, false);
        }
        if let Some(outcome) =
            CombatSystem::resolve_melee(self.opponent.active_mut(), self.local.active_mut())
        {
            self.register_hit(Side::Opponent, outcome, false);
        }

        // Projectiles
        let hits = self.projectiles.advance(
            self.stage.width,
            self.local.active_mut(),
            self.opponent.active_mut(),
        );
        for hit in hits {
            if !hit.outcome.blocked {
                self.team_mut(hit.owner).active_mut().gain_meter(METER_GAIN_HIT);
            }
            self.register_hit(hit.owner, hit.outcome, true);
        }

        // Physics and recovery
        PhysicsSystem::integrate(self.local.active_mut(), &self.stage);
        PhysicsSystem::integrate(self.opponent.active_mut(), &self.stage);
        CombatSystem::advance_recovery(self.local.active_mut());
        CombatSystem::advance_recovery(self.opponent.active_mut());

        // KO replacements; local first
        for side in [Side::Local, Side::Opponent] {
            let entry_x = TagManager::entry_x(side, self.stage.width);
            match TagManager::auto_switch(self.team_mut(side), entry_x) {
                AutoSwitch::NotNeeded => {}
                AutoSwitch::Switched(member) => self.events.push(GameEvent::Tagged {
                    side,
                    member,
                    manual: false,
                }),
                AutoSwitch::Eliminated => {
                    self.finish(side.other(), Decision::KnockOut, now_ms);
                    break;
                }
            }
        }

        if !self.state.is_over() && self.state.timer_seconds == 0 {
            self.time_out(now_ms);
        }

        self.projectiles.purge();
    }

    fn fire_projectile(&mut self, side: Side) {
        let caster = match side {
            Side::Local => self.local.active(),
            Side::Opponent => self.opponent.active(),
        };
        let kind = self.projectiles.spawn(caster, side).kind;
        self.events.push(GameEvent::ProjectileFired { owner: side, kind });
    }

    fn register_hit(&mut self, attacker: Side, outcome: HitOutcome, projectile: bool) {
        self.state.freeze(outcome.hit_stop);
        if let Some(shake) = outcome.shake {
            self.state.shake = shake;
        }

        self.events.push(GameEvent::Hit {
            attacker,
            kind: outcome.kind,
            blocked: outcome.blocked,
            damage: outcome.damage,
            projectile,
        });
        if outcome.knocked_out {
            let fighter = self.team(attacker.other()).active().config.name.clone();
            info!(match_id = %self.id, side = ?attacker.other(), fighter = %fighter, "Knocked out");
            self.events.push(GameEvent::KnockedOut {
                side: attacker.other(),
                fighter,
            });
        }
        self.effects.push(outcome.effect);
    }

    fn decay_cosmetics(&mut self) {
        self.state.shake.decay();
        self.effects.retain_mut(HitEffect::tick);
    }

    fn time_out(&mut self, now_ms: u64) {
        let winner = if self.local.total_health() >= self.opponent.total_health() {
            Side::Local
        } else {
            Side::Opponent
        };
        self.finish(winner, Decision::TimeOut, now_ms);
    }

    fn finish(&mut self, winner: Side, decision: Decision, now_ms: u64) {
        if self.state.is_over() {
            return;
        }

        let team = self.team(winner);
        let result = MatchResult {
            match_id: self.id,
            winner,
            winner_label: winner.label().to_string(),
            loser_label: winner.other().label().to_string(),
            winner_remaining_health: team.total_health(),
            duration_secs: now_ms / 1000,
            winning_member_names: team.member_names(),
            decision,
            finished_at: Utc::now(),
        };

        info!(
            match_id = %self.id,
            winner = %result.winner_label,
            decision = ?decision,
            remaining_health = result.winner_remaining_health,
            duration_secs = result.duration_secs,
            "Match over"
        );

        self.state.phase = MatchPhase::Over;
        self.state.result = Some(result);
        self.events.push(GameEvent::MatchOver { winner });
    }

    fn snapshot(&mut self) -> FrameSnapshot {
        let events = std::mem::take(&mut self.events);
        if !events.is_empty() {
            debug!(
                match_id = %self.id,
                tick = self.state.tick,
                count = events.len(),
                "Tick events"
            );
        }

        FrameSnapshot {
            tick: self.state.tick,
            timer_seconds: self.state.timer_seconds,
            hit_stop: self.state.hit_stop,
            shake: self.state.shake,
            active_local: FighterSnapshot::capture(self.local.active(), self.local.active, true),
            active_opponent: FighterSnapshot::capture(
                self.opponent.active(),
                self.opponent.active,
                true,
            ),
            team_local: team_snapshot(&self.local),
            team_opponent: team_snapshot(&self.opponent),
            projectiles: self.projectiles.iter().map(|p| p.snapshot()).collect(),
            effects: self.effects.clone(),
            events,
            over: self.state.is_over(),
            winner: self.state.result.as_ref().map(|r| r.winner),
        }
    }
}

/// Per-tick bookkeeping for one active fighter. Returns true when a
/// Special releases its projectile this tick.
fn step_fighter(
    fighter: &mut FighterState,
    target_x: f32,
    control: Option<f32>,
    ground_y: f32,
) -> bool {
    fighter.tick_timers();
    if !fighter.is_alive() {
        return false;
    }

    if fighter.is_stunned() {
        fighter.decelerate();
    } else {
        fighter.face_towards(target_x);
        if let Some(vx) = control {
            fighter.velocity.x = vx;
        }
    }
    fighter.update_locomotion(ground_y);

    if fighter.is_attacking {
        CombatSystem::advance_attack(fighter)
    } else {
        if fighter.is_neutral() && fighter.is_grounded(ground_y) {
            fighter.frames_current = (fighter.frames_current + 1) % IDLE_CYCLE;
        }
        false
    }
}

#[cfg(test)]
impl MatchResult {
    pub fn sample() -> Self {
        Self {
            match_id: Uuid::nil(),
            winner: Side::Local,
            winner_label: "Team 1".into(),
            loser_label: "Team 2".into(),
            winner_remaining_health: 150,
            duration_secs: 42,
            winning_member_names: vec!["Kaito".into(), "Ren".into(), "Hana".into()],
            decision: Decision::KnockOut,
            finished_at: Utc::now(),
        }
    }
}
