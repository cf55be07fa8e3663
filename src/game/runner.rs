//! Real-time driver for a `Simulation`
//!
//! One task owns the simulation. The render tick and the one-second
//! countdown are both serviced from the same `select!`, so a countdown
//! step can never observe a half-committed tick.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use super::input::{InputAction, InputMapper, KeyBindings, KeyEdge};
use super::protocol::{MatchMsg, ResultPhase};
use super::Simulation;
use crate::commentary::{resolve_commentary, Commentator};
use crate::util::time::{tick_duration, MatchClock, COUNTDOWN_PERIOD};

/// Handle for feeding a running match and watching its output
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    pub input_tx: mpsc::Sender<KeyEdge>,
    pub snapshot_tx: broadcast::Sender<MatchMsg>,
    /// Shared with the match so edges are stamped on its timeline
    pub clock: MatchClock,
}

impl MatchHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<MatchMsg> {
        self.snapshot_tx.subscribe()
    }

    /// Parse a `+k` / `-k` line stamped with the current match time
    pub fn edge(&self, line: &str) -> Option<KeyEdge> {
        KeyEdge::parse(line, self.clock.elapsed_ms())
    }
}

/// A match bound to its input queue, output channel and commentator
pub struct GameMatch<C> {
    sim: Simulation,
    mapper: InputMapper,
    clock: MatchClock,
    input_rx: mpsc::Receiver<KeyEdge>,
    snapshot_tx: broadcast::Sender<MatchMsg>,
    commentator: C,
    commentary_timeout: Duration,
}

impl<C: Commentator> GameMatch<C> {
    /// Wrap a simulation. The match clock starts here.
    pub fn new(
        sim: Simulation,
        bindings: KeyBindings,
        commentator: C,
        commentary_timeout: Duration,
    ) -> (Self, MatchHandle) {
        let (input_tx, input_rx) = mpsc::channel(256);
        let (snapshot_tx, _) = broadcast::channel(64);
        let clock = MatchClock::start();

        let handle = MatchHandle {
            id: sim.id(),
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            clock,
        };

        let game_match = Self {
            sim,
            mapper: InputMapper::new(bindings),
            clock,
            input_rx,
            snapshot_tx,
            commentator,
            commentary_timeout,
        };

        (game_match, handle)
    }

    /// Run until the match is decided, then resolve commentary.
    ///
    /// Returns the resolved result phase, which is also the last message
    /// broadcast on the snapshot channel.
    pub async fn run(mut self) -> Option<ResultPhase> {
        let match_id = self.sim.id();
        info!(match_id = %match_id, "Match started");

        let mut tick_interval = interval(tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut countdown = interval_at(Instant::now() + COUNTDOWN_PERIOD, COUNTDOWN_PERIOD);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !self.sim.is_over() {
            tokio::select! {
                _ = tick_interval.tick() => {
                    let actions = self.drain_inputs();
                    let frame = self.sim.advance(&actions, self.clock.elapsed_ms());
                    let _ = self.snapshot_tx.send(MatchMsg::Frame(frame));
                }
                _ = countdown.tick() => {
                    if self.sim.countdown_second(self.clock.elapsed_ms()) {
                        debug!(
                            match_id = %match_id,
                            timer = self.sim.state().timer_seconds,
                            "Countdown"
                        );
                    }
                }
            }
        }

        // Flush events raised by a countdown-driven finish
        let frame = self.sim.advance(&[], self.clock.elapsed_ms());
        let _ = self.snapshot_tx.send(MatchMsg::Frame(frame));

        let result = self.sim.result()?.clone();
        let _ = self.snapshot_tx.send(MatchMsg::MatchEnd(ResultPhase::AwaitingCommentary {
            result: result.clone(),
        }));

        let commentary =
            resolve_commentary(&self.commentator, &result, self.commentary_timeout).await;
        info!(match_id = %match_id, commentary = %commentary, "Commentary resolved");

        let resolved = ResultPhase::Resolved { result, commentary };
        let _ = self.snapshot_tx.send(MatchMsg::MatchEnd(resolved.clone()));
        Some(resolved)
    }

    /// Drain queued key edges into discrete actions
    fn drain_inputs(&mut self) -> Vec<InputAction> {
        let mut actions = Vec::new();
        while let Ok(edge) = self.input_rx.try_recv() {
            if let Some(action) = self.mapper.translate(edge) {
                actions.push(action);
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commentary::CommentaryError;
    use crate::game::ai::AiTunables;
    use crate::game::r#match::Decision;
    use crate::game::{MatchResult, Roster, Side};
    use tokio::sync::broadcast::error::TryRecvError;

    struct Announcer;

    impl Commentator for Announcer {
        async fn commentate(&self, result: &MatchResult) -> Result<String, CommentaryError> {
            Ok(format!("{} takes it!", result.winner_label))
        }
    }

    fn idle_ai() -> AiTunables {
        AiTunables {
            block_chance: 0.0,
            jump_chance: 0.0,
            chase_range: 10_000.0,
            melee_range: 0.0,
            press_threshold: 0.0,
            approach_threshold: 0.0,
            ..AiTunables::default()
        }
    }

    fn game(round_seconds: u32) -> (GameMatch<Announcer>, MatchHandle) {
        let roster = Roster::builtin().unwrap();
        let local = roster.team(&["kaito", "ren", "hana"]).unwrap();
        let cpu = roster.team(&["kaito", "ren", "hana"]).unwrap();
        let stage = roster.stages()[0].clone();
        let sim = Simulation::new(&local, &cpu, stage, idle_ai(), 9)
            .unwrap()
            .with_round_seconds(round_seconds);
        GameMatch::new(sim, KeyBindings::default(), Announcer, Duration::from_secs(8))
    }

    #[tokio::test]
    async fn drains_and_translates_edges() {
        let (mut game, handle) = game(99);
        for line in ["+d", "+j", "-j", "+x"] {
            let edge = handle.edge(line).unwrap();
            handle.input_tx.try_send(edge).unwrap();
        }

        let actions = game.drain_inputs();
        assert_eq!(
            actions,
            vec![InputAction::MoveRight { held: true }, InputAction::LightAttack]
        );
        assert!(game.drain_inputs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn time_out_resolves_commentary() {
        let (game, handle) = game(2);
        let mut rx = handle.subscribe();

        let phase = game.run().await.unwrap();
        let result = phase.result();
        assert_eq!(result.decision, Decision::TimeOut);
        // Untouched teams tie; ties go to team 1
        assert_eq!(result.winner, Side::Local);
        assert!(result.duration_secs >= 2);
        assert_eq!(phase.commentary(), Some("Team 1 takes it!"));

        let mut tail = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(msg) => tail.push(msg),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        let n = tail.len();
        assert!(n >= 3);
        assert!(matches!(
            &tail[n - 2],
            MatchMsg::MatchEnd(ResultPhase::AwaitingCommentary { .. })
        ));
        assert!(matches!(
            &tail[n - 1],
            MatchMsg::MatchEnd(ResultPhase::Resolved { .. })
        ));
        match &tail[n - 3] {
            MatchMsg::Frame(frame) => {
                assert!(frame.over);
                assert_eq!(frame.timer_seconds, 0);
            }
            other => panic!("expected final frame, got {other:?}"),
        }
    }
}
