//! Tag Arena - headless 3v3 tag-team fighter
//!
//! Runs a single match in real time. It handles:
//! - Raw key edges from stdin for team 1 (`+k` press, `-k` release)
//! - A seeded CPU team driven by the AI controller
//! - Post-match commentary from the commentary API

mod commentary;
mod config;
mod game;
mod util;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commentary::HttpCommentator;
use crate::config::{Config, LogFormat};
use crate::game::input::KeyBindings;
use crate::game::protocol::{MatchMsg, ResultPhase};
use crate::game::tag::TEAM_SIZE;
use crate::game::{GameMatch, MatchHandle, Roster, Simulation};
use crate::util::time::unix_millis;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    info!("Starting Tag Arena");

    let roster = match &config.roster_path {
        Some(path) => Roster::from_path(path)?,
        None => Roster::builtin()?,
    };

    let seed = config.seed.unwrap_or_else(unix_millis);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let local: Vec<_> = if config.local_team.is_empty() {
        roster.fighters().iter().take(TEAM_SIZE).cloned().collect()
    } else {
        roster.team(&config.local_team)?
    };
    let cpu = roster.random_team(&mut rng, TEAM_SIZE);
    let stage = match &config.stage {
        Some(id) => roster.stage(id)?,
        None => roster.stages()[0].clone(),
    };

    let sim = match Simulation::new(&local, &cpu, stage, config.ai.clone(), seed) {
        Ok(sim) => sim.with_round_seconds(config.round_seconds),
        Err(e) => {
            error!(error = %e, "Match not started");
            return Ok(());
        }
    };

    let commentator = HttpCommentator::new(&config.commentary);
    let (game_match, handle) = GameMatch::new(
        sim,
        KeyBindings::default(),
        commentator,
        config.commentary.timeout,
    );

    tokio::spawn(read_key_edges(handle.clone()));
    tokio::spawn(log_snapshots(handle.clone()));

    let outcome = tokio::select! {
        phase = game_match.run() => phase,
        _ = shutdown_signal() => None,
    };

    match outcome {
        Some(phase) => {
            let result = phase.result();
            info!(
                match_id = %result.match_id,
                winner = %result.winner_label,
                decision = ?result.decision,
                remaining_health = result.winner_remaining_health,
                duration_secs = result.duration_secs,
                "Final result"
            );
            if let Some(text) = phase.commentary() {
                info!("{}", text);
            }
        }
        None => info!(match_id = %handle.id, "Match abandoned"),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Forward stdin lines to the match as key edges
async fn read_key_edges(handle: MatchHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some(edge) = handle.edge(&line) else {
            debug!(line = %line.trim(), "Ignoring input line");
            continue;
        };
        if handle.input_tx.send(edge).await.is_err() {
            break;
        }
    }
}

/// Log the broadcast stream until the match closes it
async fn log_snapshots(handle: MatchHandle) {
    let mut rx = handle.subscribe();
    loop {
        match rx.recv().await {
            Ok(MatchMsg::Frame(frame)) => {
                if !frame.events.is_empty() {
                    debug!(
                        tick = frame.tick,
                        timer = frame.timer_seconds,
                        events = ?frame.events,
                        "Frame"
                    );
                }
            }
            Ok(MatchMsg::MatchEnd(ResultPhase::AwaitingCommentary { result })) => {
                info!(
                    match_id = %result.match_id,
                    winner = %result.winner_label,
                    "Match over, awaiting commentary"
                );
            }
            Ok(MatchMsg::MatchEnd(ResultPhase::Resolved { .. })) => break,
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "Snapshot logger lagged"),
            Err(RecvError::Closed) => break,
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
