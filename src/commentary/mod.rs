//! Post-match commentary boundary
//!
//! The collaborator is called once, after the match is over. Every failure
//! degrades to a fixed line; nothing here can hold up the result screen.

mod client;

pub use client::HttpCommentator;

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::game::r#match::Decision;
use crate::game::MatchResult;

/// No credential configured
pub const OFFLINE_FALLBACK: &str = "Commentary system offline. (Check API Key)";
/// Collaborator answered with nothing
pub const EMPTY_FALLBACK: &str = "INCREDIBLE TEAM BATTLE!";
/// Transport, API or timeout failure
pub const FEED_FALLBACK: &str = "THE SATELLITE FEED IS INTERRUPTED! BUT THE CROWD GOES WILD!";

/// Something that can turn a match result into announcer text
pub trait Commentator {
    fn commentate(
        &self,
        result: &MatchResult,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send;
}

/// Commentary errors
#[derive(Debug, thiserror::Error)]
pub enum CommentaryError {
    #[error("No commentary API key configured")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No reply within {0:?}")]
    Timeout(Duration),
}

/// Ask the collaborator for commentary, substituting a fallback on any failure
pub async fn resolve_commentary<C: Commentator>(
    commentator: &C,
    result: &MatchResult,
    timeout: Duration,
) -> String {
    let outcome = match tokio::time::timeout(timeout, commentator.commentate(result)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(CommentaryError::Timeout(timeout)),
    };

    match outcome {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => EMPTY_FALLBACK.to_string(),
        Err(CommentaryError::MissingCredential) => {
            warn!(match_id = %result.match_id, "Commentary offline, no API key");
            OFFLINE_FALLBACK.to_string()
        }
        Err(e) => {
            warn!(match_id = %result.match_id, error = %e, "Commentary failed");
            FEED_FALLBACK.to_string()
        }
    }
}

/// Announcer prompt for a finished match
pub fn build_prompt(result: &MatchResult) -> String {
    let finish = match result.decision {
        Decision::KnockOut => "K.O.",
        Decision::TimeOut => "Time Out (decided on remaining health)",
    };

    format!(
        "You are an excited, high-energy fighting game announcer for a 3v3 tag-team tournament.\n\
         A match just ended.\n\n\
         Winning Team: {}\n\
         Winning Members: {}\n\
         Loser: {}\n\
         Total Remaining Health (Winner): {}\n\
         Match Duration: {} seconds.\n\
         Finish: {}\n\n\
         Write a short, hype commentary (2 sentences max).\n\
         Highlight if it was a \"Reverse Sweep\" (if health is low), \
         a \"Perfect Victory\" (if health is high), or a \"Time Out\".\n\
         Mention one of the winning characters by name if possible.\n\
         Use arcade slang (K.O., Super Special Move, Combo).",
        result.winner_label,
        result.winning_member_names.join(", "),
        result.loser_label,
        result.winner_remaining_health,
        result.duration_secs,
        finish,
    )
}
