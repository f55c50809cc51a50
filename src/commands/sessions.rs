//! Session management commands

use crate::error::Result;
use crate::models::Confirmation;
use crate::session::{Session, SessionStore, SessionSummary};

/// List active sessions, optionally filtered by website context
pub async fn cmd_list_sessions(
    sessions: &SessionStore,
    website_context: Option<&str>,
) -> Vec<SessionSummary> {
    sessions.list(website_context).await
}

/// Show one session's transcript
pub async fn cmd_show_session(
    sessions: &SessionStore,
    session_id: &str,
    website_context: Option<&str>,
) -> Result<Session> {
    sessions.get(session_id, website_context).await
}

/// Clear one session
pub async fn cmd_clear_session(
    sessions: &SessionStore,
    session_id: &str,
    website_context: Option<&str>,
    confirm: Confirmation,
) -> Result<()> {
    sessions.clear(session_id, website_context, confirm).await
}

/// Clear all sessions, optionally scoped to one website context
pub async fn cmd_clear_all_sessions(
    sessions: &SessionStore,
    website_context: Option<&str>,
    confirm: Confirmation,
) -> Result<usize> {
    sessions.clear_all(website_context, confirm).await
}

/// Print session list to console
pub fn print_sessions(summaries: &[SessionSummary]) {
    println!("\nActive sessions\n");

    if summaries.is_empty() {
        println!("No active sessions.");
        return;
    }

    for summary in summaries {
        println!(
            "• {} [{}] - {} turns, created {}",
            summary.id,
            summary.website_context,
            summary.turn_count,
            summary.created_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
}

/// Print a session transcript to console
pub fn print_session(session: &Session) {
    println!(
        "\nSession {} [{}] - {} turns\n",
        session.id,
        session.website_context,
        session.turns.len()
    );

    for turn in &session.turns {
        let preview = |text: &str| {
            if text.len() > 200 {
                let mut cut = 200;
                while !text.is_char_boundary(cut) {
                    cut -= 1;
                }
                format!("{}...", &text[..cut])
            } else {
                text.to_string()
            }
        };

        println!("[{}]", turn.timestamp.format("%Y-%m-%d %H:%M:%S"));
        println!("User: {}", preview(&turn.query));
        println!("Assistant: {}\n", preview(&turn.answer));
    }
}
