//! Conversation session store
//!
//! Process-wide, in-memory store of conversation transcripts. Sessions are
//! keyed by (website context, session id): the same session id under two
//! website contexts is two independent sessions. Turns are append-only and
//! time-ordered; the write lock is the serialization point for concurrent
//! appends to one session.

use crate::error::{Error, Result};
use crate::models::Confirmation;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

const DEFAULT_CONTEXT: &str = "default";

/// One completed query/answer exchange
#[derive(Debug, Clone, serde::Serialize)]
pub struct Turn {
    pub query: String,
    pub answer: String,
    pub timestamp: DateTime<Utc>,
}

/// A conversation session
#[derive(Debug, Clone, serde::Serialize)]
pub struct Session {
    pub id: String,
    pub website_context: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
}

/// Summary row for session listings
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub website_context: String,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
}

/// In-memory session store.
///
/// Construct one at process start and hand it to every caller that needs
/// conversation history; there is deliberately no global instance.
pub struct SessionStore {
    // website context -> session id -> session
    sessions: RwLock<HashMap<String, HashMap<String, Session>>>,
    history_window: usize,
    max_sessions_per_context: usize,
}

impl SessionStore {
    pub fn new(history_window: usize, max_sessions_per_context: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history_window: history_window.max(1),
            max_sessions_per_context: max_sessions_per_context.max(1),
        }
    }

    fn context_key(website_context: Option<&str>) -> String {
        match website_context {
            Some(ctx) if !ctx.is_empty() => ctx.to_string(),
            _ => DEFAULT_CONTEXT.to_string(),
        }
    }

    /// Get a session, creating it on first use
    pub async fn get_or_create(
        &self,
        session_id: &str,
        website_context: Option<&str>,
    ) -> Result<Session> {
        if session_id.is_empty() {
            return Err(Error::Validation("session id is empty".to_string()));
        }

        let context = Self::context_key(website_context);
        let mut sessions = self.sessions.write().await;
        let by_context = sessions.entry(context.clone()).or_default();

        if let Some(existing) = by_context.get(session_id) {
            return Ok(existing.clone());
        }

        let session = Session {
            id: session_id.to_string(),
            website_context: context,
            turns: Vec::new(),
            created_at: Utc::now(),
        };
        by_context.insert(session_id.to_string(), session.clone());
        Self::evict_oldest(by_context, self.max_sessions_per_context);

        Ok(session)
    }

    /// Append one query/answer exchange to a session, creating it if needed.
    /// Appending is the only mutation; prior turns are never rewritten.
    pub async fn append(
        &self,
        session_id: &str,
        website_context: Option<&str>,
        query: String,
        answer: String,
    ) -> Result<()> {
        if session_id.is_empty() {
            return Err(Error::Validation("session id is empty".to_string()));
        }

        let context = Self::context_key(website_context);
        let mut sessions = self.sessions.write().await;
        let by_context = sessions.entry(context.clone()).or_default();

        let session = by_context
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                id: session_id.to_string(),
                website_context: context.clone(),
                turns: Vec::new(),
                created_at: Utc::now(),
            });

        session.turns.push(Turn {
            query,
            answer,
            timestamp: Utc::now(),
        });

        Self::evict_oldest(by_context, self.max_sessions_per_context);
        Ok(())
    }

    /// Most recent turns of a session, bounded by the history window
    pub async fn recent_turns(
        &self,
        session_id: &str,
        website_context: Option<&str>,
    ) -> Vec<Turn> {
        let context = Self::context_key(website_context);
        let sessions = self.sessions.read().await;

        sessions
            .get(&context)
            .and_then(|by_context| by_context.get(session_id))
            .map(|session| {
                let skip = session.turns.len().saturating_sub(self.history_window);
                session.turns[skip..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Conversation history formatted for prompt injection
    pub async fn formatted_history(
        &self,
        session_id: &str,
        website_context: Option<&str>,
    ) -> String {
        let turns = self.recent_turns(session_id, website_context).await;
        format_history(&turns)
    }

    /// List sessions, optionally filtered to one website context
    pub async fn list(&self, website_context: Option<&str>) -> Vec<SessionSummary> {
        let sessions = self.sessions.read().await;

        let mut summaries: Vec<SessionSummary> = sessions
            .iter()
            .filter(|(context, _)| match website_context {
                Some(filter) => context.as_str() == filter,
                None => true,
            })
            .flat_map(|(_, by_context)| by_context.values())
            .map(|session| SessionSummary {
                id: session.id.clone(),
                website_context: session.website_context.clone(),
                turn_count: session.turns.len(),
                created_at: session.created_at,
            })
            .collect();

        summaries.sort_by(|a, b| {
            (&a.website_context, &a.id).cmp(&(&b.website_context, &b.id))
        });
        summaries
    }

    /// Fetch one session's transcript
    pub async fn get(
        &self,
        session_id: &str,
        website_context: Option<&str>,
    ) -> Result<Session> {
        let context = Self::context_key(website_context);
        let sessions = self.sessions.read().await;

        sessions
            .get(&context)
            .and_then(|by_context| by_context.get(session_id))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "session '{}' in context '{}'",
                    session_id, context
                ))
            })
    }

    /// Clear one session. Destructive, so it requires confirmation.
    pub async fn clear(
        &self,
        session_id: &str,
        website_context: Option<&str>,
        confirm: Confirmation,
    ) -> Result<()> {
        confirm.require(&format!("clearing session '{}'", session_id))?;

        let context = Self::context_key(website_context);
        let mut sessions = self.sessions.write().await;

        let removed = sessions
            .get_mut(&context)
            .and_then(|by_context| by_context.remove(session_id));

        match removed {
            Some(_) => Ok(()),
            None => Err(Error::NotFound(format!(
                "session '{}' in context '{}'",
                session_id, context
            ))),
        }
    }

    /// Clear every session, optionally only for one website context.
    /// Returns the number of sessions removed.
    pub async fn clear_all(
        &self,
        website_context: Option<&str>,
        confirm: Confirmation,
    ) -> Result<usize> {
        confirm.require("clearing all sessions")?;

        let mut sessions = self.sessions.write().await;

        match website_context {
            Some(context) => {
                let removed = sessions
                    .remove(context)
                    .map(|by_context| by_context.len())
                    .unwrap_or(0);
                Ok(removed)
            }
            None => {
                let removed = sessions.values().map(|c| c.len()).sum();
                sessions.clear();
                Ok(removed)
            }
        }
    }

    fn evict_oldest(by_context: &mut HashMap<String, Session>, cap: usize) {
        while by_context.len() > cap {
            let oldest = by_context
                .values()
                .min_by_key(|s| s.created_at)
                .map(|s| s.id.clone());
            match oldest {
                Some(id) => {
                    by_context.remove(&id);
                }
                None => break,
            }
        }
    }
}

/// Format turns for prompt injection
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return String::new();
    }

    let mut formatted = String::from("\n=== CONVERSATION HISTORY ===\n");
    for turn in turns {
        formatted.push_str(&format!("User: {}\n\n", turn.query));
        formatted.push_str(&format!("Assistant: {}\n\n", turn.answer));
    }
    formatted.push_str("=== END HISTORY ===\n");
    formatted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(3, 100)
    }

    #[tokio::test]
    async fn test_sessions_isolated_by_website_context() {
        let store = store();

        store
            .append("s1", Some("website_a"), "q".into(), "a".into())
            .await
            .unwrap();

        let other = store.get_or_create("s1", Some("website_b")).await.unwrap();
        assert_eq!(other.turns.len(), 0);

        let original = store.get("s1", Some("website_a")).await.unwrap();
        assert_eq!(original.turns.len(), 1);
    }

    #[tokio::test]
    async fn test_turns_are_ordered_and_append_only() {
        let store = store();

        for i in 0..5 {
            store
                .append("s1", None, format!("q{}", i), format!("a{}", i))
                .await
                .unwrap();
        }

        let session = store.get("s1", None).await.unwrap();
        assert_eq!(session.turns.len(), 5);
        for (i, turn) in session.turns.iter().enumerate() {
            assert_eq!(turn.query, format!("q{}", i));
        }
        for pair in session.turns.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn test_history_bounded_to_window() {
        let store = SessionStore::new(2, 100);

        for i in 0..6 {
            store
                .append("s1", None, format!("q{}", i), format!("a{}", i))
                .await
                .unwrap();
        }

        let recent = store.recent_turns("s1", None).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "q4");
        assert_eq!(recent[1].query, "q5");
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let store = store();
        store
            .append("s1", None, "q".into(), "a".into())
            .await
            .unwrap();

        let err = store
            .clear("s1", None, Confirmation::Unconfirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PreconditionFailed(_)));

        // Session is untouched after the rejected clear
        assert_eq!(store.get("s1", None).await.unwrap().turns.len(), 1);

        store
            .clear("s1", None, Confirmation::Confirmed)
            .await
            .unwrap();
        assert!(matches!(
            store.get("s1", None).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_clear_all_scoped_to_context() {
        let store = store();
        store
            .append("s1", Some("a"), "q".into(), "a".into())
            .await
            .unwrap();
        store
            .append("s2", Some("a"), "q".into(), "a".into())
            .await
            .unwrap();
        store
            .append("s3", Some("b"), "q".into(), "a".into())
            .await
            .unwrap();

        let removed = store
            .clear_all(Some("a"), Confirmation::Confirmed)
            .await
            .unwrap();
        assert_eq!(removed, 2);

        assert_eq!(store.list(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_oldest_sessions_evicted_over_cap() {
        let store = SessionStore::new(3, 2);

        store.get_or_create("s1", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.get_or_create("s2", None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.get_or_create("s3", None).await.unwrap();

        let sessions = store.list(None).await;
        assert_eq!(sessions.len(), 2);
        assert!(sessions.iter().all(|s| s.id != "s1"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_serialize() {
        let store = std::sync::Arc::new(SessionStore::new(100, 100));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append("s1", None, format!("q{}", i), format!("a{}", i))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get("s1", None).await.unwrap();
        assert_eq!(session.turns.len(), 20);
        for pair in session.turns.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }

    #[test]
    fn test_format_history() {
        let turns = vec![Turn {
            query: "What is dMRV?".to_string(),
            answer: "Digital monitoring.".to_string(),
            timestamp: Utc::now(),
        }];

        let formatted = format_history(&turns);
        assert!(formatted.contains("User: What is dMRV?"));
        assert!(formatted.contains("Assistant: Digital monitoring."));
        assert!(formatted.starts_with("\n=== CONVERSATION HISTORY ==="));

        assert!(format_history(&[]).is_empty());
    }
}
