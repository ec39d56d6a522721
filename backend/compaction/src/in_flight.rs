//! Per-session exclusion for compaction.
//!
//! A session id is marked in flight for as long as its guard lives. The guard
//! clears the mark on drop, including when the compaction future is cancelled.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct InFlightSessions {
    active: Mutex<HashSet<String>>,
}

impl InFlightSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `session_id` as compacting. Returns `None` if it already is.
    pub fn try_acquire(&self, session_id: &str) -> Option<InFlightGuard<'_>> {
        let inserted = self.lock().insert(session_id.to_string());
        inserted.then(|| InFlightGuard {
            sessions: self,
            session_id: session_id.to_string(),
        })
    }

    pub fn is_active(&self, session_id: &str) -> bool {
        self.lock().contains(session_id)
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug)]
pub struct InFlightGuard<'a> {
    sessions: &'a InFlightSessions,
    session_id: String,
}

impl InFlightGuard<'_> {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.sessions.lock().remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_refused_until_release() {
        let sessions = InFlightSessions::new();
        let guard = sessions.try_acquire("s1").expect("first acquire");
        assert_eq!(guard.session_id(), "s1");
        assert!(sessions.try_acquire("s1").is_none());
        assert!(sessions.is_active("s1"));

        drop(guard);
        assert!(!sessions.is_active("s1"));
        assert!(sessions.try_acquire("s1").is_some());
    }

    #[test]
    fn test_sessions_are_independent() {
        let sessions = InFlightSessions::new();
        let _a = sessions.try_acquire("a").unwrap();
        assert!(sessions.try_acquire("b").is_some());
    }
}
