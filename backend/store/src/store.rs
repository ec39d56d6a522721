use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use scribe_core::{Message, Role, ScribeError, ScribeResult};

/// Reject client appends that carry a non-qualifying role or no content.
pub fn validate_append(role: Role, content: &str) -> ScribeResult<()> {
    if !role.is_qualifying() {
        return Err(ScribeError::Validation(format!(
            "role '{role}' cannot be appended by clients"
        )));
    }
    if content.trim().is_empty() {
        return Err(ScribeError::Validation("content must not be empty".into()));
    }
    Ok(())
}

/// A row cleared for insertion. Only this crate can build one, through
/// [`MessageStore::append`] or [`MessageStore::append_summary`], so a store
/// never sees a `summary` row that did not come from the compaction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewMessage<'a> {
    session_id: &'a str,
    role: Role,
    content: &'a str,
}

impl<'a> NewMessage<'a> {
    pub(crate) fn client(session_id: &'a str, role: Role, content: &'a str) -> ScribeResult<Self> {
        validate_append(role, content)?;
        Ok(Self { session_id, role, content })
    }

    pub(crate) fn summary(session_id: &'a str, content: &'a str) -> Self {
        Self {
            session_id,
            role: Role::Summary,
            content,
        }
    }

    pub fn session_id(&self) -> &'a str {
        self.session_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &'a str {
        self.content
    }
}

/// Durable append-only message log grouped by session.
///
/// Every operation is a single independent statement scoped to one session,
/// so callers may interleave them freely.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Write one row with a freshly generated id.
    async fn insert(&self, row: NewMessage<'_>) -> ScribeResult<i64>;

    /// Qualifying messages of a session, ascending by id. Unknown sessions yield
    /// an empty list.
    async fn list_conversation(&self, session_id: &str) -> ScribeResult<Vec<Message>>;

    /// Up to `limit` most recent qualifying messages, in ascending id order.
    async fn recent_window(&self, session_id: &str, limit: usize) -> ScribeResult<Vec<Message>>;

    /// Delete every message of any role with `id >= from_id`. Returns rows removed.
    async fn truncate_from(&self, session_id: &str, from_id: i64) -> ScribeResult<u64>;

    /// Delete every qualifying message with `id <= up_to_id`. Summary rows are
    /// never touched. Returns rows removed.
    async fn prune_up_to(&self, session_id: &str, up_to_id: i64) -> ScribeResult<u64>;

    /// Every row of a session regardless of role, ascending by id.
    async fn list_all(&self, session_id: &str) -> ScribeResult<Vec<Message>>;

    /// Newest summary anchor of a session, if any.
    async fn latest_summary(&self, session_id: &str) -> ScribeResult<Option<Message>>;

    /// Client append path: only `user` and `assistant` are accepted.
    async fn append(&self, session_id: &str, role: Role, content: &str) -> ScribeResult<i64> {
        self.insert(NewMessage::client(session_id, role, content)?).await
    }

    /// Compaction-only append of a summary anchor.
    async fn append_summary(&self, session_id: &str, content: &str) -> ScribeResult<i64> {
        self.insert(NewMessage::summary(session_id, content)).await
    }
}

#[derive(Default)]
struct Rows {
    last_id: i64,
    by_id: BTreeMap<i64, Message>,
}

/// Process-local message store for tests and ephemeral runs.
///
/// Ids come from one counter shared by all sessions and are never reused,
/// matching the SQLite store's AUTOINCREMENT behaviour.
#[derive(Default)]
pub struct InMemoryMessageStore {
    rows: Mutex<Rows>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut Rows) -> T) -> T {
        let mut rows = self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rows)
    }

    fn select(&self, session_id: &str, keep: impl Fn(&Message) -> bool) -> Vec<Message> {
        self.with_rows(|rows| {
            rows.by_id
                .values()
                .filter(|m| m.session_id == session_id && keep(m))
                .cloned()
                .collect()
        })
    }

    fn remove(&self, session_id: &str, doomed: impl Fn(&Message) -> bool) -> u64 {
        self.with_rows(|rows| {
            let before = rows.by_id.len();
            rows.by_id.retain(|_, m| !(m.session_id == session_id && doomed(m)));
            (before - rows.by_id.len()) as u64
        })
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, row: NewMessage<'_>) -> ScribeResult<i64> {
        let id = self.with_rows(|rows| {
            rows.last_id += 1;
            let id = rows.last_id;
            rows.by_id.insert(
                id,
                Message {
                    id,
                    session_id: row.session_id().to_string(),
                    role: row.role(),
                    content: row.content().to_string(),
                    created_at: Utc::now(),
                },
            );
            id
        });
        Ok(id)
    }

    async fn list_conversation(&self, session_id: &str) -> ScribeResult<Vec<Message>> {
        Ok(self.select(session_id, |m| m.role.is_qualifying()))
    }

    async fn recent_window(&self, session_id: &str, limit: usize) -> ScribeResult<Vec<Message>> {
        let mut qualifying = self.select(session_id, |m| m.role.is_qualifying());
        let skip = qualifying.len().saturating_sub(limit);
        Ok(qualifying.split_off(skip))
    }

    async fn truncate_from(&self, session_id: &str, from_id: i64) -> ScribeResult<u64> {
        Ok(self.remove(session_id, |m| m.id >= from_id))
    }

    async fn prune_up_to(&self, session_id: &str, up_to_id: i64) -> ScribeResult<u64> {
        Ok(self.remove(session_id, |m| m.id <= up_to_id && m.role.is_qualifying()))
    }

    async fn list_all(&self, session_id: &str) -> ScribeResult<Vec<Message>> {
        Ok(self.select(session_id, |_| true))
    }

    async fn latest_summary(&self, session_id: &str) -> ScribeResult<Option<Message>> {
        Ok(self.select(session_id, |m| m.role == Role::Summary).pop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_rejects_summary_and_blank_content() {
        let store = InMemoryMessageStore::new();
        let err = store.append("s", Role::Summary, "sneaky").await.unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
        let err = store.append("s", Role::User, "   ").await.unwrap_err();
        assert!(matches!(err, ScribeError::Validation(_)));
        assert!(store.list_all("s").await.unwrap().is_empty());
    }

    #[test]
    fn test_new_message_constructors() {
        let row = NewMessage::client("s", Role::Assistant, "fine").unwrap();
        assert_eq!((row.session_id(), row.role(), row.content()), ("s", Role::Assistant, "fine"));
        assert!(NewMessage::client("s", Role::Summary, "forged").is_err());
        assert!(NewMessage::client("s", Role::User, "").is_err());
        assert_eq!(NewMessage::summary("s", "anchor").role(), Role::Summary);
    }

    #[tokio::test]
    async fn test_summary_rows_only_via_append_summary() {
        let store = InMemoryMessageStore::new();
        store.append("s", Role::User, "hi").await.unwrap();
        assert!(store.append("s", Role::Summary, "forged").await.is_err());
        let anchor = store.append_summary("s", "so far: hi").await.unwrap();

        let summaries: Vec<i64> = store
            .list_all("s")
            .await
            .unwrap()
            .iter()
            .filter(|m| m.role == Role::Summary)
            .map(|m| m.id)
            .collect();
        assert_eq!(summaries, vec![anchor]);
    }

    #[tokio::test]
    async fn test_ids_increase_across_sessions() {
        let store = InMemoryMessageStore::new();
        let a = store.append("a", Role::User, "one").await.unwrap();
        let b = store.append("b", Role::User, "two").await.unwrap();
        let c = store.append("a", Role::Assistant, "three").await.unwrap();
        assert!(a < b && b < c);

        let ids: Vec<i64> = store.list_conversation("a").await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, c]);
    }

    #[tokio::test]
    async fn test_recent_window_is_chronological() {
        let store = InMemoryMessageStore::new();
        for i in 0..5 {
            store.append("s", Role::User, &format!("m{i}")).await.unwrap();
        }
        store.append_summary("s", "summary").await.unwrap();

        let window = store.recent_window("s", 3).await.unwrap();
        let contents: Vec<&str> = window.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[tokio::test]
    async fn test_prune_keeps_summaries_and_newer_rows() {
        let store = InMemoryMessageStore::new();
        let first = store.append("s", Role::User, "a").await.unwrap();
        let summary = store.append_summary("s", "sum").await.unwrap();
        let boundary = store.append("s", Role::Assistant, "b").await.unwrap();
        let later = store.append("s", Role::User, "c").await.unwrap();

        assert_eq!(store.prune_up_to("s", boundary).await.unwrap(), 2);
        let ids: Vec<i64> = store.list_all("s").await.unwrap().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![summary, later]);
        assert!(first < summary);
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_truncate() {
        let store = InMemoryMessageStore::new();
        store.append("s", Role::User, "a").await.unwrap();
        let b = store.append("s", Role::User, "b").await.unwrap();
        store.truncate_from("s", b).await.unwrap();
        let c = store.append("s", Role::User, "c").await.unwrap();
        assert!(c > b);
    }
}
