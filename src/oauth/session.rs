//! Per-browser session storage for OAuth state and tokens.

use axum::http::{HeaderMap, header};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default name of the cookie carrying the session id.
pub const DEFAULT_SESSION_COOKIE: &str = "zoneadmin_session";

/// Sessions older than this are dropped, pending logins and tokens alike.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Key/value slots scoped to one session id.
pub trait SessionStore: Send + Sync {
    fn get(&self, session_id: &str, key: &str) -> Option<Value>;
    fn insert(&self, session_id: &str, key: &str, value: Value);
    fn remove(&self, session_id: &str, key: &str) -> Option<Value>;
    /// Whether the store issued and still holds this id.
    fn contains(&self, session_id: &str) -> bool;
    /// Move every slot of `session_id` under a fresh id and return it.
    fn rotate(&self, session_id: &str) -> String;
}

#[derive(Debug)]
struct Session {
    created_at: Instant,
    slots: HashMap<String, Value>,
}

impl Session {
    fn new() -> Self {
        Self {
            created_at: Instant::now(),
            slots: HashMap::new(),
        }
    }
}

/// Process-local session store. Sessions expire `ttl` after creation.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of sessions held, expired ones included until the next purge.
    pub fn session_count(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let Ok(mut sessions) = self.sessions.write() else {
            return 0;
        };
        let before = sessions.len();
        let ttl = self.ttl;
        sessions.retain(|_, s| s.created_at.elapsed() < ttl);
        let purged = before - sessions.len();
        if purged > 0 {
            debug!(purged, "Expired sessions dropped");
        }
        purged
    }

    fn is_live(&self, session: &Session) -> bool {
        session.created_at.elapsed() < self.ttl
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, session_id: &str, key: &str) -> Option<Value> {
        let sessions = self.sessions.read().ok()?;
        let session = sessions.get(session_id).filter(|s| self.is_live(s))?;
        session.slots.get(key).cloned()
    }

    fn insert(&self, session_id: &str, key: &str, value: Value) {
        self.purge_expired();
        // A poisoned lock only loses session slots; the caller sees a fresh login.
        if let Ok(mut sessions) = self.sessions.write() {
            sessions
                .entry(session_id.to_string())
                .or_insert_with(Session::new)
                .slots
                .insert(key.to_string(), value);
        }
    }

    fn remove(&self, session_id: &str, key: &str) -> Option<Value> {
        let mut sessions = self.sessions.write().ok()?;
        let session = sessions.get_mut(session_id)?;
        let live = session.created_at.elapsed() < self.ttl;
        let removed = session.slots.remove(key);
        if !live || session.slots.is_empty() {
            sessions.remove(session_id);
        }
        removed.filter(|_| live)
    }

    fn contains(&self, session_id: &str) -> bool {
        self.sessions
            .read()
            .map(|s| s.get(session_id).is_some_and(|s| self.is_live(s)))
            .unwrap_or(false)
    }

    fn rotate(&self, session_id: &str) -> String {
        let fresh = new_session_id();
        if let Ok(mut sessions) = self.sessions.write() {
            let mut session = Session::new();
            if let Some(old) = sessions.remove(session_id) {
                session.slots = old.slots;
            }
            sessions.insert(fresh.clone(), session);
        }
        fresh
    }
}

/// New random session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Session id carried by the named cookie, if any.
pub fn session_id_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value for a session id.
pub fn session_cookie(cookie_name: &str, session_id: &str, secure: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", cookie_name, session_id);
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
