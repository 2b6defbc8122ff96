//! Per-browser-session state
//!
//! Each browser session owns a bounded, insertion-ordered code→URL map, a
//! CSRF token and a rolling creation-rate window. Sessions are identified by
//! an opaque cookie value and registered in a [`SessionManager`]; no state is
//! shared between sessions.

use actix_web::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use subtle::ConstantTimeEq;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{Result, ShortstashError};
use crate::utils::generate_csrf_token;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shortstash_session";

/// Hard cap on links held by one session.
pub const MAX_URLS_PER_SESSION: usize = 100;

/// Survivors of a batch eviction (most recent half).
const EVICT_KEEP: usize = MAX_URLS_PER_SESSION / 2;

/// Creations allowed per rolling window.
pub const CREATION_LIMIT_PER_WINDOW: u32 = 10;

/// Rolling rate-limit window, anchored at the first creation inside it.
pub const CREATION_WINDOW_SECS: i64 = 60;

/// Age after which a session is rotated (fresh ID, fresh CSRF token).
pub const SESSION_MAX_AGE_SECS: i64 = 1800;

/// State owned by a single browser session.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// code → url, insertion order. Linear scans are fine at ≤ 100 entries.
    urls: Vec<(String, String)>,
    creation_count: u32,
    window_start: DateTime<Utc>,
    csrf_token: String,
    created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        SessionState {
            urls: Vec::new(),
            creation_count: 0,
            window_start: now,
            csrf_token: generate_csrf_token(),
            created_at: now,
        }
    }

    pub fn csrf_token(&self) -> &str {
        &self.csrf_token
    }

    /// 常量时间比较，防止时序攻击
    pub fn csrf_matches(&self, token: &str) -> bool {
        self.csrf_token.as_bytes().ct_eq(token.as_bytes()).into()
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.urls
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, url)| url.as_str())
    }

    /// Reverse lookup for same-URL deduplication within the session.
    pub fn code_for_url(&self, url: &str) -> Option<&str> {
        self.urls
            .iter()
            .find(|(_, u)| u == url)
            .map(|(c, _)| c.as_str())
    }

    pub fn contains_code(&self, code: &str) -> bool {
        self.urls.iter().any(|(c, _)| c == code)
    }

    /// Insert a mapping, evicting the oldest half when the cap is reached.
    ///
    /// Returns the number of entries after insertion.
    pub fn insert(&mut self, code: String, url: String) -> usize {
        if self.urls.len() >= MAX_URLS_PER_SESSION {
            let cut = self.urls.len() - EVICT_KEEP;
            debug!("session map full, evicting {} oldest entries", cut);
            self.urls.drain(..cut);
        }
        self.urls.push((code, url));
        self.urls.len()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn clear(&mut self) {
        self.urls.clear();
        self.creation_count = 0;
    }

    /// Roll the rate window if it has lapsed, then reject once the creation
    /// counter has reached the per-window limit.
    pub fn check_rate_limit(&mut self, now: DateTime<Utc>) -> Result<()> {
        if (now - self.window_start).num_seconds() > CREATION_WINDOW_SECS {
            self.creation_count = 0;
            self.window_start = now;
        }
        if self.creation_count >= CREATION_LIMIT_PER_WINDOW {
            return Err(ShortstashError::rate_limited(
                "Rate limit exceeded. Please wait a minute.",
            ));
        }
        Ok(())
    }

    pub fn note_creation(&mut self) {
        self.creation_count += 1;
    }

    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() > SESSION_MAX_AGE_SECS
    }
}

/// A resolved session identity for the current request.
#[derive(Debug, Clone)]
pub struct SessionTicket {
    pub id: String,
    pub csrf_token: String,
    /// A new session was created (or a stale one rotated); the handler must
    /// attach a fresh session cookie to its response.
    pub fresh: bool,
}

/// Registry of live sessions, keyed by the opaque cookie value.
///
/// Every method takes and releases the per-entry lock synchronously, so no
/// guard is ever held across an await point.
pub struct SessionManager {
    sessions: DashMap<String, SessionState>,
}

impl SessionManager {
    pub fn new() -> Self {
        SessionManager {
            sessions: DashMap::new(),
        }
    }

    /// Resolve the session for a request, creating or rotating as needed.
    pub fn touch(&self, cookie_id: Option<&str>) -> SessionTicket {
        self.touch_at(cookie_id, Utc::now())
    }

    pub fn touch_at(&self, cookie_id: Option<&str>, now: DateTime<Utc>) -> SessionTicket {
        if let Some(id) = cookie_id {
            if let Some(state) = self.sessions.get(id)
                && !state.is_stale(now)
            {
                return SessionTicket {
                    id: id.to_string(),
                    csrf_token: state.csrf_token.clone(),
                    fresh: false,
                };
            }
            // unknown or stale cookie: drop any old entry, mint a new session
            if self.sessions.remove(id).is_some() {
                debug!("rotated stale session");
            }
        }

        let id = Uuid::new_v4().simple().to_string();
        let state = SessionState::new(now);
        let csrf_token = state.csrf_token.clone();
        self.sessions.insert(id.clone(), state);
        SessionTicket {
            id,
            csrf_token,
            fresh: true,
        }
    }

    pub fn validate_csrf(&self, id: &str, token: &str) -> bool {
        self.sessions
            .get(id)
            .map(|s| s.csrf_matches(token))
            .unwrap_or(false)
    }

    pub fn lookup_url(&self, id: &str, code: &str) -> Option<String> {
        self.sessions
            .get(id)
            .and_then(|s| s.get(code).map(String::from))
    }

    pub fn code_for_url(&self, id: &str, url: &str) -> Option<String> {
        self.sessions
            .get(id)
            .and_then(|s| s.code_for_url(url).map(String::from))
    }

    pub fn contains_code(&self, id: &str, code: &str) -> bool {
        self.sessions
            .get(id)
            .map(|s| s.contains_code(code))
            .unwrap_or(false)
    }

    pub fn check_rate_limit(&self, id: &str) -> Result<()> {
        match self.sessions.get_mut(id) {
            Some(mut s) => s.check_rate_limit(Utc::now()),
            None => Ok(()),
        }
    }

    pub fn note_creation(&self, id: &str) {
        if let Some(mut s) = self.sessions.get_mut(id) {
            s.note_creation();
        }
    }

    /// Store a mapping in the session, evicting per the capacity policy.
    ///
    /// Returns the session's entry count after insertion.
    pub fn store_link(&self, id: &str, code: String, url: String) -> usize {
        match self.sessions.get_mut(id) {
            Some(mut s) => s.insert(code, url),
            None => 0,
        }
    }

    pub fn total(&self, id: &str) -> usize {
        self.sessions.get(id).map(|s| s.len()).unwrap_or(0)
    }

    pub fn clear(&self, id: &str) {
        if let Some(mut s) = self.sessions.get_mut(id) {
            s.clear();
        }
    }

    /// Drop sessions past their maximum age. Invoked opportunistically
    /// alongside the durable-store sweep.
    pub fn prune_stale(&self) -> usize {
        self.prune_stale_at(Utc::now())
    }

    pub fn prune_stale_at(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_stale(now));
        before - self.sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the session cookie attached to responses that minted a session.
pub fn session_cookie(id: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, id.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .finish()
}
