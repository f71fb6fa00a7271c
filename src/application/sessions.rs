//! Admin sessions backed by opaque bearer tokens.
//!
//! A session is active until its expiry instant passes. Expired sessions are
//! removed by [`SessionManager::validate`] when it runs into one, and in bulk
//! by [`SessionManager::sweep`].

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use metrics::{counter, gauge};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{rw_read, rw_write};
use crate::infra::sweeper::Sweep;

pub const METRIC_SESSIONS_ACTIVE: &str = "folio_sessions_active";
pub const METRIC_LOGIN_FAILED: &str = "folio_login_failed_total";

/// Random bytes behind each token.
pub const TOKEN_BYTES: usize = 32;

const SOURCE: &str = "application::sessions";
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub created_at: OffsetDateTime,
    pub expires_at: Instant,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Issues, checks and revokes admin sessions for one configured account.
pub struct SessionManager {
    username_digest: Vec<u8>,
    password_digest: Vec<u8>,
    duration: Duration,
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionManager {
    /// Only digests of the credential pair are kept.
    pub fn new(username: &str, password: &str, duration: Duration) -> Self {
        Self {
            username_digest: digest(username),
            password_digest: digest(password),
            duration,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a session when both fields match exactly.
    ///
    /// Both comparisons always run, and the error does not say which field
    /// was wrong.
    pub fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username_ok = digest(username).ct_eq(&self.username_digest);
        let password_ok = digest(password).ct_eq(&self.password_digest);
        if !bool::from(username_ok & password_ok) {
            counter!(METRIC_LOGIN_FAILED).increment(1);
            warn!("admin login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = generate_token();
        let now = Instant::now();
        let expires_at = now
            .checked_add(self.duration)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let session = Session {
            token: token.clone(),
            username: username.to_string(),
            created_at: OffsetDateTime::now_utc(),
            expires_at,
        };

        let active = {
            let mut guard = rw_write(&self.sessions, SOURCE, "login");
            guard.insert(token.clone(), session);
            guard.len()
        };
        gauge!(METRIC_SESSIONS_ACTIVE).set(active as f64);
        info!(username, "admin session started");
        Ok(token)
    }

    /// True iff `token` names a session that has not expired.
    pub fn validate(&self, token: &str) -> bool {
        let now = Instant::now();
        {
            let guard = rw_read(&self.sessions, SOURCE, "validate");
            match guard.get(token) {
                None => return false,
                Some(session) if !session.is_expired(now) => return true,
                Some(_) => {}
            }
        }

        let active = {
            let mut guard = rw_write(&self.sessions, SOURCE, "validate.evict");
            if guard
                .get(token)
                .is_some_and(|session| session.is_expired(now))
            {
                guard.remove(token);
                Some(guard.len())
            } else {
                None
            }
        };
        if let Some(active) = active {
            gauge!(METRIC_SESSIONS_ACTIVE).set(active as f64);
            debug!("expired session evicted on validation");
        }
        false
    }

    /// Snapshot of an active session.
    pub fn session(&self, token: &str) -> Option<Session> {
        let now = Instant::now();
        rw_read(&self.sessions, SOURCE, "session")
            .get(token)
            .filter(|session| !session.is_expired(now))
            .cloned()
    }

    pub fn logout(&self, token: &str) {
        let (removed, active) = {
            let mut guard = rw_write(&self.sessions, SOURCE, "logout");
            let removed = guard.remove(token).is_some();
            (removed, guard.len())
        };
        if removed {
            gauge!(METRIC_SESSIONS_ACTIVE).set(active as f64);
            info!("admin session ended");
        }
    }

    /// Remove every expired session and return how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let (removed, active) = {
            let mut guard = rw_write(&self.sessions, SOURCE, "sweep");
            let before = guard.len();
            guard.retain(|_, session| !session.is_expired(now));
            (before - guard.len(), guard.len())
        };

        gauge!(METRIC_SESSIONS_ACTIVE).set(active as f64);
        if removed > 0 {
            debug!(removed, "swept expired sessions");
        }
        removed
    }

    /// Stored sessions, including expired ones not yet swept.
    pub fn active_sessions(&self) -> usize {
        rw_read(&self.sessions, SOURCE, "active_sessions").len()
    }
}

impl Sweep for SessionManager {
    fn sweep(&self) -> usize {
        SessionManager::sweep(self)
    }
}

fn digest(value: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().to_vec()
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use metrics_util::debugging::{DebugValue, DebuggingRecorder};

    use super::*;

    const HOUR: Duration = Duration::from_secs(3600);

    fn manager() -> SessionManager {
        SessionManager::new("admin", "s3cret", HOUR)
    }

    #[tokio::test(start_paused = true)]
    async fn login_issues_a_valid_token() {
        let sessions = manager();
        let token = sessions.login("admin", "s3cret").expect("login");

        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        );
        assert!(sessions.validate(&token));
        let snapshot = sessions.session(&token).expect("active session");
        assert_eq!(snapshot.username, "admin");
    }

    #[test]
    fn wrong_credentials_are_rejected() {
        let sessions = manager();

        assert_eq!(
            sessions.login("admin", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            sessions.login("Admin", "s3cret"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(sessions.login("", ""), Err(AuthError::InvalidCredentials));
        assert_eq!(sessions.active_sessions(), 0);
    }

    #[test]
    fn tokens_are_unique() {
        let sessions = manager();
        let tokens: HashSet<String> = (0..64)
            .map(|_| sessions.login("admin", "s3cret").expect("login"))
            .collect();

        assert_eq!(tokens.len(), 64);
        assert_eq!(sessions.active_sessions(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn validate_removes_expired_session() {
        let sessions = manager();
        let token = sessions.login("admin", "s3cret").expect("login");

        tokio::time::advance(HOUR - Duration::from_secs(1)).await;
        assert!(sessions.validate(&token));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(sessions.active_sessions(), 1);
        assert!(!sessions.validate(&token));
        assert_eq!(sessions.active_sessions(), 0);
        assert!(sessions.session(&token).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn lazy_eviction_updates_active_gauge() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let sessions = manager();

        let token = metrics::with_local_recorder(&recorder, || sessions.login("admin", "s3cret"))
            .expect("login");
        tokio::time::advance(HOUR).await;
        let valid = metrics::with_local_recorder(&recorder, || sessions.validate(&token));
        assert!(!valid);

        let active = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .find_map(|(key, _, _, value)| {
                (key.key().name() == METRIC_SESSIONS_ACTIVE).then_some(value)
            });
        assert!(matches!(active, Some(DebugValue::Gauge(value)) if value.into_inner() == 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_drops_only_expired_sessions() {
        let sessions = manager();
        let old = sessions.login("admin", "s3cret").expect("login");
        tokio::time::advance(Duration::from_secs(1800)).await;
        let fresh = sessions.login("admin", "s3cret").expect("login");
        tokio::time::advance(Duration::from_secs(1800)).await;

        assert_eq!(sessions.sweep(), 1);
        assert!(!sessions.validate(&old));
        assert!(sessions.validate(&fresh));
    }

    #[test]
    fn logout_is_idempotent() {
        let sessions = manager();
        let token = sessions.login("admin", "s3cret").expect("login");

        sessions.logout(&token);
        sessions.logout(&token);
        sessions.logout("never-issued");

        assert!(!sessions.validate(&token));
        assert_eq!(sessions.active_sessions(), 0);
    }
}
