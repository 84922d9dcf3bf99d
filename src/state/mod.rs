pub mod machine;
pub mod session;

use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use rand::Rng;

use crate::{config::AppConfig, error::ServiceError, state::session::QuizSession};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Join codes are 6 decimal digits, matching what participants type in.
pub const SESSION_CODE_LENGTH: usize = 6;

/// Central application state: the session registry and runtime configuration.
///
/// Each session is an independent unit of mutable state keyed by its join
/// code, so nothing here locks across sessions.
pub struct AppState {
    sessions: DashMap<String, Arc<QuizSession>>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            sessions: DashMap::new(),
            config,
        })
    }

    /// Runtime configuration shared across the application.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Look up a session by join code.
    pub fn session(&self, code: &str) -> Option<Arc<QuizSession>> {
        self.sessions.get(code).map(|entry| entry.value().clone())
    }

    /// Look up a session by join code or fail with [`ServiceError::NotFound`].
    pub fn require_session(&self, code: &str) -> Result<Arc<QuizSession>, ServiceError> {
        self.session(code)
            .ok_or_else(|| ServiceError::NotFound(format!("session `{code}` not found")))
    }

    /// Register a new session under a freshly allocated join code.
    ///
    /// Codes are drawn at random and re-drawn on collision; the registry
    /// entry API makes allocation race-free against concurrent creates.
    pub fn register(&self, build: impl Fn(String) -> QuizSession) -> Arc<QuizSession> {
        loop {
            let code = generate_session_code();
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    let session = Arc::new(build(code));
                    slot.insert(session.clone());
                    return session;
                }
            }
        }
    }

    /// Number of sessions currently registered.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for at least `ttl`, returning how many were removed.
    pub async fn sweep_idle(&self, ttl: Duration) -> usize {
        let candidates: Vec<(String, Arc<QuizSession>)> = self
            .sessions
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        let mut removed = 0;
        for (code, session) in candidates {
            // A touch between the check and the removal loses a session that
            // was idle for a full TTL anyway; clients recover via NotFound.
            if session.idle_for().await >= ttl {
                self.sessions.remove(&code);
                removed += 1;
            }
        }
        removed
    }
}

/// Draw a random join code of [`SESSION_CODE_LENGTH`] decimal digits.
fn generate_session_code() -> String {
    let mut rng = rand::rng();
    rng.random_range(100_000..1_000_000u32).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..64 {
            let code = generate_session_code();
            assert_eq!(code.len(), SESSION_CODE_LENGTH);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn register_allocates_unique_codes() {
        let state = AppState::new(AppConfig::default());
        let first = state.register(|code| {
            QuizSession::new(code, "host".into(), Vec::new(), Duration::from_secs(30))
        });
        let second = state.register(|code| {
            QuizSession::new(code, "host".into(), Vec::new(), Duration::from_secs(30))
        });
        assert_ne!(first.code(), second.code());
        assert_eq!(state.session_count(), 2);
        assert!(state.require_session(first.code()).is_ok());
        assert!(state.require_session("000000").is_err());
    }
}
