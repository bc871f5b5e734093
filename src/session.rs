// 🎫 Session - who is logged in, per browser
//
// A Session is plain data handed to each operation. SessionStore keeps them
// in process memory keyed by an opaque token (the cookie value); nothing is
// persisted, so restarting the process logs everyone out.

use crate::accounts::UserId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub logged_in: bool,
    pub user_id: Option<UserId>,
}

impl Session {
    pub fn login(&mut self, user_id: UserId) {
        self.logged_in = true;
        self.user_id = Some(user_id);
    }

    pub fn logout(&mut self) {
        *self = Session::default();
    }

    /// The logged-in user, if any
    pub fn current_user(&self) -> Option<UserId> {
        if self.logged_in {
            self.user_id
        } else {
            None
        }
    }
}

/// Process-local session table
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an empty (logged out) session and return its token
    pub fn create(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.lock().insert(token.clone(), Session::default());
        token
    }

    /// Session for `token`; unknown tokens read as logged out
    pub fn get(&self, token: &str) -> Session {
        self.lock().get(token).copied().unwrap_or_default()
    }

    pub fn update(&self, token: &str, session: Session) {
        self.lock().insert(token.to_string(), session);
    }

    /// Forget a session entirely
    pub fn remove(&self, token: &str) -> Option<Session> {
        self.lock().remove(token)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        // A panic while holding the lock cannot leave a HashMap half-written
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
