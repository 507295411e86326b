use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDate, NaiveDateTime};

pub const SESSION_TTL_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    SelectingDate,
    SelectingTime,
    EnteringName,
    EnteringPhone,
}

/// In-flight booking dialog for one requester. Lives only in memory; a
/// restart drops it.
#[derive(Debug, Clone)]
pub struct Session {
    pub state: SessionState,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    touched: NaiveDateTime,
}

impl Session {
    fn new(now: NaiveDateTime) -> Self {
        Self {
            state: SessionState::SelectingDate,
            selected_date: None,
            selected_time: None,
            name: None,
            phone: None,
            touched: now,
        }
    }

    fn expired(&self, now: NaiveDateTime) -> bool {
        now - self.touched > Duration::minutes(SESSION_TTL_MINUTES)
    }
}

/// Dialog sessions keyed by requester id. Created explicitly when a dialog
/// starts, removed on completion or cancel; idle entries are pruned lazily.
#[derive(Default)]
pub struct SessionStore {
    inner: Mutex<HashMap<i64, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, requester_id: i64, now: NaiveDateTime) {
        self.inner
            .lock()
            .unwrap()
            .insert(requester_id, Session::new(now));
    }

    pub fn get(&self, requester_id: i64, now: NaiveDateTime) -> Option<Session> {
        let mut map = self.inner.lock().unwrap();
        match map.get(&requester_id) {
            Some(session) if session.expired(now) => {
                map.remove(&requester_id);
                None
            }
            Some(session) => Some(session.clone()),
            None => None,
        }
    }

    pub fn put(&self, requester_id: i64, mut session: Session, now: NaiveDateTime) {
        session.touched = now;
        self.inner.lock().unwrap().insert(requester_id, session);
    }

    pub fn end(&self, requester_id: i64) -> bool {
        self.inner.lock().unwrap().remove(&requester_id).is_some()
    }
}
