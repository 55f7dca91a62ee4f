//! Per-chat session context: which reel a translate click refers to.
//! Overwritten by every delivered recipe; lost on restart.

use std::collections::HashMap;

use parking_lot::Mutex;

use super::ChatId;
use crate::recipe::{Locale, ReelLink};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub reel_link: ReelLink,
    /// Locale detected for the reel's original recipe.
    pub source_locale: Locale,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<ChatId, SessionContext>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, chat: ChatId) -> Option<SessionContext> {
        self.sessions.lock().get(&chat).cloned()
    }

    pub fn set(&self, chat: ChatId, context: SessionContext) {
        self.sessions.lock().insert(chat, context);
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
