// ============================================
// Session Store (會話與用戶狀態)
// ============================================
//
// In-memory state for live conversations:
// - conversation_id -> Session (message history + latest signals)
// - user_id -> UserProfile (interests, blocks, mood, interaction counts)
//
// Both maps hand out `Arc<RwLock<_>>` handles. Callers lock one handle at a
// time; the store itself never holds a map shard while locking a handle.

use crate::models::{Session, UserProfile};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

pub type SessionHandle = Arc<RwLock<Session>>;
pub type ProfileHandle = Arc<RwLock<UserProfile>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
    profiles: DashMap<String, ProfileHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or atomically create the session. Creating it also creates the
    /// owner's profile.
    ///
    /// An existing session keeps its original user id.
    pub fn get_or_create_session(&self, conversation_id: &str, user_id: &str) -> SessionHandle {
        // Shard guard from `get` must be gone before `entry` write-locks it
        let existing = self
            .sessions
            .get(conversation_id)
            .map(|entry| Arc::clone(entry.value()));

        if let Some(existing) = existing {
            return existing;
        }

        let handle = Arc::clone(
            self.sessions
                .entry(conversation_id.to_string())
                .or_insert_with(|| {
                    info!(
                        conversation_id = conversation_id,
                        user_id = user_id,
                        "Session created"
                    );
                    Arc::new(RwLock::new(Session::new(conversation_id, user_id)))
                })
                .value(),
        );

        // Owner of whichever session won the insert race
        let owner_id = handle.read().user_id.clone();
        self.get_or_create_profile(&owner_id);
        handle
    }

    pub fn get_session(&self, conversation_id: &str) -> Option<SessionHandle> {
        self.sessions
            .get(conversation_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_or_create_profile(&self, user_id: &str) -> ProfileHandle {
        if let Some(existing) = self.profiles.get(user_id) {
            return Arc::clone(existing.value());
        }

        Arc::clone(
            self.profiles
                .entry(user_id.to_string())
                .or_insert_with(|| {
                    debug!(user_id = user_id, "Profile created");
                    Arc::new(RwLock::new(UserProfile::new(user_id)))
                })
                .value(),
        )
    }

    pub fn get_profile(&self, user_id: &str) -> Option<ProfileHandle> {
        self.profiles
            .get(user_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Replace the stored profile with a fresh handle
    pub fn update_profile(&self, user_id: &str, profile: UserProfile) -> ProfileHandle {
        let handle = Arc::new(RwLock::new(profile));
        self.profiles
            .insert(user_id.to_string(), Arc::clone(&handle));
        handle
    }

    /// Returns true when a session was removed
    pub fn clear_session(&self, conversation_id: &str) -> bool {
        let removed = self.sessions.remove(conversation_id).is_some();
        if removed {
            info!(conversation_id = conversation_id, "Session cleared");
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn profile_count(&self) -> usize {
        self.profiles.len()
    }
}
