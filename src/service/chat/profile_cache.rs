//! In-memory cache of user profiles with a fixed freshness window.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Duration, Utc};

use crate::base::types::UserProfile;

/// How long a fetched profile stays fresh.
pub const PROFILE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct ProfileCacheEntry {
    profile: UserProfile,
    fetched_at: DateTime<Utc>,
}

/// Profile cache shared by every clone.
///
/// Entries are never evicted. A stale entry is skipped on read and overwritten
/// by the next `put` for the same user. Concurrent writers race harmlessly.
#[derive(Debug, Clone, Default)]
pub struct ProfileCache {
    entries: Arc<RwLock<HashMap<String, ProfileCacheEntry>>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached profile if it was stored less than [`PROFILE_TTL_SECS`] before `now`.
    pub fn get(&self, user_id: &str, now: DateTime<Utc>) -> Option<UserProfile> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(user_id)?;

        if now.signed_duration_since(entry.fetched_at) < Duration::seconds(PROFILE_TTL_SECS) {
            Some(entry.profile.clone())
        } else {
            None
        }
    }

    pub fn put(&self, user_id: &str, profile: UserProfile, now: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(user_id.to_string(), ProfileCacheEntry { profile, fetched_at: now });
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Tests.
