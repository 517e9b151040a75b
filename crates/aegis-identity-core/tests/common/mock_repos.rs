//! Mock repositories for testing
//!
//! In-memory implementations honoring the same atomicity contracts as the
//! Postgres layer: unique keys on insert, compare-and-swap on version.

use aegis_db::{
    CreateSession, CreateUser, DbError, DbResult, DeletedFilter, SessionRepository, SessionRow,
    UserRepository, UserRow,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory identity repository for testing
#[derive(Default, Clone)]
pub struct MockUserRepository {
    users: Arc<DashMap<Uuid, UserRow>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a stored row directly, bypassing visibility filters
    pub fn get_raw(&self, id: Uuid) -> Option<UserRow> {
        self.users.get(&id).map(|r| r.value().clone())
    }
}

fn visible(row: &UserRow, filter: DeletedFilter) -> bool {
    matches!(filter, DeletedFilter::IncludeDeleted) || !row.deleted
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: Uuid, filter: DeletedFilter) -> DbResult<Option<UserRow>> {
        Ok(self
            .users
            .get(&id)
            .filter(|r| visible(r.value(), filter))
            .map(|r| r.value().clone()))
    }

    async fn find_by_email(
        &self,
        email: &str,
        filter: DeletedFilter,
    ) -> DbResult<Option<UserRow>> {
        Ok(self
            .by_email
            .get(email)
            .and_then(|id| self.users.get(id.value()).map(|r| r.value().clone()))
            .filter(|r| visible(r, filter)))
    }

    async fn exists_by_phone(&self, phone: &str, exclude: Option<Uuid>) -> DbResult<bool> {
        Ok(self.users.iter().any(|r| {
            r.value().phone.as_deref() == Some(phone) && Some(r.value().id) != exclude
        }))
    }

    async fn create(&self, user: CreateUser) -> DbResult<UserRow> {
        if let Some(ref phone) = user.phone {
            if self.exists_by_phone(phone, None).await? {
                return Err(DbError::Duplicate);
            }
        }

        // The email index entry is the unique key: the first racer claims
        // the slot, the second sees it occupied.
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DbError::Duplicate),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let row = UserRow {
                    id: user.id,
                    email: user.email.clone(),
                    phone: user.phone,
                    password_hash: user.password_hash,
                    first_name: user.first_name,
                    last_name: user.last_name,
                    display_name: user.display_name,
                    date_of_birth: user.date_of_birth,
                    role: user.role,
                    status: user.status,
                    version: 1,
                    password_history: vec![],
                    deleted: false,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(user.id);
                self.users.insert(user.id, row.clone());
                Ok(row)
            }
        }
    }

    async fn replace_if_version(
        &self,
        id: Uuid,
        expected_version: i64,
        row: &UserRow,
    ) -> DbResult<bool> {
        let Some(mut stored) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        if stored.version != expected_version {
            return Ok(false);
        }

        stored.first_name = row.first_name.clone();
        stored.last_name = row.last_name.clone();
        stored.display_name = row.display_name.clone();
        stored.date_of_birth = row.date_of_birth;
        stored.phone = row.phone.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_credentials(
        &self,
        id: Uuid,
        password_hash: &str,
        history: &[String],
    ) -> DbResult<bool> {
        let Some(mut stored) = self.users.get_mut(&id) else {
            return Ok(false);
        };
        if stored.deleted {
            return Ok(false);
        }

        stored.password_hash = password_hash.to_string();
        stored.password_history = history.to_vec();
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_status(&self, id: Uuid, status: &str) -> DbResult<bool> {
        let Some(mut stored) = self.users.get_mut(&id) else {
            return Ok(false);
        };

        stored.status = status.to_string();
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(true)
    }

    async fn set_deleted(&self, id: Uuid) -> DbResult<bool> {
        let Some(mut stored) = self.users.get_mut(&id) else {
            return Ok(false);
        };

        stored.deleted = true;
        stored.version += 1;
        stored.updated_at = Utc::now();
        Ok(true)
    }
}

/// In-memory session repository for testing
#[derive(Default, Clone)]
pub struct MockSessionRepository {
    sessions: Arc<DashMap<Uuid, SessionRow>>,
    by_token_hash: Arc<DashMap<String, Uuid>>,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[async_trait]
impl SessionRepository for MockSessionRepository {
    async fn find_by_token_hash(&self, token_hash: &str) -> DbResult<Option<SessionRow>> {
        // Revoked and expired rows are returned too, matching the SQL layer
        Ok(self
            .by_token_hash
            .get(token_hash)
            .and_then(|id| self.sessions.get(id.value()).map(|r| r.value().clone())))
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> DbResult<Vec<SessionRow>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn create(&self, session: CreateSession) -> DbResult<SessionRow> {
        match self.by_token_hash.entry(session.token_hash.clone()) {
            Entry::Occupied(_) => Err(DbError::Duplicate),
            Entry::Vacant(slot) => {
                let row = SessionRow {
                    id: session.id,
                    user_id: session.user_id,
                    token_hash: session.token_hash,
                    ip_address: session.ip_address,
                    user_agent: session.user_agent,
                    created_at: Utc::now(),
                    expires_at: session.expires_at,
                    revoked: false,
                    revoked_at: None,
                };
                slot.insert(session.id);
                self.sessions.insert(session.id, row.clone());
                Ok(row)
            }
        }
    }

    async fn revoke(&self, id: Uuid) -> DbResult<bool> {
        let Some(mut stored) = self.sessions.get_mut(&id) else {
            return Ok(false);
        };

        stored.revoked = true;
        if stored.revoked_at.is_none() {
            stored.revoked_at = Some(Utc::now());
        }
        Ok(true)
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let mut count = 0;
        for mut s in self.sessions.iter_mut() {
            if s.user_id == user_id && !s.revoked {
                s.revoked = true;
                s.revoked_at = Some(Utc::now());
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete_expired(&self) -> DbResult<u64> {
        let now = Utc::now();
        let expired: Vec<Uuid> = self
            .sessions
            .iter()
            .filter(|r| r.expires_at < now)
            .map(|r| r.id)
            .collect();
        let count = expired.len() as u64;
        for id in expired {
            if let Some((_, session)) = self.sessions.remove(&id) {
                self.by_token_hash.remove(&session.token_hash);
            }
        }
        Ok(count)
    }
}
