//! In-process UserRepository for tests and local runs without MongoDB.
//!
//! Mirrors the Mongo implementation: unique emails, the same sort order and
//! `_id` tiebreak, and the same aggregates.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tokio::sync::RwLock;

use crate::error::{UserError, UserResult};
use crate::models::{
    AgeSummary, DatabaseStats, SortDirection, SortField, SortSpec, StatusCount, User, UserChanges,
    UserQuery, UserStatus,
};
use crate::repository::UserRepository;

/// Clones share the same store.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<ObjectId, User>>>,
    offline: Arc<AtomicBool>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the database were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, AtomicOrdering::SeqCst);
    }

    fn check_online(&self) -> UserResult<()> {
        if self.offline.load(AtomicOrdering::SeqCst) {
            return Err(UserError::Database(
                "in-memory store is offline".to_string(),
            ));
        }
        Ok(())
    }
}

fn compare_field(a: &User, b: &User, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Email => a.email.cmp(&b.email),
        SortField::Age => a.age.cmp(&b.age),
        SortField::Status => a.status.to_string().cmp(&b.status.to_string()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    }
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn compare_users(a: &User, b: &User, sort: &SortSpec) -> Ordering {
    sort.0
        .iter()
        .map(|(field, direction)| directed(compare_field(a, b, *field), *direction))
        .find(|ordering| ordering.is_ne())
        .unwrap_or_else(|| directed(a.id.cmp(&b.id), sort.tiebreak_direction()))
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: User) -> UserResult<User> {
        self.check_online()?;
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::EmailTaken);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.check_online()?;
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self, query: &UserQuery) -> UserResult<Vec<User>> {
        self.check_online()?;
        let users = self.users.read().await;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| query.status.is_none_or(|status| u.status == status))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_users(a, b, &query.sort));

        Ok(matching
            .into_iter()
            .skip(usize::try_from(query.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(query.limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, status: Option<UserStatus>) -> UserResult<u64> {
        self.check_online()?;
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| status.is_none_or(|s| u.status == s))
            .count() as u64)
    }

    async fn update(&self, id: ObjectId, changes: UserChanges) -> UserResult<Option<User>> {
        self.check_online()?;
        let mut users = self.users.write().await;

        if let Some(ref email) = changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(UserError::EmailTaken);
            }
        }

        Ok(users.get_mut(&id).map(|user| {
            user.apply_changes(&changes);
            user.clone()
        }))
    }

    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>> {
        self.check_online()?;
        Ok(self.users.write().await.remove(&id))
    }

    async fn age_summary(&self) -> UserResult<Option<AgeSummary>> {
        self.check_online()?;
        let users = self.users.read().await;
        if users.is_empty() {
            return Ok(None);
        }

        let total = users.len() as u64;
        let sum: i64 = users.values().map(|u| i64::from(u.age)).sum();
        Ok(Some(AgeSummary {
            total_users: total,
            average_age: sum as f64 / total as f64,
            min_age: users.values().map(|u| u.age).min().unwrap_or_default(),
            max_age: users.values().map(|u| u.age).max().unwrap_or_default(),
        }))
    }

    async fn status_distribution(&self) -> UserResult<Vec<StatusCount>> {
        self.check_online()?;
        let users = self.users.read().await;
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for user in users.values() {
            *counts.entry(user.status.to_string()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }

    async fn ping(&self) -> UserResult<()> {
        self.check_online()
    }

    async fn database_stats(&self) -> UserResult<DatabaseStats> {
        self.check_online()?;
        let objects = self.users.read().await.len() as u64;
        Ok(DatabaseStats {
            collections: 1,
            objects,
            indexes: 1,
            ..Default::default()
        })
    }
}
