use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::error::UserResult;
use crate::models::{AgeSummary, DatabaseStats, StatusCount, User, UserChanges, UserQuery, UserStatus};

/// Repository trait for User persistence
///
/// Uniqueness of `email` is enforced here: `insert` and `update` fail with
/// [`UserError::EmailTaken`](crate::error::UserError::EmailTaken) when
/// another user already holds the address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user
    async fn insert(&self, user: User) -> UserResult<User>;

    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>>;

    /// Look up by (already lowercased) email
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// One page of users, filtered and sorted
    async fn list(&self, query: &UserQuery) -> UserResult<Vec<User>>;

    /// Count users, optionally with a given status
    async fn count(&self, status: Option<UserStatus>) -> UserResult<u64>;

    /// Apply changes and return the updated user, `None` if absent
    async fn update(&self, id: ObjectId, changes: UserChanges) -> UserResult<Option<User>>;

    /// Remove permanently and return the removed user, `None` if absent
    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>>;

    /// Count and age aggregates, `None` for an empty collection
    async fn age_summary(&self) -> UserResult<Option<AgeSummary>>;

    /// Users per status, sorted by status
    async fn status_distribution(&self) -> UserResult<Vec<StatusCount>>;

    /// Round-trip to the store
    async fn ping(&self) -> UserResult<()>;

    async fn database_stats(&self) -> UserResult<DatabaseStats>;
}
