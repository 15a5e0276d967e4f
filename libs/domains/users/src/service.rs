//! User Service - Business logic layer

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{
    CreateUser, DeletedUser, HealthReport, ListQuery, Pagination, StatsSummary, UpdateUser, User,
    UserPage, UserQuery, UserStats,
};
use crate::repository::UserRepository;
use crate::validation::UserDraft;

/// Current time at the precision the store keeps (milliseconds).
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// User service providing business logic operations
///
/// Validation and the email conflict pre-check live here; the repository's
/// unique index stays the final arbiter for concurrent writes.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new user
    #[instrument(skip(self, input))]
    pub async fn create_user(&self, input: CreateUser) -> UserResult<User> {
        let new_user = UserDraft::from(input).into_new_user()?;
        self.repository.insert(User::new(new_user, now())).await
    }

    /// One page of users with pagination metadata
    #[instrument(skip(self))]
    pub async fn list_users(&self, query: ListQuery) -> UserResult<UserPage> {
        let params = query.parse()?;
        let user_query = UserQuery::from(&params);

        let (users, total) = tokio::try_join!(
            self.repository.list(&user_query),
            self.repository.count(params.status)
        )?;

        Ok(UserPage {
            users,
            pagination: Pagination::new(params.page, params.limit, total),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: ObjectId) -> UserResult<User> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Partially update a user
    ///
    /// Order of checks: existence (404), field validation (400), email
    /// conflict with another user (409). The conflict check and the write are
    /// not atomic; a duplicate caught by the store also surfaces as 409.
    #[instrument(skip(self, input))]
    pub async fn update_user(&self, id: ObjectId, input: UpdateUser) -> UserResult<User> {
        let existing = self.get_user(id).await?;
        let changes = input.into_changes(&existing, now())?;

        if let Some(ref email) = changes.email {
            if *email != existing.email {
                if let Some(other) = self.repository.find_by_email(email).await? {
                    if other.id != id {
                        return Err(UserError::EmailTaken);
                    }
                }
            }
        }

        self.repository
            .update(id, changes)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Permanently delete a user
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: ObjectId) -> UserResult<DeletedUser> {
        let deleted = self
            .repository
            .delete(id)
            .await?
            .ok_or(UserError::NotFound(id))?;
        Ok(DeletedUser::new(deleted, Utc::now()))
    }

    /// Run the database sub-checks; failures degrade the report instead of
    /// failing it.
    #[instrument(skip(self))]
    pub async fn health(&self) -> HealthReport {
        let (ping, user_count, stats) = tokio::join!(
            self.repository.ping(),
            self.repository.count(None),
            self.repository.database_stats()
        );

        let mut errors = Vec::new();

        let connected = match ping {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Health check: database ping failed");
                errors.push("database ping failed".to_string());
                false
            }
        };

        let user_count = match user_count {
            Ok(count) => Some(count),
            Err(e) => {
                tracing::warn!(error = %e, "Health check: user count failed");
                errors.push("user count unavailable".to_string());
                None
            }
        };

        let stats = match stats {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "Health check: database stats failed");
                errors.push("database stats unavailable".to_string());
                None
            }
        };

        HealthReport {
            connected,
            user_count,
            stats,
            errors,
        }
    }

    /// Age aggregates and status breakdown
    #[instrument(skip(self))]
    pub async fn stats_summary(&self) -> UserResult<UserStats> {
        let (ages, status_distribution) = tokio::try_join!(
            self.repository.age_summary(),
            self.repository.status_distribution()
        )?;

        let summary = match ages {
            Some(ages) => StatsSummary {
                total_users: ages.total_users,
                average_age: Some(round2(ages.average_age)),
                min_age: Some(ages.min_age),
                max_age: Some(ages.max_age),
            },
            None => StatsSummary {
                total_users: 0,
                average_age: None,
                min_age: None,
                max_age: None,
            },
        };

        Ok(UserStats {
            summary,
            status_distribution,
        })
    }
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
