//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    bson::{self, Bson, Document, doc, oid::ObjectId},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions, ReturnDocument},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::{
    AgeSummary, DatabaseStats, SortDirection, SortSpec, StatusCount, User, UserChanges, UserQuery,
    UserStatus,
};
use crate::repository::UserRepository;

pub const COLLECTION_NAME: &str = "users";

const DUPLICATE_KEY: i32 = 11000;

/// Stored shape of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    age: i32,
    status: UserStatus,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl From<&User> for UserDocument {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            status: user.status,
            created_at: to_bson_datetime(user.created_at),
            updated_at: to_bson_datetime(user.updated_at),
        }
    }
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            age: doc.age,
            status: doc.status,
            created_at: from_bson_datetime(doc.created_at),
            updated_at: from_bson_datetime(doc.updated_at),
        }
    }
}

/// MongoDB implementation of the UserRepository
pub struct MongoUserRepository {
    database: Database,
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Create a repository over the `users` collection of `db`
    ///
    /// # Example
    /// ```ignore
    /// let client = database::mongodb::connect("mongodb://localhost:27017/users_api").await?;
    /// let repo = MongoUserRepository::new(client.database("users_api"));
    /// repo.init_indexes().await?;
    /// ```
    pub fn new(db: Database) -> Self {
        Self::with_collection(db, COLLECTION_NAME)
    }

    pub fn with_collection(db: Database, collection_name: &str) -> Self {
        let collection = db.collection::<UserDocument>(collection_name);
        Self {
            database: db,
            collection,
        }
    }

    /// Create the indexes the service relies on
    ///
    /// - unique `email` (uniqueness arbiter)
    /// - `createdAt` descending (default list order)
    /// - `status` + `createdAt` (filtered lists)
    pub async fn init_indexes(&self) -> UserResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
            IndexModel::builder()
                .keys(doc! { "status": 1, "createdAt": -1 })
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!(collection = COLLECTION_NAME, "User indexes ensured");
        Ok(())
    }

    fn build_filter(status: Option<UserStatus>) -> Document {
        let mut filter = doc! {};
        if let Some(status) = status {
            filter.insert("status", status.to_string());
        }
        filter
    }

    fn build_sort(sort: &SortSpec) -> Document {
        let mut sort_doc = Document::new();
        for (field, direction) in &sort.0 {
            sort_doc.insert(field.to_string(), direction_value(*direction));
        }
        sort_doc.insert("_id", direction_value(sort.tiebreak_direction()));
        sort_doc
    }

    fn build_update(changes: &UserChanges) -> Document {
        let mut set = doc! { "updatedAt": to_bson_datetime(changes.updated_at) };
        if let Some(ref name) = changes.name {
            set.insert("name", name.as_str());
        }
        if let Some(ref email) = changes.email {
            set.insert("email", email.as_str());
        }
        if let Some(age) = changes.age {
            set.insert("age", age);
        }
        if let Some(status) = changes.status {
            set.insert("status", status.to_string());
        }
        doc! { "$set": set }
    }
}

fn direction_value(direction: SortDirection) -> i32 {
    match direction {
        SortDirection::Ascending => 1,
        SortDirection::Descending => -1,
    }
}

/// `true` for a unique index violation, reported either as a write error
/// (insert) or a command error (findAndModify).
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

fn map_write_error(err: mongodb::error::Error) -> UserError {
    if is_duplicate_key(&err) {
        UserError::EmailTaken
    } else {
        UserError::from(err)
    }
}

/// Numeric field of a server reply, whatever BSON number type it uses.
fn number(doc: &Document, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

fn count_field(doc: &Document, key: &str) -> u64 {
    number(doc, key).map_or(0, |v| v.max(0.0) as u64)
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    async fn insert(&self, user: User) -> UserResult<User> {
        self.collection
            .insert_one(UserDocument::from(&user))
            .await
            .map_err(map_write_error)?;

        tracing::info!(user_id = %user.id, "User created successfully");
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        let user = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(user.map(User::from))
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let user = self.collection.find_one(doc! { "email": email }).await?;
        Ok(user.map(User::from))
    }

    #[instrument(skip(self))]
    async fn list(&self, query: &UserQuery) -> UserResult<Vec<User>> {
        let options = FindOptions::builder()
            .sort(Self::build_sort(&query.sort))
            .skip(query.skip.min(i64::MAX as u64))
            .limit(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .build();

        let cursor = self
            .collection
            .find(Self::build_filter(query.status))
            .with_options(options)
            .await?;
        let documents: Vec<UserDocument> = cursor.try_collect().await?;

        Ok(documents.into_iter().map(User::from).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self, status: Option<UserStatus>) -> UserResult<u64> {
        let count = self
            .collection
            .count_documents(Self::build_filter(status))
            .await?;
        Ok(count)
    }

    #[instrument(skip(self, changes))]
    async fn update(&self, id: ObjectId, changes: UserChanges) -> UserResult<Option<User>> {
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, Self::build_update(&changes))
            .return_document(ReturnDocument::After)
            .await
            .map_err(map_write_error)?;

        if updated.is_some() {
            tracing::info!(user_id = %id, "User updated successfully");
        }
        Ok(updated.map(User::from))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: ObjectId) -> UserResult<Option<User>> {
        let deleted = self.collection.find_one_and_delete(doc! { "_id": id }).await?;

        if deleted.is_some() {
            tracing::info!(user_id = %id, "User deleted successfully");
        }
        Ok(deleted.map(User::from))
    }

    #[instrument(skip(self))]
    async fn age_summary(&self) -> UserResult<Option<AgeSummary>> {
        let pipeline = vec![doc! {
            "$group": {
                "_id": Bson::Null,
                "totalUsers": { "$sum": 1 },
                "averageAge": { "$avg": "$age" },
                "minAge": { "$min": "$age" },
                "maxAge": { "$max": "$age" },
            }
        }];

        let cursor = self.collection.aggregate(pipeline).await?;
        let results: Vec<Document> = cursor.try_collect().await?;

        Ok(results.first().map(|row| AgeSummary {
            total_users: count_field(row, "totalUsers"),
            average_age: number(row, "averageAge").unwrap_or_default(),
            min_age: number(row, "minAge").unwrap_or_default() as i32,
            max_age: number(row, "maxAge").unwrap_or_default() as i32,
        }))
    }

    #[instrument(skip(self))]
    async fn status_distribution(&self) -> UserResult<Vec<StatusCount>> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$status", "count": { "$sum": 1 } } },
            doc! { "$sort": { "_id": 1 } },
        ];

        let cursor = self.collection.aggregate(pipeline).await?;
        let results: Vec<Document> = cursor.try_collect().await?;

        Ok(results
            .iter()
            .map(|row| StatusCount {
                status: row.get_str("_id").unwrap_or_default().to_string(),
                count: count_field(row, "count"),
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> UserResult<()> {
        database::mongodb::ping(&self.database).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn database_stats(&self) -> UserResult<DatabaseStats> {
        let stats = self.database.run_command(doc! { "dbStats": 1 }).await?;

        Ok(DatabaseStats {
            collections: count_field(&stats, "collections"),
            objects: count_field(&stats, "objects"),
            data_size: count_field(&stats, "dataSize"),
            storage_size: count_field(&stats, "storageSize"),
            indexes: count_field(&stats, "indexes"),
        })
    }
}
