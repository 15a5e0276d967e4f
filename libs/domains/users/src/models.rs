use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};

pub const MIN_AGE: i64 = 1;
pub const MAX_AGE: i64 = 120;
pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// User status
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Active, UserStatus::Inactive, UserStatus::Pending];
}

/// Age bracket derived from `age`; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AgeGroup {
    Minor,
    Adult,
    Senior,
}

impl AgeGroup {
    pub fn from_age(age: i32) -> Self {
        if age < 18 {
            AgeGroup::Minor
        } else if age < 65 {
            AgeGroup::Adult
        } else {
            AgeGroup::Senior
        }
    }
}

/// User entity
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ObjectId,
    pub name: String,
    /// Lowercased, unique across users
    pub email: String,
    pub age: i32,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user from validated fields with a fresh id.
    pub fn new(input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: ObjectId::new(),
            name: input.name,
            email: input.email,
            age: input.age,
            status: input.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }

    /// Apply changes in place, as the store does on update.
    pub fn apply_changes(&mut self, changes: &UserChanges) {
        if let Some(ref name) = changes.name {
            self.name = name.clone();
        }
        if let Some(ref email) = changes.email {
            self.email = email.clone();
        }
        if let Some(age) = changes.age {
            self.age = age;
        }
        if let Some(status) = changes.status {
            self.status = status;
        }
        self.updated_at = changes.updated_at;
    }
}

/// Normalized, validated fields of a user about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i32,
    pub status: UserStatus,
}

/// Field-level changes of an update. `None` leaves the field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub status: Option<UserStatus>,
    pub updated_at: DateTime<Utc>,
}

impl UserChanges {
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            name: None,
            email: None,
            age: None,
            status: None,
            updated_at,
        }
    }
}

/// Request body for creating a user
///
/// Fields are kept as raw JSON at the parsing stage so that every missing
/// or mistyped field can be reported at once.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(value_type = Option<String>, example = "Ada Lovelace")]
    pub name: Option<Value>,
    #[schema(value_type = Option<String>, example = "ada@example.com")]
    pub email: Option<Value>,
    #[schema(value_type = Option<i64>, example = 36)]
    pub age: Option<Value>,
    /// One of `active`, `inactive`, `pending` (default)
    #[schema(value_type = Option<String>)]
    pub status: Option<Value>,
}

/// Request body for a partial update
///
/// Absent fields are left unchanged. A field sent as `null` is present and
/// fails validation like a missing required value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub email: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>)]
    pub age: Option<Option<Value>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub status: Option<Option<Value>>,
}

/// Marks a field as present, keeping an explicit `null` as `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(Some)
}

/// Raw list query string
///
/// Values are kept as text and parsed by the service so that bad input is
/// reported per field.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Page number, 1-based (default 1)
    pub page: Option<String>,
    /// Page size, 1-100 (default 10)
    pub limit: Option<String>,
    /// Exact status filter
    pub status: Option<String>,
    /// Sort fields, space or comma separated, `-` prefix for descending
    /// (default `-createdAt`)
    pub sort: Option<String>,
}

/// Sortable user fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SortField {
    #[strum(serialize = "name")]
    Name,
    #[strum(serialize = "email")]
    Email,
    #[strum(serialize = "age")]
    Age,
    #[strum(serialize = "status")]
    Status,
    #[strum(serialize = "createdAt")]
    CreatedAt,
    #[strum(serialize = "updatedAt")]
    UpdatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Ordered sort keys; the id breaks remaining ties in the direction of the
/// first key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec(pub Vec<(SortField, SortDirection)>);

impl SortSpec {
    pub fn tiebreak_direction(&self) -> SortDirection {
        self.0
            .first()
            .map_or(SortDirection::Descending, |(_, direction)| *direction)
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self(vec![(SortField::CreatedAt, SortDirection::Descending)])
    }
}

/// Parsed list parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub status: Option<UserStatus>,
    pub sort: SortSpec,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            status: None,
            sort: SortSpec::default(),
        }
    }
}

impl ListParams {
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Repository-level list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuery {
    pub status: Option<UserStatus>,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: u64,
}

impl From<&ListParams> for UserQuery {
    fn from(params: &ListParams) -> Self {
        Self {
            status: params.status,
            sort: params.sort.clone(),
            skip: params.skip(),
            limit: params.limit,
        }
    }
}

/// Pagination metadata of a list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub page: u64,
    pub pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let pages = total.div_ceil(limit.max(1)).max(1);
        Self {
            total,
            limit,
            page,
            pages,
            has_next: page < pages,
            has_prev: page > 1,
        }
    }
}

/// One page of users
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// Raw age aggregate over all users
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeSummary {
    pub total_users: u64,
    pub average_age: f64,
    pub min_age: i32,
    pub max_age: i32,
}

/// Number of users per status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: u64,
}

/// Statistics summary; age fields are omitted when there are no users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_users: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserStats {
    pub summary: StatsSummary,
    pub status_distribution: Vec<StatusCount>,
}

/// Storage statistics of the backing database
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub collections: u64,
    pub objects: u64,
    pub data_size: u64,
    pub storage_size: u64,
    pub indexes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Degraded,
}

/// Outcome of the database sub-checks of the deep health endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub connected: bool,
    pub user_count: Option<u64>,
    pub stats: Option<DatabaseStats>,
    /// Client-safe descriptions of the failed sub-checks
    pub errors: Vec<String>,
}

impl HealthReport {
    pub fn state(&self) -> HealthState {
        if self.errors.is_empty() {
            HealthState::Ok
        } else {
            HealthState::Degraded
        }
    }
}

// Response shapes

/// Success envelope
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
            pagination: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// Full user record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "665f1c2e9b1d4a0012345678")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub age_group: AgeGroup,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            age_group: user.age_group(),
            name: user.name,
            email: user.email,
            age: user.age,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// User record as shown in lists and on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
    pub age_group: AgeGroup,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_hex(),
            age_group: user.age_group(),
            name: user.name,
            email: user.email,
            age: user.age,
            status: user.status,
            created_at: user.created_at,
        }
    }
}

/// Confirmation of a permanent delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub deleted_at: DateTime<Utc>,
}

impl DeletedUser {
    pub fn new(user: User, deleted_at: DateTime<Utc>) -> Self {
        Self {
            id: user.id.to_hex(),
            name: user.name,
            email: user.email,
            deleted_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_group_boundaries() {
        assert_eq!(AgeGroup::from_age(1), AgeGroup::Minor);
        assert_eq!(AgeGroup::from_age(17), AgeGroup::Minor);
        assert_eq!(AgeGroup::from_age(18), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(64), AgeGroup::Adult);
        assert_eq!(AgeGroup::from_age(65), AgeGroup::Senior);
        assert_eq!(AgeGroup::from_age(120), AgeGroup::Senior);
    }

    #[test]
    fn test_user_status_defaults_to_pending() {
        assert_eq!(UserStatus::default(), UserStatus::Pending);
        assert_eq!("active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert!("ACTIVE".parse::<UserStatus>().is_err());
        assert_eq!(UserStatus::Inactive.to_string(), "inactive");
    }

    #[test]
    fn test_update_user_distinguishes_null_from_absent() {
        let update: UpdateUser =
            serde_json::from_str(r#"{"name": null, "age": 30}"#).unwrap();
        assert_eq!(update.name, Some(None));
        assert_eq!(update.age, Some(Some(serde_json::json!(30))));
        assert_eq!(update.email, None);
        assert_eq!(update.status, None);
    }

    #[test]
    fn test_create_user_accepts_mistyped_fields() {
        let input: CreateUser =
            serde_json::from_str(r#"{"name": 7, "age": "28", "status": null}"#).unwrap();
        assert_eq!(input.name, Some(serde_json::json!(7)));
        assert_eq!(input.age, Some(serde_json::json!("28")));
        assert_eq!(input.email, None);
        assert_eq!(input.status, None);
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(2, 10, 25);
        assert_eq!(p.pages, 3);
        assert!(p.has_next);
        assert!(p.has_prev);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);

        let last = Pagination::new(3, 10, 30);
        assert!(!last.has_next);
    }

    #[test]
    fn test_list_params_skip() {
        let params = ListParams {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(params.skip(), 40);
        assert_eq!(ListParams::default().skip(), 0);
    }

    #[test]
    fn test_sort_field_names() {
        assert_eq!("createdAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!(SortField::UpdatedAt.to_string(), "updatedAt");
        assert!("created_at".parse::<SortField>().is_err());
    }

    #[test]
    fn test_apply_changes_touches_only_present_fields() {
        let now = Utc::now();
        let mut user = User::new(
            NewUser {
                name: "Ab".to_string(),
                email: "ab@example.com".to_string(),
                age: 28,
                status: UserStatus::Pending,
            },
            now,
        );
        let later = now + chrono::Duration::seconds(5);
        let mut changes = UserChanges::new(later);
        changes.age = Some(70);
        user.apply_changes(&changes);

        assert_eq!(user.age, 70);
        assert_eq!(user.age_group(), AgeGroup::Senior);
        assert_eq!(user.name, "Ab");
        assert_eq!(user.updated_at, later);
        assert_eq!(user.created_at, now);
    }

    #[test]
    fn test_user_response_is_camel_case() {
        let user = User::new(
            NewUser {
                name: "Ab".to_string(),
                email: "ab@example.com".to_string(),
                age: 10,
                status: UserStatus::Active,
            },
            Utc::now(),
        );
        let json = serde_json::to_value(UserResponse::from(user.clone())).unwrap();
        assert_eq!(json["id"], user.id.to_hex());
        assert_eq!(json["ageGroup"], "minor");
        assert_eq!(json["status"], "active");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());

        let summary = serde_json::to_value(UserSummary::from(user)).unwrap();
        assert!(summary.get("updatedAt").is_none());
    }

    #[test]
    fn test_stats_summary_omits_age_fields_when_empty() {
        let summary = StatsSummary {
            total_users: 0,
            average_age: None,
            min_age: None,
            max_age: None,
        };
        assert_eq!(
            serde_json::to_value(summary).unwrap(),
            serde_json::json!({ "totalUsers": 0 })
        );
    }
}
