use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    JsonBody, ObjectIdPath, ProcessMemory, QueryParams, RuntimeInfo,
    errors::responses::{
        BadRequestIdResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::UserResult;
use crate::models::{
    AgeGroup, ApiResponse, CreateUser, DatabaseStats, DeletedUser, HealthState, ListQuery,
    Pagination, StatsSummary, StatusCount, UpdateUser, UserResponse, UserStatus, UserSummary,
};
use crate::repository::UserRepository;
use crate::service::UserService;

const SERVICE_NAME: &str = "User API";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        health_status,
        stats_summary,
    ),
    components(
        schemas(
            UserResponse,
            UserSummary,
            DeletedUser,
            CreateUser,
            UpdateUser,
            UserStatus,
            AgeGroup,
            Pagination,
            StatsSummary,
            StatusCount,
            StatsData,
            DatabaseStats,
            HealthState,
            HealthResponse,
            DatabaseHealth,
            ServerHealth,
            ProcessMemory
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestIdResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "User management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Router state: the service plus process facts for the deep health check
pub struct UsersState<R: UserRepository> {
    service: Arc<UserService<R>>,
    runtime: RuntimeInfo,
}

impl<R: UserRepository> Clone for UsersState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            runtime: self.runtime.clone(),
        }
    }
}

/// Create the users router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>, runtime: RuntimeInfo) -> Router {
    let state = UsersState {
        service: Arc::new(service),
        runtime,
    };

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/health/status", get(health_status))
        .route("/stats/summary", get(stats_summary))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .with_state(state)
}

/// List users with pagination, status filter and sorting
#[utoipa::path(
    get,
    path = "",
    tag = "Users",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of users", body = ApiResponse<Vec<UserSummary>>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(state): State<UsersState<R>>,
    QueryParams(query): QueryParams<ListQuery>,
) -> UserResult<Json<ApiResponse<Vec<UserSummary>>>> {
    let page = state.service.list_users(query).await?;
    let users = page.users.into_iter().map(UserSummary::from).collect();
    Ok(Json(ApiResponse::ok(users).with_pagination(page.pagination)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created successfully", body = ApiResponse<UserSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    JsonBody(input): JsonBody<CreateUser>,
) -> UserResult<impl IntoResponse> {
    let user = state.service.create_user(input).await?;
    tracing::info!(user_id = %user.id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserSummary::from(user)).with_message("User created successfully")),
    ))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex ObjectId)")
    ),
    responses(
        (status = 200, description = "User found", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Json<ApiResponse<UserResponse>>> {
    let user = state.service.get_user(id).await?;
    Ok(Json(ApiResponse::ok(UserResponse::from(user))))
}

/// Partially update a user
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex ObjectId)")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated successfully", body = ApiResponse<UserResponse>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    ObjectIdPath(id): ObjectIdPath,
    JsonBody(input): JsonBody<UpdateUser>,
) -> UserResult<Json<ApiResponse<UserResponse>>> {
    let user = state.service.update_user(id, input).await?;
    Ok(Json(
        ApiResponse::ok(UserResponse::from(user)).with_message("User updated successfully"),
    ))
}

/// Permanently delete a user
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    params(
        ("id" = String, Path, description = "User ID (24-character hex ObjectId)")
    ),
    responses(
        (status = 200, description = "User deleted successfully", body = ApiResponse<DeletedUser>),
        (status = 400, response = BadRequestIdResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(state): State<UsersState<R>>,
    ObjectIdPath(id): ObjectIdPath,
) -> UserResult<Json<ApiResponse<DeletedUser>>> {
    let deleted = state.service.delete_user(id).await?;
    tracing::info!(user_id = %deleted.id, "User deleted");
    Ok(Json(
        ApiResponse::ok(deleted).with_message("User deleted successfully"),
    ))
}

/// Deep health check body
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub success: bool,
    pub status: HealthState,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "User API")]
    pub service: String,
    #[schema(example = "1.0.0")]
    pub version: String,
    #[schema(example = "development")]
    pub environment: String,
    pub database: DatabaseHealth,
    pub server: ServerHealth,
    /// Failed sub-checks, present only when degraded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub user_count: Option<u64>,
    pub stats: Option<DatabaseStats>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServerHealth {
    /// Seconds since startup
    pub uptime: f64,
    pub memory: Option<ProcessMemory>,
}

/// Deep health check
///
/// Always answers 200; failing database sub-checks mark the report as
/// `degraded` and are listed under `errors`.
#[utoipa::path(
    get,
    path = "/health/status",
    tag = "Users",
    responses(
        (status = 200, description = "Service health with database details", body = HealthResponse)
    )
)]
async fn health_status<R: UserRepository>(
    State(state): State<UsersState<R>>,
) -> Json<HealthResponse> {
    let report = state.service.health().await;
    let status = report.state();

    Json(HealthResponse {
        success: true,
        status,
        timestamp: Utc::now(),
        service: SERVICE_NAME.to_string(),
        version: state.runtime.version.clone(),
        environment: state.runtime.environment.as_str().to_string(),
        database: DatabaseHealth {
            connected: report.connected,
            user_count: report.user_count,
            stats: report.stats,
        },
        server: ServerHealth {
            uptime: state.runtime.uptime_secs(),
            memory: state.runtime.memory(),
        },
        errors: report.errors,
    })
}

/// Payload of the statistics endpoint
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsData {
    pub summary: StatsSummary,
    pub status_distribution: Vec<StatusCount>,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate user statistics
#[utoipa::path(
    get,
    path = "/stats/summary",
    tag = "Users",
    responses(
        (status = 200, description = "Age summary and status distribution", body = ApiResponse<StatsData>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn stats_summary<R: UserRepository>(
    State(state): State<UsersState<R>>,
) -> UserResult<Json<ApiResponse<StatsData>>> {
    let stats = state.service.stats_summary().await?;
    Ok(Json(ApiResponse::ok(StatsData {
        summary: stats.summary,
        status_distribution: stats.status_distribution,
        timestamp: Utc::now(),
    })))
}
