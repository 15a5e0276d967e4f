//! Users Domain
//!
//! User management backed by MongoDB.
//!
//! # Features
//!
//! - User CRUD with partial updates
//! - Pagination, status filter and multi-key sorting
//! - Case-insensitive unique emails
//! - Aggregate statistics and a deep health check
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, response envelopes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, conflict checks, pagination
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB / in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, request and response shapes
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::RuntimeInfo;
//! use core_config::Environment;
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let service = UserService::new(InMemoryUserRepository::new());
//! let runtime = RuntimeInfo::new("1.0.0", Environment::Development);
//! let router = handlers::router(service, runtime);
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryUserRepository;
pub use models::{
    AgeGroup, CreateUser, ListQuery, UpdateUser, User, UserResponse, UserStatus, UserSummary,
};
pub use mongodb::MongoUserRepository;
pub use repository::UserRepository;
pub use service::UserService;
